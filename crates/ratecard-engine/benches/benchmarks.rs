//! Ratecard Performance Benchmarks
//!
//! Critical paths evaluated once per billing event:
//! - Expression parsing and evaluation
//! - Cost calculation across pricing shapes
//! - Validation of nested pricing trees

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ratecard_common::{parse, GradTier, Pricing, Tier, UsageData};
use ratecard_engine::{calculate_cost, validate, PricingEngine};
use rust_decimal_macros::dec;

const FORMULA: &str = "input_tokens / 1000000 * 0.50 + output_tokens / 1000000 * 1.50";

// ============ EXPRESSION BENCHMARKS ============

fn bench_expression(c: &mut Criterion) {
    let mut group = c.benchmark_group("expression");

    group.bench_function("parse", |b| b.iter(|| parse(black_box(FORMULA))));

    let expr = parse(FORMULA).unwrap();
    let usage = UsageData::tokens(2_000_000, 1_000_000);
    group.bench_function("evaluate", |b| {
        b.iter(|| expr.evaluate(black_box(&usage)))
    });

    group.finish();
}

// ============ CALCULATION BENCHMARKS ============

fn graduated(bands: u64) -> Pricing {
    let mut tiers: Vec<GradTier> = (1..=bands)
        .map(|i| GradTier::new(i * 1000, dec!(0.01)))
        .collect();
    tiers.push(GradTier::unbounded(dec!(0.001)));
    Pricing::graduated("request_count", tiers)
}

fn bench_calculation(c: &mut Criterion) {
    let mut group = c.benchmark_group("calculate_cost");
    let usage = UsageData::tokens(2_000_000, 1_000_000).with_request_count(50_000u64);

    let tokens = Pricing::per_million_split(dec!(0.50), dec!(1.50));
    group.bench_function("one_million_tokens", |b| {
        b.iter(|| calculate_cost(black_box(&tokens), black_box(&usage)))
    });

    for bands in [2u64, 8, 32].iter() {
        let pricing = graduated(*bands);
        group.throughput(Throughput::Elements(*bands));
        group.bench_with_input(BenchmarkId::new("graduated", bands), &pricing, |b, p| {
            b.iter(|| calculate_cost(black_box(p), black_box(&usage)))
        });
    }

    let nested = Pricing::add(vec![
        Pricing::multiply(dec!(0.9), graduated(4)),
        Pricing::tiered(
            "request_count",
            vec![
                Tier::new(10_000, Pricing::constant(dec!(10))),
                Tier::unbounded(Pricing::expr(FORMULA)),
            ],
        ),
    ]);
    group.bench_function("nested", |b| {
        b.iter(|| calculate_cost(black_box(&nested), black_box(&usage)))
    });

    group.finish();
}

// ============ VALIDATION BENCHMARKS ============

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");

    let wide = Pricing::add((0..64).map(|_| graduated(8)).collect());
    group.bench_function("wide_add", |b| b.iter(|| validate(black_box(&wide))));

    let engine = PricingEngine::default();
    let pricing = graduated(8);
    group.bench_function("compile_cached", |b| {
        b.iter(|| engine.compile(black_box(&pricing)))
    });

    group.finish();
}

criterion_group!(benches, bench_expression, bench_calculation, bench_validation);
criterion_main!(benches);
