//! Recursive-descent parser
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | primary
//! primary := NUMBER | METRIC | '(' expr ')'
//! ```

use super::ast::{BinaryOp, Expression, Node};
use super::lexer::{tokenize, Token, TokenKind};
use crate::error::ExpressionError;
use crate::types::metric::Metric;

/// Deepest expression tree accepted, counting parentheses, unary minus and
/// chained operators
pub(crate) const MAX_DEPTH: usize = 128;

pub(crate) fn parse_expression(text: &str) -> Result<Expression, ExpressionError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: text.len(),
        nesting: 0,
    };

    let (root, _) = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(ExpressionError::InvalidSyntax {
            position: token.position,
        });
    }
    Ok(Expression::new(root))
}

/// A parsed subtree and its height
type Parsed = (Node, usize);

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Reported position when input runs out
    end: usize,
    /// Open parentheses and unary minus signs on the current path
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn syntax_error(&self, token: Option<&Token>) -> ExpressionError {
        ExpressionError::InvalidSyntax {
            position: token.map_or(self.end, |t| t.position),
        }
    }

    fn descend(&mut self, token: &Token) -> Result<(), ExpressionError> {
        self.nesting += 1;
        if self.nesting > MAX_DEPTH {
            return Err(ExpressionError::InvalidSyntax {
                position: token.position,
            });
        }
        Ok(())
    }

    fn binary(
        op: BinaryOp,
        token: &Token,
        (lhs, lhs_height): Parsed,
        (rhs, rhs_height): Parsed,
    ) -> Result<Parsed, ExpressionError> {
        let height = lhs_height.max(rhs_height) + 1;
        if height > MAX_DEPTH {
            return Err(ExpressionError::InvalidSyntax {
                position: token.position,
            });
        }
        let node = Node::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
        Ok((node, height))
    }

    fn expr(&mut self) -> Result<Parsed, ExpressionError> {
        let mut lhs = self.term()?;
        while let Some((op, token)) = self.peek().and_then(|t| match t.kind {
            TokenKind::Plus => Some((BinaryOp::Add, t)),
            TokenKind::Minus => Some((BinaryOp::Sub, t)),
            _ => None,
        }) {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Self::binary(op, token, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Parsed, ExpressionError> {
        let mut lhs = self.unary()?;
        while let Some((op, token)) = self.peek().and_then(|t| match t.kind {
            TokenKind::Star => Some((BinaryOp::Mul, t)),
            TokenKind::Slash => Some((BinaryOp::Div, t)),
            _ => None,
        }) {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Self::binary(op, token, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Parsed, ExpressionError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Minus => {
                self.pos += 1;
                self.descend(token)?;
                let (inner, height) = self.unary()?;
                self.nesting -= 1;
                Ok((Node::Neg(Box::new(inner)), height + 1))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Parsed, ExpressionError> {
        let token = self.advance();
        match token.map(|t| (&t.kind, t)) {
            Some((TokenKind::Number(value), _)) => Ok((Node::Number(*value), 1)),
            Some((TokenKind::Ident(name), _)) => Ok((Node::Metric(Metric::lookup(name)?), 1)),
            Some((TokenKind::LParen, open)) => {
                self.descend(open)?;
                let inner = self.expr()?;
                self.nesting -= 1;
                let close = self.advance();
                match close.map(|t| &t.kind) {
                    Some(TokenKind::RParen) => Ok(inner),
                    _ => Err(self.syntax_error(close)),
                }
            }
            _ => Err(self.syntax_error(token)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_parentheses_rejected() {
        let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));
        assert!(parse_expression(&nested(MAX_DEPTH)).is_ok());
        assert_eq!(
            parse_expression(&nested(MAX_DEPTH + 1)),
            Err(ExpressionError::InvalidSyntax {
                position: MAX_DEPTH
            })
        );
        assert!(parse_expression(&nested(50_000)).is_err());
    }

    #[test]
    fn test_long_unary_chain_rejected() {
        assert!(parse_expression(&format!("{}1", "-".repeat(MAX_DEPTH - 1))).is_ok());
        assert_eq!(
            parse_expression(&format!("{}1", "-".repeat(MAX_DEPTH + 1))),
            Err(ExpressionError::InvalidSyntax {
                position: MAX_DEPTH
            })
        );
        assert!(parse_expression(&format!("{}1", "-".repeat(50_000))).is_err());
    }

    #[test]
    fn test_long_operator_chain_rejected() {
        let chain = |n: usize| vec!["count"; n].join(" + ");
        assert!(parse_expression(&chain(MAX_DEPTH)).is_ok());
        assert!(matches!(
            parse_expression(&chain(50_000)),
            Err(ExpressionError::InvalidSyntax { .. })
        ));
    }
}
