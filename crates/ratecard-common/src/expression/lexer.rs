//! Tokenizer for the expression language

use rust_decimal::Decimal;

use crate::error::ExpressionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Number(Decimal),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub position: usize,
}

/// Split `text` into tokens, rejecting anything outside the four operators,
/// parentheses, decimal literals and identifiers.
pub(crate) fn tokenize(text: &str) -> Result<Vec<Token>, ExpressionError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;

        let kind = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                pos += 1;
                continue;
            }
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => {
                if bytes.get(pos + 1) == Some(&b'*') {
                    return Err(ExpressionError::UnsupportedOperator("**".to_string()));
                }
                TokenKind::Star
            }
            b'/' => TokenKind::Slash,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'0'..=b'9' => {
                pos = scan_number(bytes, pos)?;
                let literal = &text[start..pos];
                // Literals that cannot be held exactly are rejected, not rounded
                let value = Decimal::from_str_exact(literal)
                    .map_err(|_| ExpressionError::InvalidSyntax { position: start })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    position: start,
                });
                continue;
            }
            b'.' => return Err(ExpressionError::InvalidSyntax { position: start }),
            c if c == b'_' || c.is_ascii_alphabetic() => {
                while pos < bytes.len() && (bytes[pos] == b'_' || bytes[pos].is_ascii_alphanumeric())
                {
                    pos += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(text[start..pos].to_string()),
                    position: start,
                });
                continue;
            }
            _ => {
                // Multi-byte characters are reported whole
                let op = text[start..].chars().next().map(String::from).unwrap_or_default();
                return Err(ExpressionError::UnsupportedOperator(op));
            }
        };

        tokens.push(Token {
            kind,
            position: start,
        });
        pos += 1;
    }

    Ok(tokens)
}

/// Returns the end offset of the literal starting at `pos`
fn scan_number(bytes: &[u8], mut pos: usize) -> Result<usize, ExpressionError> {
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        let fraction_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == fraction_start {
            return Err(ExpressionError::InvalidSyntax { position: pos });
        }
    }
    Ok(pos)
}
