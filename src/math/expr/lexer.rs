use crate::utils::error::{PropError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Power,
    LParen,
    RParen,
    Comma,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    Amp,
    Pipe,
    Tilde,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset into the source.
    pub position: usize,
}

fn error(source: &str, position: usize, message: impl Into<String>) -> PropError {
    PropError::ExpressionError {
        expr: source.to_string(),
        position,
        message: message.into(),
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let mut end = position;
            let mut seen_exponent = false;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    end = i + d.len_utf8();
                    chars.next();
                } else if (d == 'e' || d == 'E') && !seen_exponent {
                    seen_exponent = true;
                    end = i + 1;
                    chars.next();
                    if let Some(&(j, sign)) = chars.peek() {
                        if sign == '+' || sign == '-' {
                            end = j + 1;
                            chars.next();
                        }
                    }
                } else {
                    break;
                }
            }
            let text = &source[position..end];
            let value: f64 = text
                .parse()
                .map_err(|_| error(source, position, format!("invalid number '{}'", text)))?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                position,
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut end = position;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Ident(source[position..end].to_string()),
                position,
            });
            continue;
        }

        chars.next();
        let next = chars.peek().map(|&(_, d)| d);
        let kind = match (c, next) {
            ('*', Some('*')) => {
                chars.next();
                TokenKind::Power
            }
            ('<', Some('=')) => {
                chars.next();
                TokenKind::Le
            }
            ('>', Some('=')) => {
                chars.next();
                TokenKind::Ge
            }
            ('=', Some('=')) => {
                chars.next();
                TokenKind::EqEq
            }
            ('!', Some('=')) => {
                chars.next();
                TokenKind::Ne
            }
            ('+', _) => TokenKind::Plus,
            ('-', _) => TokenKind::Minus,
            ('*', _) => TokenKind::Star,
            ('/', _) => TokenKind::Slash,
            ('%', _) => TokenKind::Percent,
            ('(', _) => TokenKind::LParen,
            (')', _) => TokenKind::RParen,
            (',', _) => TokenKind::Comma,
            ('<', _) => TokenKind::Lt,
            ('>', _) => TokenKind::Gt,
            ('&', _) => TokenKind::Amp,
            ('|', _) => TokenKind::Pipe,
            ('~', _) => TokenKind::Tilde,
            (other, _) => {
                return Err(error(
                    source,
                    position,
                    format!("unexpected character '{}'", other),
                ))
            }
        };
        tokens.push(Token { kind, position });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        position: source.len(),
    });
    Ok(tokens)
}
