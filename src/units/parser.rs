use super::dimension::Exponent;
use crate::utils::error::{PropError, Result};

/// Largest magnitude of a written exponent.
pub const MAX_EXPONENT: f64 = 1000.0;

/// Deepest unit expression tree the parser builds.
pub const MAX_DEPTH: usize = 256;

/// Parsed unit expression, before names are resolved against a registry.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitExpr {
    Number(f64),
    Name(String),
    Mul(Box<UnitExpr>, Box<UnitExpr>),
    Div(Box<UnitExpr>, Box<UnitExpr>),
    Pow(Box<UnitExpr>, Exponent),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Name(String),
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn error(text: &str, reason: impl Into<String>) -> PropError {
    PropError::UnitParseError {
        unit: text.to_string(),
        reason: reason.into(),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '°' || c == '%' || c == '℃' || c == '℉'
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // exponent only when digits follow, so "2e" never eats a unit name
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let literal: String = chars[start..i].iter().collect();
            let value = literal
                .parse()
                .map_err(|_| error(text, format!("invalid number '{}'", literal)))?;
            tokens.push(Token::Number(value));
        } else if is_name_char(c) {
            let start = i;
            while i < chars.len() && (is_name_char(chars[i]) || chars[i].is_ascii_digit()) {
                i += 1;
            }
            tokens.push(Token::Name(chars[start..i].iter().collect()));
        } else {
            let token = match c {
                '*' if chars.get(i + 1) == Some(&'*') => {
                    i += 1;
                    Token::Caret
                }
                '*' | '·' => Token::Star,
                '/' => Token::Slash,
                '^' => Token::Caret,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '-' | '+' => {
                    // signs only appear in exponents, handled by the parser
                    tokens.push(Token::Name(c.to_string()));
                    i += 1;
                    continue;
                }
                other => return Err(error(text, format!("unexpected character '{}'", other))),
            };
            tokens.push(token);
            i += 1;
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    cursor: usize,
}

impl<'a> Parser<'a> {
    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(error(
                self.text,
                format!("nests deeper than {} levels", MAX_DEPTH),
            ));
        }
        Ok(())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        self.cursor += 1;
        token
    }

    /// `depth` counts the tree levels above this node; every operand folded
    /// into the left-deep chain adds one.
    fn product(&mut self, mut depth: usize) -> Result<UnitExpr> {
        self.check_depth(depth)?;
        let mut lhs = self.power(depth + 1)?;
        loop {
            let divide = match self.peek() {
                Some(Token::Star) => {
                    self.next();
                    false
                }
                Some(Token::Slash) => {
                    self.next();
                    true
                }
                // whitespace juxtaposition, e.g. "Ω m"
                Some(Token::Number(_)) | Some(Token::LParen) => false,
                Some(Token::Name(name)) if name != "-" && name != "+" => false,
                _ => break,
            };
            depth += 1;
            self.check_depth(depth)?;
            let rhs = Box::new(self.power(depth + 1)?);
            lhs = if divide {
                UnitExpr::Div(Box::new(lhs), rhs)
            } else {
                UnitExpr::Mul(Box::new(lhs), rhs)
            };
        }
        Ok(lhs)
    }

    fn power(&mut self, depth: usize) -> Result<UnitExpr> {
        let base = self.atom(depth)?;
        if self.peek() == Some(&Token::Caret) {
            self.next();
            let exponent = self.exponent()?;
            return Ok(UnitExpr::Pow(Box::new(base), exponent));
        }
        Ok(base)
    }

    fn exponent(&mut self) -> Result<Exponent> {
        let parenthesized = self.peek() == Some(&Token::LParen);
        if parenthesized {
            self.next();
        }

        let mut sign = 1.0;
        if let Some(Token::Name(name)) = self.peek() {
            if name == "-" || name == "+" {
                if name == "-" {
                    sign = -1.0;
                }
                self.next();
            }
        }

        let value = match self.next() {
            Some(Token::Number(value)) => sign * value,
            other => {
                return Err(error(
                    self.text,
                    format!("expected an exponent, found {:?}", other),
                ))
            }
        };

        if parenthesized && self.next() != Some(Token::RParen) {
            return Err(error(self.text, "unbalanced parentheses in exponent"));
        }
        if value.abs() > MAX_EXPONENT {
            return Err(error(
                self.text,
                format!("exponent {} exceeds {}", value, MAX_EXPONENT),
            ));
        }
        Exponent::from_f64(value).ok_or_else(|| {
            error(
                self.text,
                format!("exponent {} is not a decimal with a small denominator", value),
            )
        })
    }

    fn atom(&mut self, depth: usize) -> Result<UnitExpr> {
        match self.next() {
            Some(Token::Number(value)) => Ok(UnitExpr::Number(value)),
            Some(Token::Name(name)) if name != "-" && name != "+" => Ok(UnitExpr::Name(name)),
            Some(Token::LParen) => {
                let inner = self.product(depth + 1)?;
                if self.next() != Some(Token::RParen) {
                    return Err(error(self.text, "unbalanced parentheses"));
                }
                Ok(inner)
            }
            other => Err(error(self.text, format!("unexpected {:?}", other))),
        }
    }
}

/// Parses a unit expression such as `W/m/K`, `kg m^-3`, `Ω m` or `1e-6/K`.
/// Empty text parses as the number one.
pub fn parse_unit_expr(text: &str) -> Result<UnitExpr> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Ok(UnitExpr::Number(1.0));
    }

    let mut parser = Parser {
        text,
        tokens,
        cursor: 0,
    };
    let expr = parser.product(0)?;
    if parser.cursor < parser.tokens.len() {
        return Err(error(text, "trailing characters"));
    }
    Ok(expr)
}
