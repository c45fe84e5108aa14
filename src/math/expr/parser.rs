use super::lexer::{tokenize, Token, TokenKind};
use crate::utils::error::{PropError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Arcsin,
    Arccos,
    Arctan,
    Arctan2,
    Sinh,
    Cosh,
    Tanh,
    Arcsinh,
    Arccosh,
    Arctanh,
    Exp,
    Expm1,
    Log,
    Log10,
    Log1p,
    Sqrt,
    Abs,
    Floor,
    Ceil,
    Where,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "arcsin" => Function::Arcsin,
            "arccos" => Function::Arccos,
            "arctan" => Function::Arctan,
            "arctan2" => Function::Arctan2,
            "sinh" => Function::Sinh,
            "cosh" => Function::Cosh,
            "tanh" => Function::Tanh,
            "arcsinh" => Function::Arcsinh,
            "arccosh" => Function::Arccosh,
            "arctanh" => Function::Arctanh,
            "exp" => Function::Exp,
            "expm1" => Function::Expm1,
            "log" => Function::Log,
            "log10" => Function::Log10,
            "log1p" => Function::Log1p,
            "sqrt" => Function::Sqrt,
            "abs" => Function::Abs,
            "floor" => Function::Floor,
            "ceil" => Function::Ceil,
            "where" => Function::Where,
            _ => return None,
        };
        Some(function)
    }

    pub fn arity(self) -> usize {
        match self {
            Function::Arctan2 => 2,
            Function::Where => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

const PREFIX_BP: u8 = 11;

/// Deepest expression tree the parser builds.
pub const MAX_DEPTH: usize = 256;

fn infix_binding_power(kind: &TokenKind) -> Option<(BinaryOp, u8, u8)> {
    let entry = match kind {
        TokenKind::Pipe => (BinaryOp::Or, 1, 2),
        TokenKind::Amp => (BinaryOp::And, 3, 4),
        TokenKind::Lt => (BinaryOp::Lt, 5, 6),
        TokenKind::Le => (BinaryOp::Le, 5, 6),
        TokenKind::Gt => (BinaryOp::Gt, 5, 6),
        TokenKind::Ge => (BinaryOp::Ge, 5, 6),
        TokenKind::EqEq => (BinaryOp::Eq, 5, 6),
        TokenKind::Ne => (BinaryOp::Ne, 5, 6),
        TokenKind::Plus => (BinaryOp::Add, 7, 8),
        TokenKind::Minus => (BinaryOp::Sub, 7, 8),
        TokenKind::Star => (BinaryOp::Mul, 9, 10),
        TokenKind::Slash => (BinaryOp::Div, 9, 10),
        TokenKind::Percent => (BinaryOp::Mod, 9, 10),
        // right associative and tighter than unary minus: -x**2 == -(x**2)
        TokenKind::Power => (BinaryOp::Pow, 14, 13),
        _ => return None,
    };
    Some(entry)
}

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    cursor: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            cursor: 0,
        })
    }

    pub fn parse(mut self) -> Result<Expr> {
        let expr = self.parse_expr(0, 0)?;
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            return Err(self.error(token.position, format!("unexpected token {:?}", token.kind)));
        }
        Ok(expr)
    }

    fn peek(&self) -> Token {
        self.tokens[self.cursor].clone()
    }

    fn advance(&mut self) -> Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }

    fn error(&self, position: usize, message: impl Into<String>) -> PropError {
        PropError::ExpressionError {
            expr: self.source.to_string(),
            position,
            message: message.into(),
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<()> {
        let token = self.advance();
        if token.kind != kind {
            return Err(self.error(
                token.position,
                format!("expected {}, found {:?}", what, token.kind),
            ));
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            let position = self.peek().position;
            return Err(self.error(
                position,
                format!("expression nests deeper than {} levels", MAX_DEPTH),
            ));
        }
        Ok(())
    }

    /// `depth` counts the tree levels above this node; every operator folded
    /// into the left-deep chain adds one.
    fn parse_expr(&mut self, min_bp: u8, mut depth: usize) -> Result<Expr> {
        self.check_depth(depth)?;
        let mut lhs = self.parse_prefix(depth)?;

        loop {
            let token = self.peek();
            let Some((op, left_bp, right_bp)) = infix_binding_power(&token.kind) else {
                break;
            };
            if left_bp < min_bp {
                break;
            }
            depth += 1;
            self.check_depth(depth)?;
            self.advance();
            let rhs = self.parse_expr(right_bp, depth + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self, depth: usize) -> Result<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number(value) => Ok(Expr::Number(value)),
            TokenKind::Ident(name) => {
                if self.peek().kind == TokenKind::LParen {
                    return self.parse_call(&name, token.position, depth);
                }
                match name.as_str() {
                    "True" => Ok(Expr::Number(1.0)),
                    "False" => Ok(Expr::Number(0.0)),
                    _ => Ok(Expr::Variable(name)),
                }
            }
            TokenKind::LParen => {
                let inner = self.parse_expr(0, depth + 1)?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Minus | TokenKind::Plus | TokenKind::Tilde => {
                let op = match token.kind {
                    TokenKind::Minus => UnaryOp::Neg,
                    TokenKind::Plus => UnaryOp::Plus,
                    _ => UnaryOp::Not,
                };
                let operand = self.parse_expr(PREFIX_BP, depth + 1)?;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Eof => Err(self.error(token.position, "unexpected end of expression")),
            other => Err(self.error(token.position, format!("unexpected token {:?}", other))),
        }
    }

    fn parse_call(&mut self, name: &str, position: usize, depth: usize) -> Result<Expr> {
        let function = Function::from_name(name)
            .ok_or_else(|| self.error(position, format!("unknown function '{}'", name)))?;
        self.expect(TokenKind::LParen, "'('")?;

        let mut args = Vec::new();
        if self.peek().kind != TokenKind::RParen {
            loop {
                args.push(self.parse_expr(0, depth + 1)?);
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        if args.len() != function.arity() {
            return Err(self.error(
                position,
                format!(
                    "{}() takes {} argument(s), {} given",
                    name,
                    function.arity(),
                    args.len()
                ),
            ));
        }
        Ok(Expr::Call { function, args })
    }
}
