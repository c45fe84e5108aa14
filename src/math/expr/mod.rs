//! Element-wise array expressions in the numexpr dialect.
//!
//! Expressions are compiled once into an [`Expr`] tree and evaluated against a
//! scope of named arrays. Every operator broadcasts its operands; comparisons
//! and logical operators produce `1.0`/`0.0`.

mod lexer;
mod parser;

pub use parser::{BinaryOp, Expr, Function, UnaryOp};

use crate::math::array::NdArray;
use crate::utils::error::{PropError, Result};
use std::collections::{BTreeSet, HashMap};

/// Names that resolve without an alias. An alias with the same name wins.
pub const BUILTIN_CONSTANTS: [(&str, f64); 2] =
    [("pi", std::f64::consts::PI), ("e", std::f64::consts::E)];

pub fn builtin_constant(name: &str) -> Option<f64> {
    BUILTIN_CONSTANTS
        .iter()
        .find(|(constant, _)| *constant == name)
        .map(|(_, value)| *value)
}

#[derive(Debug, Clone)]
pub struct CompiledExpr {
    source: String,
    ast: Expr,
}

impl PartialEq for CompiledExpr {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl CompiledExpr {
    pub fn compile(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Err(PropError::ExpressionError {
                expr: source.to_string(),
                position: 0,
                message: "expression is empty".to_string(),
            });
        }
        let ast = parser::Parser::new(source)?.parse()?;
        Ok(Self {
            source: source.to_string(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Every variable name referenced, built-in constants included.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        collect_variables(&self.ast, &mut names);
        names
    }

    pub fn evaluate(&self, scope: &HashMap<String, NdArray>) -> Result<NdArray> {
        self.eval(&self.ast, scope)
    }

    fn eval(&self, expr: &Expr, scope: &HashMap<String, NdArray>) -> Result<NdArray> {
        match expr {
            Expr::Number(value) => Ok(NdArray::scalar(*value)),
            Expr::Variable(name) => scope
                .get(name)
                .cloned()
                .or_else(|| builtin_constant(name).map(NdArray::scalar))
                .ok_or_else(|| PropError::UndefinedVariableError {
                    name: name.clone(),
                    expr: self.source.clone(),
                }),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, scope)?;
                Ok(match op {
                    UnaryOp::Neg => value.map(|x| -x),
                    UnaryOp::Plus => value,
                    UnaryOp::Not => value.map(|x| truth(x == 0.0)),
                })
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs, scope)?;
                let rhs = self.eval(rhs, scope)?;
                lhs.zip_with(&rhs, binary_fn(*op))
            }
            Expr::Call { function, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.eval(arg, scope))
                    .collect::<Result<Vec<_>>>()?;
                apply(*function, &values)
            }
        }
    }
}

/// Compiles and evaluates `source` in one step.
pub fn evaluate(source: &str, scope: &HashMap<String, NdArray>) -> Result<NdArray> {
    CompiledExpr::compile(source)?.evaluate(scope)
}

fn truth(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn binary_fn(op: BinaryOp) -> fn(f64, f64) -> f64 {
    match op {
        BinaryOp::Add => |a, b| a + b,
        BinaryOp::Sub => |a, b| a - b,
        BinaryOp::Mul => |a, b| a * b,
        BinaryOp::Div => |a, b| a / b,
        // floored modulo: the result takes the sign of the divisor
        BinaryOp::Mod => |a, b| a - b * (a / b).floor(),
        BinaryOp::Pow => f64::powf,
        BinaryOp::Lt => |a, b| truth(a < b),
        BinaryOp::Le => |a, b| truth(a <= b),
        BinaryOp::Gt => |a, b| truth(a > b),
        BinaryOp::Ge => |a, b| truth(a >= b),
        BinaryOp::Eq => |a, b| truth(a == b),
        BinaryOp::Ne => |a, b| truth(a != b),
        BinaryOp::And => |a, b| truth(a != 0.0 && b != 0.0),
        BinaryOp::Or => |a, b| truth(a != 0.0 || b != 0.0),
    }
}

fn apply(function: Function, values: &[NdArray]) -> Result<NdArray> {
    let unary = |f: fn(f64) -> f64| Ok(values[0].map(f));
    match function {
        Function::Sin => unary(f64::sin),
        Function::Cos => unary(f64::cos),
        Function::Tan => unary(f64::tan),
        Function::Arcsin => unary(f64::asin),
        Function::Arccos => unary(f64::acos),
        Function::Arctan => unary(f64::atan),
        Function::Sinh => unary(f64::sinh),
        Function::Cosh => unary(f64::cosh),
        Function::Tanh => unary(f64::tanh),
        Function::Arcsinh => unary(f64::asinh),
        Function::Arccosh => unary(f64::acosh),
        Function::Arctanh => unary(f64::atanh),
        Function::Exp => unary(f64::exp),
        Function::Expm1 => unary(f64::exp_m1),
        Function::Log => unary(f64::ln),
        Function::Log10 => unary(f64::log10),
        Function::Log1p => unary(f64::ln_1p),
        Function::Sqrt => unary(f64::sqrt),
        Function::Abs => unary(f64::abs),
        Function::Floor => unary(f64::floor),
        Function::Ceil => unary(f64::ceil),
        Function::Arctan2 => values[0].zip_with(&values[1], f64::atan2),
        Function::Where => NdArray::select(&values[0], &values[1], &values[2]),
    }
}

fn collect_variables(expr: &Expr, names: &mut BTreeSet<String>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Variable(name) => {
            names.insert(name.clone());
        }
        Expr::Unary { operand, .. } => collect_variables(operand, names),
        Expr::Binary { lhs, rhs, .. } => {
            collect_variables(lhs, names);
            collect_variables(rhs, names);
        }
        Expr::Call { args, .. } => args.iter().for_each(|arg| collect_variables(arg, names)),
    }
}
