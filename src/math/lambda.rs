use crate::core::fields::Fields;
use crate::domain::model::{Mapping, Value};
use crate::domain::ports::{ConstructContext, YamlObject};
use crate::math::array::NdArray;
use crate::math::expr::{builtin_constant, CompiledExpr};
use crate::utils::error::{PropError, Result};
use std::collections::{HashMap, HashSet};

/// Expression with named positional parameters and bound aliases, the
/// `!lambda` tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    args: Vec<String>,
    expr: CompiledExpr,
    alias: Vec<(String, NdArray)>,
}

impl Lambda {
    pub fn new(args: Vec<String>, expr: &str, alias: Vec<(String, NdArray)>) -> Result<Self> {
        let expr = CompiledExpr::compile(expr)?;

        let mut seen = HashSet::new();
        for arg in &args {
            if !seen.insert(arg.as_str()) {
                return Err(PropError::argument(format!(
                    "duplicate lambda argument '{}'",
                    arg
                )));
            }
        }
        for (name, _) in &alias {
            if seen.contains(name.as_str()) {
                return Err(PropError::argument(format!(
                    "alias '{}' collides with a lambda argument",
                    name
                )));
            }
        }

        for name in expr.variables() {
            let bound = seen.contains(name.as_str())
                || alias.iter().any(|(alias_name, _)| *alias_name == name)
                || builtin_constant(&name).is_some();
            if !bound {
                return Err(PropError::UndefinedVariableError {
                    name,
                    expr: expr.source().to_string(),
                });
            }
        }

        Ok(Self { args, expr, alias })
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn source(&self) -> &str {
        self.expr.source()
    }

    pub fn alias(&self) -> &[(String, NdArray)] {
        &self.alias
    }

    pub fn call(&self, inputs: &[NdArray]) -> Result<NdArray> {
        if inputs.len() != self.args.len() {
            return Err(PropError::argument(format!(
                "lambda '{}' takes {} argument(s), {} given",
                self.source(),
                self.args.len(),
                inputs.len()
            )));
        }

        let mut scope: HashMap<String, NdArray> = self.alias.iter().cloned().collect();
        for (name, value) in self.args.iter().zip(inputs) {
            scope.insert(name.clone(), value.clone());
        }
        self.expr.evaluate(&scope)
    }
}

impl YamlObject for Lambda {
    const TAG: &'static str = "!lambda";

    fn from_node(_ctx: &ConstructContext, node: Value) -> Result<Self> {
        let mut fields = Fields::from_node(Self::TAG, node)?;
        let args = fields.optional_strings("args")?.unwrap_or_default();
        let expr = fields.string("expr")?;
        let alias = fields.aliases("alias")?;
        fields.finish()?;
        Lambda::new(args, &expr, alias)
    }

    fn to_node(&self) -> Value {
        let mut mapping = Mapping::new();
        mapping.insert(
            "args",
            Value::Seq(self.args.iter().cloned().map(Value::Str).collect()),
        );
        mapping.insert("expr", Value::Str(self.source().to_string()));
        mapping.insert(
            "alias",
            Value::Map(
                self.alias
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_value()))
                    .collect(),
            ),
        );
        Value::Map(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alias(entries: &[(&str, f64)]) -> Vec<(String, NdArray)> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), NdArray::scalar(*value)))
            .collect()
    }

    #[test]
    fn test_call_binds_arguments_and_aliases() {
        let lambda = Lambda::new(
            vec!["T".to_string()],
            "a + b * T",
            alias(&[("a", 1.0), ("b", 2.0)]),
        )
        .unwrap();
        let out = lambda
            .call(&[NdArray::from_vec(vec![0.0, 1.0, 2.0])])
            .unwrap();
        assert_eq!(out.as_slice(), &[1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_arity_mismatch() {
        let lambda = Lambda::new(vec!["x".to_string()], "x", Vec::new()).unwrap();
        assert!(matches!(
            lambda.call(&[]),
            Err(PropError::ArgumentError { .. })
        ));
    }

    #[test]
    fn test_unbound_variable_fails_at_construction() {
        let result = Lambda::new(vec!["x".to_string()], "x * y", Vec::new());
        assert!(matches!(
            result,
            Err(PropError::UndefinedVariableError { .. })
        ));
    }

    #[test]
    fn test_alias_cannot_shadow_argument() {
        let result = Lambda::new(vec!["x".to_string()], "x", alias(&[("x", 1.0)]));
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_argument() {
        let result = Lambda::new(vec!["x".to_string(), "x".to_string()], "x", Vec::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_to_node_keeps_source() {
        let lambda = Lambda::new(vec!["x".to_string()], "2 * x", alias(&[])).unwrap();
        let node = lambda.to_node();
        let mapping = node.as_map().unwrap();
        assert_eq!(mapping.get("expr").and_then(Value::as_str), Some("2 * x"));
    }
}
