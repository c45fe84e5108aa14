use crate::core::fields::Fields;
use crate::domain::model::Value;
use crate::domain::ports::{ConstructContext, YamlObject};
use crate::math::{expr, Lambda, NdArray};
use crate::properties::{ConstantProperty, FunctionProperty, TableProperty};
use crate::utils::error::{PropError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a value from a tagged node whose children are already constructed.
pub type Constructor = Arc<dyn Fn(&ConstructContext, Value) -> Result<Value> + Send + Sync>;

pub const ARRAY_TAG: &str = "!array";
pub const NUMEXPR_TAG: &str = "!numexpr";

/// The six built-in tags.
pub fn builtin_constructors() -> Vec<(&'static str, Constructor)> {
    vec![
        (ARRAY_TAG, Arc::new(array_constructor) as Constructor),
        (NUMEXPR_TAG, Arc::new(numexpr_constructor) as Constructor),
        (Lambda::TAG, Arc::new(object_constructor::<Lambda>) as Constructor),
        (
            ConstantProperty::TAG,
            Arc::new(object_constructor::<ConstantProperty>) as Constructor,
        ),
        (
            TableProperty::TAG,
            Arc::new(object_constructor::<TableProperty>) as Constructor,
        ),
        (
            FunctionProperty::TAG,
            Arc::new(object_constructor::<FunctionProperty>) as Constructor,
        ),
    ]
}

/// `!array [[1, 2], [3, 4]]`; a bare number gives a 0-d array.
pub fn array_constructor(_ctx: &ConstructContext, node: Value) -> Result<Value> {
    match node {
        Value::Seq(_) | Value::Int(_) | Value::Float(_) => {
            Ok(Value::Array(NdArray::from_value(&node)?))
        }
        other => Err(PropError::invalid_field(
            ARRAY_TAG,
            "<node>",
            format!("expected a sequence or a number, found {}", other.type_name()),
        )),
    }
}

/// `!numexpr "2 * pi"` or `!numexpr {expr: "a * b", alias: {a: 1, b: 2}}`,
/// evaluated once at load time.
pub fn numexpr_constructor(_ctx: &ConstructContext, node: Value) -> Result<Value> {
    let (source, alias) = match node {
        Value::Str(source) => (source, Vec::new()),
        node => {
            let mut fields = Fields::from_node(NUMEXPR_TAG, node)?;
            let source = fields.string("expr")?;
            let alias = fields.aliases("alias")?;
            fields.finish()?;
            (source, alias)
        }
    };
    let scope: HashMap<String, NdArray> = alias.into_iter().collect();
    Ok(Value::Array(expr::evaluate(&source, &scope)?))
}

pub fn object_constructor<T>(ctx: &ConstructContext, node: Value) -> Result<Value>
where
    T: YamlObject + Into<Value>,
{
    T::from_node(ctx, node).map(Into::into)
}
