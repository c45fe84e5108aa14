use crate::core::tags::ARRAY_TAG;
use crate::domain::model::Value;
use crate::domain::ports::YamlObject;
use crate::math::Lambda;
use crate::properties::{ConstantProperty, FunctionProperty, TableProperty};
use crate::utils::error::Result;
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping as YamlMapping, Number, Value as YamlValue};

/// Writes documents back to YAML with the property tags.
///
/// Properties are written in base units; arrays inside a property are plain
/// sequences, anywhere else they carry `!array`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyDumper;

impl PropertyDumper {
    pub fn new() -> Self {
        Self
    }

    pub fn represent(&self, value: &Value) -> YamlValue {
        match value {
            Value::Null => YamlValue::Null,
            Value::Bool(b) => YamlValue::Bool(*b),
            Value::Int(i) => YamlValue::Number(Number::from(*i)),
            Value::Float(f) => YamlValue::Number(Number::from(*f)),
            Value::Str(s) => YamlValue::String(s.clone()),
            Value::Seq(items) => {
                YamlValue::Sequence(items.iter().map(|item| self.represent(item)).collect())
            }
            Value::Map(mapping) => {
                let mut out = YamlMapping::new();
                for (key, child) in mapping.iter() {
                    out.insert(YamlValue::String(key.to_string()), self.represent(child));
                }
                YamlValue::Mapping(out)
            }
            Value::Array(array) => tagged(ARRAY_TAG, self.represent(&array.to_value())),
            Value::Lambda(lambda) => tagged(Lambda::TAG, self.represent(&lambda.to_node())),
            Value::Constant(p) => tagged(ConstantProperty::TAG, self.represent(&p.to_node())),
            Value::Table(p) => tagged(TableProperty::TAG, self.represent(&p.to_node())),
            Value::Function(p) => tagged(FunctionProperty::TAG, self.represent(&p.to_node())),
            Value::Tagged { tag, value } => tagged(tag, self.represent(value)),
        }
    }

    pub fn dump(&self, value: &Value) -> Result<String> {
        Ok(serde_yaml::to_string(&self.represent(value))?)
    }

    /// Documents separated by `---`.
    pub fn dump_all(&self, values: &[Value]) -> Result<String> {
        let documents = values
            .iter()
            .map(|value| self.dump(value))
            .collect::<Result<Vec<_>>>()?;
        Ok(documents.join("---\n"))
    }
}

fn tagged(tag: &str, value: YamlValue) -> YamlValue {
    YamlValue::Tagged(Box::new(TaggedValue {
        tag: Tag::new(tag),
        value,
    }))
}
