use crate::domain::model::{Mapping, Value};
use crate::math::NdArray;
use crate::utils::error::{PropError, Result};

/// Named fields of a tagged mapping, consumed one by one by a constructor.
/// Fields left over at [`Fields::finish`] are reported as unexpected.
#[derive(Debug)]
pub struct Fields {
    tag: &'static str,
    entries: Mapping,
}

impl Fields {
    pub fn from_node(tag: &'static str, node: Value) -> Result<Self> {
        match node {
            Value::Map(entries) => Ok(Self { tag, entries }),
            Value::Null => Ok(Self {
                tag,
                entries: Mapping::new(),
            }),
            other => Err(PropError::invalid_field(
                tag,
                "<node>",
                format!("expected a mapping, found {}", other.type_name()),
            )),
        }
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Removes a field; an explicit null counts as absent.
    pub fn take(&mut self, field: &str) -> Option<Value> {
        match self.entries.remove(field) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    pub fn required(&mut self, field: &str) -> Result<Value> {
        self.take(field)
            .ok_or_else(|| PropError::missing_field(self.tag, field))
    }

    pub fn string(&mut self, field: &str) -> Result<String> {
        let value = self.required(field)?;
        scalar_string(self.tag, field, value)
    }

    pub fn optional_string(&mut self, field: &str) -> Result<Option<String>> {
        self.take(field)
            .map(|value| scalar_string(self.tag, field, value))
            .transpose()
    }

    pub fn strings(&mut self, field: &str) -> Result<Vec<String>> {
        let value = self.required(field)?;
        string_list(self.tag, field, value)
    }

    pub fn optional_strings(&mut self, field: &str) -> Result<Option<Vec<String>>> {
        self.take(field)
            .map(|value| string_list(self.tag, field, value))
            .transpose()
    }

    pub fn array(&mut self, field: &str) -> Result<NdArray> {
        let value = self.required(field)?;
        NdArray::from_value(&value)
            .map_err(|e| PropError::invalid_field(self.tag, field, e.to_string()))
    }

    /// A sequence whose items are arrays of independent shapes.
    pub fn arrays(&mut self, field: &str) -> Result<Vec<NdArray>> {
        match self.required(field)? {
            Value::Seq(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    NdArray::from_value(item).map_err(|e| {
                        PropError::invalid_field(self.tag, &format!("{}[{}]", field, i), e.to_string())
                    })
                })
                .collect(),
            other => Err(PropError::invalid_field(
                self.tag,
                field,
                format!("expected a sequence, found {}", other.type_name()),
            )),
        }
    }

    /// A flat sequence of numbers.
    pub fn numbers(&mut self, field: &str) -> Result<Vec<f64>> {
        let array = self.array(field)?;
        if array.ndim() != 1 {
            return Err(PropError::invalid_field(
                self.tag,
                field,
                format!("expected a flat sequence of numbers, found shape {:?}", array.shape()),
            ));
        }
        Ok(array.into_vec())
    }

    /// Optional mapping of names to numbers or arrays.
    pub fn aliases(&mut self, field: &str) -> Result<Vec<(String, NdArray)>> {
        match self.take(field) {
            None => Ok(Vec::new()),
            Some(Value::Map(mapping)) => mapping
                .into_iter()
                .map(|(name, value)| {
                    let array = NdArray::from_value(&value).map_err(|e| {
                        PropError::invalid_field(self.tag, &format!("{}.{}", field, name), e.to_string())
                    })?;
                    Ok((name, array))
                })
                .collect(),
            Some(other) => Err(PropError::invalid_field(
                self.tag,
                field,
                format!("expected a mapping, found {}", other.type_name()),
            )),
        }
    }

    pub fn finish(self) -> Result<()> {
        if let Some(field) = self.entries.keys().next() {
            return Err(PropError::invalid_field(self.tag, field, "unexpected field"));
        }
        Ok(())
    }
}

fn scalar_string(tag: &str, field: &str, value: Value) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(PropError::invalid_field(
            tag,
            field,
            format!("expected a string, found {}", other.type_name()),
        )),
    }
}

fn string_list(tag: &str, field: &str, value: Value) -> Result<Vec<String>> {
    match value {
        Value::Seq(items) => items
            .into_iter()
            .map(|item| scalar_string(tag, field, item))
            .collect(),
        other => Err(PropError::invalid_field(
            tag,
            field,
            format!("expected a sequence of strings, found {}", other.type_name()),
        )),
    }
}
