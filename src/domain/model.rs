use crate::domain::ports::Property;
use crate::math::{Lambda, NdArray};
use crate::properties::{ConstantProperty, FunctionProperty, TableProperty};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;

/// A loaded YAML document. Plain YAML nodes map onto the first seven
/// variants; tagged nodes become the object their constructor built.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    Map(Mapping),
    Array(NdArray),
    Lambda(Lambda),
    Constant(ConstantProperty),
    Table(TableProperty),
    Function(FunctionProperty),
    /// Tag without a registered constructor, kept as-is.
    Tagged { tag: String, value: Box<Value> },
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "mapping",
            Value::Array(_) => "array",
            Value::Lambda(_) => "lambda",
            Value::Constant(_) => "constant property",
            Value::Table(_) => "table property",
            Value::Function(_) => "function property",
            Value::Tagged { .. } => "tagged node",
        }
    }

    /// Numeric view: numbers, booleans, numeric strings and single-element
    /// arrays.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Str(s) => s.trim().parse().ok(),
            Value::Array(array) => array.as_scalar(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(mapping) => Some(mapping),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_lambda(&self) -> Option<&Lambda> {
        match self {
            Value::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&dyn Property> {
        match self {
            Value::Constant(p) => Some(p as &dyn Property),
            Value::Table(p) => Some(p as &dyn Property),
            Value::Function(p) => Some(p as &dyn Property),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Every property in the document with its path (`a.b[2]`).
    pub fn properties(&self) -> Vec<(String, &dyn Property)> {
        let mut found = Vec::new();
        collect_properties(self, String::new(), &mut found);
        found
    }

    /// Finds a property by path, mapping key or property name, ignoring case.
    pub fn find_property(&self, name: &str) -> Option<&dyn Property> {
        self.properties()
            .into_iter()
            .find(|(path, property)| {
                let key = path.rsplit('.').next().unwrap_or(path.as_str());
                path.eq_ignore_ascii_case(name)
                    || key.eq_ignore_ascii_case(name)
                    || property.name().eq_ignore_ascii_case(name)
            })
            .map(|(_, property)| property)
    }
}

impl From<NdArray> for Value {
    fn from(array: NdArray) -> Self {
        Value::Array(array)
    }
}

impl From<Lambda> for Value {
    fn from(lambda: Lambda) -> Self {
        Value::Lambda(lambda)
    }
}

impl From<ConstantProperty> for Value {
    fn from(property: ConstantProperty) -> Self {
        Value::Constant(property)
    }
}

impl From<TableProperty> for Value {
    fn from(property: TableProperty) -> Self {
        Value::Table(property)
    }
}

impl From<FunctionProperty> for Value {
    fn from(property: FunctionProperty) -> Self {
        Value::Function(property)
    }
}

fn collect_properties<'a>(
    value: &'a Value,
    path: String,
    found: &mut Vec<(String, &'a dyn Property)>,
) {
    if let Some(property) = value.as_property() {
        found.push((path, property));
        return;
    }
    match value {
        Value::Map(mapping) => {
            for (key, child) in mapping.iter() {
                let child_path = if path.is_empty() {
                    key.to_string()
                } else {
                    format!("{}.{}", path, key)
                };
                collect_properties(child, child_path, found);
            }
        }
        Value::Seq(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_properties(child, format!("{}[{}]", path, i), found);
            }
        }
        Value::Tagged { value, .. } => collect_properties(value, path, found),
        _ => {}
    }
}

/// Insertion-ordered mapping with string keys.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Property values along one argument, in display units.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub property: String,
    pub argument: String,
    pub x_unit: String,
    pub y_unit: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Sample {
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([
            format!("{} [{}]", self.argument, self.x_unit),
            format!("{} [{}]", self.property, self.y_unit),
        ])?;
        for (x, y) in self.x.iter().zip(&self.y) {
            wtr.serialize((x, y))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_insert_replaces_in_place() {
        let mut mapping = Mapping::new();
        mapping.insert("a", Value::Int(1));
        mapping.insert("b", Value::Int(2));
        let previous = mapping.insert("a", Value::Int(3));
        assert!(matches!(previous, Some(Value::Int(1))));
        assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(matches!(mapping.get("a"), Some(Value::Int(3))));
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Str(" 1.5e3 ".to_string()).as_f64(), Some(1500.0));
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn test_sample_csv() {
        let sample = Sample {
            property: "Density".to_string(),
            argument: "Temperature".to_string(),
            x_unit: "K".to_string(),
            y_unit: "kg/m^3".to_string(),
            x: vec![300.0, 400.0],
            y: vec![7990.0, 7950.5],
        };
        let mut out = Vec::new();
        sample.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Temperature [K],Density [kg/m^3]\n300.0,7990.0\n400.0,7950.5\n"
        );
    }
}
