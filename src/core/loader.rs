use crate::core::tags::{builtin_constructors, Constructor};
use crate::domain::model::{Mapping, Value};
use crate::domain::ports::ConstructContext;
use crate::units::UnitRegistry;
use crate::utils::env::substitute_env_vars;
use crate::utils::error::{PropError, Result};
use serde::Deserialize;
use serde_yaml::Value as YamlValue;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// What to do with a tag that has no constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTagPolicy {
    #[default]
    Error,
    /// Keep the node as [`Value::Tagged`].
    Keep,
}

impl FromStr for UnknownTagPolicy {
    type Err = PropError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(UnknownTagPolicy::Error),
            "keep" => Ok(UnknownTagPolicy::Keep),
            other => Err(PropError::InvalidConfigValueError {
                field: "loader.unknown_tags".to_string(),
                value: other.to_string(),
                reason: "expected 'error' or 'keep'".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Replace `${VAR}` with environment variables before parsing.
    pub substitute_env: bool,
    pub unknown_tags: UnknownTagPolicy,
}

/// YAML loader with the property tags registered.
///
/// Children are constructed before their parent, so a `!function` sees its
/// `!lambda` expression as a [`Value::Lambda`].
#[derive(Clone)]
pub struct PropertyLoader {
    ctx: ConstructContext,
    options: LoaderOptions,
    constructors: HashMap<String, Constructor>,
}

impl fmt::Debug for PropertyLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyLoader")
            .field("options", &self.options)
            .field("tags", &self.tags())
            .finish()
    }
}

impl Default for PropertyLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyLoader {
    pub fn new() -> Self {
        Self::with_registry(Arc::new(UnitRegistry::new()))
    }

    pub fn with_registry(units: Arc<UnitRegistry>) -> Self {
        let constructors = builtin_constructors()
            .into_iter()
            .map(|(tag, constructor)| (tag.to_string(), constructor))
            .collect();
        Self {
            ctx: ConstructContext { units },
            options: LoaderOptions::default(),
            constructors,
        }
    }

    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.ctx.units
    }

    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Registers or replaces the constructor for `tag` (leading `!` optional).
    pub fn add_constructor<F>(&mut self, tag: &str, constructor: F)
    where
        F: Fn(&ConstructContext, Value) -> Result<Value> + Send + Sync + 'static,
    {
        let tag = normalize_tag(tag);
        tracing::debug!("Registering constructor for {}", tag);
        self.constructors.insert(tag, Arc::new(constructor));
    }

    /// Loads a single document; an empty stream loads as null.
    pub fn load(&self, text: &str) -> Result<Value> {
        let mut documents = self.load_all(text)?;
        match documents.len() {
            0 => Ok(Value::Null),
            1 => Ok(documents.remove(0)),
            n => Err(PropError::ConfigError {
                message: format!(
                    "expected a single YAML document, found {}; load them with load_all",
                    n
                ),
            }),
        }
    }

    pub fn load_all(&self, text: &str) -> Result<Vec<Value>> {
        let text = if self.options.substitute_env {
            substitute_env_vars(text)?
        } else {
            text.to_string()
        };

        let mut documents = Vec::new();
        for document in serde_yaml::Deserializer::from_str(&text) {
            let mut node = YamlValue::deserialize(document)?;
            // `<<: *anchor` merge keys, as a safe loader resolves them
            node.apply_merge()?;
            documents.push(self.construct(node)?);
        }
        tracing::debug!("Loaded {} document(s)", documents.len());
        Ok(documents)
    }

    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<Value> {
        let path = path.as_ref();
        tracing::info!("📂 Loading {}", path.display());
        let text = std::fs::read_to_string(path)?;
        self.load(&text)
    }

    pub fn load_all_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Value>> {
        let path = path.as_ref();
        tracing::info!("📂 Loading {}", path.display());
        let text = std::fs::read_to_string(path)?;
        self.load_all(&text)
    }

    /// Converts a parsed node, running tag constructors bottom-up.
    pub fn construct(&self, node: YamlValue) -> Result<Value> {
        match node {
            YamlValue::Null => Ok(Value::Null),
            YamlValue::Bool(b) => Ok(Value::Bool(b)),
            YamlValue::Number(n) => Ok(match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            YamlValue::String(s) => Ok(Value::Str(s)),
            YamlValue::Sequence(items) => items
                .into_iter()
                .map(|item| self.construct(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Seq),
            YamlValue::Mapping(entries) => {
                let mut mapping = Mapping::new();
                for (key, value) in entries {
                    mapping.insert(mapping_key(key)?, self.construct(value)?);
                }
                Ok(Value::Map(mapping))
            }
            YamlValue::Tagged(tagged) => {
                let tagged = *tagged;
                let tag = normalize_tag(&tagged.tag.to_string());
                let value = self.construct(tagged.value)?;
                match self.constructors.get(&tag) {
                    Some(constructor) => {
                        tracing::debug!("Constructing {}", tag);
                        constructor(&self.ctx, value)
                    }
                    None => match self.options.unknown_tags {
                        UnknownTagPolicy::Error => Err(PropError::UnknownTagError { tag }),
                        UnknownTagPolicy::Keep => {
                            tracing::warn!("No constructor for {}, keeping the node as-is", tag);
                            Ok(Value::Tagged {
                                tag,
                                value: Box::new(value),
                            })
                        }
                    },
                }
            }
        }
    }
}

fn normalize_tag(tag: &str) -> String {
    if tag.starts_with('!') {
        tag.to_string()
    } else {
        format!("!{}", tag)
    }
}

fn mapping_key(key: YamlValue) -> Result<String> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        _ => Err(PropError::ConfigError {
            message: "mapping keys must be scalars".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertyArgs;

    #[test]
    fn test_plain_yaml_keeps_order() {
        let loader = PropertyLoader::new();
        let value = loader.load("b: 1\na: [1.5, two]\nc: null\n").unwrap();
        let mapping = value.as_map().unwrap();
        assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert!(matches!(mapping.get("b"), Some(Value::Int(1))));
        assert!(matches!(mapping.get("c"), Some(Value::Null)));
    }

    #[test]
    fn test_unknown_tag_policies() {
        let loader = PropertyLoader::new();
        assert!(matches!(
            loader.load("x: !mystery 1"),
            Err(PropError::UnknownTagError { tag }) if tag == "!mystery"
        ));

        let keeping = PropertyLoader::new().with_options(LoaderOptions {
            unknown_tags: UnknownTagPolicy::Keep,
            ..LoaderOptions::default()
        });
        let value = keeping.load("x: !mystery 1").unwrap();
        assert!(matches!(
            value.get("x"),
            Some(Value::Tagged { tag, .. }) if tag == "!mystery"
        ));
    }

    #[test]
    fn test_user_constructor() {
        let mut loader = PropertyLoader::new();
        loader.add_constructor("double", |_ctx, node| {
            let x = node.as_f64().unwrap_or(0.0);
            Ok(Value::Float(2.0 * x))
        });
        let value = loader.load("x: !double 21").unwrap();
        assert!(matches!(value.get("x"), Some(Value::Float(f)) if *f == 42.0));
    }

    #[test]
    fn test_nested_tags_construct_children_first() {
        let loader = PropertyLoader::new();
        let value = loader
            .load("x: !numexpr {expr: 'a + 1', alias: {a: !array [1, 2]}}")
            .unwrap();
        assert_eq!(value.get("x").unwrap().as_array().unwrap().as_slice(), &[2.0, 3.0]);
    }

    #[test]
    fn test_load_rejects_multiple_documents() {
        let loader = PropertyLoader::new();
        assert!(loader.load("a: 1\n---\nb: 2\n").is_err());
        assert_eq!(loader.load_all("a: 1\n---\nb: 2\n").unwrap().len(), 2);
    }

    #[test]
    fn test_merge_keys_share_fields() {
        let loader = PropertyLoader::new();
        let value = loader
            .load(
                r#"
base: &density {name: Density, unit: kg/m^3, symbol: rho}
steel: !constant {<<: *density, value: 7990}
aluminium: !constant
  <<: *density
  name: Aluminium density
  value: 2.7
  unit: g/cm^3
"#,
            )
            .unwrap();

        let steel = value.get("steel").and_then(Value::as_property).unwrap();
        assert_eq!(steel.name(), "Density");
        assert_eq!(steel.evaluate(&PropertyArgs::new()).unwrap().as_scalar(), Some(7990.0));

        // explicit keys win over merged ones
        let aluminium = value.get("aluminium").and_then(Value::as_property).unwrap();
        assert_eq!(aluminium.name(), "Aluminium density");
        let density = aluminium.evaluate(&PropertyArgs::new()).unwrap();
        assert!((density.as_scalar().unwrap() - 2700.0).abs() < 1e-9);
    }

    #[test]
    fn test_merge_of_a_scalar_is_an_error() {
        let loader = PropertyLoader::new();
        assert!(matches!(
            loader.load("a: {<<: 1, b: 2}"),
            Err(PropError::YamlError(_))
        ));
    }

    #[test]
    fn test_unknown_tag_policy_parsing() {
        assert_eq!("KEEP".parse::<UnknownTagPolicy>().unwrap(), UnknownTagPolicy::Keep);
        assert!("ignore".parse::<UnknownTagPolicy>().is_err());
    }
}
