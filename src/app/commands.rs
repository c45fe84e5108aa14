use crate::config::ToolConfig;
use crate::core::{PropertyDumper, PropertyLoader};
use crate::domain::model::{Sample, Value};
use crate::domain::ports::Property;
use crate::math::NdArray;
use crate::properties::PropertyArgs;
use crate::utils::error::{PropError, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Loader and settings shared by the commands of one run.
#[derive(Debug, Clone)]
pub struct App {
    config: ToolConfig,
    loader: PropertyLoader,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertySummary {
    pub document: usize,
    pub path: String,
    pub tag: String,
    pub name: String,
    pub arguments: Vec<String>,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub property: String,
    pub unit: String,
    pub value: NdArray,
}

#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub value: f64,
    pub unit: String,
}

impl App {
    pub fn new(config: ToolConfig) -> Result<Self> {
        let registry = Arc::new(config.build_registry()?);
        let loader = PropertyLoader::with_registry(registry).with_options(config.loader_options()?);
        Ok(Self { config, loader })
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn loader(&self) -> &PropertyLoader {
        &self.loader
    }

    /// Every property of every document in `file`.
    pub fn check(&self, file: &Path) -> Result<Vec<PropertySummary>> {
        let documents = self.loader.load_all_file(file)?;
        let mut summaries = Vec::new();
        for (document, value) in documents.iter().enumerate() {
            for (path, property) in value.properties() {
                summaries.push(PropertySummary {
                    document,
                    path,
                    tag: property.tag().to_string(),
                    name: property.name().to_string(),
                    arguments: property.arguments().to_vec(),
                    unit: property.output_unit().to_string(),
                });
            }
        }
        tracing::info!(
            "✅ {} document(s), {} propert(ies)",
            documents.len(),
            summaries.len()
        );
        Ok(summaries)
    }

    pub fn dump(&self, file: &Path) -> Result<String> {
        let documents = self.loader.load_all_file(file)?;
        PropertyDumper::new().dump_all(&documents)
    }

    pub fn eval(
        &self,
        file: &Path,
        property: &str,
        positional: &[f64],
        keyword: &[(String, Vec<f64>)],
        unit: Option<&str>,
    ) -> Result<Evaluation> {
        let documents = self.loader.load_all_file(file)?;
        let found = find_property(&documents, property)?;

        let mut args = PropertyArgs::new();
        for &value in positional {
            args = args.arg(value);
        }
        for (name, values) in keyword {
            args = args.kwarg(name.clone(), vector_or_scalar(values));
        }

        let value = found.evaluate(&args)?;
        let base_unit = found.output_unit();
        let (value, unit) = match unit {
            Some(unit) => (self.loader.registry().to(&value, base_unit, unit)?, unit.to_string()),
            None => (value, base_unit.to_string()),
        };
        Ok(Evaluation {
            property: found.name().to_string(),
            unit,
            value,
        })
    }

    /// `points` falls back to the configured sample size; an empty `units`
    /// means preferred display units.
    pub fn sample(
        &self,
        file: &Path,
        property: &str,
        argument: &str,
        points: Option<usize>,
        units: &[String],
    ) -> Result<Sample> {
        let documents = self.loader.load_all_file(file)?;
        let found = find_property(&documents, property)?;
        let points = points.unwrap_or_else(|| self.config.sample_points());
        let units = if units.is_empty() { None } else { Some(units) };
        let sample = found.sample(argument, units, points)?;
        tracing::info!(
            "📈 Sampled '{}' along '{}' at {} point(s)",
            sample.property,
            sample.argument,
            sample.x.len()
        );
        Ok(sample)
    }

    pub fn convert(&self, value: f64, from: &str, to: &str) -> Result<Conversion> {
        Ok(Conversion {
            value: self.loader.registry().to_scalar(value, from, to)?,
            unit: to.to_string(),
        })
    }
}

fn find_property<'a>(documents: &'a [Value], name: &str) -> Result<&'a dyn Property> {
    documents
        .iter()
        .find_map(|document| document.find_property(name))
        .ok_or_else(|| PropError::argument(format!("no property named '{}'", name)))
}

fn vector_or_scalar(values: &[f64]) -> NdArray {
    match values {
        [value] => NdArray::scalar(*value),
        _ => NdArray::from_vec(values.to_vec()),
    }
}
