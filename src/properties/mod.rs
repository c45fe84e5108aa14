//! Physical properties: `!constant`, `!table` and `!function`.

pub mod constant;
pub mod function;
pub mod table;

pub use constant::ConstantProperty;
pub use function::FunctionProperty;
pub use table::TableProperty;

use crate::domain::model::Sample;
use crate::domain::ports::Property;
use crate::math::array::{broadcast_shapes, NdArray};
use crate::units::UnitRegistry;
use crate::utils::error::{PropError, Result};

/// Evaluation arguments: positional values fill property arguments in order,
/// keywords match argument names ignoring case.
#[derive(Debug, Clone, Default)]
pub struct PropertyArgs {
    positional: Vec<NdArray>,
    keyword: Vec<(String, NdArray)>,
}

impl PropertyArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<NdArray>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<NdArray>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }

    pub fn positional(&self) -> &[NdArray] {
        &self.positional
    }

    pub fn keyword(&self) -> &[(String, NdArray)] {
        &self.keyword
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// One value per argument, defaults filling the gaps, all broadcast to a
    /// common shape.
    pub fn resolve(&self, arguments: &[String], defaults: &[f64]) -> Result<Vec<NdArray>> {
        if self.positional.len() > arguments.len() {
            return Err(PropError::argument(format!(
                "takes {} argument(s), {} positional given",
                arguments.len(),
                self.positional.len()
            )));
        }

        for (i, (name, _)) in self.keyword.iter().enumerate() {
            if !arguments.iter().any(|a| a.eq_ignore_ascii_case(name)) {
                return Err(PropError::argument(format!(
                    "unknown argument '{}', expected one of: {}",
                    name,
                    arguments.join(", ")
                )));
            }
            if self.keyword[..i]
                .iter()
                .any(|(other, _)| other.eq_ignore_ascii_case(name))
            {
                return Err(PropError::argument(format!(
                    "'{}' given more than once",
                    name
                )));
            }
        }

        let mut columns = Vec::with_capacity(arguments.len());
        for (i, argument) in arguments.iter().enumerate() {
            let keyword = self
                .keyword
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(argument))
                .map(|(_, value)| value);
            let value = match (self.positional.get(i), keyword) {
                (Some(_), Some(_)) => {
                    return Err(PropError::argument(format!(
                        "'{}' values in args and kwargs",
                        argument
                    )))
                }
                (Some(value), None) | (None, Some(value)) => value.clone(),
                (None, None) => {
                    let default = defaults.get(i).copied().ok_or_else(|| {
                        PropError::argument(format!("no value or default for '{}'", argument))
                    })?;
                    NdArray::scalar(default)
                }
            };
            columns.push(value);
        }

        let mut shape = Vec::new();
        for column in &columns {
            shape = broadcast_shapes(&shape, column.shape())?;
        }
        columns.iter().map(|c| c.broadcast_to(&shape)).collect()
    }
}

pub(crate) fn argument_index(property: &dyn Property, argument: &str) -> Result<usize> {
    property
        .arguments()
        .iter()
        .position(|a| a.eq_ignore_ascii_case(argument))
        .ok_or_else(|| {
            PropError::argument(format!(
                "'{}' has no argument '{}' (arguments: {})",
                property.name(),
                argument,
                property.arguments().join(", ")
            ))
        })
}

/// Evaluates `property` at `xq` (base units) along argument `index` and
/// converts both axes to display units.
pub(crate) fn sample_along(
    property: &dyn Property,
    registry: &UnitRegistry,
    index: usize,
    xq: NdArray,
    units: Option<&[String]>,
) -> Result<Sample> {
    let argument = property.arguments()[index].clone();
    let args = PropertyArgs::new().kwarg(argument.clone(), xq.clone());
    let y = property.evaluate(&args)?;

    let x_base = &property.units()[index];
    let y_base = property.output_unit();
    let (x, x_unit, y, y_unit) = match units {
        None => {
            let (x, x_unit) = registry.display(&xq, x_base)?;
            let (y, y_unit) = registry.display(&y, y_base)?;
            (x, x_unit, y, y_unit)
        }
        Some(units) => {
            if units.len() != property.units().len() {
                return Err(PropError::argument(format!(
                    "expected {} display units (arguments then output), found {}",
                    property.units().len(),
                    units.len()
                )));
            }
            let x_unit = units[index].clone();
            let y_unit = units[units.len() - 1].clone();
            (
                registry.to(&xq, x_base, &x_unit)?,
                x_unit,
                registry.to(&y, y_base, &y_unit)?,
                y_unit,
            )
        }
    };

    Ok(Sample {
        property: property.name().to_string(),
        argument,
        x_unit,
        y_unit,
        x: x.into_vec(),
        y: y.into_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults_fill_missing_arguments() {
        let args = PropertyArgs::new().kwarg("PRESSURE", vec![1.0, 2.0]);
        let columns = args
            .resolve(&names(&["temperature", "pressure"]), &[300.0, 1e5])
            .unwrap();
        assert_eq!(columns[0].as_slice(), &[300.0, 300.0]);
        assert_eq!(columns[1].as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn test_positional_and_keyword_conflict() {
        let args = PropertyArgs::new().arg(1.0).kwarg("temperature", 2.0);
        let err = args.resolve(&names(&["temperature"]), &[300.0]).unwrap_err();
        assert!(err.to_string().contains("values in args and kwargs"));
    }

    #[test]
    fn test_unknown_keyword_and_surplus_positional() {
        assert!(PropertyArgs::new()
            .kwarg("strain", 1.0)
            .resolve(&names(&["temperature"]), &[300.0])
            .is_err());
        assert!(PropertyArgs::new()
            .arg(1.0)
            .arg(2.0)
            .resolve(&names(&["temperature"]), &[300.0])
            .is_err());
    }

    #[test]
    fn test_incompatible_argument_shapes() {
        let args = PropertyArgs::new()
            .arg(vec![1.0, 2.0])
            .arg(vec![1.0, 2.0, 3.0]);
        assert!(args.resolve(&names(&["a", "b"]), &[0.0, 0.0]).is_err());
    }
}
