use crate::core::fields::Fields;
use crate::domain::model::{Mapping, Sample, Value};
use crate::domain::ports::{ConstructContext, Property, YamlObject};
use crate::math::array::broadcast_shapes;
use crate::math::{Lambda, NdArray};
use crate::properties::{argument_index, sample_along, PropertyArgs};
use crate::units::UnitRegistry;
use crate::utils::error::{PropError, Result};
use crate::utils::validation::validate_length;
use std::sync::Arc;

/// Property computed by an expression of its arguments.
///
/// The expression works in the units the property was declared with;
/// evaluation takes and returns base units. Bounds are inclusive and
/// checked in base units.
#[derive(Debug, Clone)]
pub struct FunctionProperty {
    name: String,
    arguments: Vec<String>,
    symbols: Vec<String>,
    declared_units: Vec<String>,
    declared_defaults: Vec<f64>,
    declared_bounds: Vec<(f64, f64)>,
    units: Vec<String>,
    defaults: Vec<f64>,
    bounds: Vec<(f64, f64)>,
    expression: Lambda,
    registry: Arc<UnitRegistry>,
}

impl FunctionProperty {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<UnitRegistry>,
        name: String,
        arguments: Vec<String>,
        units: Vec<String>,
        symbols: Vec<String>,
        defaults: Vec<f64>,
        bounds: Vec<(f64, f64)>,
        expression: Lambda,
    ) -> Result<Self> {
        let tag = Self::TAG;
        let n = arguments.len();
        validate_length(tag, "units", units.len(), n + 1)?;
        validate_length(tag, "symbols", symbols.len(), n + 1)?;
        validate_length(tag, "defaults", defaults.len(), n)?;
        validate_length(tag, "bounds", bounds.len(), n)?;
        if expression.arity() != n {
            return Err(PropError::invalid_field(
                tag,
                "expression",
                format!(
                    "takes {} argument(s) but the property has {}",
                    expression.arity(),
                    n
                ),
            ));
        }

        let base_units = units
            .iter()
            .map(|unit| Ok(registry.dimension(unit)?.base_unit()))
            .collect::<Result<Vec<String>>>()?;

        let mut base_defaults = Vec::with_capacity(n);
        let mut base_bounds = Vec::with_capacity(n);
        for i in 0..n {
            base_defaults.push(registry.to_scalar(defaults[i], &units[i], &base_units[i])?);
            let (lo, hi) = bounds[i];
            let lo = registry.to_scalar(lo, &units[i], &base_units[i])?;
            let hi = registry.to_scalar(hi, &units[i], &base_units[i])?;
            if lo > hi {
                return Err(PropError::invalid_field(
                    tag,
                    "bounds",
                    format!("lower bound of '{}' exceeds its upper bound", arguments[i]),
                ));
            }
            base_bounds.push((lo, hi));
        }

        tracing::debug!(
            "Function property '{}' over ({}) = {}",
            name,
            arguments.join(", "),
            expression.source()
        );

        Ok(Self {
            name,
            arguments,
            symbols,
            declared_units: units,
            declared_defaults: defaults,
            declared_bounds: bounds,
            units: base_units,
            defaults: base_defaults,
            bounds: base_bounds,
            expression,
            registry,
        })
    }

    /// Bounds in base units.
    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    pub fn expression(&self) -> &Lambda {
        &self.expression
    }

    pub fn declared_units(&self) -> &[String] {
        &self.declared_units
    }
}

impl Property for FunctionProperty {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn arguments(&self) -> &[String] {
        &self.arguments
    }

    fn units(&self) -> &[String] {
        &self.units
    }

    fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn defaults(&self) -> &[f64] {
        &self.defaults
    }

    fn evaluate(&self, args: &PropertyArgs) -> Result<NdArray> {
        let columns = args.resolve(&self.arguments, &self.defaults)?;

        let mut inputs = Vec::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let (min, max) = self.bounds[i];
            if let Some(value) = column.iter().find(|&x| x < min || x > max) {
                return Err(PropError::OutOfBoundsError {
                    argument: self.arguments[i].clone(),
                    value,
                    min,
                    max,
                });
            }
            inputs.push(self.registry.to(column, &self.units[i], &self.declared_units[i])?);
        }

        let mut result = self.expression.call(&inputs)?;
        if let Some(first) = columns.first() {
            let shape = broadcast_shapes(result.shape(), first.shape())?;
            result = result.broadcast_to(&shape)?;
        }

        let n = self.arguments.len();
        self.registry
            .to(&result, &self.declared_units[n], &self.units[n])
    }

    /// Samples `points` evenly spaced values between the bounds of `argument`.
    fn sample(&self, argument: &str, units: Option<&[String]>, points: usize) -> Result<Sample> {
        let index = argument_index(self, argument)?;
        if points < 2 {
            return Err(PropError::argument(format!(
                "sampling needs at least 2 points, {} requested",
                points
            )));
        }
        let (min, max) = self.bounds[index];
        let xq = NdArray::linspace(min, max, points);
        sample_along(self, &self.registry, index, xq, units)
    }
}

impl YamlObject for FunctionProperty {
    const TAG: &'static str = "!function";

    fn from_node(ctx: &ConstructContext, node: Value) -> Result<Self> {
        let mut fields = Fields::from_node(Self::TAG, node)?;
        let name = fields.string("name")?;
        let arguments = fields.strings("arguments")?;
        let units = fields.strings("units")?;
        let symbols = fields.strings("symbols")?;
        let defaults = fields.numbers("defaults")?;
        let bounds = bound_pairs(fields.array("bounds")?, arguments.len())?;
        let expression = match fields.required("expression")? {
            Value::Lambda(lambda) => lambda,
            Value::Str(source) => Lambda::new(arguments.clone(), &source, Vec::new())?,
            other => {
                return Err(PropError::invalid_field(
                    Self::TAG,
                    "expression",
                    format!("expected !lambda or a string, found {}", other.type_name()),
                ))
            }
        };
        fields.finish()?;
        FunctionProperty::new(
            ctx.units.clone(),
            name,
            arguments,
            units,
            symbols,
            defaults,
            bounds,
            expression,
        )
    }

    /// Written in the declared units so the node loads back unchanged.
    fn to_node(&self) -> Value {
        let strings = |list: &[String]| Value::Seq(list.iter().cloned().map(Value::Str).collect());
        let mut mapping = Mapping::new();
        mapping.insert("name", Value::Str(self.name.clone()));
        mapping.insert("arguments", strings(&self.arguments));
        mapping.insert("units", strings(&self.declared_units));
        mapping.insert("symbols", strings(&self.symbols));
        mapping.insert(
            "defaults",
            Value::Seq(self.declared_defaults.iter().map(|&d| Value::Float(d)).collect()),
        );
        mapping.insert(
            "bounds",
            Value::Seq(
                self.declared_bounds
                    .iter()
                    .map(|&(lo, hi)| Value::Seq(vec![Value::Float(lo), Value::Float(hi)]))
                    .collect(),
            ),
        );
        mapping.insert("expression", Value::Lambda(self.expression.clone()));
        Value::Map(mapping)
    }
}

/// `[[lo, hi], ...]`; a single argument may also be written as `[lo, hi]`.
fn bound_pairs(bounds: NdArray, count: usize) -> Result<Vec<(f64, f64)>> {
    let tag = FunctionProperty::TAG;
    let shape = bounds.shape().to_vec();
    let data = match shape.as_slice() {
        [0] if count == 0 => return Ok(Vec::new()),
        [2] if count == 1 => bounds.into_vec(),
        [rows, 2] if *rows == count => bounds.into_vec(),
        shape => {
            return Err(PropError::invalid_field(
                tag,
                "bounds",
                format!("expected {} [min, max] pair(s), found shape {:?}", count, shape),
            ))
        }
    };
    Ok(data.chunks(2).map(|pair| (pair[0], pair[1])).collect())
}
