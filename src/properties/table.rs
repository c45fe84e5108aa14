use crate::core::fields::Fields;
use crate::domain::model::{Mapping, Sample, Value};
use crate::domain::ports::{ConstructContext, Property, YamlObject};
use crate::math::{GridInterpolator, InterpMethod, NdArray};
use crate::properties::{argument_index, sample_along, PropertyArgs};
use crate::units::UnitRegistry;
use crate::utils::error::{PropError, Result};
use crate::utils::validation::validate_length;
use std::sync::Arc;

/// Property tabulated on a regular grid, one axis per argument.
///
/// Grids, table values and defaults are converted to base units on
/// construction. Coordinates outside the grid are clamped to its edges.
#[derive(Debug, Clone)]
pub struct TableProperty {
    name: String,
    arguments: Vec<String>,
    units: Vec<String>,
    symbols: Vec<String>,
    defaults: Vec<f64>,
    min: Vec<f64>,
    max: Vec<f64>,
    interpolator: GridInterpolator,
    registry: Arc<UnitRegistry>,
}

impl TableProperty {
    /// `values` holds one grid per argument followed by the table itself.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<UnitRegistry>,
        name: String,
        arguments: Vec<String>,
        units: Vec<String>,
        symbols: Vec<String>,
        defaults: Vec<f64>,
        values: Vec<NdArray>,
        method: InterpMethod,
    ) -> Result<Self> {
        let tag = Self::TAG;
        let n = arguments.len();
        if n == 0 {
            return Err(PropError::invalid_field(
                tag,
                "arguments",
                "a table needs at least one argument",
            ));
        }
        validate_length(tag, "units", units.len(), n + 1)?;
        validate_length(tag, "symbols", symbols.len(), n + 1)?;
        validate_length(tag, "defaults", defaults.len(), n)?;
        validate_length(tag, "values", values.len(), n + 1)?;

        let mut base_units = Vec::with_capacity(n + 1);
        let mut base_values = Vec::with_capacity(n + 1);
        for (value, unit) in values.iter().zip(&units) {
            let (value, base_unit) = registry.base(value, unit)?;
            base_values.push(value);
            base_units.push(base_unit);
        }

        let defaults = defaults
            .iter()
            .zip(units.iter().zip(&base_units))
            .map(|(&d, (unit, base_unit))| registry.to_scalar(d, unit, base_unit))
            .collect::<Result<Vec<f64>>>()?;

        let table = base_values.pop().ok_or_else(|| PropError::missing_field(tag, "values"))?;
        let mut grid = Vec::with_capacity(n);
        for (i, axis) in base_values.into_iter().enumerate() {
            if axis.ndim() != 1 {
                return Err(PropError::invalid_field(
                    tag,
                    &format!("values[{}]", i),
                    format!("grid must be one-dimensional, found shape {:?}", axis.shape()),
                ));
            }
            grid.push(axis.into_vec());
        }

        let interpolator = GridInterpolator::new(grid, table, method)?;
        let min = interpolator.grid().iter().map(|axis| axis[0]).collect();
        let max = interpolator
            .grid()
            .iter()
            .map(|axis| axis[axis.len() - 1])
            .collect();

        tracing::debug!(
            "Table property '{}' over ({}) with {} interpolation",
            name,
            arguments.join(", "),
            method
        );

        Ok(Self {
            name,
            arguments,
            units: base_units,
            symbols,
            defaults,
            min,
            max,
            interpolator,
            registry,
        })
    }

    pub fn method(&self) -> InterpMethod {
        self.interpolator.method()
    }

    /// Grid axes in base units, ascending.
    pub fn grid(&self) -> &[Vec<f64>] {
        self.interpolator.grid()
    }

    pub fn table(&self) -> &NdArray {
        self.interpolator.values()
    }
}

impl Property for TableProperty {
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
        let shape = columns[0].shape().to_vec();
        let count = columns[0].len();

        let mut point = vec![0.0; columns.len()];
        let mut out = Vec::with_capacity(count);
        for j in 0..count {
            for (i, column) in columns.iter().enumerate() {
                let x = column.as_slice()[j];
                point[i] = if x < self.min[i] {
                    tracing::warn!(
                        "Thresholding {}-th {} to minimum: {} < {}",
                        j,
                        self.arguments[i],
                        x,
                        self.min[i]
                    );
                    self.min[i]
                } else if x > self.max[i] {
                    tracing::warn!(
                        "Thresholding {}-th {} to maximum: {} > {}",
                        j,
                        self.arguments[i],
                        x,
                        self.max[i]
                    );
                    self.max[i]
                } else {
                    x
                };
            }
            out.push(self.interpolator.interpolate_point(&point));
        }
        NdArray::from_shape_vec(shape, out)
    }

    /// Samples at the grid points of `argument`; `points` is ignored.
    fn sample(&self, argument: &str, units: Option<&[String]>, _points: usize) -> Result<Sample> {
        let index = argument_index(self, argument)?;
        let xq = NdArray::from_vec(self.grid()[index].clone());
        sample_along(self, &self.registry, index, xq, units)
    }
}

impl YamlObject for TableProperty {
    const TAG: &'static str = "!table";

    fn from_node(ctx: &ConstructContext, node: Value) -> Result<Self> {
        let mut fields = Fields::from_node(Self::TAG, node)?;
        let name = fields.string("name")?;
        let arguments = fields.strings("arguments")?;
        let units = fields.strings("units")?;
        let symbols = fields.strings("symbols")?;
        let defaults = fields.numbers("defaults")?;
        let values = fields.arrays("values")?;
        let method = match fields.optional_string("method")? {
            Some(method) => method.parse()?,
            None => InterpMethod::default(),
        };
        fields.finish()?;
        TableProperty::new(
            ctx.units.clone(),
            name,
            arguments,
            units,
            symbols,
            defaults,
            values,
            method,
        )
    }

    fn to_node(&self) -> Value {
        let strings = |list: &[String]| Value::Seq(list.iter().cloned().map(Value::Str).collect());
        let mut values: Vec<Value> = self
            .grid()
            .iter()
            .map(|axis| Value::Seq(axis.iter().map(|&x| Value::Float(x)).collect()))
            .collect();
        values.push(self.table().to_value());

        let mut mapping = Mapping::new();
        mapping.insert("name", Value::Str(self.name.clone()));
        mapping.insert("arguments", strings(&self.arguments));
        mapping.insert("units", strings(&self.units));
        mapping.insert("symbols", strings(&self.symbols));
        mapping.insert(
            "defaults",
            Value::Seq(self.defaults.iter().map(|&d| Value::Float(d)).collect()),
        );
        mapping.insert("values", Value::Seq(values));
        mapping.insert("method", Value::Str(self.method().as_str().to_string()));
        Value::Map(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn conductivity() -> TableProperty {
        TableProperty::new(
            Arc::new(UnitRegistry::new()),
            "Thermal conductivity".to_string(),
            strings(&["temperature"]),
            strings(&["degC", "W/m/K"]),
            strings(&["T", "k"]),
            vec![20.0],
            vec![
                NdArray::from_vec(vec![0.0, 100.0, 200.0]),
                NdArray::from_vec(vec![14.0, 16.0, 17.0]),
            ],
            InterpMethod::Linear,
        )
        .unwrap()
    }

    #[test]
    fn test_grid_and_defaults_in_base_units() {
        let table = conductivity();
        assert_eq!(table.units(), &["K".to_string(), "m*kg/s^3/K".to_string()]);
        assert!((table.defaults()[0] - 293.15).abs() < 1e-9);
        assert!((table.grid()[0][1] - 373.15).abs() < 1e-9);
    }

    #[test]
    fn test_linear_interpolation_and_default() {
        let table = conductivity();
        let y = table
            .evaluate(&PropertyArgs::new().arg(vec![323.15, 423.15]))
            .unwrap();
        assert!((y.as_slice()[0] - 15.0).abs() < 1e-9);
        assert!((y.as_slice()[1] - 16.5).abs() < 1e-9);

        let at_default = table.evaluate(&PropertyArgs::new()).unwrap();
        assert!((at_default.as_scalar().unwrap() - 14.4).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_grid_values_are_clamped() {
        let table = conductivity();
        let y = table
            .evaluate(&PropertyArgs::new().kwarg("Temperature", vec![0.0, 1000.0]))
            .unwrap();
        assert_eq!(y.as_slice(), &[14.0, 17.0]);
    }

    #[test]
    fn test_sample_uses_grid_points() {
        let table = conductivity();
        let sample = table.sample("temperature", None, 1000).unwrap();
        assert_eq!(sample.x.len(), 3);
        assert_eq!(sample.x_unit, "K");
        assert_eq!(sample.y_unit, "W/m/K");
        assert_eq!(sample.y, vec![14.0, 16.0, 17.0]);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let result = TableProperty::new(
            Arc::new(UnitRegistry::new()),
            "k".to_string(),
            strings(&["temperature"]),
            strings(&["K"]),
            strings(&["T", "k"]),
            vec![300.0],
            vec![NdArray::from_vec(vec![0.0, 1.0]), NdArray::from_vec(vec![0.0, 1.0])],
            InterpMethod::Linear,
        );
        assert!(matches!(
            result,
            Err(PropError::InvalidFieldError { field, .. }) if field == "units"
        ));
    }
}
