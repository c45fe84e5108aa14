use crate::core::fields::Fields;
use crate::domain::model::{Mapping, Sample, Value};
use crate::domain::ports::{ConstructContext, Property, YamlObject};
use crate::math::NdArray;
use crate::properties::PropertyArgs;
use crate::units::UnitRegistry;
use crate::utils::error::{PropError, Result};

/// Property with a single value, stored in base units.
#[derive(Debug, Clone)]
pub struct ConstantProperty {
    name: String,
    units: Vec<String>,
    symbols: Vec<String>,
    value: NdArray,
}

impl ConstantProperty {
    pub fn new(
        registry: &UnitRegistry,
        name: String,
        unit: &str,
        symbol: String,
        value: NdArray,
    ) -> Result<Self> {
        let (value, unit) = registry.base(&value, unit)?;
        tracing::debug!("Constant property '{}' in {}", name, unit);
        Ok(Self {
            name,
            units: vec![unit],
            symbols: vec![symbol],
            value,
        })
    }

    pub fn unit(&self) -> &str {
        &self.units[0]
    }

    pub fn symbol(&self) -> &str {
        &self.symbols[0]
    }

    pub fn value(&self) -> &NdArray {
        &self.value
    }
}

impl Property for ConstantProperty {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn arguments(&self) -> &[String] {
        &[]
    }

    fn units(&self) -> &[String] {
        &self.units
    }

    fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn defaults(&self) -> &[f64] {
        &[]
    }

    /// Arguments are accepted and ignored.
    fn evaluate(&self, _args: &PropertyArgs) -> Result<NdArray> {
        Ok(self.value.clone())
    }

    fn sample(&self, argument: &str, _units: Option<&[String]>, _points: usize) -> Result<Sample> {
        Err(PropError::argument(format!(
            "constant property '{}' has no argument '{}' to sample",
            self.name, argument
        )))
    }
}

impl YamlObject for ConstantProperty {
    const TAG: &'static str = "!constant";

    fn from_node(ctx: &ConstructContext, node: Value) -> Result<Self> {
        let mut fields = Fields::from_node(Self::TAG, node)?;
        let name = fields.string("name")?;
        let unit = fields.string("unit")?;
        let symbol = fields.string("symbol")?;
        let value = fields.array("value")?;
        fields.finish()?;
        ConstantProperty::new(&ctx.units, name, &unit, symbol, value)
    }

    fn to_node(&self) -> Value {
        let mut mapping = Mapping::new();
        mapping.insert("name", Value::Str(self.name.clone()));
        mapping.insert("unit", Value::Str(self.unit().to_string()));
        mapping.insert("symbol", Value::Str(self.symbol().to_string()));
        mapping.insert("value", self.value.to_value());
        Value::Map(mapping)
    }
}
