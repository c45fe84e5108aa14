use crate::domain::model::{Sample, Value};
use crate::math::NdArray;
use crate::properties::PropertyArgs;
use crate::units::UnitRegistry;
use crate::utils::error::Result;
use std::fmt::Debug;
use std::sync::Arc;

/// State shared by every tag constructor of one loader.
#[derive(Debug, Clone)]
pub struct ConstructContext {
    pub units: Arc<UnitRegistry>,
}

/// A type that is read from and written back to a tagged YAML mapping.
pub trait YamlObject: Sized {
    const TAG: &'static str;

    /// Builds the object from an already deep-constructed node.
    fn from_node(ctx: &ConstructContext, node: Value) -> Result<Self>;

    /// The untagged node the dumper emits under [`Self::TAG`].
    fn to_node(&self) -> Value;
}

/// A physical property evaluated in SI base units.
pub trait Property: Debug + Send + Sync {
    fn tag(&self) -> &'static str;
    fn name(&self) -> &str;
    fn arguments(&self) -> &[String];
    /// Argument units followed by the property unit.
    fn units(&self) -> &[String];
    fn symbols(&self) -> &[String];
    fn defaults(&self) -> &[f64];

    fn evaluate(&self, args: &PropertyArgs) -> Result<NdArray>;

    /// Samples the property along `argument`, other arguments at their
    /// defaults. `units` overrides the display units (arguments then output).
    fn sample(&self, argument: &str, units: Option<&[String]>, points: usize) -> Result<Sample>;

    fn output_unit(&self) -> &str {
        self.units().last().map(String::as_str).unwrap_or("dimensionless")
    }
}
