//! Physical units: dimensions, unit expressions and the conversion registry.

pub mod dimension;
pub mod parser;
pub mod registry;

pub use dimension::{Dimension, Exponent};
pub use registry::{Unit, UnitRegistry, DEFAULT_PREFERRED_UNITS};
