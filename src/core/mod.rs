pub mod dumper;
pub mod fields;
pub mod loader;
pub mod tags;

pub use crate::domain::model::{Mapping, Value};
pub use crate::domain::ports::{ConstructContext, Property, YamlObject};
pub use crate::utils::error::Result;
pub use dumper::PropertyDumper;
pub use loader::{LoaderOptions, PropertyLoader, UnknownTagPolicy};
