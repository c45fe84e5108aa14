pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod math;
pub mod properties;
pub mod units;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use app::App;
pub use config::ToolConfig;
pub use core::{LoaderOptions, PropertyDumper, PropertyLoader, UnknownTagPolicy};
pub use domain::model::{Mapping, Sample, Value};
pub use domain::ports::{Property, YamlObject};
pub use math::{Lambda, NdArray};
pub use properties::{ConstantProperty, FunctionProperty, PropertyArgs, TableProperty};
pub use units::UnitRegistry;
pub use utils::error::{PropError, Result};
