pub mod commands;

pub use commands::{App, Conversion, Evaluation, PropertySummary};
