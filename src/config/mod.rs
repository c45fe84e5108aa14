pub mod toml_config;

pub use toml_config::ToolConfig;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};

#[cfg(feature = "cli")]
mod cli {
    use crate::utils::error::Result;
    use crate::utils::validation::{validate_non_empty_string, validate_path, validate_positive_number, Validate};
    use clap::{Parser, Subcommand};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "yaml-prop")]
    #[command(about = "Load, check and evaluate YAML property files with units")]
    pub struct CliConfig {
        #[arg(long, global = true, help = "TOML tool configuration (default: ./yaml-prop.toml)")]
        pub config: Option<PathBuf>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Load every document and list the properties found
        Check { file: PathBuf },

        /// Reload and re-emit the documents, properties in base units
        Dump {
            file: PathBuf,
            #[arg(short, long)]
            output: Option<PathBuf>,
        },

        /// Evaluate a property; arguments are in base units
        Eval {
            file: PathBuf,
            #[arg(short, long)]
            property: String,
            /// name=value or name=v1,v2,...
            #[arg(long = "arg", value_parser = parse_keyword)]
            args: Vec<(String, Vec<f64>)>,
            #[arg(long, help = "Convert the result to this unit")]
            unit: Option<String>,
            #[arg(allow_negative_numbers = true)]
            values: Vec<f64>,
        },

        /// Write a CSV sample of a property along one argument
        Sample {
            file: PathBuf,
            #[arg(short, long)]
            property: String,
            #[arg(short, long)]
            argument: String,
            #[arg(long)]
            points: Option<usize>,
            /// Display units, arguments then output
            #[arg(long, value_delimiter = ',')]
            units: Vec<String>,
            #[arg(short, long)]
            output: Option<PathBuf>,
        },

        /// Convert a value between units
        Convert {
            #[arg(allow_negative_numbers = true)]
            value: f64,
            from: String,
            to: String,
        },
    }

    fn parse_keyword(text: &str) -> std::result::Result<(String, Vec<f64>), String> {
        let (name, values) = text
            .split_once('=')
            .ok_or_else(|| format!("expected name=value, found '{}'", text))?;
        let values = values
            .split(',')
            .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{}': {}", v, e)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((name.trim().to_string(), values))
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            if let Some(config) = &self.config {
                validate_path("config", &config.to_string_lossy())?;
            }
            match &self.command {
                Command::Check { file } | Command::Dump { file, .. } => {
                    validate_path("file", &file.to_string_lossy())
                }
                Command::Eval { file, property, .. } => {
                    validate_path("file", &file.to_string_lossy())?;
                    validate_non_empty_string("property", property)
                }
                Command::Sample {
                    file,
                    property,
                    argument,
                    points,
                    ..
                } => {
                    validate_path("file", &file.to_string_lossy())?;
                    validate_non_empty_string("property", property)?;
                    validate_non_empty_string("argument", argument)?;
                    if let Some(points) = points {
                        validate_positive_number("points", *points, 2)?;
                    }
                    Ok(())
                }
                Command::Convert { from, to, .. } => {
                    validate_non_empty_string("from", from)?;
                    validate_non_empty_string("to", to)
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_eval_command() {
            let config = CliConfig::parse_from([
                "yaml-prop",
                "eval",
                "ss316.yaml",
                "-p",
                "density",
                "--arg",
                "temperature=300,400",
                "-5",
            ]);
            match config.command {
                Command::Eval {
                    property,
                    args,
                    values,
                    ..
                } => {
                    assert_eq!(property, "density");
                    assert_eq!(args, vec![("temperature".to_string(), vec![300.0, 400.0])]);
                    assert_eq!(values, vec![-5.0]);
                }
                other => panic!("unexpected command: {:?}", other),
            }
        }

        #[test]
        fn test_sample_units_are_comma_separated() {
            let config = CliConfig::parse_from([
                "yaml-prop",
                "--verbose",
                "sample",
                "ss316.yaml",
                "-p",
                "k",
                "-a",
                "temperature",
                "--units",
                "degC,W/m/K",
            ]);
            assert!(config.verbose);
            match config.command {
                Command::Sample { units, .. } => assert_eq!(units, vec!["degC", "W/m/K"]),
                other => panic!("unexpected command: {:?}", other),
            }
        }

        #[test]
        fn test_validation_rejects_single_point() {
            let config = CliConfig::parse_from([
                "yaml-prop", "sample", "f.yaml", "-p", "k", "-a", "t", "--points", "1",
            ]);
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_keyword_parser() {
            assert!(parse_keyword("temperature").is_err());
            assert!(parse_keyword("t=abc").is_err());
            assert_eq!(parse_keyword("t = 1").unwrap(), ("t".to_string(), vec![1.0]));
        }
    }
}
