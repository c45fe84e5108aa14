use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropError {
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Could not determine a constructor for the tag '{tag}'")]
    UnknownTagError { tag: String },

    #[error("{tag}: missing required field '{field}'")]
    MissingFieldError { tag: String, field: String },

    #[error("{tag}: invalid field '{field}': {reason}")]
    InvalidFieldError {
        tag: String,
        field: String,
        reason: String,
    },

    #[error("Shape error: {message}")]
    ShapeError { message: String },

    #[error("Expression error in '{expr}' at position {position}: {message}")]
    ExpressionError {
        expr: String,
        position: usize,
        message: String,
    },

    #[error("Undefined variable '{name}' in expression '{expr}'")]
    UndefinedVariableError { name: String, expr: String },

    #[error("Invalid unit '{unit}': {reason}")]
    UnitParseError { unit: String, reason: String },

    #[error("Cannot convert from '{from}' to '{to}': incompatible dimensions")]
    IncompatibleUnitsError { from: String, to: String },

    #[error("Argument error: {message}")]
    ArgumentError { message: String },

    #[error("Evaluation point {argument} = {value} is outside of bounds [{min}, {max}]")]
    OutOfBoundsError {
        argument: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 檔案或 YAML 語法問題
    Input,
    /// 標籤欄位不符合預期
    Schema,
    Units,
    Evaluation,
    Config,
    System,
}

impl PropError {
    pub fn missing_field(tag: &str, field: &str) -> Self {
        PropError::MissingFieldError {
            tag: tag.to_string(),
            field: field.to_string(),
        }
    }

    pub fn invalid_field(tag: &str, field: &str, reason: impl Into<String>) -> Self {
        PropError::InvalidFieldError {
            tag: tag.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        PropError::ShapeError {
            message: message.into(),
        }
    }

    pub fn argument(message: impl Into<String>) -> Self {
        PropError::ArgumentError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PropError::YamlError(_) => ErrorCategory::Input,
            PropError::IoError(_) => ErrorCategory::System,
            PropError::SerializationError(_) | PropError::CsvError(_) => ErrorCategory::System,
            PropError::ConfigError { .. } | PropError::InvalidConfigValueError { .. } => {
                ErrorCategory::Config
            }
            PropError::UnknownTagError { .. }
            | PropError::MissingFieldError { .. }
            | PropError::InvalidFieldError { .. }
            | PropError::ShapeError { .. } => ErrorCategory::Schema,
            PropError::UnitParseError { .. } | PropError::IncompatibleUnitsError { .. } => {
                ErrorCategory::Units
            }
            PropError::ExpressionError { .. }
            | PropError::UndefinedVariableError { .. }
            | PropError::ArgumentError { .. }
            | PropError::OutOfBoundsError { .. } => ErrorCategory::Evaluation,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Could not read the property file: {}", self),
            ErrorCategory::Schema => format!("The property file is malformed: {}", self),
            ErrorCategory::Units => format!("Unit problem: {}", self),
            ErrorCategory::Evaluation => format!("Evaluation failed: {}", self),
            ErrorCategory::Config => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PropError::UnknownTagError { .. } => {
                "Use one of !array, !numexpr, !lambda, !constant, !table, !function or register a constructor"
            }
            PropError::MissingFieldError { .. } | PropError::InvalidFieldError { .. } => {
                "Check the fields of the tagged mapping against the tag documentation"
            }
            PropError::ShapeError { .. } => "Make sure nested sequences and table grids have matching lengths",
            PropError::ExpressionError { .. } | PropError::UndefinedVariableError { .. } => {
                "Check the expression syntax and that every variable is an argument or alias"
            }
            PropError::UnitParseError { .. } => "Use unit symbols such as m, kg/m^3, W/m/K or define the unit in the config",
            PropError::IncompatibleUnitsError { .. } => "Convert only between units of the same dimension",
            PropError::ArgumentError { .. } => "Pass each property argument once, by position or by name",
            PropError::OutOfBoundsError { .. } => "Evaluate the function within its declared bounds",
            PropError::YamlError(_) => "Make sure the file is valid YAML",
            PropError::ConfigError { .. } | PropError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and try again"
            }
            PropError::IoError(_) => "Check that the file exists and is readable",
            PropError::SerializationError(_) | PropError::CsvError(_) => "Check the output destination",
        }
    }
}

pub type Result<T> = std::result::Result<T, PropError>;
