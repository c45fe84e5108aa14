use crate::core::loader::{LoaderOptions, UnknownTagPolicy};
use crate::units::UnitRegistry;
use crate::utils::env::substitute_env_vars;
use crate::utils::error::{PropError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_one_of, validate_positive_number, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 預設的工具配置檔名，存在於工作目錄時自動載入
pub const DEFAULT_CONFIG_FILE: &str = "yaml-prop.toml";

pub const DEFAULT_SAMPLE_POINTS: usize = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    pub loader: Option<LoaderConfig>,
    pub units: Option<UnitsConfig>,
    pub sample: Option<SampleConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub substitute_env: Option<bool>,
    pub unknown_tags: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitsConfig {
    pub preferred: Option<Vec<String>>,
    pub replace_preferred: Option<bool>,
    pub definitions: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleConfig {
    pub points: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl ToolConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，先替換 ${VAR} 環境變數
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PropError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Loads `path` when given, else `yaml-prop.toml` from the working
    /// directory when present, else the defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                tracing::debug!("Using {}", DEFAULT_CONFIG_FILE);
                Self::from_file(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn substitute_env(&self) -> bool {
        self.loader
            .as_ref()
            .and_then(|l| l.substitute_env)
            .unwrap_or(false)
    }

    pub fn unknown_tags(&self) -> Result<UnknownTagPolicy> {
        match self.loader.as_ref().and_then(|l| l.unknown_tags.as_deref()) {
            Some(policy) => policy.parse(),
            None => Ok(UnknownTagPolicy::default()),
        }
    }

    pub fn loader_options(&self) -> Result<LoaderOptions> {
        Ok(LoaderOptions {
            substitute_env: self.substitute_env(),
            unknown_tags: self.unknown_tags()?,
        })
    }

    pub fn sample_points(&self) -> usize {
        self.sample
            .as_ref()
            .and_then(|s| s.points)
            .unwrap_or(DEFAULT_SAMPLE_POINTS)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    /// 依照 [units] 設定建立單位註冊表
    pub fn build_registry(&self) -> Result<UnitRegistry> {
        let mut registry = UnitRegistry::new();
        let Some(units) = &self.units else {
            return Ok(registry);
        };

        if let Some(definitions) = &units.definitions {
            for (name, definition) in definitions {
                registry.define(name, definition)?;
                tracing::debug!("Defined unit {} = {}", name, definition);
            }
        }

        if let Some(preferred) = &units.preferred {
            if units.replace_preferred.unwrap_or(false) {
                registry.set_preferred(preferred)?;
            } else {
                for unit in preferred {
                    registry.add_preferred(unit)?;
                }
            }
        }
        Ok(registry)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if let Some(policy) = self.loader.as_ref().and_then(|l| l.unknown_tags.as_deref()) {
            validate_one_of("loader.unknown_tags", policy, &["error", "keep"])?;
        }

        if let Some(points) = self.sample.as_ref().and_then(|s| s.points) {
            validate_positive_number("sample.points", points, 2)?;
        }

        if let Some(logging) = &self.logging {
            if let Some(level) = &logging.level {
                validate_one_of(
                    "logging.level",
                    level,
                    &["trace", "debug", "info", "warn", "error"],
                )?;
            }
            if let Some(format) = &logging.format {
                validate_one_of("logging.format", format, &["compact", "json"])?;
            }
        }

        if let Some(units) = &self.units {
            for unit in units.preferred.iter().flatten() {
                validate_non_empty_string("units.preferred", unit)?;
            }
        }

        // definitions and preferred units only fail once parsed
        self.build_registry().map_err(|e| PropError::InvalidConfigValueError {
            field: "units".to_string(),
            value: e.to_string(),
            reason: "unit definitions must parse".to_string(),
        })?;

        Ok(())
    }
}

impl Validate for ToolConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
