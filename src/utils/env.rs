use crate::utils::error::{PropError, Result};
use regex::Regex;

/// 替換環境變數 (例如 ${DATA_DIR})，找不到的變數保持原樣
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PropError::ConfigError {
        message: format!("env pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_variable_is_replaced() {
        std::env::set_var("YAML_PROP_TEST_DENSITY", "7.99");
        let out = substitute_env_vars("value: ${YAML_PROP_TEST_DENSITY}").unwrap();
        assert_eq!(out, "value: 7.99");
        std::env::remove_var("YAML_PROP_TEST_DENSITY");
    }

    #[test]
    fn test_unknown_variable_is_kept() {
        let out = substitute_env_vars("unit: ${YAML_PROP_TEST_MISSING_VAR}").unwrap();
        assert_eq!(out, "unit: ${YAML_PROP_TEST_MISSING_VAR}");
    }
}
