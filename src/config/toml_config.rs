use crate::config::report_options::ReportOptions;
use crate::domain::model::ValidationRules;
use crate::utils::error::{LaszyError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional `laszy.toml` settings. Values may reference `${VAR}` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaszyConfig {
    pub report: Option<ReportConfig>,
    pub monitoring: Option<MonitoringConfig>,
    pub validation: Option<ValidationRules>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_dir: Option<String>,
    pub name: Option<String>,
    pub to_json: Option<bool>,
    pub check_logs: Option<bool>,
    pub validate: Option<bool>,
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_json: Option<bool>,
}

impl LaszyConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LaszyError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LaszyError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR}` with the variable's value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| LaszyError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_json(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_json)
            .unwrap_or(false)
    }

    /// Report options with file settings laid over the defaults.
    pub fn report_options(&self) -> ReportOptions {
        let mut options = ReportOptions {
            monitor: self.monitoring_enabled(),
            ..Default::default()
        };

        if let Some(report) = &self.report {
            if let Some(output_dir) = &report.output_dir {
                options.output_dir = output_dir.clone();
            }
            if let Some(name) = &report.name {
                options.name = name.clone();
            }
            options.to_json = report.to_json.unwrap_or(options.to_json);
            options.check_logs = report.check_logs.unwrap_or(options.check_logs);
            options.validate = report.validate.unwrap_or(options.validate);
            options.jobs = report.jobs.unwrap_or(options.jobs);
        }
        if let Some(rules) = &self.validation {
            options.rules = rules.clone();
        }

        options
    }
}

impl Validate for LaszyConfig {
    fn validate(&self) -> Result<()> {
        self.report_options().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[report]
output_dir = "./reports"
name = "batch"
to_json = true
check_logs = false
jobs = 2

[monitoring]
enabled = true

[validation]
version = "1.3"
point_data_format = 1
check_file_source_id = true
"#;

        let config = LaszyConfig::from_toml_str(toml_content).unwrap();
        let options = config.report_options();

        assert_eq!(options.output_dir, "./reports");
        assert_eq!(options.name, "batch");
        assert!(options.to_json);
        assert!(!options.check_logs);
        assert!(!options.validate);
        assert_eq!(options.jobs, 2);
        assert!(options.monitor);
        assert_eq!(options.rules.version, "1.3");
        assert_eq!(options.rules.point_data_format, 1);
        assert_eq!(options.rules.scale, 0.01);
        assert!(options.rules.check_file_source_id);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = LaszyConfig::from_toml_str("").unwrap();
        assert_eq!(config.report_options(), ReportOptions::default());
        assert!(!config.log_json());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LASZY_TEST_OUTDIR", "/data/laszy");

        let config = LaszyConfig::from_toml_str(
            r#"
[report]
output_dir = "${LASZY_TEST_OUTDIR}"
"#,
        )
        .unwrap();
        assert_eq!(config.report_options().output_dir, "/data/laszy");

        std::env::remove_var("LASZY_TEST_OUTDIR");
    }

    #[test]
    fn test_invalid_toml() {
        let result = LaszyConfig::from_toml_str("[report\noutput_dir = 1");
        assert!(matches!(result, Err(LaszyError::ConfigError { .. })));
    }

    #[test]
    fn test_invalid_jobs_fails_validation() {
        let config = LaszyConfig::from_toml_str("[report]\njobs = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[validation]\nhz_datum = \"WGS_1984\"\n")
            .unwrap();

        let config = LaszyConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.report_options().rules.hz_datum, "WGS_1984");
    }
}
