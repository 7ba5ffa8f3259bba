use crate::core::report::DEFAULT_REPORT_NAME;
use crate::domain::model::ValidationRules;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_regex, Validate,
};
use serde::{Deserialize, Serialize};

pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Settings for one report run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    pub output_dir: String,
    pub name: String,
    /// Also write a summary JSON per LAS/LAZ file under `laszy_json/`.
    pub to_json: bool,
    /// Skip inputs listed in the completed logs and append to an existing report.
    pub check_logs: bool,
    pub validate: bool,
    pub verbose: bool,
    pub monitor: bool,
    pub jobs: usize,
    pub rules: ValidationRules,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
            name: DEFAULT_REPORT_NAME.to_string(),
            to_json: false,
            check_logs: true,
            validate: false,
            verbose: false,
            monitor: false,
            jobs: default_jobs(),
            rules: ValidationRules::default(),
        }
    }
}

impl ConfigProvider for ReportOptions {
    fn output_dir(&self) -> &str {
        &self.output_dir
    }

    fn report_name(&self) -> &str {
        &self.name
    }

    fn to_json(&self) -> bool {
        self.to_json
    }

    fn check_logs(&self) -> bool {
        self.check_logs
    }

    fn validate_report(&self) -> bool {
        self.validate
    }

    fn verbose(&self) -> bool {
        self.verbose
    }

    fn jobs(&self) -> usize {
        self.jobs
    }

    fn validation_rules(&self) -> &ValidationRules {
        &self.rules
    }
}

impl Validate for ReportOptions {
    fn validate(&self) -> Result<()> {
        validate_path("output_dir", &self.output_dir)?;
        validate_positive_number("jobs", self.jobs, 1)?;

        let rules = &self.rules;
        validate_non_empty_string("validation.version", &rules.version)?;
        validate_range("validation.scale", rules.scale, f64::MIN_POSITIVE, 1.0)?;
        validate_regex(
            "validation.contract_number_pattern",
            &rules.contract_number_pattern,
        )?;
        validate_regex("validation.system_id_pattern", &rules.system_id_pattern)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = ReportOptions::default();
        assert!(options.validate().is_ok());
        assert!(options.check_logs);
        assert_eq!(options.report_name(), DEFAULT_REPORT_NAME);
        assert!(options.jobs() >= 1);
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let options = ReportOptions {
            jobs: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_bad_rules_rejected() {
        let mut options = ReportOptions::default();
        options.rules.scale = 0.0;
        assert!(options.validate().is_err());

        let mut options = ReportOptions::default();
        options.rules.contract_number_pattern = "[".to_string();
        assert!(options.validate().is_err());
    }
}
