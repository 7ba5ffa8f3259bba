use crate::core::gps_time::GPS_WEEK_TIME_ERR_STR;
use crate::core::laszy::to_pretty_json;
use crate::core::report::{flag, name_root, NOT_AVAILABLE};
use crate::domain::model::ValidationRules;
use crate::utils::error::{LaszyError, Result};
use chrono::{Local, NaiveDate};
use csv::StringRecord;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const ERRORS_SUMMARY_SUFFIX: &str = "_errors_summary.json";
pub const ERRORS_CSV_SUFFIX: &str = "_errors.csv";

/// Report column checks, in errors CSV order.
enum Check {
    /// Copied through for context.
    Keep(&'static str),
    /// Cells describe the offending value; `companions` are copied alongside.
    Value {
        column: &'static str,
        issue: &'static str,
        companions: &'static [&'static str],
    },
    /// Cells are `True` when the row fails.
    Flag {
        column: &'static str,
        issue: &'static str,
    },
}

const CHECKS: &[Check] = &[
    Check::Keep("filename"),
    Check::Value { column: "guid_asc", issue: "guid_contract_number", companions: &[] },
    Check::Keep("file_source_id"),
    Check::Value { column: "system_id", issue: "system_id_format", companions: &[] },
    Check::Keep("creation_date"),
    Check::Value { column: "version", issue: "version", companions: &[] },
    Check::Value { column: "point_data_format", issue: "point_data_format", companions: &[] },
    Check::Value { column: "x_scale", issue: "x_scale", companions: &[] },
    Check::Value { column: "y_scale", issue: "y_scale", companions: &[] },
    Check::Value { column: "z_scale", issue: "z_scale", companions: &[] },
    Check::Value { column: "x_offset", issue: "x_offset", companions: &[] },
    Check::Value { column: "y_offset", issue: "y_offset", companions: &[] },
    Check::Value { column: "z_offset", issue: "z_offset", companions: &[] },
    Check::Value { column: "global_encoding", issue: "global_encoding_value", companions: &[] },
    Check::Value { column: "gps_standard_time", issue: "gps_time_flag", companions: &[] },
    Check::Value { column: "synthetic_returns", issue: "synthetic_returns_flag", companions: &[] },
    Check::Value { column: "wkt_crs", issue: "wkt_crs_flag", companions: &[] },
    Check::Value { column: "vert_datum", issue: "vert_datum", companions: &[] },
    Check::Value { column: "compd_cs", issue: "compd_cs", companions: &[] },
    Check::Value { column: "hz_datum", issue: "hz_datum", companions: &[] },
    Check::Value { column: "classes", issue: "points_in_never_classified", companions: &[] },
    Check::Value { column: "gps_time_min", issue: "gps_week_time_found", companions: &[] },
    Check::Value {
        column: "flightline_start",
        issue: "invalid_flightline_numbers",
        companions: &["flightline_end"],
    },
    Check::Value { column: "has_synthetic", issue: "synthetic_class_flags", companions: &[] },
    Check::Value {
        column: "filename_has_correct_source_id",
        issue: "filename_has_correct_source_id",
        companions: &[],
    },
    Check::Flag { column: "no_wkt_found", issue: "vlr_has_wkt_crs" },
    Check::Flag { column: "invalid_dates", issue: "invalid_dates_found" },
];

/// Columns the checks read.
const REQUIRED_COLUMNS: &[&str] = &[
    "filename",
    "guid_asc",
    "file_source_id",
    "system_id",
    "creation_date",
    "version",
    "point_data_format",
    "x_scale",
    "y_scale",
    "z_scale",
    "x_offset",
    "y_offset",
    "z_offset",
    "global_encoding",
    "gps_standard_time",
    "synthetic_returns",
    "wkt_crs",
    "vert_datum",
    "compd_cs",
    "hz_datum",
    "vlr_has_wkt_crs",
    "evlr_has_wkt_crs",
    "classes",
    "gps_time_min",
    "date_end",
    "flightline_start",
    "flightline_end",
    "has_synthetic",
];

/// Result of validating one report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    /// Issue key to number of offending rows. Only non-zero counts.
    pub issues: BTreeMap<String, usize>,
    pub summary_path: Option<PathBuf>,
    pub errors_path: Option<PathBuf>,
}

impl ValidationOutcome {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

struct Row<'a> {
    index: &'a HashMap<String, usize>,
    record: &'a StringRecord,
}

impl Row<'_> {
    fn get(&self, column: &str) -> &str {
        self.index
            .get(column)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
            .unwrap_or_default()
    }
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || value == NOT_AVAILABLE
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_classes(value: &str) -> Vec<i64> {
    value
        .trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .filter_map(|c| c.trim().parse().ok())
        .collect()
}

/// Checks a CSV report against a set of `ValidationRules`.
pub struct ReportValidator {
    rules: ValidationRules,
    contract_number: Regex,
    system_id: Regex,
}

impl ReportValidator {
    pub fn new(rules: ValidationRules) -> Result<Self> {
        let compile = |field: &str, pattern: &str| {
            Regex::new(pattern).map_err(|e| LaszyError::InvalidConfigValueError {
                field: field.to_string(),
                value: pattern.to_string(),
                reason: e.to_string(),
            })
        };
        let contract_number = compile("contract_number_pattern", &rules.contract_number_pattern)?;
        let system_id = compile("system_id_pattern", &rules.system_id_pattern)?;
        Ok(Self {
            rules,
            contract_number,
            system_id,
        })
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub fn validate_report(&self, path: &Path, outdir: Option<&Path>) -> Result<ValidationOutcome> {
        self.validate_report_on(path, outdir, Local::now().date_naive())
    }

    /// Validate with `today` as the latest acceptable acquisition date.
    pub fn validate_report_on(
        &self,
        path: &Path,
        outdir: Option<&Path>,
        today: NaiveDate,
    ) -> Result<ValidationOutcome> {
        if !path.exists() {
            tracing::warn!("Report {} not found, nothing to validate", path.display());
            return Ok(ValidationOutcome::default());
        }

        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();
        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !index.contains_key(**c)) {
            return Err(LaszyError::MissingField {
                field: missing.to_string(),
                context: path.display().to_string(),
            });
        }
        let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        let rows: Vec<Row> = records
            .iter()
            .map(|record| Row {
                index: &index,
                record,
            })
            .collect();

        let mut issues = BTreeMap::new();
        let mut columns: Vec<(String, Vec<String>)> = Vec::new();

        for check in CHECKS {
            match check {
                Check::Keep(column) => {
                    columns.push((column.to_string(), rows.iter().map(|r| r.get(column).to_string()).collect()));
                }
                Check::Value {
                    column,
                    issue,
                    companions,
                } => {
                    let cells: Vec<Option<String>> =
                        rows.iter().map(|row| self.check_value(column, row)).collect();
                    let count = cells.iter().filter(|c| c.is_some()).count();
                    if count == 0 {
                        continue;
                    }
                    issues.insert(issue.to_string(), count);
                    columns.push((
                        column.to_string(),
                        cells.into_iter().map(Option::unwrap_or_default).collect(),
                    ));
                    for companion in companions.iter() {
                        columns.push((
                            companion.to_string(),
                            rows.iter().map(|r| r.get(companion).to_string()).collect(),
                        ));
                    }
                }
                Check::Flag { column, issue } => {
                    let flags: Vec<bool> =
                        rows.iter().map(|row| self.check_flag(column, row, today)).collect();
                    let count = flags.iter().filter(|f| **f).count();
                    if count == 0 {
                        continue;
                    }
                    issues.insert(issue.to_string(), count);
                    columns.push((column.to_string(), flags.into_iter().map(flag).collect()));
                }
            }
        }

        if issues.is_empty() {
            tracing::info!("Report {} passed validation", path.display());
            return Ok(ValidationOutcome::default());
        }

        for (issue, count) in &issues {
            tracing::warn!("{}: {} file(s)", issue, count);
        }

        let outdir = match outdir {
            Some(dir) => dir.to_path_buf(),
            None => path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        std::fs::create_dir_all(&outdir)?;
        let stem = name_root(&path.to_string_lossy());

        let summary_path = outdir.join(format!("{}{}", stem, ERRORS_SUMMARY_SUFFIX));
        std::fs::write(&summary_path, to_pretty_json(&issues)?)?;

        let errors_path = outdir.join(format!("{}{}", stem, ERRORS_CSV_SUFFIX));
        let mut writer = csv::Writer::from_path(&errors_path)?;
        let mut header = vec![String::new()];
        header.extend(columns.iter().map(|(name, _)| name.clone()));
        writer.write_record(&header)?;
        for i in 0..rows.len() {
            let mut line = vec![i.to_string()];
            line.extend(columns.iter().map(|(_, cells)| cells[i].clone()));
            writer.write_record(&line)?;
        }
        writer.flush()?;

        tracing::info!(
            "Validation issues written to {} and {}",
            summary_path.display(),
            errors_path.display()
        );

        Ok(ValidationOutcome {
            issues,
            summary_path: Some(summary_path),
            errors_path: Some(errors_path),
        })
    }

    /// Describes the offending value, or `None` when the row passes.
    fn check_value(&self, column: &str, row: &Row) -> Option<String> {
        let value = row.get(column);
        let rules = &self.rules;
        let offending = || Some(value.to_string());

        match column {
            "guid_asc" => Self::pattern_issue(value, &self.contract_number, "No GUID found"),
            "system_id" => Self::pattern_issue(value, &self.system_id, "No System ID found"),
            "version" => {
                let expected = rules.version.parse::<f64>().ok();
                (value.parse::<f64>().ok() != expected || expected.is_none())
                    .then(|| value.to_string())
            }
            "point_data_format" => {
                (value.parse::<u8>().ok() != Some(rules.point_data_format)).then(|| value.to_string())
            }
            "x_scale" | "y_scale" | "z_scale" => match value.parse::<f64>() {
                Ok(scale) if (scale - rules.scale).abs() <= f64::EPSILON * rules.scale.abs() => None,
                _ => offending(),
            },
            "x_offset" | "y_offset" | "z_offset" => match value.parse::<f64>() {
                Ok(offset) if offset.fract() == 0.0 => None,
                _ => offending(),
            },
            "global_encoding" => {
                (value.parse::<u16>().ok() != Some(rules.global_encoding)).then(|| value.to_string())
            }
            "gps_standard_time" | "wkt_crs" => (parse_flag(value) != Some(true)).then(|| value.to_string()),
            "synthetic_returns" => (parse_flag(value) != Some(false)).then(|| value.to_string()),
            "vert_datum" => Self::datum_issue(value, &rules.vert_datum, "No vertical datum"),
            "hz_datum" => Self::datum_issue(value, &rules.hz_datum, "No horizontal datum"),
            "compd_cs" => value
                .is_empty()
                .then(|| "No compound projection".to_string()),
            "classes" => {
                if is_missing(value) {
                    return None;
                }
                parse_classes(value).contains(&0).then(|| value.to_string())
            }
            "gps_time_min" => {
                if is_missing(value) {
                    return None;
                }
                match value.parse::<f64>() {
                    Ok(t) if t > rules.max_gps_week_time => None,
                    _ => offending(),
                }
            }
            "flightline_start" => {
                if is_missing(value) {
                    return None;
                }
                match value.parse::<i64>() {
                    Ok(id) if id >= rules.min_flightline => None,
                    _ => offending(),
                }
            }
            "has_synthetic" => {
                if is_missing(value) {
                    return None;
                }
                (parse_flag(value) != Some(false)).then(|| value.to_string())
            }
            "filename_has_correct_source_id" => {
                if !rules.check_file_source_id {
                    return None;
                }
                let filename = row.get("filename");
                let prefix = filename.split('_').next().unwrap_or_default();
                (prefix != row.get("file_source_id"))
                    .then(|| "Filename does not contain File Source ID".to_string())
            }
            _ => None,
        }
    }

    fn check_flag(&self, column: &str, row: &Row, today: NaiveDate) -> bool {
        match column {
            "no_wkt_found" => {
                parse_flag(row.get("vlr_has_wkt_crs")) != Some(true)
                    && parse_flag(row.get("evlr_has_wkt_crs")) != Some(true)
            }
            "invalid_dates" => {
                let date_end = row.get("date_end");
                if is_missing(date_end) {
                    return false;
                }
                if date_end == GPS_WEEK_TIME_ERR_STR {
                    return true;
                }
                let day = date_end.split(' ').next().unwrap_or_default();
                match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
                    Ok(date) => date > today,
                    Err(_) => true,
                }
            }
            _ => false,
        }
    }

    fn pattern_issue(value: &str, pattern: &Regex, empty: &str) -> Option<String> {
        if value.is_empty() {
            Some(empty.to_string())
        } else if pattern.is_match(value) {
            None
        } else {
            Some(value.to_string())
        }
    }

    fn datum_issue(value: &str, expected: &str, empty: &str) -> Option<String> {
        if value == expected {
            None
        } else if value.is_empty() {
            Some(empty.to_string())
        } else {
            Some(value.to_string())
        }
    }
}
