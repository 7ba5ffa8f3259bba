use crate::app::pipelines::report_pipeline::ReportPipeline;
use crate::config::report_options::ReportOptions;
use crate::config::storage::LocalStorage;
use crate::core::engine::ReportEngine;
use crate::core::laszy::is_lidar_file;
use crate::core::report_validation::{ReportValidator, ValidationOutcome};
use crate::domain::model::LasSummary;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

pub const DEFAULT_REPORT_NAME: &str = "laszy_report.csv";
pub const JSON_LOG_NAME: &str = "json_completed.log";
pub const LIDAR_LOG_NAME: &str = "lidar_completed.log";
/// Directory under the output dir holding per-file summary JSON.
pub const SUMMARY_JSON_DIR: &str = "laszy_json";
pub const CORRUPT_FILE_MSG: &str = "POSSIBLE CORRUPT FILE (Failed to decompress)";
pub const NOT_AVAILABLE: &str = "N/A";

/// Column names of the CSV report, in output order.
pub struct ReportColumns;

impl ReportColumns {
    pub const FILENAME: &'static str = "filename";
    pub const PUB_HDR: [&'static str; 21] = [
        "guid_asc",
        "guid_hex",
        "file_source_id",
        "system_id",
        "generating_software",
        "creation_date",
        "version",
        "point_data_format",
        "point_count",
        "x_min",
        "x_max",
        "y_min",
        "y_max",
        "z_min",
        "z_max",
        "x_scale",
        "y_scale",
        "z_scale",
        "x_offset",
        "y_offset",
        "z_offset",
    ];
    pub const GLOBAL_ENCODING: [&'static str; 6] = [
        "global_encoding",
        "gps_standard_time",
        "waveform_internal_packets",
        "waveform_external_packets",
        "synthetic_returns",
        "wkt_crs",
    ];
    pub const CRS: [&'static str; 8] = [
        "projection",
        "vert_datum",
        "compd_cs",
        "spheroid",
        "hz_datum",
        "vert_cs",
        "proj_cs",
        "geog_cs",
    ];
    pub const VLR_HDR: [&'static str; 3] = ["vlr_count", "vlr_has_wkt_crs", "vlr_has_geotiff_crs"];
    pub const POINT_RECORDS: [&'static str; 7] = [
        "classes",
        "gps_time_min",
        "gps_time_max",
        "date_start",
        "date_end",
        "flightline_start",
        "flightline_end",
    ];
    pub const CLASS_FLAGS: [&'static str; 4] =
        ["has_synthetic", "has_keypoint", "has_withheld", "has_overlap"];
    pub const EVLR_HDR: [&'static str; 3] =
        ["evlr_count", "evlr_has_wkt_crs", "evlr_has_geotiff_crs"];
    pub const RGB_ENCODING: &'static str = "rgb_encoding";
    pub const WKT_BBOX: &'static str = "wkt_bbox";

    pub fn all() -> Vec<&'static str> {
        let mut columns = vec![Self::FILENAME];
        columns.extend(Self::PUB_HDR);
        columns.extend(Self::GLOBAL_ENCODING);
        columns.extend(Self::CRS);
        columns.extend(Self::VLR_HDR);
        columns.extend(Self::POINT_RECORDS);
        columns.extend(Self::CLASS_FLAGS);
        columns.extend(Self::EVLR_HDR);
        columns.push(Self::RGB_ENCODING);
        columns.push(Self::WKT_BBOX);
        columns
    }
}

pub(crate) fn flag(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn class_list(classes: &[u8]) -> String {
    let items: Vec<String> = classes.iter().map(u8::to_string).collect();
    format!("[{}]", items.join(", "))
}

/// One report row, in `ReportColumns::all()` order.
pub fn summary_row(summary: &LasSummary) -> Vec<String> {
    let phb = &summary.public_header_block;
    let ge = &phb.global_encoding;
    let crs = &summary.crs;
    let pr = summary.point_records.as_ref();
    let class_flags = pr.and_then(|p| p.class_flags);

    let mut row = vec![
        summary.filename.clone(),
        phb.guid_asc.clone(),
        phb.guid_hex.clone(),
        phb.file_source_id.to_string(),
        phb.system_id.clone(),
        phb.generating_software.clone(),
        phb.creation_date.clone(),
        phb.version.clone(),
        phb.point_data_format.to_string(),
        phb.point_count.to_string(),
        phb.x_min.to_string(),
        phb.x_max.to_string(),
        phb.y_min.to_string(),
        phb.y_max.to_string(),
        phb.z_min.to_string(),
        phb.z_max.to_string(),
        phb.x_scale.to_string(),
        phb.y_scale.to_string(),
        phb.z_scale.to_string(),
        phb.x_offset.to_string(),
        phb.y_offset.to_string(),
        phb.z_offset.to_string(),
        ge.global_encoding.to_string(),
        flag(ge.gps_standard_time),
        flag(ge.waveform_internal_packets),
        flag(ge.waveform_external_packets),
        flag(ge.synthetic_returns),
        flag(ge.wkt_crs),
        crs.projection.clone(),
        crs.vert_datum.clone(),
        crs.compd_cs.clone(),
        crs.spheroid.clone(),
        crs.hz_datum.clone(),
        crs.vert_cs.clone(),
        crs.proj_cs.clone(),
        crs.geog_cs.clone(),
        summary.vlrs.vlr_count.to_string(),
        flag(summary.vlrs.vlr_has_wkt_crs),
        flag(summary.vlrs.vlr_has_geotiff_crs),
    ];

    row.extend([
        or_na(pr.map(|p| class_list(&p.classes))),
        or_na(pr.and_then(|p| p.gps_time_min)),
        or_na(pr.and_then(|p| p.gps_time_max)),
        or_na(pr.and_then(|p| p.date_start.clone())),
        or_na(pr.and_then(|p| p.date_end.clone())),
        or_na(pr.and_then(|p| p.flightline_start)),
        or_na(pr.and_then(|p| p.flightline_end)),
        or_na(class_flags.map(|f| flag(f.has_synthetic))),
        or_na(class_flags.map(|f| flag(f.has_keypoint))),
        or_na(class_flags.map(|f| flag(f.has_withheld))),
        or_na(class_flags.map(|f| flag(f.has_overlap))),
        summary.evlrs.evlr_count.to_string(),
        flag(summary.evlrs.evlr_has_wkt_crs),
        flag(summary.evlrs.evlr_has_geotiff_crs),
        flag(summary.rgb_encoding),
        summary.wkt_bbox.clone(),
    ]);

    row
}

/// Default name when empty, `.csv` appended when missing.
pub fn report_file_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return DEFAULT_REPORT_NAME.to_string();
    }
    if name.ends_with(".csv") {
        name.to_string()
    } else {
        format!("{}.csv", name)
    }
}

/// File name without its last extension.
pub(crate) fn name_root(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Report inputs split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportInputs {
    pub lidar: Vec<String>,
    pub json: Vec<String>,
}

impl ReportInputs {
    /// Anything that is neither LAS/LAZ nor JSON is ignored.
    pub fn partition(files: &[String]) -> Self {
        let mut inputs = Self::default();
        for file in files {
            if is_lidar_file(Path::new(file)) {
                inputs.lidar.push(file.clone());
            } else if file.to_ascii_lowercase().ends_with(".json") {
                inputs.json.push(file.clone());
            } else {
                tracing::warn!("Ignoring {}: not a LAS/LAZ or summary JSON file", file);
            }
        }
        inputs
    }

    /// Add summary JSON files and drop LAS/LAZ files they already cover.
    pub fn merge_summaries(&mut self, summaries: Vec<String>) {
        for summary in summaries {
            if !self.json.contains(&summary) {
                self.json.push(summary);
            }
        }

        let summarized: Vec<String> = self.json.iter().map(|f| name_root(f)).collect();
        self.lidar.retain(|file| {
            let covered = summarized.contains(&name_root(file));
            if covered {
                tracing::debug!("Using existing summary for {}", file);
            }
            !covered
        });
    }

    pub fn is_empty(&self) -> bool {
        self.lidar.is_empty() && self.json.is_empty()
    }
}

/// Builds a CSV report from LAS/LAZ files and summary JSON files.
pub struct LaszyReport {
    files: Vec<String>,
    options: ReportOptions,
}

impl LaszyReport {
    pub fn new(files: Vec<String>, options: ReportOptions) -> Self {
        Self { files, options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    pub fn report_path(&self) -> PathBuf {
        Path::new(&self.options.output_dir).join(report_file_name(&self.options.name))
    }

    /// Write the report (and optionally validate it). Returns its path.
    pub async fn write(self) -> Result<String> {
        let inputs = ReportInputs::partition(&self.files);
        let storage = LocalStorage::new(self.options.output_dir.clone());
        let monitor = self.options.monitor;
        let pipeline = ReportPipeline::new(storage, self.options, inputs);
        ReportEngine::new_with_monitoring(pipeline, monitor).run().await
    }

    /// Validate an existing report. `outdir` defaults to the report's directory.
    pub fn validate_report(&self, path: &Path, outdir: Option<&Path>) -> Result<ValidationOutcome> {
        ReportValidator::new(self.options.rules.clone())?.validate_report(path, outdir)
    }
}
