use serde::{Deserialize, Serialize};

/// Everything laszy knows about one LAS/LAZ file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LasSummary {
    pub filename: String,
    pub public_header_block: PublicHeaderSummary,
    pub crs: WktCrsInfo,
    pub vlrs: VlrSection,
    pub point_records: Option<PointRecordSummary>,
    pub evlrs: EvlrSection,
    pub rgb_encoding: bool,
    pub wkt_bbox: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicHeaderSummary {
    pub global_encoding: GlobalEncoding,
    pub guid_asc: String,
    pub guid_hex: String,
    pub file_source_id: u16,
    pub system_id: String,
    pub generating_software: String,
    pub creation_date: String,
    pub version: String,
    pub point_data_format: u8,
    pub point_count: u64,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub x_scale: f64,
    pub y_scale: f64,
    pub z_scale: f64,
    pub x_offset: f64,
    pub y_offset: f64,
    pub z_offset: f64,
}

/// Decoded global encoding bit field of the public header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalEncoding {
    pub global_encoding: u16,
    pub gps_standard_time: bool,
    pub waveform_internal_packets: bool,
    pub waveform_external_packets: bool,
    pub synthetic_returns: bool,
    pub wkt_crs: bool,
}

impl GlobalEncoding {
    pub const GPS_STANDARD_TIME: u16 = 1 << 0;
    pub const WAVEFORM_INTERNAL: u16 = 1 << 1;
    pub const WAVEFORM_EXTERNAL: u16 = 1 << 2;
    pub const SYNTHETIC_RETURNS: u16 = 1 << 3;
    pub const WKT_CRS: u16 = 1 << 4;

    pub fn from_bits(value: u16) -> Self {
        Self {
            global_encoding: value,
            gps_standard_time: value & Self::GPS_STANDARD_TIME != 0,
            waveform_internal_packets: value & Self::WAVEFORM_INTERNAL != 0,
            waveform_external_packets: value & Self::WAVEFORM_EXTERNAL != 0,
            synthetic_returns: value & Self::SYNTHETIC_RETURNS != 0,
            wkt_crs: value & Self::WKT_CRS != 0,
        }
    }
}

/// Names pulled out of a WKT coordinate system definition. Empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WktCrsInfo {
    pub projection: String,
    pub vert_datum: String,
    pub compd_cs: String,
    pub spheroid: String,
    pub hz_datum: String,
    pub vert_cs: String,
    pub proj_cs: String,
    pub geog_cs: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlrSection {
    pub vlr_count: u32,
    pub vlr_has_wkt_crs: bool,
    pub vlr_has_geotiff_crs: bool,
    pub records: Option<Vec<VlrRecordSummary>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvlrSection {
    pub evlr_count: u32,
    pub evlr_has_wkt_crs: bool,
    pub evlr_has_geotiff_crs: bool,
    pub records: Option<Vec<VlrRecordSummary>>,
}

/// COPC hierarchy records leave user id, record id and length unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlrRecordSummary {
    pub number: usize,
    pub user_id: Option<String>,
    pub record_id: Option<u16>,
    pub record_length: Option<u64>,
    pub description: String,
    pub record_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecordSummary {
    pub classes: Vec<u8>,
    pub gps_time_min: Option<f64>,
    pub gps_time_max: Option<f64>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub flightline_start: Option<u16>,
    pub flightline_end: Option<u16>,
    pub class_flags: Option<ClassificationFlags>,
}

/// Whether any point record carries each classification flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationFlags {
    pub has_synthetic: bool,
    pub has_keypoint: bool,
    pub has_withheld: bool,
    pub has_overlap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    Lidar,
    Json,
}

/// Result of summarizing one report input.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub source: String,
    pub kind: InputKind,
    pub result: std::result::Result<LasSummary, String>,
}

/// Rows and bookkeeping produced from a set of summaries.
#[derive(Debug, Clone, Default)]
pub struct ReportBatch {
    pub rows: Vec<Vec<String>>,
    pub completed_lidar: Vec<String>,
    pub completed_json: Vec<String>,
    pub errors: Vec<(String, String)>,
}

/// Expected values a report is validated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    pub global_encoding: u16,
    pub version: String,
    pub point_data_format: u8,
    pub scale: f64,
    pub hz_datum: String,
    pub vert_datum: String,
    pub max_gps_week_time: f64,
    pub min_flightline: i64,
    pub contract_number_pattern: String,
    pub system_id_pattern: String,
    pub check_file_source_id: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            global_encoding: 17,
            version: "1.4".to_string(),
            point_data_format: 6,
            scale: 0.01,
            hz_datum: "NAD83_Canadian_Spatial_Reference_System".to_string(),
            vert_datum: "Canadian Geodetic Vertical Datum of 2013".to_string(),
            max_gps_week_time: 604_800.0,
            min_flightline: 1,
            contract_number_pattern: r"^[A-Za-z0-9][A-Za-z0-9_\-]*$".to_string(),
            system_id_pattern: r"^[A-Za-z0-9][A-Za-z0-9 ._/\-]*$".to_string(),
            check_file_source_id: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_encoding_bits() {
        let ge = GlobalEncoding::from_bits(17);
        assert!(ge.gps_standard_time);
        assert!(ge.wkt_crs);
        assert!(!ge.synthetic_returns);
        assert!(!ge.waveform_internal_packets);
        assert!(!ge.waveform_external_packets);

        let ge = GlobalEncoding::from_bits(0b1110);
        assert!(!ge.gps_standard_time);
        assert!(ge.waveform_internal_packets);
        assert!(ge.waveform_external_packets);
        assert!(ge.synthetic_returns);
    }

    #[test]
    fn test_validation_rules_partial_toml() {
        let rules: ValidationRules = toml::from_str("version = \"1.3\"\nmin_flightline = 5").unwrap();
        assert_eq!(rules.version, "1.3");
        assert_eq!(rules.min_flightline, 5);
        assert_eq!(rules.point_data_format, 6);
        assert!(!rules.check_file_source_id);
    }
}
