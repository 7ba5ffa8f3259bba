use crate::core::header::c_string;
use crate::domain::model::VlrRecordSummary;
use crate::utils::error::Result;
use las::raw;
use std::io::Read;

pub const PROJECTION_USER_ID: &str = "LASF_Projection";
pub const COPC_USER_ID: &str = "copc";
pub const LASZIP_USER_ID: &str = "laszip encoded";

pub const WKT_RECORD_ID: u16 = 2112;
pub const GEO_KEY_DIRECTORY_RECORD_ID: u16 = 34735;
pub const GEO_DOUBLE_PARAMS_RECORD_ID: u16 = 34736;
pub const GEO_ASCII_PARAMS_RECORD_ID: u16 = 34737;
pub const COPC_INFO_RECORD_ID: u16 = 1;
pub const COPC_HIERARCHY_RECORD_ID: u16 = 1000;
pub const LASZIP_RECORD_ID: u16 = 22204;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    WktCrs,
    GeoKeyDirectory,
    GeoDoubleParams,
    GeoAsciiParams,
    CopcInfo,
    CopcHierarchy,
    LasZip,
    Other,
}

impl RecordKind {
    pub fn is_geotiff(self) -> bool {
        matches!(
            self,
            RecordKind::GeoKeyDirectory | RecordKind::GeoDoubleParams | RecordKind::GeoAsciiParams
        )
    }
}

/// A VLR or EVLR. `extended` is set for records read from the EVLR area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableLengthRecord {
    pub user_id: String,
    pub record_id: u16,
    pub description: String,
    pub data: Vec<u8>,
    pub extended: bool,
}

impl VariableLengthRecord {
    pub fn read_from<R: Read>(read: R, extended: bool) -> Result<Self> {
        let raw = raw::Vlr::read_from(read, extended)?;
        Ok(Self {
            user_id: c_string(&raw.user_id),
            record_id: raw.record_id,
            description: c_string(&raw.description),
            data: raw.data,
            extended,
        })
    }

    pub fn kind(&self) -> RecordKind {
        match (self.user_id.as_str(), self.record_id) {
            (PROJECTION_USER_ID, WKT_RECORD_ID) => RecordKind::WktCrs,
            (PROJECTION_USER_ID, GEO_KEY_DIRECTORY_RECORD_ID) => RecordKind::GeoKeyDirectory,
            (PROJECTION_USER_ID, GEO_DOUBLE_PARAMS_RECORD_ID) => RecordKind::GeoDoubleParams,
            (PROJECTION_USER_ID, GEO_ASCII_PARAMS_RECORD_ID) => RecordKind::GeoAsciiParams,
            (COPC_USER_ID, COPC_INFO_RECORD_ID) => RecordKind::CopcInfo,
            (COPC_USER_ID, COPC_HIERARCHY_RECORD_ID) => RecordKind::CopcHierarchy,
            (LASZIP_USER_ID, LASZIP_RECORD_ID) => RecordKind::LasZip,
            _ => RecordKind::Other,
        }
    }

    /// Payload as text, with trailing NULs dropped.
    pub fn data_as_text(&self) -> String {
        String::from_utf8_lossy(&self.data)
            .trim_end_matches('\0')
            .to_string()
    }

    /// Human readable payload for the record types laszy understands.
    /// Opaque binary payloads give `None`.
    pub fn record_data(&self) -> Option<String> {
        match self.kind() {
            RecordKind::WktCrs | RecordKind::GeoAsciiParams => Some(self.data_as_text()),
            RecordKind::GeoDoubleParams => {
                let values: Vec<String> = self
                    .data
                    .chunks_exact(8)
                    .map(|chunk| {
                        let mut bytes = [0u8; 8];
                        bytes.copy_from_slice(chunk);
                        f64::from_le_bytes(bytes).to_string()
                    })
                    .collect();
                Some(format!("[{}]", values.join(", ")))
            }
            RecordKind::GeoKeyDirectory => Some(format_geo_keys(&self.data)),
            RecordKind::CopcInfo
            | RecordKind::CopcHierarchy
            | RecordKind::LasZip
            | RecordKind::Other => None,
        }
    }

    pub fn summarize(&self, number: usize) -> VlrRecordSummary {
        if self.kind() == RecordKind::CopcHierarchy {
            return VlrRecordSummary {
                number,
                user_id: None,
                record_id: None,
                record_length: None,
                description: self.description.clone(),
                record_data: None,
            };
        }

        VlrRecordSummary {
            number,
            user_id: Some(self.user_id.clone()),
            record_id: Some(self.record_id),
            record_length: Some(self.data.len() as u64),
            description: self.description.clone(),
            record_data: self.record_data(),
        }
    }
}

/// GeoKeyDirectoryTag: a header of four u16 followed by (key, location,
/// count, value) entries.
fn format_geo_keys(data: &[u8]) -> String {
    let shorts: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    if shorts.len() < 4 {
        return String::new();
    }

    let entries: Vec<String> = shorts[4..]
        .chunks_exact(4)
        .take(usize::from(shorts[3]))
        .map(|entry| format!("{}: {}", entry[0], entry[3]))
        .collect();

    format!(
        "GeoKeyDirectory(version={}.{}.{}, keys=[{}])",
        shorts[0],
        shorts[1],
        shorts[2],
        entries.join(", ")
    )
}

pub fn find_wkt(records: &[VariableLengthRecord]) -> Option<String> {
    records
        .iter()
        .find(|record| record.kind() == RecordKind::WktCrs)
        .map(VariableLengthRecord::data_as_text)
}

pub fn has_wkt_crs(records: &[VariableLengthRecord]) -> bool {
    records.iter().any(|record| record.kind() == RecordKind::WktCrs)
}

pub fn has_geotiff_crs(records: &[VariableLengthRecord]) -> bool {
    records.iter().any(|record| record.kind().is_geotiff())
}

pub fn summarize_records(records: &[VariableLengthRecord]) -> Option<Vec<VlrRecordSummary>> {
    if records.is_empty() {
        return None;
    }
    Some(
        records
            .iter()
            .enumerate()
            .map(|(i, record)| record.summarize(i + 1))
            .collect(),
    )
}
