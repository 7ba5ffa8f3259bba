use crate::utils::error::Result;
use chrono::NaiveDate;
use las::raw;
use std::io::Read;
use uuid::Uuid;

/// Marker used when the GUID bytes are not valid UTF-8.
pub const UNICODE_DECODE_ERROR: &str = "UnicodeDecodeError";

/// Byte order in which the GUID is rendered: the first three fields are
/// little endian, then the two leading byte pairs of the tail are swapped.
const GUID_BYTE_ORDER: [usize; 16] = [3, 2, 1, 0, 5, 4, 7, 6, 9, 8, 11, 10, 12, 13, 14, 15];

const LAZ_COMPRESSION_BITS: u8 = 0b1100_0000;

/// The public header block of a LAS/LAZ file, as stored on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicHeaderBlock {
    pub file_source_id: u16,
    pub global_encoding: u16,
    pub guid: [u8; 16],
    pub version_major: u8,
    pub version_minor: u8,
    pub system_identifier: String,
    pub generating_software: String,
    pub file_creation_day_of_year: u16,
    pub file_creation_year: u16,
    pub header_size: u16,
    pub offset_to_point_data: u32,
    pub number_of_vlrs: u32,
    /// Point data record format with the LAZ compression bits masked off.
    pub point_data_format: u8,
    pub is_compressed: bool,
    pub point_data_record_length: u16,
    pub point_count: u64,
    pub points_by_return: Vec<u64>,
    pub x_scale: f64,
    pub y_scale: f64,
    pub z_scale: f64,
    pub x_offset: f64,
    pub y_offset: f64,
    pub z_offset: f64,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub start_of_first_evlr: Option<u64>,
    pub number_of_evlrs: u32,
}

impl PublicHeaderBlock {
    pub fn read_from<R: Read>(read: R) -> Result<Self> {
        let raw = raw::Header::read_from(read)?;
        Ok(Self::from(raw))
    }

    pub fn version(&self) -> String {
        format!("{}.{}", self.version_major, self.version_minor)
    }

    pub fn guid_hex(&self) -> String {
        guid_hex(&self.guid)
    }

    pub fn guid_asc(&self) -> String {
        guid_asc(&self.guid)
    }

    /// `YYYY-MM-DD`, or empty when the header carries no valid date.
    pub fn creation_date(&self) -> String {
        if self.file_creation_year == 0 || self.file_creation_day_of_year == 0 {
            return String::new();
        }
        NaiveDate::from_yo_opt(
            i32::from(self.file_creation_year),
            u32::from(self.file_creation_day_of_year),
        )
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
    }
}

impl From<raw::Header> for PublicHeaderBlock {
    fn from(raw: raw::Header) -> Self {
        let point_count = match &raw.large_file {
            Some(large) if large.number_of_point_records > 0 => large.number_of_point_records,
            _ => u64::from(raw.number_of_point_records),
        };
        let points_by_return = match &raw.large_file {
            Some(large) if large.number_of_point_records > 0 => {
                large.number_of_points_by_return.to_vec()
            }
            _ => raw
                .number_of_points_by_return
                .iter()
                .map(|&n| u64::from(n))
                .collect(),
        };
        let (start_of_first_evlr, number_of_evlrs) = match &raw.evlr {
            Some(evlr) => (Some(evlr.start_of_first_evlr), evlr.number_of_evlrs),
            None => (None, 0),
        };

        Self {
            file_source_id: raw.file_source_id,
            global_encoding: raw.global_encoding,
            guid: raw.guid,
            version_major: raw.version.major,
            version_minor: raw.version.minor,
            system_identifier: c_string(&raw.system_identifier),
            generating_software: c_string(&raw.generating_software),
            file_creation_day_of_year: raw.file_creation_day_of_year,
            file_creation_year: raw.file_creation_year,
            header_size: raw.header_size,
            offset_to_point_data: raw.offset_to_point_data,
            number_of_vlrs: raw.number_of_variable_length_records,
            point_data_format: raw.point_data_record_format & !LAZ_COMPRESSION_BITS,
            is_compressed: raw.point_data_record_format & LAZ_COMPRESSION_BITS != 0,
            point_data_record_length: raw.point_data_record_length,
            point_count,
            points_by_return,
            x_scale: raw.x_scale_factor,
            y_scale: raw.y_scale_factor,
            z_scale: raw.z_scale_factor,
            x_offset: raw.x_offset,
            y_offset: raw.y_offset,
            z_offset: raw.z_offset,
            x_min: raw.min_x,
            x_max: raw.max_x,
            y_min: raw.min_y,
            y_max: raw.max_y,
            z_min: raw.min_z,
            z_max: raw.max_z,
            start_of_first_evlr,
            number_of_evlrs,
        }
    }
}

/// Text up to the first NUL of a fixed-width header field.
pub(crate) fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim_end().to_string()
}

fn ordered_guid_bytes(guid: &[u8; 16]) -> [u8; 16] {
    GUID_BYTE_ORDER.map(|i| guid[i])
}

pub fn guid_hex(guid: &[u8; 16]) -> String {
    Uuid::from_bytes(ordered_guid_bytes(guid))
        .hyphenated()
        .to_string()
}

/// GUID bytes read as text. Acquisition contracts are often stored there.
pub fn guid_asc(guid: &[u8; 16]) -> String {
    match String::from_utf8(ordered_guid_bytes(guid).to_vec()) {
        Ok(text) => text.replace('\0', ""),
        Err(_) => UNICODE_DECODE_ERROR.to_string(),
    }
}

/// Number of decimal places in a scale factor, e.g. 2 for 0.01.
pub fn decimal_places(scale: f64) -> i32 {
    let text = format!("{}", scale);
    match text.split_once('.') {
        Some((_, fraction)) => fraction.len() as i32,
        None => 0,
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    if places <= 0 {
        return value.round();
    }
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
