use crate::core::gps_time::describe_gps_time;
use crate::core::header::{decimal_places, round_to, PublicHeaderBlock};
use crate::core::points::{PointFilter, PointRecord, PointRecords};
use crate::core::vlr::{self, VariableLengthRecord};
use crate::domain::model::{
    ClassificationFlags, EvlrSection, GlobalEncoding, LasSummary, PointRecordSummary,
    PublicHeaderSummary, VlrSection, WktCrsInfo,
};
use crate::utils::error::{LaszyError, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const LIDAR_EXTENSIONS: [&str; 2] = ["las", "laz"];
const RGB_POINT_FORMATS: [u8; 6] = [2, 3, 5, 7, 8, 10];
/// Classification flags have their own byte from point format 6 on.
const FIRST_EXTENDED_POINT_FORMAT: u8 = 6;

/// Any seekable byte source holding a LAS/LAZ file.
pub trait LasSource: Read + Seek + Send + Sync + Debug {}

impl<T: Read + Seek + Send + Sync + Debug> LasSource for T {}

#[derive(Debug)]
enum Origin {
    Path(PathBuf),
    Source(Box<dyn LasSource>),
    Detached,
}

#[derive(Debug, Clone, Default)]
pub struct SummaryOptions {
    /// Skip the point records. Faster, but the point section is omitted.
    pub header_only: bool,
    /// When set, the summary is also written to `<outdir>/<stem>.json`.
    pub outdir: Option<PathBuf>,
}

/// Reads, parses and interprets one LAS/LAZ data set.
#[derive(Debug)]
pub struct Laszy {
    pub file_basename: String,
    pub file_absolute: String,
    pub public_header_block: PublicHeaderBlock,
    pub vlrs: Vec<VariableLengthRecord>,
    pub evlrs: Vec<VariableLengthRecord>,
    points: Option<PointRecords>,
    origin: Origin,
}

pub fn is_lidar_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| LIDAR_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Record header bytes ahead of the payload length field.
const RECORD_LENGTH_OFFSET: u64 = 20;
const VLR_HEADER_LEN: u64 = 54;
const EVLR_HEADER_LEN: u64 = 60;

/// Read one (E)VLR at the current position, refusing records that run past `end`.
fn read_record<R: Read + Seek>(
    source: &mut R,
    extended: bool,
    end: u64,
) -> Result<VariableLengthRecord> {
    let start = source.stream_position()?;
    let kind = if extended { "EVLR" } else { "VLR" };
    let header_len = if extended { EVLR_HEADER_LEN } else { VLR_HEADER_LEN };
    let past_end = || LaszyError::CorruptHeader {
        message: format!("{} at byte {} runs past the end of the file ({} bytes)", kind, start, end),
    };
    if start.saturating_add(header_len) > end {
        return Err(past_end());
    }

    source.seek(SeekFrom::Start(start + RECORD_LENGTH_OFFSET))?;
    let data_len = if extended {
        let mut bytes = [0u8; 8];
        source.read_exact(&mut bytes)?;
        u64::from_le_bytes(bytes)
    } else {
        let mut bytes = [0u8; 2];
        source.read_exact(&mut bytes)?;
        u64::from(u16::from_le_bytes(bytes))
    };
    if start.saturating_add(header_len).saturating_add(data_len) > end {
        return Err(past_end());
    }

    source.seek(SeekFrom::Start(start))?;
    VariableLengthRecord::read_from(&mut *source, extended)
}

fn read_records<R: Read + Seek>(
    source: &mut R,
) -> Result<(PublicHeaderBlock, Vec<VariableLengthRecord>, Vec<VariableLengthRecord>)> {
    let end = source.seek(SeekFrom::End(0))?;
    source.seek(SeekFrom::Start(0))?;
    let header = PublicHeaderBlock::read_from(&mut *source)?;

    source.seek(SeekFrom::Start(u64::from(header.header_size)))?;
    let mut vlrs = Vec::new();
    for _ in 0..header.number_of_vlrs {
        vlrs.push(read_record(&mut *source, false, end)?);
    }

    let mut evlrs = Vec::new();
    if let Some(start) = header.start_of_first_evlr {
        if header.number_of_evlrs > 0 {
            source.seek(SeekFrom::Start(start))?;
            for _ in 0..header.number_of_evlrs {
                evlrs.push(read_record(&mut *source, true, end)?);
            }
        }
    }

    source.seek(SeekFrom::Start(0))?;
    Ok((header, vlrs, evlrs))
}

impl Laszy {
    /// Open a `.las`/`.laz` file, optionally decoding every point record.
    pub fn open<P: AsRef<Path>>(path: P, read_points: bool) -> Result<Self> {
        let path = path.as_ref();
        if !is_lidar_file(path) {
            return Err(LaszyError::NotLidarFile {
                path: path.display().to_string(),
            });
        }

        let mut source = BufReader::new(File::open(path)?);
        let (public_header_block, vlrs, evlrs) = read_records(&mut source)?;
        tracing::debug!(
            "Parsed header of {} (format {}, {} points, {} VLRs, {} EVLRs)",
            path.display(),
            public_header_block.point_data_format,
            public_header_block.point_count,
            vlrs.len(),
            evlrs.len()
        );

        let mut laszy = Self {
            file_basename: path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default(),
            file_absolute: path.display().to_string(),
            public_header_block,
            vlrs,
            evlrs,
            points: None,
            origin: Origin::Source(Box::new(source)),
        };

        if read_points {
            laszy.read_points()?;
        } else {
            // Reopen on demand rather than holding the handle.
            laszy.origin = Origin::Path(path.to_path_buf());
        }
        Ok(laszy)
    }

    /// Build from an already opened source, such as an in-memory buffer.
    /// The file name fields stay empty.
    pub fn from_source<R: LasSource + 'static>(mut source: R, read_points: bool) -> Result<Self> {
        let (public_header_block, vlrs, evlrs) = read_records(&mut source)?;
        let mut laszy = Self {
            file_basename: String::new(),
            file_absolute: String::new(),
            public_header_block,
            vlrs,
            evlrs,
            points: None,
            origin: Origin::Source(Box::new(source)),
        };
        if read_points {
            laszy.read_points()?;
        }
        Ok(laszy)
    }

    /// Assemble from parts that were decoded elsewhere.
    pub fn from_parts(
        public_header_block: PublicHeaderBlock,
        vlrs: Vec<VariableLengthRecord>,
        evlrs: Vec<VariableLengthRecord>,
        points: Option<Vec<PointRecord>>,
    ) -> Self {
        Self {
            file_basename: String::new(),
            file_absolute: String::new(),
            public_header_block,
            vlrs,
            evlrs,
            points: points.map(PointRecords::new),
            origin: Origin::Detached,
        }
    }

    /// Decode the point records if that has not happened yet.
    pub fn read_points(&mut self) -> Result<()> {
        if self.points.is_some() {
            return Ok(());
        }

        let source: Box<dyn LasSource> = match std::mem::replace(&mut self.origin, Origin::Detached) {
            Origin::Path(path) => {
                let file = File::open(&path)?;
                self.origin = Origin::Path(path);
                Box::new(BufReader::new(file))
            }
            Origin::Source(mut source) => {
                source.seek(SeekFrom::Start(0))?;
                source
            }
            Origin::Detached => return Err(LaszyError::PointsNotLoaded),
        };

        let points = PointRecords::decode(source).map_err(|e| {
            if self.public_header_block.is_compressed {
                LaszyError::Decompression {
                    path: self.file_absolute.clone(),
                    message: e.to_string(),
                }
            } else {
                LaszyError::LasError(e)
            }
        })?;

        self.points = Some(points);
        Ok(())
    }

    pub fn points(&self) -> Option<&PointRecords> {
        self.points.as_ref()
    }

    fn loaded_points(&self) -> Result<&PointRecords> {
        self.points.as_ref().ok_or(LaszyError::PointsNotLoaded)
    }

    /// Classes present in the point records.
    pub fn get_classes(&self) -> Result<Vec<u8>> {
        Ok(self.loaded_points()?.classes())
    }

    pub fn filter_points(&self, filter: &PointFilter) -> Result<Vec<&PointRecord>> {
        Ok(self.loaded_points()?.filter(filter))
    }

    /// Points per square unit over the header's X/Y extent.
    pub fn get_density(&self, filter: &PointFilter) -> Result<f64> {
        let (min_x, max_x) = self.get_x_minmax();
        let (min_y, max_y) = self.get_y_minmax();
        let area = (max_x - min_x) * (max_y - min_y);
        if !(area.is_finite() && area > 0.0) {
            return Err(LaszyError::DegenerateExtent {
                message: format!(
                    "X/Y extent [{}, {}] x [{}, {}] has no area",
                    min_x, max_x, min_y, max_y
                ),
            });
        }

        let count = self.loaded_points()?.count_matching(filter);
        Ok(count as f64 / area)
    }

    pub fn get_global_encoding(&self) -> GlobalEncoding {
        GlobalEncoding::from_bits(self.public_header_block.global_encoding)
    }

    pub fn global_encoding_value(&self) -> u16 {
        self.public_header_block.global_encoding
    }

    /// WKT from the VLRs, then the EVLRs; empty when neither has one.
    pub fn get_crs_info(&self) -> String {
        vlr::find_wkt(&self.vlrs)
            .or_else(|| vlr::find_wkt(&self.evlrs))
            .unwrap_or_default()
    }

    pub fn get_x_minmax(&self) -> (f64, f64) {
        (self.public_header_block.x_min, self.public_header_block.x_max)
    }

    pub fn get_y_minmax(&self) -> (f64, f64) {
        (self.public_header_block.y_min, self.public_header_block.y_max)
    }

    pub fn get_z_minmax(&self) -> (f64, f64) {
        (self.public_header_block.z_min, self.public_header_block.z_max)
    }

    pub fn get_guid_hex(&self) -> String {
        self.public_header_block.guid_hex()
    }

    pub fn get_guid_asc(&self) -> String {
        self.public_header_block.guid_asc()
    }

    pub fn get_gps_time_minmax(&self) -> Result<Option<(f64, f64)>> {
        Ok(self.loaded_points()?.gps_time_minmax())
    }

    pub fn get_point_source_id_minmax(&self) -> Result<Option<(u16, u16)>> {
        Ok(self.loaded_points()?.point_source_id_minmax())
    }

    /// `None` for point formats without a classification flags field.
    pub fn get_classification_flags(&self) -> Result<Option<ClassificationFlags>> {
        if self.public_header_block.point_data_format < FIRST_EXTENDED_POINT_FORMAT {
            return Ok(None);
        }
        Ok(Some(self.loaded_points()?.classification_flags()))
    }

    pub fn is_rgb_encoded(&self) -> bool {
        RGB_POINT_FORMATS.contains(&self.public_header_block.point_data_format)
    }

    pub fn get_version(&self) -> String {
        self.public_header_block.version()
    }

    pub fn get_wkt_boundingbox(&self) -> String {
        let (x_min, x_max) = self.get_x_minmax();
        let (y_min, y_max) = self.get_y_minmax();

        let p_ll = format!("{} {}", x_min, y_min);
        let p_ul = format!("{} {}", x_min, y_max);
        let p_ur = format!("{} {}", x_max, y_max);
        let p_lr = format!("{} {}", x_max, y_min);

        format!("POLYGON(({}, {}, {}, {}, {}))", p_ll, p_ul, p_ur, p_lr, p_ll)
    }

    fn records(&self, evlr: bool) -> &[VariableLengthRecord] {
        if evlr {
            &self.evlrs
        } else {
            &self.vlrs
        }
    }

    pub fn vlrs_have_wkt_crs(&self, evlr: bool) -> bool {
        vlr::has_wkt_crs(self.records(evlr))
    }

    pub fn vlrs_have_geotiff_crs(&self, evlr: bool) -> bool {
        vlr::has_geotiff_crs(self.records(evlr))
    }

    /// Summarize header, CRS, (E)VLRs and, unless `header_only`, the points.
    pub fn summarize(&mut self, options: &SummaryOptions) -> Result<LasSummary> {
        let point_records = if !options.header_only && self.public_header_block.point_count > 0 {
            self.read_points()?;
            Some(self.point_record_summary()?)
        } else {
            None
        };

        let summary = LasSummary {
            filename: self.file_basename.clone(),
            public_header_block: self.public_header_summary(),
            crs: WktCrsInfo::parse(&self.get_crs_info()),
            vlrs: VlrSection {
                vlr_count: self.public_header_block.number_of_vlrs,
                vlr_has_wkt_crs: self.vlrs_have_wkt_crs(false),
                vlr_has_geotiff_crs: self.vlrs_have_geotiff_crs(false),
                records: vlr::summarize_records(&self.vlrs),
            },
            point_records,
            evlrs: EvlrSection {
                evlr_count: self.public_header_block.number_of_evlrs,
                evlr_has_wkt_crs: self.vlrs_have_wkt_crs(true),
                evlr_has_geotiff_crs: self.vlrs_have_geotiff_crs(true),
                records: vlr::summarize_records(&self.evlrs),
            },
            rgb_encoding: self.is_rgb_encoded(),
            wkt_bbox: self.get_wkt_boundingbox(),
        };

        if let Some(outdir) = &options.outdir {
            if let Some(written) = self.write_summary_json(outdir, &summary)? {
                tracing::debug!("Summary written to {}", written.display());
            }
        }

        Ok(summary)
    }

    fn public_header_summary(&self) -> PublicHeaderSummary {
        let hdr = &self.public_header_block;
        let x_places = decimal_places(hdr.x_scale);
        let y_places = decimal_places(hdr.y_scale);
        let z_places = decimal_places(hdr.z_scale);

        PublicHeaderSummary {
            global_encoding: self.get_global_encoding(),
            guid_asc: self.get_guid_asc(),
            guid_hex: self.get_guid_hex(),
            file_source_id: hdr.file_source_id,
            system_id: hdr.system_identifier.clone(),
            generating_software: hdr.generating_software.clone(),
            creation_date: hdr.creation_date(),
            version: self.get_version(),
            point_data_format: hdr.point_data_format,
            point_count: hdr.point_count,
            x_min: round_to(hdr.x_min, x_places),
            x_max: round_to(hdr.x_max, x_places),
            y_min: round_to(hdr.y_min, y_places),
            y_max: round_to(hdr.y_max, y_places),
            z_min: round_to(hdr.z_min, z_places),
            z_max: round_to(hdr.z_max, z_places),
            x_scale: hdr.x_scale,
            y_scale: hdr.y_scale,
            z_scale: hdr.z_scale,
            x_offset: round_to(hdr.x_offset, x_places),
            y_offset: round_to(hdr.y_offset, y_places),
            z_offset: round_to(hdr.z_offset, z_places),
        }
    }

    fn point_record_summary(&self) -> Result<PointRecordSummary> {
        let gps = self.get_gps_time_minmax()?;
        let flightlines = self.get_point_source_id_minmax()?;

        Ok(PointRecordSummary {
            classes: self.get_classes()?,
            gps_time_min: gps.map(|(min, _)| min),
            gps_time_max: gps.map(|(_, max)| max),
            date_start: gps.map(|(min, _)| describe_gps_time(min)),
            date_end: gps.map(|(_, max)| describe_gps_time(max)),
            flightline_start: flightlines.map(|(min, _)| min),
            flightline_end: flightlines.map(|(_, max)| max),
            class_flags: self.get_classification_flags()?,
        })
    }

    /// Write `<outdir>/<stem>.json` unless it already exists. Returns the
    /// path when a file was written.
    pub fn write_summary_json(&self, outdir: &Path, summary: &LasSummary) -> Result<Option<PathBuf>> {
        std::fs::create_dir_all(outdir)?;
        let stem = Path::new(&self.file_basename)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| LaszyError::ProcessingError {
                message: "cannot name a summary file for data without a file name".to_string(),
            })?;
        let out_json = outdir.join(format!("{}.json", stem));

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&out_json) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!("Keeping existing summary {}", out_json.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        file.write_all(&to_pretty_json(summary)?)?;
        Ok(Some(out_json))
    }
}

/// JSON with four-space indentation.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}
