#![allow(dead_code)]

use anyhow::Result;
use las::point::{Classification, Format};
use las::{Builder, GpsTimeType, Point, Transform, Vector, Vlr, Writer};
use std::path::{Path, PathBuf};

pub const COMPOUND_WKT: &str = r#"COMPD_CS["NAD83(CSRS) / UTM zone 10N + CGVD2013 height",PROJCS["NAD83(CSRS) / UTM zone 10N",GEOGCS["NAD83(CSRS)",DATUM["NAD83_Canadian_Spatial_Reference_System",SPHEROID["GRS 1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["central_meridian",-123],UNIT["metre",1]],VERT_CS["CGVD2013 height",VERT_DATUM["Canadian Geodetic Vertical Datum of 2013",2005],UNIT["metre",1]]]"#;

/// Text GUID that reads the same whichever field byte order is applied.
pub const CONTRACT_GUID: &[u8; 16] = b"AAAABBCCDDEEFFFF";

/// 2023-01-01 00:00:00 UTC as adjusted standard GPS time.
pub const NEW_YEAR_2023: f64 = 356_566_418.0;

#[derive(Debug, Clone, Copy)]
pub struct TilePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub classification: u8,
    pub point_source_id: u16,
    pub gps_time: f64,
}

pub fn default_points() -> Vec<TilePoint> {
    vec![
        TilePoint {
            x: 500_000.0,
            y: 5_400_000.0,
            z: 10.0,
            classification: 2,
            point_source_id: 1,
            gps_time: NEW_YEAR_2023,
        },
        TilePoint {
            x: 500_010.0,
            y: 5_400_020.0,
            z: 30.0,
            classification: 1,
            point_source_id: 4,
            gps_time: NEW_YEAR_2023 + 2.0,
        },
        TilePoint {
            x: 500_005.0,
            y: 5_400_010.0,
            z: 20.0,
            classification: 2,
            point_source_id: 2,
            gps_time: NEW_YEAR_2023 + 1.0,
        },
    ]
}

/// Where a tile keeps its OGC WKT record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WktRecord {
    Vlr,
    Evlr,
}

/// Write a LAS 1.4 point format 6 tile; `.laz` paths are compressed.
pub fn write_tile(path: &Path, file_source_id: u16, points: &[TilePoint]) -> Result<PathBuf> {
    write_tile_with_wkt(path, file_source_id, points, WktRecord::Vlr)
}

pub fn write_tile_with_wkt(
    path: &Path,
    file_source_id: u16,
    points: &[TilePoint],
    wkt: WktRecord,
) -> Result<PathBuf> {
    let mut builder = Builder::from((1, 4));
    builder.point_format = Format::new(6)?;
    builder.file_source_id = file_source_id;
    builder.guid = uuid::Uuid::from_bytes(*CONTRACT_GUID);
    builder.system_identifier = "ALS70".to_string();
    builder.generating_software = "laszy tests".to_string();
    builder.date = chrono::NaiveDate::from_ymd_opt(2023, 2, 1);
    builder.gps_time_type = GpsTimeType::Standard;
    builder.has_wkt_crs = true;
    builder.transforms = Vector {
        x: Transform {
            scale: 0.01,
            offset: 500_000.0,
        },
        y: Transform {
            scale: 0.01,
            offset: 5_400_000.0,
        },
        z: Transform {
            scale: 0.01,
            offset: 0.0,
        },
    };
    let record = Vlr {
        user_id: "LASF_Projection".to_string(),
        record_id: 2112,
        description: "OGC WKT".to_string(),
        data: COMPOUND_WKT.as_bytes().to_vec(),
    };
    match wkt {
        WktRecord::Vlr => builder.vlrs.push(record),
        WktRecord::Evlr => builder.evlrs.push(record),
    }

    let mut writer = Writer::from_path(path, builder.into_header()?)?;
    for p in points {
        writer.write_point(Point {
            x: p.x,
            y: p.y,
            z: p.z,
            intensity: 100,
            return_number: 1,
            number_of_returns: 1,
            classification: Classification::new(p.classification)?,
            point_source_id: p.point_source_id,
            gps_time: Some(p.gps_time),
            ..Default::default()
        })?;
    }
    writer.close()?;
    Ok(path.to_path_buf())
}

/// A LAZ tile cut off shortly after the start of its point data.
pub fn write_truncated_laz(path: &Path) -> Result<PathBuf> {
    write_tile(path, 3, &default_points())?;
    let header = laszy::core::header::PublicHeaderBlock::read_from(std::fs::File::open(path)?)?;
    let file = std::fs::OpenOptions::new().write(true).open(path)?;
    file.set_len(u64::from(header.offset_to_point_data) + 12)?;
    Ok(path.to_path_buf())
}

/// A tile whose header claims `u32::MAX` VLRs.
pub fn write_bad_vlr_count(path: &Path) -> Result<PathBuf> {
    use std::io::{Seek, SeekFrom, Write};

    write_tile(path, 5, &default_points())?;
    let mut file = std::fs::OpenOptions::new().write(true).open(path)?;
    file.seek(SeekFrom::Start(100))?;
    file.write_all(&u32::MAX.to_le_bytes())?;
    Ok(path.to_path_buf())
}

pub fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
