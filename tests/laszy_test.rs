mod common;

use anyhow::Result;
use common::{
    default_points, write_bad_vlr_count, write_tile, write_tile_with_wkt, write_truncated_laz,
    WktRecord, COMPOUND_WKT, NEW_YEAR_2023,
};
use laszy::{Laszy, LaszyError, PointFilter, SummaryOptions};
use tempfile::TempDir;

#[test]
fn test_open_las_reads_header_and_points() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_tile(&temp_dir.path().join("12345_tile.las"), 12345, &default_points())?;

    let las = Laszy::open(&path, true)?;
    assert_eq!(las.file_basename, "12345_tile.las");
    assert_eq!(las.get_version(), "1.4");
    assert_eq!(las.public_header_block.point_data_format, 6);
    assert_eq!(las.public_header_block.point_count, 3);
    assert_eq!(las.global_encoding_value(), 17);
    assert_eq!(las.get_guid_asc(), "AAAABBCCDDEEFFFF");
    assert_eq!(las.get_x_minmax(), (500_000.0, 500_010.0));
    assert_eq!(las.get_classes()?, vec![1, 2]);
    assert_eq!(las.get_gps_time_minmax()?, Some((NEW_YEAR_2023, NEW_YEAR_2023 + 2.0)));
    assert_eq!(las.get_point_source_id_minmax()?, Some((1, 4)));
    assert!(las.vlrs_have_wkt_crs(false));
    assert!(!las.vlrs_have_geotiff_crs(false));
    assert!(!las.is_rgb_encoded());

    // 10 x 20 extent
    let density = las.get_density(&PointFilter::class(2))?;
    assert!((density - 2.0 / 200.0).abs() < 1e-9);

    Ok(())
}

#[test]
fn test_points_read_lazily() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_tile(&temp_dir.path().join("tile.las"), 1, &default_points())?;

    let mut las = Laszy::open(&path, false)?;
    assert!(las.points().is_none());
    assert!(matches!(las.get_classes(), Err(LaszyError::PointsNotLoaded)));

    las.read_points()?;
    assert_eq!(las.points().map(|p| p.len()), Some(3));
    Ok(())
}

#[test]
fn test_laz_summary_matches_las() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let las_path = write_tile(&temp_dir.path().join("tile.las"), 7, &default_points())?;
    let laz_path = write_tile(&temp_dir.path().join("tile.laz"), 7, &default_points())?;

    let options = SummaryOptions::default();
    let from_las = Laszy::open(&las_path, true)?.summarize(&options)?;
    let from_laz = Laszy::open(&laz_path, true)?.summarize(&options)?;

    assert_eq!(from_las.point_records, from_laz.point_records);
    assert_eq!(from_las.crs, from_laz.crs);
    assert_eq!(from_laz.crs.vert_datum, "Canadian Geodetic Vertical Datum of 2013");
    assert_eq!(from_laz.crs.compd_cs, "NAD83(CSRS) / UTM zone 10N + CGVD2013 height");

    let records = from_laz.point_records.expect("point records");
    assert_eq!(records.date_start.as_deref(), Some("2023-01-01 00:00:00"));
    assert_eq!(records.date_end.as_deref(), Some("2023-01-01 00:00:02"));
    assert_eq!(records.flightline_start, Some(1));
    assert_eq!(records.flightline_end, Some(4));
    assert!(records.class_flags.is_some());
    Ok(())
}

#[test]
fn test_truncated_laz_reports_decompression_failure() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_truncated_laz(&temp_dir.path().join("broken.laz"))?;

    let mut las = Laszy::open(&path, false)?;
    assert!(las.public_header_block.is_compressed);
    assert!(matches!(
        las.read_points(),
        Err(LaszyError::Decompression { .. })
    ));
    Ok(())
}

#[test]
fn test_vlr_count_past_end_of_file_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_bad_vlr_count(&temp_dir.path().join("tile.las"))?;

    let err = Laszy::open(&path, false).unwrap_err();
    assert!(matches!(err, LaszyError::CorruptHeader { .. }));
    Ok(())
}

#[test]
fn test_wkt_read_from_evlr() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_tile_with_wkt(
        &temp_dir.path().join("tile.las"),
        1,
        &default_points(),
        WktRecord::Evlr,
    )?;

    let mut las = Laszy::open(&path, false)?;
    assert!(las.vlrs.is_empty());
    assert_eq!(las.evlrs.len(), 1);
    assert!(!las.vlrs_have_wkt_crs(false));
    assert!(las.vlrs_have_wkt_crs(true));
    assert_eq!(las.get_crs_info(), COMPOUND_WKT);

    let summary = las.summarize(&SummaryOptions::default())?;
    assert!(!summary.vlrs.vlr_has_wkt_crs);
    assert!(summary.evlrs.evlr_has_wkt_crs);
    assert_eq!(summary.crs.vert_datum, "Canadian Geodetic Vertical Datum of 2013");
    assert_eq!(summary.crs.projection, "Transverse_Mercator");
    Ok(())
}

#[test]
fn test_summary_json_written_once() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_tile(&temp_dir.path().join("tile.las"), 1, &default_points())?;
    let outdir = temp_dir.path().join("json");

    let options = SummaryOptions {
        header_only: true,
        outdir: Some(outdir.clone()),
    };
    let summary = Laszy::open(&path, false)?.summarize(&options)?;
    assert!(summary.point_records.is_none());

    let json_path = outdir.join("tile.json");
    let written = std::fs::read_to_string(&json_path)?;
    let parsed: laszy::LasSummary = serde_json::from_str(&written)?;
    assert_eq!(parsed, summary);

    // Existing summaries are kept as they are.
    std::fs::write(&json_path, "{}")?;
    Laszy::open(&path, false)?.summarize(&options)?;
    assert_eq!(std::fs::read_to_string(&json_path)?, "{}");
    Ok(())
}

#[test]
fn test_in_memory_source() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_tile(&temp_dir.path().join("tile.las"), 1, &default_points())?;
    let bytes = std::fs::read(path)?;

    let las = Laszy::from_source(std::io::Cursor::new(bytes), true)?;
    assert!(las.file_basename.is_empty());
    assert_eq!(las.filter_points(&PointFilter::ALL)?.len(), 3);
    Ok(())
}
