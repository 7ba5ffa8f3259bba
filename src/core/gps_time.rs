use chrono::{DateTime, NaiveDate};

/// Integer digits at or below which a GPS time is taken to be week time.
pub const GPS_WEEK_TIME_LENGTH: usize = 6;
pub const GPS_WEEK_SECONDS: f64 = 604_800.0;
pub const GPS_WEEK_TIME_ERR_STR: &str = "GpsDateConversionError";

/// Adjusted standard GPS time is GPS time minus this offset.
const ADJUSTED_STANDARD_OFFSET: f64 = 1.0e9;
/// Seconds between the Unix epoch and the GPS epoch (1980-01-06).
const GPS_EPOCH_UNIX: i64 = 315_964_800;

/// UTC dates on which GPS-UTC grew by one second, with the new offset.
const LEAP_SECONDS: [(i32, u32, i64); 18] = [
    (1981, 7, 1),
    (1982, 7, 2),
    (1983, 7, 3),
    (1985, 7, 4),
    (1988, 1, 5),
    (1990, 1, 6),
    (1991, 1, 7),
    (1992, 7, 8),
    (1993, 7, 9),
    (1994, 7, 10),
    (1996, 1, 11),
    (1997, 7, 12),
    (1999, 1, 13),
    (2006, 1, 14),
    (2009, 1, 15),
    (2012, 7, 16),
    (2015, 7, 17),
    (2017, 1, 18),
];

pub fn is_gps_week_time(gps_time: f64) -> bool {
    let integer_part = format!("{}", gps_time.trunc() as i64);
    integer_part.len() <= GPS_WEEK_TIME_LENGTH
}

fn leap_seconds_at(unix_without_leaps: i64) -> i64 {
    LEAP_SECONDS
        .iter()
        .filter_map(|&(year, month, offset)| {
            let effective = NaiveDate::from_ymd_opt(year, month, 1)?
                .and_hms_opt(0, 0, 0)?
                .and_utc()
                .timestamp();
            (unix_without_leaps >= effective + offset).then_some(offset)
        })
        .max()
        .unwrap_or(0)
}

/// Adjusted standard GPS time to `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn gps_to_utc_string(adjusted_gps_time: f64) -> Option<String> {
    if !adjusted_gps_time.is_finite() {
        return None;
    }
    let gps_seconds = (adjusted_gps_time + ADJUSTED_STANDARD_OFFSET).floor() as i64;
    let unix_without_leaps = gps_seconds + GPS_EPOCH_UNIX;
    let unix = unix_without_leaps - leap_seconds_at(unix_without_leaps);
    DateTime::from_timestamp(unix, 0).map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Date string for report columns; week time cannot be placed on a calendar.
pub fn describe_gps_time(gps_time: f64) -> String {
    if is_gps_week_time(gps_time) {
        return GPS_WEEK_TIME_ERR_STR.to_string();
    }
    gps_to_utc_string(gps_time).unwrap_or_else(|| GPS_WEEK_TIME_ERR_STR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_time_detection() {
        assert!(is_gps_week_time(604_799.99));
        assert!(is_gps_week_time(12.5));
        assert!(!is_gps_week_time(1_234_567.0));
        assert!(!is_gps_week_time(356_566_418.0));
    }

    #[test]
    fn test_adjusted_standard_zero() {
        assert_eq!(
            gps_to_utc_string(0.0).as_deref(),
            Some("2011-09-14 01:46:25")
        );
    }

    #[test]
    fn test_after_2017_leap_second() {
        assert_eq!(
            gps_to_utc_string(356_566_418.0).as_deref(),
            Some("2023-01-01 00:00:00")
        );
    }

    #[test]
    fn test_describe_week_time() {
        assert_eq!(describe_gps_time(4_000.0), GPS_WEEK_TIME_ERR_STR);
        assert_eq!(describe_gps_time(356_566_418.0), "2023-01-01 00:00:00");
    }
}
