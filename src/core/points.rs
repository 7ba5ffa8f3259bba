use crate::domain::model::ClassificationFlags;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::io::{Read, Seek};

/// The per-point attributes laszy reports on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub intensity: u16,
    pub return_number: u8,
    pub number_of_returns: u8,
    pub classification: u8,
    pub is_synthetic: bool,
    pub is_key_point: bool,
    pub is_withheld: bool,
    pub is_overlap: bool,
    pub point_source_id: u16,
    pub gps_time: Option<f64>,
}

impl Default for PointRecord {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            intensity: 0,
            return_number: 1,
            number_of_returns: 1,
            classification: 0,
            is_synthetic: false,
            is_key_point: false,
            is_withheld: false,
            is_overlap: false,
            point_source_id: 0,
            gps_time: None,
        }
    }
}

impl From<&las::Point> for PointRecord {
    fn from(point: &las::Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
            z: point.z,
            intensity: point.intensity,
            return_number: point.return_number,
            number_of_returns: point.number_of_returns,
            classification: u8::from(point.classification),
            is_synthetic: point.is_synthetic,
            is_key_point: point.is_key_point,
            is_withheld: point.is_withheld,
            is_overlap: point.is_overlap,
            point_source_id: point.point_source_id,
            gps_time: point.gps_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassFilter {
    Any,
    Class(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnFilter {
    Any,
    /// Return number equals the number of returns of the pulse.
    Last,
    Number(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointFilter {
    pub class: ClassFilter,
    pub returns: ReturnFilter,
}

impl PointFilter {
    pub const LAST_RETURN: i32 = 0;
    pub const IGNORE: i32 = -1;

    pub const ALL: PointFilter = PointFilter {
        class: ClassFilter::Any,
        returns: ReturnFilter::Any,
    };

    pub fn class(class: u8) -> Self {
        Self {
            class: ClassFilter::Class(class),
            returns: ReturnFilter::Any,
        }
    }

    pub fn last_return() -> Self {
        Self {
            class: ClassFilter::Any,
            returns: ReturnFilter::Last,
        }
    }

    pub fn with_returns(mut self, returns: ReturnFilter) -> Self {
        self.returns = returns;
        self
    }

    /// Integer codes: a return number of 0 selects last returns, and any
    /// negative class or return number disables that filter.
    pub fn from_codes(class_num: i32, return_num: i32) -> Self {
        let class = match u8::try_from(class_num) {
            Ok(class) => ClassFilter::Class(class),
            Err(_) if class_num < 0 => ClassFilter::Any,
            Err(_) => ClassFilter::Class(u8::MAX),
        };
        let returns = match return_num {
            n if n < 0 => ReturnFilter::Any,
            Self::LAST_RETURN => ReturnFilter::Last,
            n => ReturnFilter::Number(u8::try_from(n).unwrap_or(u8::MAX)),
        };
        Self { class, returns }
    }

    pub fn matches(&self, point: &PointRecord) -> bool {
        let class_ok = match self.class {
            ClassFilter::Any => true,
            ClassFilter::Class(class) => point.classification == class,
        };
        let return_ok = match self.returns {
            ReturnFilter::Any => true,
            ReturnFilter::Last => point.return_number == point.number_of_returns,
            ReturnFilter::Number(n) => point.return_number == n,
        };
        class_ok && return_ok
    }
}

impl Default for PointFilter {
    fn default() -> Self {
        Self::ALL
    }
}

/// Decoded point records of one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointRecords {
    points: Vec<PointRecord>,
}

impl PointRecords {
    pub fn new(points: Vec<PointRecord>) -> Self {
        Self { points }
    }

    /// Decode every point from a LAS/LAZ stream positioned at its start.
    pub fn decode<R>(source: R) -> las::Result<Self>
    where
        R: Read + Seek + Send + Sync + Debug + 'static,
    {
        let mut reader = las::Reader::new(source)?;
        let expected = reader.header().number_of_points();
        // The header count is not trusted for allocation.
        let mut points = Vec::new();
        for point in reader.points() {
            points.push(PointRecord::from(&point?));
        }
        tracing::debug!("Decoded {} of {} point records", points.len(), expected);
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PointRecord> {
        self.points.iter()
    }

    pub fn filter(&self, filter: &PointFilter) -> Vec<&PointRecord> {
        self.points.iter().filter(|p| filter.matches(p)).collect()
    }

    pub fn count_matching(&self, filter: &PointFilter) -> usize {
        self.points.iter().filter(|p| filter.matches(p)).count()
    }

    /// Sorted, unique classification codes.
    pub fn classes(&self) -> Vec<u8> {
        self.points
            .iter()
            .map(|p| p.classification)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// `None` when no point carries a GPS time.
    pub fn gps_time_minmax(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .filter_map(|p| p.gps_time)
            .fold(None, |acc, t| match acc {
                None => Some((t, t)),
                Some((min, max)) => Some((min.min(t), max.max(t))),
            })
    }

    pub fn point_source_id_minmax(&self) -> Option<(u16, u16)> {
        let min = self.points.iter().map(|p| p.point_source_id).min()?;
        let max = self.points.iter().map(|p| p.point_source_id).max()?;
        Some((min, max))
    }

    pub fn classification_flags(&self) -> ClassificationFlags {
        self.points
            .iter()
            .fold(ClassificationFlags::default(), |flags, p| ClassificationFlags {
                has_synthetic: flags.has_synthetic || p.is_synthetic,
                has_keypoint: flags.has_keypoint || p.is_key_point,
                has_withheld: flags.has_withheld || p.is_withheld,
                has_overlap: flags.has_overlap || p.is_overlap,
            })
    }
}

impl From<Vec<PointRecord>> for PointRecords {
    fn from(points: Vec<PointRecord>) -> Self {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(classification: u8, return_number: u8, number_of_returns: u8) -> PointRecord {
        PointRecord {
            classification,
            return_number,
            number_of_returns,
            ..Default::default()
        }
    }

    #[test]
    fn test_from_codes() {
        assert_eq!(PointFilter::from_codes(-1, -1), PointFilter::ALL);
        assert_eq!(PointFilter::from_codes(2, 0).returns, ReturnFilter::Last);
        assert_eq!(PointFilter::from_codes(2, 0).class, ClassFilter::Class(2));
        assert_eq!(PointFilter::from_codes(-5, 3).returns, ReturnFilter::Number(3));
    }

    #[test]
    fn test_combined_filter() {
        let records = PointRecords::new(vec![
            point(2, 1, 1),
            point(2, 1, 2),
            point(2, 2, 2),
            point(5, 2, 2),
        ]);

        assert_eq!(records.filter(&PointFilter::ALL).len(), 4);
        assert_eq!(records.count_matching(&PointFilter::class(2)), 3);
        assert_eq!(records.count_matching(&PointFilter::last_return()), 3);
        assert_eq!(records.count_matching(&PointFilter::from_codes(2, 0)), 2);
        assert_eq!(records.count_matching(&PointFilter::from_codes(-1, 2)), 2);
        let first_ground = PointFilter::class(2).with_returns(ReturnFilter::Number(1));
        assert_eq!(records.count_matching(&first_ground), 2);
    }

    #[test]
    fn test_reductions() {
        let mut a = point(6, 1, 1);
        a.gps_time = Some(350_000_000.5);
        a.point_source_id = 12;
        let mut b = point(2, 1, 1);
        b.gps_time = Some(349_999_000.0);
        b.point_source_id = 3;
        b.is_overlap = true;
        let records = PointRecords::new(vec![a, b]);

        assert_eq!(records.classes(), vec![2, 6]);
        assert_eq!(records.gps_time_minmax(), Some((349_999_000.0, 350_000_000.5)));
        assert_eq!(records.point_source_id_minmax(), Some((3, 12)));
        let flags = records.classification_flags();
        assert!(flags.has_overlap);
        assert!(!flags.has_synthetic);
    }

    #[test]
    fn test_empty_records() {
        let records = PointRecords::default();
        assert!(records.gps_time_minmax().is_none());
        assert!(records.point_source_id_minmax().is_none());
        assert!(records.classes().is_empty());
    }
}
