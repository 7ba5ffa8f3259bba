pub mod crs;
pub mod engine;
pub mod gps_time;
pub mod header;
pub mod laszy;
pub mod points;
pub mod report;
pub mod report_validation;
pub mod vlr;

pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
