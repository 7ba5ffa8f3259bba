pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{LaszyConfig, LocalStorage, ReportOptions};

pub use app::pipelines::ReportPipeline;
pub use core::engine::ReportEngine;
pub use core::laszy::{Laszy, SummaryOptions};
pub use core::points::{PointFilter, ReturnFilter};
pub use core::report::{LaszyReport, ReportInputs};
pub use core::report_validation::{ReportValidator, ValidationOutcome};
pub use domain::model::{LasSummary, ValidationRules};
pub use utils::error::{LaszyError, Result};
