#[cfg(feature = "cli")]
pub mod cli;
pub mod report_options;
pub mod storage;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};
pub use report_options::ReportOptions;
pub use storage::LocalStorage;
pub use toml_config::LaszyConfig;
