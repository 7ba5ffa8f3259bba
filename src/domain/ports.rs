use crate::domain::model::{ReportBatch, SummaryOutcome, ValidationRules};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
    /// Remove a file; a missing file is not an error.
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Files directly under `dir` with the given extension, sorted by name.
    fn list_files(
        &self,
        dir: &str,
        extension: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_dir(&self) -> &str;
    fn report_name(&self) -> &str;
    fn to_json(&self) -> bool;
    fn check_logs(&self) -> bool;
    fn validate_report(&self) -> bool;
    fn verbose(&self) -> bool;
    fn jobs(&self) -> usize;
    fn validation_rules(&self) -> &ValidationRules;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SummaryOutcome>>;
    async fn transform(&self, data: Vec<SummaryOutcome>) -> Result<ReportBatch>;
    async fn load(&self, batch: ReportBatch) -> Result<String>;
}
