use crate::core::laszy::{Laszy, SummaryOptions};
use crate::core::report::{
    name_root, report_file_name, summary_row, ReportColumns, ReportInputs, CORRUPT_FILE_MSG,
    JSON_LOG_NAME, LIDAR_LOG_NAME, SUMMARY_JSON_DIR,
};
use crate::core::report_validation::ReportValidator;
use crate::domain::model::{InputKind, LasSummary, ReportBatch, SummaryOutcome};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{LaszyError, Result};
use crate::utils::progress::file_progress;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Summarizes report inputs and writes the CSV report with its logs.
pub struct ReportPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    inputs: ReportInputs,
}

impl<S: Storage, C: ConfigProvider> ReportPipeline<S, C> {
    pub fn new(storage: S, config: C, inputs: ReportInputs) -> Self {
        Self {
            storage,
            config,
            inputs,
        }
    }

    fn report_name(&self) -> String {
        report_file_name(self.config.report_name())
    }

    fn exceptions_log_name(&self) -> String {
        format!("{}_exceptions.log", self.report_name())
    }

    async fn read_log(&self, name: &str) -> Result<Vec<String>> {
        if !self.storage.exists(name).await {
            return Ok(Vec::new());
        }
        let data = self.storage.read_file(name).await?;
        Ok(String::from_utf8_lossy(&data)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    /// Previous entries first, then new ones not already listed.
    async fn append_log(&self, name: &str, completed: &[String]) -> Result<()> {
        if completed.is_empty() {
            return Ok(());
        }
        let mut entries = self.read_log(name).await?;
        for file in completed {
            if !entries.contains(file) {
                entries.push(file.clone());
            }
        }
        let mut content = entries.join("\n");
        content.push('\n');
        self.storage.write_file(name, content.as_bytes()).await
    }

    /// Inputs left to summarize once summary JSON and completed logs are accounted for.
    async fn pending_inputs(&self) -> Result<ReportInputs> {
        let mut inputs = self.inputs.clone();
        let check_logs = self.config.check_logs();

        let (done_lidar, done_json) = if check_logs {
            (
                self.read_log(LIDAR_LOG_NAME).await?,
                self.read_log(JSON_LOG_NAME).await?,
            )
        } else {
            (Vec::new(), Vec::new())
        };

        // Summaries of files whose rows are already in the report are not reused.
        let reported: Vec<String> = done_lidar.iter().map(|f| name_root(f)).collect();
        let summaries: Vec<String> = self
            .storage
            .list_files(SUMMARY_JSON_DIR, "json")
            .await?
            .into_iter()
            .filter(|summary| !reported.contains(&name_root(summary)))
            .collect();
        inputs.merge_summaries(summaries);

        if check_logs {
            let before = inputs.lidar.len() + inputs.json.len();
            inputs.lidar.retain(|file| !done_lidar.contains(file));
            inputs.json.retain(|file| !done_json.contains(file));
            let skipped = before - inputs.lidar.len() - inputs.json.len();
            if skipped > 0 {
                tracing::info!("⏭️ Skipping {} input(s) listed in completed logs", skipped);
            }
        }

        Ok(inputs)
    }
}

/// Summarize LAS/LAZ files on a worker pool, keeping input order.
fn summarize_lidar(
    files: Vec<String>,
    json_outdir: Option<PathBuf>,
    jobs: usize,
    verbose: bool,
) -> Result<Vec<SummaryOutcome>> {
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .map_err(|e| LaszyError::ProcessingError {
            message: format!("Failed to start worker pool: {}", e),
        })?;

    let pb = file_progress(files.len(), "Processing LAS/LAZ files...", verbose);
    let outcomes: Vec<SummaryOutcome> = pool.install(|| {
        files
            .par_iter()
            .map(|file| {
                let outcome = summarize_lidar_file(file, json_outdir.as_deref());
                pb.inc(1);
                outcome
            })
            .collect()
    });
    pb.finish_and_clear();

    Ok(outcomes)
}

fn summarize_lidar_file(file: &str, json_outdir: Option<&Path>) -> SummaryOutcome {
    let options = SummaryOptions {
        header_only: false,
        outdir: json_outdir.map(Path::to_path_buf),
    };
    let result = Laszy::open(file, true)
        .and_then(|mut las| las.summarize(&options))
        .map_err(|e| match e {
            LaszyError::Decompression { .. } => CORRUPT_FILE_MSG.to_string(),
            other => other.to_string(),
        });

    if let Err(message) = &result {
        tracing::warn!("Skipping {}: {}", file, message);
    }
    SummaryOutcome {
        source: file.to_string(),
        kind: InputKind::Lidar,
        result,
    }
}

async fn summarize_json_file(file: &str) -> SummaryOutcome {
    let result = match tokio::fs::read_to_string(file).await {
        Ok(content) => serde_json::from_str::<LasSummary>(&content).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    if let Err(message) = &result {
        tracing::warn!("Skipping {}: {}", file, message);
    }
    SummaryOutcome {
        source: file.to_string(),
        kind: InputKind::Json,
        result,
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ReportPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<SummaryOutcome>> {
        let inputs = self.pending_inputs().await?;
        tracing::debug!(
            "📥 {} LAS/LAZ file(s) and {} summary JSON file(s) to read",
            inputs.lidar.len(),
            inputs.json.len()
        );

        let json_outdir = self
            .config
            .to_json()
            .then(|| Path::new(self.config.output_dir()).join(SUMMARY_JSON_DIR));
        let jobs = self.config.jobs();
        let verbose = self.config.verbose();
        let lidar = inputs.lidar;

        let mut outcomes = tokio::task::spawn_blocking(move || {
            summarize_lidar(lidar, json_outdir, jobs, verbose)
        })
        .await
        .map_err(|e| LaszyError::ProcessingError {
            message: format!("Summary worker failed: {}", e),
        })??;

        let pb = file_progress(inputs.json.len(), "Processing JSON files...", verbose);
        for file in &inputs.json {
            outcomes.push(summarize_json_file(file).await);
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(outcomes)
    }

    async fn transform(&self, data: Vec<SummaryOutcome>) -> Result<ReportBatch> {
        let mut batch = ReportBatch::default();

        for outcome in data {
            match outcome.result {
                Ok(summary) => {
                    batch.rows.push(summary_row(&summary));
                    match outcome.kind {
                        InputKind::Lidar => batch.completed_lidar.push(outcome.source),
                        InputKind::Json => batch.completed_json.push(outcome.source),
                    }
                }
                Err(message) => batch.errors.push((outcome.source, message)),
            }
        }

        Ok(batch)
    }

    async fn load(&self, batch: ReportBatch) -> Result<String> {
        let report_name = self.report_name();

        // With completed logs in play, previous rows are kept and new ones appended.
        let mut data = if self.config.check_logs() && self.storage.exists(&report_name).await {
            self.storage.read_file(&report_name).await?
        } else {
            Vec::new()
        };
        if !data.is_empty() && !data.ends_with(b"\n") {
            data.push(b'\n');
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        if data.is_empty() {
            writer.write_record(ReportColumns::all())?;
        }
        for row in &batch.rows {
            writer.write_record(row)?;
        }
        let body = writer.into_inner().map_err(|e| LaszyError::ProcessingError {
            message: format!("Failed to finish report: {}", e),
        })?;
        data.extend_from_slice(&body);

        tracing::debug!("Writing {} row(s) to {}", batch.rows.len(), report_name);
        self.storage.write_file(&report_name, &data).await?;
        let report_path = Path::new(self.config.output_dir()).join(&report_name);

        self.append_log(LIDAR_LOG_NAME, &batch.completed_lidar).await?;
        self.append_log(JSON_LOG_NAME, &batch.completed_json).await?;

        // The exceptions log only ever describes the latest run.
        let log_name = self.exceptions_log_name();
        if batch.errors.is_empty() {
            self.storage.remove_file(&log_name).await?;
        } else {
            let log: String = batch
                .errors
                .iter()
                .map(|(file, message)| format!("{}\n\t{}\n", file, message))
                .collect();
            self.storage.write_file(&log_name, log.as_bytes()).await?;
            tracing::warn!(
                "⚠️ {} input(s) failed, see {}",
                batch.errors.len(),
                Path::new(self.config.output_dir()).join(&log_name).display()
            );
        }

        if self.config.validate_report() {
            let validator = ReportValidator::new(self.config.validation_rules().clone())?;
            let outcome = validator.validate_report(&report_path, None)?;
            if outcome.is_clean() {
                tracing::info!("✅ Report passed validation");
            }
        }

        Ok(report_path.display().to_string())
    }
}
