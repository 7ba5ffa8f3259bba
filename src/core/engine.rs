use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::{ReportPhase, SystemMonitor};

/// Runs a pipeline's extract, transform and load phases in order.
pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitoring: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitoring),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting report");
        self.monitor.phase(ReportPhase::Start, 0);

        let outcomes = self.pipeline.extract().await?;
        let inputs = outcomes.len();
        tracing::info!("📥 Summarized {} input(s)", inputs);
        self.monitor.phase(ReportPhase::Summarize, inputs);

        let batch = self.pipeline.transform(outcomes).await?;
        tracing::info!(
            "🔄 {} row(s) ready, {} input(s) failed",
            batch.rows.len(),
            batch.errors.len()
        );
        self.monitor.phase(ReportPhase::BuildRows, inputs);

        let rows = batch.rows.len();
        let output_path = self.pipeline.load(batch).await?;
        tracing::info!("💾 Report saved to: {}", output_path);
        self.monitor.phase(ReportPhase::WriteReport, inputs);
        self.monitor.finish(rows);

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{InputKind, ReportBatch, SummaryOutcome};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingPipeline {
        phases: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl Pipeline for RecordingPipeline {
        async fn extract(&self) -> Result<Vec<SummaryOutcome>> {
            self.phases.lock().unwrap().push("extract");
            Ok(vec![SummaryOutcome {
                source: "broken.laz".to_string(),
                kind: InputKind::Lidar,
                result: Err("bad".to_string()),
            }])
        }

        async fn transform(&self, data: Vec<SummaryOutcome>) -> Result<ReportBatch> {
            self.phases.lock().unwrap().push("transform");
            Ok(ReportBatch {
                errors: data
                    .into_iter()
                    .filter_map(|o| o.result.err().map(|e| (o.source, e)))
                    .collect(),
                ..Default::default()
            })
        }

        async fn load(&self, batch: ReportBatch) -> Result<String> {
            self.phases.lock().unwrap().push("load");
            Ok(format!("{} error(s)", batch.errors.len()))
        }
    }

    #[tokio::test]
    async fn test_phases_run_in_order() {
        let engine = ReportEngine::new(RecordingPipeline {
            phases: Mutex::new(Vec::new()),
        });

        let output = engine.run().await.unwrap();
        assert_eq!(output, "1 error(s)");
        assert_eq!(
            *engine.pipeline.phases.lock().unwrap(),
            vec!["extract", "transform", "load"]
        );
    }
}
