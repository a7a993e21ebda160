use crate::app::pipelines::{CustomerGroupPointsPipeline, CustomerPointsPipeline};
use crate::core::pipeline_sequence::{PipelineResult, PipelineSequence};
use crate::core::stage_io::{join_path, prepare_output_dir, SUCCESS_MARKER};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

pub const RUN_SUMMARY_FILE: &str = "_run_summary.json";

/// Outcome of a successful two-stage run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub execution_id: String,
    pub started_at: DateTime<Utc>,
    pub stages: Vec<PipelineResult>,
    pub total_duration_ms: u64,
    #[serde(skip)]
    pub summary_path: String,
}

impl RunReport {
    pub fn final_output(&self) -> Option<&str> {
        self.stages.last().map(|stage| stage.output_path.as_str())
    }
}

pub fn default_execution_id() -> String {
    format!("run_{}", Utc::now().format("%Y%m%d_%H%M%S"))
}

/// Runs customer-points, then customer-group-points, as one all-or-nothing job.
pub struct EtlEngine<S, C> {
    storage: S,
    config: C,
    execution_id: String,
    monitor_enabled: bool,
}

impl<S, C> EtlEngine<S, C>
where
    S: Storage + Clone + 'static,
    C: ConfigProvider + Clone + 'static,
{
    pub fn new(storage: S, config: C, execution_id: String) -> Self {
        Self::new_with_monitoring(storage, config, execution_id, false)
    }

    pub fn new_with_monitoring(
        storage: S,
        config: C,
        execution_id: String,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            storage,
            config,
            execution_id,
            monitor_enabled,
        }
    }

    /// The ordered two-node task graph: totals first, tiers after.
    pub fn build_sequence(&self) -> PipelineSequence {
        let mut sequence =
            PipelineSequence::new(self.execution_id.clone()).with_monitoring(self.monitor_enabled);
        sequence.add_pipeline(Box::new(CustomerPointsPipeline::new(
            self.storage.clone(),
            self.config.clone(),
        )));
        sequence.add_pipeline(Box::new(CustomerGroupPointsPipeline::new(
            self.storage.clone(),
            self.config.clone(),
        )));
        sequence
    }

    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        let start_time = Instant::now();
        tracing::info!("🚀 Starting run {}", self.execution_id);

        let overwrite = self.config.overwrite();
        prepare_output_dir(&self.storage, self.config.intermediate_dir(), overwrite).await?;
        prepare_output_dir(&self.storage, self.config.final_dir(), overwrite).await?;

        let sequence = self.build_sequence();
        let stages = match sequence.execute_all().await {
            Ok(stages) => stages,
            Err(e) => {
                self.invalidate_outputs().await;
                return Err(e);
            }
        };
        tracing::debug!(
            "Execution summary: {}",
            PipelineSequence::get_execution_summary(&stages)
        );

        let summary_path = join_path(self.config.final_dir(), RUN_SUMMARY_FILE);
        let report = RunReport {
            execution_id: self.execution_id.clone(),
            started_at,
            stages,
            total_duration_ms: start_time.elapsed().as_millis() as u64,
            summary_path: summary_path.clone(),
        };

        let summary = serde_json::to_vec_pretty(&report)?;
        self.storage.write_file(&summary_path, &summary).await?;
        tracing::info!(
            "🏁 Run {} finished in {} ms",
            report.execution_id,
            report.total_duration_ms
        );

        Ok(report)
    }

    /// Drops the success markers so no stage of a failed run looks complete.
    async fn invalidate_outputs(&self) {
        for dir in [self.config.intermediate_dir(), self.config.final_dir()] {
            let marker = join_path(dir, SUCCESS_MARKER);
            if let Err(e) = self.storage.remove_file(&marker).await {
                tracing::warn!("Could not remove {}: {}", marker, e);
            }
        }
    }
}
