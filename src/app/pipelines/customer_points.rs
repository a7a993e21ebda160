use crate::core::mapreduce::LocalMapReduce;
use crate::core::pipeline_sequence::{ContextualPipeline, PipelineContext};
use crate::core::stage_io::{read_lines, write_stage_output};
use crate::domain::model::{TransformResult, CUSTOMER_POINTS_STAGE};
use crate::domain::ports::{ConfigProvider, OutputRecord, Storage};
use crate::domain::services::{CustomerAggregator, RecordParser};
use crate::utils::error::Result;

/// Stage A: raw transaction CSV to one `customerId\taccumulated\tredeemed` row per customer.
pub struct CustomerPointsPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    engine: LocalMapReduce,
}

impl<S: Storage, C: ConfigProvider> CustomerPointsPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let engine = LocalMapReduce::new(config.workers());
        Self {
            storage,
            config,
            engine,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> ContextualPipeline for CustomerPointsPipeline<S, C> {
    async fn extract_with_context(&self, _context: &PipelineContext) -> Result<Vec<String>> {
        tracing::debug!("Reading raw transactions from: {}", self.config.input_path());
        read_lines(&self.storage, self.config.input_path()).await
    }

    async fn transform_with_context(
        &self,
        lines: Vec<String>,
        _context: &PipelineContext,
    ) -> Result<TransformResult> {
        let parser = RecordParser::new(self.config.header_token());
        let output = self
            .engine
            .run(CUSTOMER_POINTS_STAGE, lines, parser, CustomerAggregator)
            .await?;

        Ok(TransformResult {
            rows: output.records.iter().map(OutputRecord::to_row).collect(),
            counters: output.counters,
        })
    }

    async fn load_with_context(
        &self,
        result: TransformResult,
        _context: &PipelineContext,
    ) -> Result<String> {
        write_stage_output(&self.storage, self.config.intermediate_dir(), &result.rows).await
    }

    fn get_name(&self) -> &str {
        CUSTOMER_POINTS_STAGE
    }

    fn output_dir(&self) -> &str {
        self.config.intermediate_dir()
    }
}
