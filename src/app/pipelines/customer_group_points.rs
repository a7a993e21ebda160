use crate::core::mapreduce::LocalMapReduce;
use crate::core::pipeline_sequence::{ContextualPipeline, PipelineContext};
use crate::core::stage_io::{read_lines, write_stage_output};
use crate::domain::model::{TransformResult, CUSTOMER_GROUP_POINTS_STAGE, CUSTOMER_POINTS_STAGE};
use crate::domain::ports::{ConfigProvider, OutputRecord, Storage};
use crate::domain::services::{TierAggregator, TierClassifier};
use crate::utils::error::Result;

/// Stage B: per-customer totals to one summary row per non-empty tier.
///
/// Reads the intermediate file reported by [`CustomerPointsPipeline`] in the
/// run context, never a path of its own choosing.
///
/// [`CustomerPointsPipeline`]: super::customer_points::CustomerPointsPipeline
pub struct CustomerGroupPointsPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    engine: LocalMapReduce,
}

impl<S: Storage, C: ConfigProvider> CustomerGroupPointsPipeline<S, C> {
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
impl<S: Storage, C: ConfigProvider> ContextualPipeline for CustomerGroupPointsPipeline<S, C> {
    async fn extract_with_context(&self, context: &PipelineContext) -> Result<Vec<String>> {
        let input = context.completed_output(self.get_name(), CUSTOMER_POINTS_STAGE)?;
        tracing::debug!("Reading customer totals from: {}", input);
        read_lines(&self.storage, input).await
    }

    async fn transform_with_context(
        &self,
        lines: Vec<String>,
        _context: &PipelineContext,
    ) -> Result<TransformResult> {
        let output = self
            .engine
            .run(CUSTOMER_GROUP_POINTS_STAGE, lines, TierClassifier, TierAggregator)
            .await?;

        for summary in &output.records {
            tracing::info!("📊 {}: {}", summary.tier, summary.summary_text());
        }

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
        write_stage_output(&self.storage, self.config.final_dir(), &result.rows).await
    }

    fn get_name(&self) -> &str {
        CUSTOMER_GROUP_POINTS_STAGE
    }

    fn output_dir(&self) -> &str {
        self.config.final_dir()
    }

    fn dependencies(&self) -> Vec<String> {
        vec![CUSTOMER_POINTS_STAGE.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use crate::core::pipeline_sequence::PipelineResult;
    use crate::domain::model::StageCounters;
    use crate::utils::error::EtlError;
    use std::time::Duration;

    struct MockConfig;

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            "input.csv"
        }

        fn intermediate_dir(&self) -> &str {
            "intermediate-output"
        }

        fn final_dir(&self) -> &str {
            "final-output"
        }

        fn header_token(&self) -> &str {
            "Customer"
        }

        fn workers(&self) -> usize {
            3
        }

        fn overwrite(&self) -> bool {
            false
        }
    }

    fn context_with_upstream(output_path: &str) -> PipelineContext {
        let mut context = PipelineContext::new("test".to_string());
        context.add_result(PipelineResult {
            pipeline_name: CUSTOMER_POINTS_STAGE.to_string(),
            output_dir: "elsewhere".to_string(),
            output_path: output_path.to_string(),
            counters: StageCounters::default(),
            duration: Duration::from_millis(1),
        });
        context
    }

    #[tokio::test]
    async fn test_extract_uses_reported_upstream_path() {
        let storage = MemoryStorage::new();
        storage
            .write_file("elsewhere/part-r-00000", b"C1\t150\t31\n")
            .await
            .unwrap();
        let pipeline = CustomerGroupPointsPipeline::new(storage, MockConfig);

        let lines = pipeline
            .extract_with_context(&context_with_upstream("elsewhere/part-r-00000"))
            .await
            .unwrap();

        assert_eq!(lines, vec!["C1\t150\t31"]);
    }

    #[tokio::test]
    async fn test_extract_without_upstream_violates_barrier() {
        let pipeline = CustomerGroupPointsPipeline::new(MemoryStorage::new(), MockConfig);
        let context = PipelineContext::new("test".to_string());

        let err = pipeline.extract_with_context(&context).await.unwrap_err();
        assert!(matches!(err, EtlError::DependencyError { .. }));
    }

    #[tokio::test]
    async fn test_transform_summarises_each_tier() {
        let pipeline = CustomerGroupPointsPipeline::new(MemoryStorage::new(), MockConfig);
        let context = context_with_upstream("unused");

        let lines = vec![
            "C1\t150\t31".to_string(),
            "C2\t2001\t1000".to_string(),
            "C3\t10000\t0".to_string(),
            "C4\t25000\t2500".to_string(),
            "C5\t2000\t0".to_string(),
            "truncated".to_string(),
        ];
        let result = pipeline
            .transform_with_context(lines, &context)
            .await
            .unwrap();

        assert_eq!(
            result.rows,
            vec![
                vec![
                    "Gruppe1_Bis2000Punkte",
                    "AnzahlKunden: 2, SummePunkte: 2150, ProzentEingeloest: 1.44%"
                ],
                vec![
                    "Gruppe2_2001Bis10000Punkte",
                    "AnzahlKunden: 2, SummePunkte: 12001, ProzentEingeloest: 8.33%"
                ],
                vec![
                    "Gruppe3_Ueber10000Punkte",
                    "AnzahlKunden: 1, SummePunkte: 25000, ProzentEingeloest: 10.00%"
                ],
            ]
        );
        assert_eq!(result.counters.input_records, 6);
        assert_eq!(result.counters.map_output_records, 5);
        assert_eq!(result.counters.reduce_input_groups, 3);
    }

    #[test]
    fn test_depends_on_customer_points() {
        let pipeline = CustomerGroupPointsPipeline::new(MemoryStorage::new(), MockConfig);
        assert_eq!(pipeline.dependencies(), vec![CUSTOMER_POINTS_STAGE.to_string()]);
        assert_eq!(pipeline.output_dir(), "final-output");
    }
}
