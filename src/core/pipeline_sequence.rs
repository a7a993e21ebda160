use crate::domain::model::{StageCounters, TransformResult};
use crate::utils::error::{EtlError, Result};
use crate::utils::monitor::SystemMonitor;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Pipeline 執行結果
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub pipeline_name: String,
    pub output_dir: String,
    pub output_path: String,
    pub counters: StageCounters,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Pipeline 執行上下文：記錄已完成 pipeline 的輸出，供下游讀取
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub execution_id: String,
    pub previous_results: Vec<PipelineResult>,
}

impl PipelineContext {
    pub fn new(execution_id: String) -> Self {
        Self {
            execution_id,
            previous_results: Vec::new(),
        }
    }

    /// 獲取指定名稱的 Pipeline 結果
    pub fn get_result_by_name(&self, name: &str) -> Option<&PipelineResult> {
        self.previous_results.iter().find(|r| r.pipeline_name == name)
    }

    /// 取得已完成上游 pipeline 的輸出檔；上游尚未完成時回傳 DependencyError
    pub fn completed_output(&self, pipeline: &str, dependency: &str) -> Result<&str> {
        self.get_result_by_name(dependency)
            .map(|result| result.output_path.as_str())
            .ok_or_else(|| EtlError::DependencyError {
                pipeline: pipeline.to_string(),
                missing: dependency.to_string(),
            })
    }

    /// 添加結果到上下文
    pub fn add_result(&mut self, result: PipelineResult) {
        self.previous_results.push(result);
    }
}

/// 帶上下文的 Pipeline 介面
#[async_trait::async_trait]
pub trait ContextualPipeline: Send + Sync {
    async fn extract_with_context(&self, context: &PipelineContext) -> Result<Vec<String>>;
    async fn transform_with_context(
        &self,
        lines: Vec<String>,
        context: &PipelineContext,
    ) -> Result<TransformResult>;
    async fn load_with_context(
        &self,
        result: TransformResult,
        context: &PipelineContext,
    ) -> Result<String>;

    /// 用於標識 pipeline 名稱
    fn get_name(&self) -> &str;

    fn output_dir(&self) -> &str;

    /// 必須先完成的上游 pipeline 名稱
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Pipeline 序列，依序執行；每個 pipeline 只在其依賴全部完成後才開始
pub struct PipelineSequence {
    pipelines: Vec<Box<dyn ContextualPipeline>>,
    monitor: Option<SystemMonitor>,
    execution_id: String,
}

impl PipelineSequence {
    pub fn new(execution_id: String) -> Self {
        Self {
            pipelines: Vec::new(),
            monitor: None,
            execution_id,
        }
    }

    /// 啟用或禁用系統監控
    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = enabled.then(|| SystemMonitor::new(true));
        self
    }

    pub fn add_pipeline(&mut self, pipeline: Box<dyn ContextualPipeline>) {
        self.pipelines.push(pipeline);
    }

    pub fn pipeline_names(&self) -> Vec<&str> {
        self.pipelines.iter().map(|p| p.get_name()).collect()
    }

    /// 依執行順序列出每個 pipeline 的 `(name, dependencies, output_dir)`
    pub fn plan(&self) -> Vec<(String, Vec<String>, String)> {
        self.pipelines
            .iter()
            .map(|p| {
                (
                    p.get_name().to_string(),
                    p.dependencies(),
                    p.output_dir().to_string(),
                )
            })
            .collect()
    }

    /// 檢查每個依賴都排在其下游之前
    pub fn validate_order(&self) -> Result<()> {
        for (index, pipeline) in self.pipelines.iter().enumerate() {
            for dependency in pipeline.dependencies() {
                let upstream = self.pipelines[..index]
                    .iter()
                    .any(|p| p.get_name() == dependency);
                if !upstream {
                    return Err(EtlError::DependencyError {
                        pipeline: pipeline.get_name().to_string(),
                        missing: dependency,
                    });
                }
            }
        }
        Ok(())
    }

    /// 執行所有 pipeline；任何失敗都會中止整個序列
    pub async fn execute_all(&self) -> Result<Vec<PipelineResult>> {
        self.validate_order()?;

        let mut context = PipelineContext::new(self.execution_id.clone());
        self.log_stats("Pipeline sequence started");

        for pipeline in &self.pipelines {
            let name = pipeline.get_name();
            for dependency in pipeline.dependencies() {
                context.completed_output(name, &dependency)?;
            }

            tracing::info!("▶️ Starting pipeline: {}", name);
            let start_time = Instant::now();

            let (counters, output_path) = match self.execute_pipeline(pipeline.as_ref(), &context).await {
                Ok(executed) => executed,
                Err(e) => {
                    tracing::error!("❌ Pipeline {} failed: {}", name, e);
                    return Err(e);
                }
            };

            let result = PipelineResult {
                pipeline_name: name.to_string(),
                output_dir: pipeline.output_dir().to_string(),
                output_path,
                counters,
                duration: start_time.elapsed(),
            };

            tracing::info!(
                "✅ Pipeline executed: {} (input: {}, groups: {}, output: {}, duration: {:?})",
                result.pipeline_name,
                result.counters.input_records,
                result.counters.reduce_input_groups,
                result.counters.reduce_output_records,
                result.duration
            );
            self.log_stats(&format!("Pipeline {} completed", name));

            context.add_result(result);
        }

        if let Some(monitor) = &self.monitor {
            monitor.log_final_stats();
        }

        Ok(context.previous_results)
    }

    async fn execute_pipeline(
        &self,
        pipeline: &dyn ContextualPipeline,
        context: &PipelineContext,
    ) -> Result<(StageCounters, String)> {
        let lines = pipeline.extract_with_context(context).await?;
        tracing::debug!("📥 Extracted {} lines", lines.len());

        let transform_result = pipeline.transform_with_context(lines, context).await?;
        let counters = transform_result.counters;
        tracing::debug!("🔄 Reduced to {} rows", transform_result.rows.len());

        let output_path = pipeline.load_with_context(transform_result, context).await?;
        tracing::debug!("💾 Loaded data to: {}", output_path);

        Ok((counters, output_path))
    }

    fn log_stats(&self, phase: &str) {
        if let Some(monitor) = &self.monitor {
            monitor.log_stats(phase);
        }
    }

    /// 獲取執行摘要
    pub fn get_execution_summary(results: &[PipelineResult]) -> serde_json::Value {
        let total_duration: Duration = results.iter().map(|r| r.duration).sum();
        let total_output: usize = results
            .iter()
            .map(|r| r.counters.reduce_output_records)
            .sum();

        serde_json::json!({
            "total_pipelines": results.len(),
            "total_output_records": total_output,
            "total_duration_ms": total_duration.as_millis() as u64,
            "executed_pipelines": results.iter().map(|r| r.pipeline_name.clone()).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct MockPipeline {
        name: String,
        dependencies: Vec<String>,
        lines: Vec<String>,
        fail_transform: bool,
        seen_upstream: Arc<Mutex<Vec<String>>>,
    }

    impl MockPipeline {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                dependencies: Vec::new(),
                lines: vec!["a".to_string(), "b".to_string()],
                fail_transform: false,
                seen_upstream: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn depends_on(mut self, dependency: &str) -> Self {
            self.dependencies.push(dependency.to_string());
            self
        }

        fn failing(mut self) -> Self {
            self.fail_transform = true;
            self
        }
    }

    #[async_trait::async_trait]
    impl ContextualPipeline for MockPipeline {
        async fn extract_with_context(&self, context: &PipelineContext) -> Result<Vec<String>> {
            let mut seen = self.seen_upstream.lock().unwrap();
            for dependency in &self.dependencies {
                seen.push(context.completed_output(&self.name, dependency)?.to_string());
            }
            Ok(self.lines.clone())
        }

        async fn transform_with_context(
            &self,
            lines: Vec<String>,
            _context: &PipelineContext,
        ) -> Result<TransformResult> {
            if self.fail_transform {
                return Err(EtlError::MalformedFieldError {
                    stage: self.name.clone(),
                    line: 1,
                    field: "accumulated".to_string(),
                    value: "x".to_string(),
                });
            }
            Ok(TransformResult {
                rows: lines.into_iter().map(|l| vec![l]).collect(),
                counters: StageCounters {
                    input_records: 2,
                    map_output_records: 2,
                    reduce_input_groups: 2,
                    reduce_output_records: 2,
                },
            })
        }

        async fn load_with_context(
            &self,
            _result: TransformResult,
            _context: &PipelineContext,
        ) -> Result<String> {
            Ok(format!("/tmp/{}/part-r-00000", self.name))
        }

        fn get_name(&self) -> &str {
            &self.name
        }

        fn output_dir(&self) -> &str {
            &self.name
        }

        fn dependencies(&self) -> Vec<String> {
            self.dependencies.clone()
        }
    }

    #[tokio::test]
    async fn test_downstream_reads_reported_upstream_output() {
        let downstream = MockPipeline::new("second").depends_on("first");
        let seen = Arc::clone(&downstream.seen_upstream);

        let mut sequence = PipelineSequence::new("exec-1".to_string());
        sequence.add_pipeline(Box::new(MockPipeline::new("first")));
        sequence.add_pipeline(Box::new(downstream));

        let results = sequence.execute_all().await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].pipeline_name, "first");
        assert_eq!(results[1].pipeline_name, "second");
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["/tmp/first/part-r-00000".to_string()]
        );
    }

    #[tokio::test]
    async fn test_dependency_declared_out_of_order_is_rejected() {
        let mut sequence = PipelineSequence::new("exec-2".to_string());
        sequence.add_pipeline(Box::new(MockPipeline::new("second").depends_on("first")));
        sequence.add_pipeline(Box::new(MockPipeline::new("first")));

        let err = sequence.execute_all().await.unwrap_err();
        match err {
            EtlError::DependencyError { pipeline, missing } => {
                assert_eq!(pipeline, "second");
                assert_eq!(missing, "first");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_stops_sequence_and_keeps_error_type() {
        let downstream = MockPipeline::new("second").depends_on("first");
        let seen = Arc::clone(&downstream.seen_upstream);

        let mut sequence = PipelineSequence::new("exec-3".to_string());
        sequence.add_pipeline(Box::new(MockPipeline::new("first").failing()));
        sequence.add_pipeline(Box::new(downstream));

        let err = sequence.execute_all().await.unwrap_err();
        assert!(matches!(err, EtlError::MalformedFieldError { .. }));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_plan_lists_stages_in_order() {
        let mut sequence = PipelineSequence::new("exec-5".to_string());
        sequence.add_pipeline(Box::new(MockPipeline::new("first")));
        sequence.add_pipeline(Box::new(MockPipeline::new("second").depends_on("first")));

        let plan = sequence.plan();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0], ("first".to_string(), vec![], "first".to_string()));
        assert_eq!(plan[1].1, vec!["first".to_string()]);
    }

    #[test]
    fn test_context_lookup() {
        let mut context = PipelineContext::new("exec-4".to_string());
        assert!(context.completed_output("b", "a").is_err());

        context.add_result(PipelineResult {
            pipeline_name: "a".to_string(),
            output_dir: "out-a".to_string(),
            output_path: "out-a/part-r-00000".to_string(),
            counters: StageCounters::default(),
            duration: Duration::from_millis(5),
        });

        assert_eq!(context.get_result_by_name("a").unwrap().pipeline_name, "a");
        assert!(context.get_result_by_name("b").is_none());
        assert_eq!(context.completed_output("b", "a").unwrap(), "out-a/part-r-00000");
    }

    #[test]
    fn test_execution_summary() {
        let results = vec![
            PipelineResult {
                pipeline_name: "a".to_string(),
                output_dir: "out-a".to_string(),
                output_path: "out-a/part-r-00000".to_string(),
                counters: StageCounters {
                    reduce_output_records: 3,
                    ..StageCounters::default()
                },
                duration: Duration::from_millis(10),
            },
            PipelineResult {
                pipeline_name: "b".to_string(),
                output_dir: "out-b".to_string(),
                output_path: "out-b/part-r-00000".to_string(),
                counters: StageCounters {
                    reduce_output_records: 2,
                    ..StageCounters::default()
                },
                duration: Duration::from_millis(15),
            },
        ];

        let summary = PipelineSequence::get_execution_summary(&results);
        assert_eq!(summary["total_pipelines"], 2);
        assert_eq!(summary["total_output_records"], 5);
        assert_eq!(summary["total_duration_ms"], 25);
        assert_eq!(summary["executed_pipelines"], serde_json::json!(["a", "b"]));
    }
}
