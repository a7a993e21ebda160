use anyhow::Context;
use clap::Parser;
use loyalty_tiers::core::etl::default_execution_id;
use loyalty_tiers::core::pipeline_sequence::PipelineSequence;
use loyalty_tiers::domain::ports::ConfigProvider;
use loyalty_tiers::utils::{logger, validation::Validate};
use loyalty_tiers::{CliConfig, EtlEngine, JobConfig, LocalStorage, RunConfig, RunReport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting loyalty-tiers");
    if args.verbose {
        tracing::debug!("CLI config: {:?}", args);
    }

    let job = match &args.config {
        Some(path) => {
            tracing::info!("📁 Loading job configuration from: {}", path);
            let job = JobConfig::from_file(path)
                .with_context(|| format!("failed to load job config '{}'", path))?;
            Some(job)
        }
        None => None,
    };

    // 驗證配置
    let config = match RunConfig::resolve(&args, job.as_ref()).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let execution_id = args.execution_id.clone().unwrap_or_else(default_execution_id);
    let job_name = job.as_ref().and_then(|job| job.job.name.as_deref());
    display_config_summary(&config, &execution_id, job_name, args.dry_run);

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let monitor_enabled = config.monitor;
    let storage = LocalStorage::new(".".to_string());
    let engine = EtlEngine::new_with_monitoring(storage, config, execution_id, monitor_enabled);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&engine.build_sequence())?;
        return Ok(());
    }

    match engine.run().await {
        Ok(report) => display_run_report(&report),
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            std::process::exit(e.severity().exit_code());
        }
    }

    Ok(())
}

fn display_config_summary(
    config: &RunConfig,
    execution_id: &str,
    job_name: Option<&str>,
    dry_run: bool,
) {
    println!("📋 Run Summary:");
    if let Some(name) = job_name {
        println!("  Job: {}", name);
    }
    println!("  Execution ID: {}", execution_id);
    println!("  Input: {}", config.input_path());
    println!("  Intermediate output: {}", config.intermediate_dir());
    println!("  Final output: {}", config.final_dir());
    println!("  Header token: {}", config.header_token());
    println!("  Workers: {}", config.workers());
    println!("  Overwrite: {}", config.overwrite());

    if dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
    println!();
}

fn perform_dry_run(sequence: &PipelineSequence) -> anyhow::Result<()> {
    sequence
        .validate_order()
        .context("stage order is not executable")?;

    println!("📝 Execution Order:");
    for (index, (name, dependencies, output_dir)) in sequence.plan().into_iter().enumerate() {
        println!("  {}. {} -> {}", index + 1, name, output_dir);
        if !dependencies.is_empty() {
            println!("     Dependencies: {}", dependencies.join(", "));
        }
    }
    println!();
    println!("✅ Dry run completed - configuration is valid");
    Ok(())
}

fn display_run_report(report: &RunReport) {
    tracing::info!("✅ Run completed successfully!");

    println!("✅ Run completed successfully!");
    println!("🆔 Execution ID: {}", report.execution_id);
    for stage in &report.stages {
        println!(
            "  📦 {}: {} records in, {} records out ({} ms) -> {}",
            stage.pipeline_name,
            stage.counters.input_records,
            stage.counters.reduce_output_records,
            stage.duration.as_millis(),
            stage.output_path
        );
    }
    if let Some(output) = report.final_output() {
        println!("📁 Tier summary saved to: {}", output);
    }
    println!("📊 Run summary: {}", report.summary_path);
}
