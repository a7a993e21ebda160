#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::JobConfig;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use serde::Serialize;
use toml_config::{default_workers, DEFAULT_FINAL_DIR, DEFAULT_HEADER_TOKEN, DEFAULT_INTERMEDIATE_DIR};

/// Settings after merging flags, job file and defaults.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub input_path: String,
    pub intermediate_dir: String,
    pub final_dir: String,
    pub header_token: String,
    pub workers: usize,
    pub overwrite: bool,
    pub monitor: bool,
}

impl RunConfig {
    /// Input path is the only setting without a default.
    pub fn new(input_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            intermediate_dir: DEFAULT_INTERMEDIATE_DIR.to_string(),
            final_dir: DEFAULT_FINAL_DIR.to_string(),
            header_token: DEFAULT_HEADER_TOKEN.to_string(),
            workers: default_workers(),
            overwrite: false,
            monitor: false,
        }
    }

    pub fn from_job_config(job: &JobConfig) -> Self {
        Self {
            input_path: job.input.path.clone(),
            intermediate_dir: job.output.intermediate_dir.clone(),
            final_dir: job.output.final_dir.clone(),
            header_token: job.input.header_token.clone(),
            workers: job.execution.workers,
            overwrite: job.output.overwrite,
            monitor: job.monitoring_enabled(),
        }
    }

    /// Command-line flags take precedence over the job file.
    #[cfg(feature = "cli")]
    pub fn resolve(cli: &CliConfig, job: Option<&JobConfig>) -> Result<Self> {
        let mut config = match (job, cli.input.as_deref()) {
            (Some(job), _) => Self::from_job_config(job),
            (None, Some(input)) => Self::new(input),
            (None, None) => {
                return Err(crate::utils::error::EtlError::MissingConfigError {
                    field: "input.path".to_string(),
                })
            }
        };

        if let Some(input) = &cli.input {
            config.input_path = input.clone();
        }
        if let Some(dir) = &cli.intermediate_dir {
            config.intermediate_dir = dir.clone();
        }
        if let Some(dir) = &cli.final_dir {
            config.final_dir = dir.clone();
        }
        if let Some(token) = &cli.header_token {
            config.header_token = token.clone();
        }
        if let Some(workers) = cli.workers {
            config.workers = workers;
        }
        config.overwrite |= cli.overwrite;
        config.monitor |= cli.monitor;

        Ok(config)
    }
}

impl ConfigProvider for RunConfig {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn intermediate_dir(&self) -> &str {
        &self.intermediate_dir
    }

    fn final_dir(&self) -> &str {
        &self.final_dir
    }

    fn header_token(&self) -> &str {
        &self.header_token
    }

    fn workers(&self) -> usize {
        self.workers
    }

    fn overwrite(&self) -> bool {
        self.overwrite
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        toml_config::validate_config(self)
    }
}
