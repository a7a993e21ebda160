use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_distinct_dirs, validate_non_empty_string, validate_path, validate_positive_number,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_HEADER_TOKEN: &str = "Customer";
pub const DEFAULT_INTERMEDIATE_DIR: &str = "intermediate-output";
pub const DEFAULT_FINAL_DIR: &str = "final-output";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub job: JobSection,
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSection {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    #[serde(default = "default_header_token")]
    pub header_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_intermediate_dir")]
    pub intermediate_dir: String,
    #[serde(default = "default_final_dir")]
    pub final_dir: String,
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            intermediate_dir: default_intermediate_dir(),
            final_dir: default_final_dir(),
            overwrite: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub enabled: bool,
}

fn default_header_token() -> String {
    DEFAULT_HEADER_TOKEN.to_string()
}

fn default_intermediate_dir() -> String {
    DEFAULT_INTERMEDIATE_DIR.to_string()
}

fn default_final_dir() -> String {
    DEFAULT_FINAL_DIR.to_string()
}

/// 預設 worker 數：可用核心數，無法取得時為 4
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl JobConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})
    ///
    /// 未設定的環境變數保留原文
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl ConfigProvider for JobConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn intermediate_dir(&self) -> &str {
        &self.output.intermediate_dir
    }

    fn final_dir(&self) -> &str {
        &self.output.final_dir
    }

    fn header_token(&self) -> &str {
        &self.input.header_token
    }

    fn workers(&self) -> usize {
        self.execution.workers
    }

    fn overwrite(&self) -> bool {
        self.output.overwrite
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        validate_config(self)
    }
}

/// 執行前對任何 [`ConfigProvider`] 做的共同檢查
pub fn validate_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_path("input.path", config.input_path())?;
    validate_path("output.intermediate_dir", config.intermediate_dir())?;
    validate_path("output.final_dir", config.final_dir())?;
    validate_non_empty_string("input.header_token", config.header_token())?;
    validate_positive_number("execution.workers", config.workers(), 1)?;
    validate_distinct_dirs("output", config.intermediate_dir(), config.final_dir())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_job_config() {
        let toml_content = r#"
[job]
name = "loyalty-q3"
description = "Quarterly tier report"

[input]
path = "data/transactions.csv"
header_token = "Kunde"

[output]
intermediate_dir = "work/customer-points"
final_dir = "work/customer-group-points"
overwrite = true

[execution]
workers = 3

[monitoring]
enabled = true
"#;

        let config = JobConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.job.name.as_deref(), Some("loyalty-q3"));
        assert_eq!(config.input_path(), "data/transactions.csv");
        assert_eq!(config.header_token(), "Kunde");
        assert_eq!(config.intermediate_dir(), "work/customer-points");
        assert_eq!(config.final_dir(), "work/customer-group-points");
        assert!(config.overwrite());
        assert_eq!(config.workers(), 3);
        assert!(config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = JobConfig::from_toml_str("[input]\npath = \"in.csv\"\n").unwrap();

        assert_eq!(config.header_token(), DEFAULT_HEADER_TOKEN);
        assert_eq!(config.intermediate_dir(), DEFAULT_INTERMEDIATE_DIR);
        assert_eq!(config.final_dir(), DEFAULT_FINAL_DIR);
        assert!(!config.overwrite());
        assert!(config.workers() >= 1);
        assert!(!config.monitoring_enabled());
    }

    #[test]
    fn test_missing_input_section_is_rejected() {
        let err = JobConfig::from_toml_str("[output]\noverwrite = true\n").unwrap_err();
        assert!(matches!(err, EtlError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LOYALTY_TEST_DATA_DIR", "/srv/loyalty");

        let toml_content = r#"
[input]
path = "${LOYALTY_TEST_DATA_DIR}/transactions.csv"

[output]
final_dir = "${LOYALTY_TEST_UNSET_VAR}/final"
"#;

        let config = JobConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.input_path(), "/srv/loyalty/transactions.csv");
        assert_eq!(config.final_dir(), "${LOYALTY_TEST_UNSET_VAR}/final");

        std::env::remove_var("LOYALTY_TEST_DATA_DIR");
    }

    #[test]
    fn test_config_validation() {
        let zero_workers = JobConfig::from_toml_str(
            "[input]\npath = \"in.csv\"\n[execution]\nworkers = 0\n",
        )
        .unwrap();
        assert!(zero_workers.validate().is_err());

        let same_dirs = JobConfig::from_toml_str(
            "[input]\npath = \"in.csv\"\n[output]\nintermediate_dir = \"out\"\nfinal_dir = \"out\"\n",
        )
        .unwrap();
        assert!(same_dirs.validate().is_err());

        let blank_header = JobConfig::from_toml_str(
            "[input]\npath = \"in.csv\"\nheader_token = \"  \"\n",
        )
        .unwrap();
        assert!(blank_header.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[job]\nname = \"file-test\"\n[input]\npath = \"in.csv\"\n")
            .unwrap();

        let config = JobConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.job.name.as_deref(), Some("file-test"));
    }

    #[test]
    fn test_config_from_missing_file() {
        let err = JobConfig::from_file("/nonexistent/loyalty.toml").unwrap_err();
        assert!(matches!(err, EtlError::IoError(_)));
    }
}
