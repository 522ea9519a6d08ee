use crate::core::ConfigProvider;
use crate::domain::model::{ExtractionPolicy, OutputFormat};
use crate::utils::error::{EtlError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_REPORT_NAME: &str = "relatorio_fiscal";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub extract: ExtractionPolicy,
    #[serde(default)]
    pub transform: TransformConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub inputs: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    pub pad_states: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    #[serde(default)]
    pub format: OutputFormat,
    pub report_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_format: Option<LogFormat>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
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

    /// 替換環境變數 (例如 ${NFE_INPUT_DIR})，未設定者保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validation::validate_input_paths("source.inputs", &self.source.inputs, &["xml"])?;
        validation::validate_path("load.output_path", &self.load.output_path)?;
        if let Some(report_name) = &self.load.report_name {
            validation::validate_file_stem("load.report_name", report_name)?;
        }

        let sentinels = [
            ("extract.missing_invoice_number", &self.extract.missing_invoice_number),
            ("extract.missing_state", &self.extract.missing_state),
            ("extract.missing_registration", &self.extract.missing_registration),
            ("extract.missing_product", &self.extract.missing_product),
        ];
        for (field, value) in sentinels {
            validation::validate_non_empty_string(field, value)?;
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_format(&self) -> LogFormat {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format)
            .unwrap_or_default()
    }
}

impl ConfigProvider for TomlConfig {
    fn input_paths(&self) -> &[String] {
        &self.source.inputs
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_format(&self) -> OutputFormat {
        self.load.format
    }

    fn report_name(&self) -> &str {
        self.load.report_name.as_deref().unwrap_or(DEFAULT_REPORT_NAME)
    }

    fn extraction_policy(&self) -> ExtractionPolicy {
        self.extract.clone()
    }

    fn pad_states(&self) -> bool {
        self.transform.pad_states.unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
