pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::{ExtractionPolicy, OutputFormat};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "nfe-etl")]
#[command(about = "Extract ICMS-ST, DIFAL and FCP totals from NF-e XML documents")]
pub struct CliConfig {
    /// NF-e XML files, or directories containing them
    #[arg(required = true)]
    pub inputs: Vec<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_enum, default_value = "zip")]
    pub format: OutputFormat,

    #[arg(long, default_value = "relatorio_fiscal")]
    pub report_name: String,

    /// Registration used when the destination has neither ISUF nor IE
    #[arg(long, default_value = "ISENTO")]
    pub missing_registration: String,

    /// Add zero rows for states without any line item
    #[arg(long)]
    pub pad_states: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU/memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_paths(&self) -> &[String] {
        &self.inputs
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_format(&self) -> OutputFormat {
        self.format
    }

    fn report_name(&self) -> &str {
        &self.report_name
    }

    fn extraction_policy(&self) -> ExtractionPolicy {
        ExtractionPolicy {
            missing_registration: self.missing_registration.clone(),
            ..ExtractionPolicy::default()
        }
    }

    fn pad_states(&self) -> bool {
        self.pad_states
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_input_paths("inputs", &self.inputs, &["xml"])?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_file_stem("report_name", &self.report_name)?;
        validation::validate_non_empty_string("missing_registration", &self.missing_registration)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_arguments() {
        let config = CliConfig::parse_from([
            "nfe-etl",
            "notas/",
            "extra.xml",
            "--format",
            "csv",
            "--missing-registration",
            "Isento/Nulo",
            "--pad-states",
        ]);

        assert_eq!(config.inputs, vec!["notas/", "extra.xml"]);
        assert_eq!(config.output_format(), OutputFormat::Csv);
        assert_eq!(config.report_name(), "relatorio_fiscal");
        assert_eq!(config.extraction_policy().missing_registration, "Isento/Nulo");
        assert_eq!(config.extraction_policy().missing_state, "N/A");
        assert!(config.pad_states());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inputs_are_required() {
        assert!(CliConfig::try_parse_from(["nfe-etl"]).is_err());
    }

    #[test]
    fn test_validation_rejects_non_xml_files() {
        let config = CliConfig::parse_from(["nfe-etl", "relatorio.pdf"]);
        assert!(config.validate().is_err());
    }
}
