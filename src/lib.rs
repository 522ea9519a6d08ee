pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::TomlConfig;

pub use core::{etl::EtlEngine, pipeline::NfePipeline};
pub use domain::model::{
    DetailRow, EtlReport, ExtractionPolicy, LineItemRecord, OutputFormat, StateSummary,
};
pub use utils::error::{EtlError, Result};
