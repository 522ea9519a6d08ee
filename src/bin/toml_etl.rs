use clap::Parser;
use nfe_fiscal_etl::app::console;
use nfe_fiscal_etl::core::pipeline::DOCUMENT_EXTENSION;
use nfe_fiscal_etl::core::{ConfigProvider, Storage};
use nfe_fiscal_etl::utils::{logger, validation::Validate};
use nfe_fiscal_etl::{EtlEngine, LocalStorage, NfePipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "NF-e fiscal extraction driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "nfe-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// List the documents that would be processed without parsing them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置（日誌格式取決於配置，先載入再初始化）
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_logger(args.verbose, config.log_format());
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    let storage = LocalStorage::default();

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No documents will be parsed");
        perform_dry_run(&config, &storage).await?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = NfePipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ ETL process completed successfully!");
            console::print_report(&report);
        }
        Err(e) => {
            let exit_code = console::report_error(&e);
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name,
        config.pipeline.version.as_deref().unwrap_or("-")
    );
    if let Some(description) = &config.pipeline.description {
        println!("  Description: {}", description);
    }
    println!("  Inputs: {}", config.input_paths().join(", "));
    println!("  Output: {}", config.output_path());
    println!("  Format: {}", config.output_format().as_str());
    println!("  Report: {}", config.report_name());
    println!(
        "  Missing registration: {}",
        config.extraction_policy().missing_registration
    );
    println!("  Pad states: {}", config.pad_states());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig, storage: &LocalStorage) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");

    let mut total = 0;
    for input in config.input_paths() {
        match storage.list_documents(input, DOCUMENT_EXTENSION).await {
            Ok(documents) => {
                println!("  {} -> {} document(s)", input, documents.len());
                for document in &documents {
                    tracing::debug!("    {}", document);
                }
                total += documents.len();
            }
            Err(e) => println!("  {} -> ❌ {}", input, e),
        }
    }

    println!();
    println!("✅ {} document(s) would be processed.", total);
    Ok(())
}
