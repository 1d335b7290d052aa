use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use sem_runtime::bridge::SemanticBridge;
use sem_runtime::config::RuntimeConfig;
use sem_runtime::runtime::{SemanticRuntime, Shutdown};
use sem_runtime::schema::{Schema, SchemaStore};

#[derive(Parser)]
#[command(name = "semd", about = "Semantic service runtime", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the service loop (the default)
    Run,
    /// Write the default configuration and schema documents
    Init,
    /// Validate a single service file against the schema and exit
    Validate {
        /// Service file to check
        file: PathBuf,
    },
    /// Interpret a free-text request and write it as a service file
    Ask {
        /// The request, in plain language
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = RuntimeConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_daemon(config).await,
        Commands::Init => init_files(&config),
        Commands::Validate { file } => validate_file(&config, &file).await,
        Commands::Ask { prompt } => ask(&config, &prompt).await,
    }
}

async fn run_daemon(config: RuntimeConfig) -> Result<()> {
    let runtime = SemanticRuntime::new(config);
    let shutdown = Shutdown::new();

    let handle = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupt received; finishing current cycle");
            handle.request();
        }
    });

    runtime.run(shutdown).await
}

/// Create the services directory and write the default schema (and a
/// config file at the default location when none exists yet).
fn init_files(config: &RuntimeConfig) -> Result<()> {
    std::fs::create_dir_all(&config.services_dir)?;
    println!("Services directory: {}", config.services_dir.display());

    if config.schema_path.exists() {
        println!("Schema document already present: {}", config.schema_path.display());
    } else {
        if let Some(parent) = config.schema_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let schema = Schema::service_default();
        std::fs::write(
            &config.schema_path,
            serde_json::to_string_pretty(&schema)?,
        )?;
        println!("Schema document: {}", config.schema_path.display());
    }

    let config_path = RuntimeConfig::default_config_path();
    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_path, toml::to_string_pretty(config)?)?;
        println!("Configuration: {}", config_path.display());
    }

    Ok(())
}

async fn validate_file(config: &RuntimeConfig, file: &PathBuf) -> Result<()> {
    let store = SchemaStore::load(&config.schema_path);
    let raw = tokio::fs::read_to_string(file).await?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;

    match store.validate(&value) {
        Ok(()) => {
            println!("OK: {}", file.display());
            Ok(())
        }
        Err(e) => bail!("{}: {}", file.display(), e),
    }
}

async fn ask(config: &RuntimeConfig, prompt: &str) -> Result<()> {
    let bridge = SemanticBridge::new(config.bridge.clone());
    let path = bridge.submit(prompt, &config.services_dir).await?;
    println!("Service written to {}", path.display());
    Ok(())
}
