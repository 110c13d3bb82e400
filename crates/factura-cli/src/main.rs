//! Factura CLI - Extract invoice fields from the command line.

use anyhow::Context;
use clap::Parser;
use factura_cli::commands;
use factura_cli::{Cli, Command, Config, Formatter};
use factura_extractor::Extractor;
use factura_llm::ChatCompletionProvider;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Parse CLI arguments (the API key may come from the environment)
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(api_key) = cli.api_key {
        config.llm.api_key = api_key;
    }

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Config => commands::execute_config(&config)?,
        Command::Extract(args) => {
            let extractor = build_extractor(&config)?;
            commands::execute_extract(args, &extractor, &formatter).await?
        }
        Command::Batch(args) => {
            let extractor = build_extractor(&config)?;
            commands::execute_batch(args, &extractor, &formatter).await?
        }
    }

    Ok(())
}

/// Extractor backed by the configured completion endpoint
fn build_extractor(config: &Config) -> anyhow::Result<Extractor<ChatCompletionProvider>> {
    let provider = ChatCompletionProvider::new(config.llm.clone())
        .context("Set ASI1_API_KEY or pass --api-key")?;
    Ok(Extractor::new(provider, config.extractor.clone())?)
}
