//! Factura Gateway server
//!
//! Serves the upload, webhook, and health endpoints.

use factura_gateway::{config::GatewayConfig, start_server, GatewayError};
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the completion API key
const API_KEY_VAR: &str = "ASI1_API_KEY";

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), GatewayError> {
    let args: Vec<String> = env::args().collect();

    let mut config = if args.len() > 2 && args[1] == "--config" {
        GatewayConfig::from_file(&args[2])?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        eprintln!("No config file specified, using defaults");
        GatewayConfig::default()
    };

    config.llm.api_key = env::var(API_KEY_VAR).unwrap_or_default();

    start_server(config).await
}

fn print_help() {
    println!("Factura Gateway - Invoice extraction over HTTP");
    println!();
    println!("USAGE:");
    println!("    factura-gateway [--config <path-to-config.toml>]");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    {}       Completion API key (also read from .env)", API_KEY_VAR);
    println!("    RUST_LOG           Log filter (default: info)");
    println!();
    println!("ROUTES:");
    println!("    POST /upload-pdf      multipart field 'file'");
    println!("    POST /extract-text    JSON {{\"path\", \"content\"}}");
    println!("    POST /api/webhook     extraction reply callback");
    println!("    GET  /health          liveness and pending requests");
    println!();
}
