use clap::Parser;
use persona_core::PersonaConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use persona_server::{http, startup};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "persona.toml")]
    config: String,

    /// Resolve the store, print its identity and exit
    #[arg(long)]
    health: bool,

    /// Keep personas in memory instead of the spreadsheet
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match PersonaConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging
    let default_level = config
        .service
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .init();

    if args.health {
        match startup::resolve_store(&config, args.dry_run).await {
            Ok(store) => {
                let info = store.describe();
                println!("✅ Store resolved: {} ({}, worksheet {})", info.title, info.id, info.worksheet);
                return Ok(());
            }
            Err(e) => {
                println!("❌ Store resolution failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    // Resolve store and generator; failure halts the session
    let state = match startup::build_state(config, args.dry_run).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialise persona store: {}", e);
            std::process::exit(1);
        }
    };

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    http::start_http_server(state, tx.subscribe()).await?;

    Ok(())
}
