//! # Print Editor
//!
//! Headless export of print-product designs.

use clap::Parser;
use editor_cli::{run, CliArgs, CliConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "editor_cli=info,editor_canvas=info,editor_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting print editor v{}", editor_core::VERSION);

    let args = CliArgs::parse();
    let config = CliConfig::from(args);
    tracing::debug!("Catalog: {}", config.catalog.display());

    let out = run(config).await?;
    println!("{}", out.display());
    Ok(())
}
