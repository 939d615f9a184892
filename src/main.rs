//! Shop identity CLI server
//!
//! ```sh
//! # Run with default config (~/.config/shop-identity/config.toml)
//! shop-identity
//!
//! # Custom config path and port
//! shop-identity --config /etc/shop-identity/config.toml --port 8080
//!
//! # Validate config without starting
//! shop-identity --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use shop_identity::config::AppConfig;
use shop_identity::server::{init_tracing, ServerHandle, ServerOptions};
use shop_identity::DatabaseConfig;

#[derive(Parser, Debug)]
#[command(
    name = "shop-identity",
    version,
    about = "User registration and authentication service for the online shop",
    long_about = "Shop identity: REST API for registration, password login and \
                  Google sign-in, issuing JWT session tokens.\n\n\
                  Default config: ~/.config/shop-identity/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "SHOP_IDENTITY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(shop_identity::default_config_path);

    let mut config = AppConfig::load(&config_path)
        .map_err(|e| format!("Failed to load config from {}: {}", config_path.display(), e))?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Address     : {}", config.server.address());
        println!("   Database    : {}", DatabaseConfig::from(&config.database).redacted_url());
        println!("   Default role: {}", config.accounts.default_role);
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    init_tracing(&config);
    info!("Configuration loaded from {}", config_path.display());
    if cli.port.is_some() || cli.log_level.is_some() {
        info!(port = ?cli.port, log_level = ?cli.log_level, "CLI overrides applied");
    }

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
