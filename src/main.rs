use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use patternbot::config::{BotConfig, Credentials};
use patternbot::exchange::{BybitClient, DryRunGateway, ExchangeGateway};
use patternbot::execution::TradingLoop;
use patternbot::strategy::SignalResolver;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "patternbot")]
#[command(about = "Chart-pattern breakout bot for Bybit USDT perpetuals", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file (defaults to config/patternbot.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan and trade until Ctrl+C
    Run {
        /// Log orders instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Resolve symbols once and print the result; never places orders
    Scan {
        /// Symbols to scan (defaults to the configured list)
        symbols: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let config =
        BotConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Run { dry_run } => run(config, dry_run).await,
        Commands::Scan { symbols } => scan(config, symbols).await,
    }
}

// ============================================================================
// Initialization Functions
// ============================================================================

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("patternbot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Configured symbols, or every tradable USDT perpetual when none are set
async fn resolve_symbols(gateway: &dyn ExchangeGateway, configured: &[String]) -> Result<Vec<String>> {
    let symbols = if configured.is_empty() {
        gateway
            .tradable_symbols()
            .await
            .context("Failed to fetch tradable symbols")?
    } else {
        configured.to_vec()
    };

    if symbols.is_empty() {
        bail!("No symbols to trade");
    }
    Ok(symbols)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("⚠️  Received Ctrl+C, shutting down..."),
        Err(e) => {
            tracing::error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn run(config: BotConfig, dry_run: bool) -> Result<()> {
    tracing::info!(
        "🚀 PatternBot starting{}",
        if dry_run { " (dry run)" } else { "" }
    );

    let credentials = Credentials::from_env()?;
    let client = BybitClient::new(&config.exchange)?.with_credentials(credentials);
    tracing::info!("Exchange endpoint: {}", client.base_url());

    let gateway: Arc<dyn ExchangeGateway> = if dry_run {
        Arc::new(DryRunGateway::new(client))
    } else {
        Arc::new(client)
    };

    let symbols = resolve_symbols(gateway.as_ref(), &config.trading.symbols).await?;

    tracing::info!("\n📊 Configuration:");
    tracing::info!("  Leverage: {}x", config.risk.leverage);
    tracing::info!("  Order size: {} USDT", config.risk.order_notional);
    tracing::info!("  Timeframe: {}m", config.trading.interval_minutes);
    tracing::info!("  Max positions: {}", config.trading.max_positions);
    tracing::info!(
        "  Pattern target: {:.0}%",
        config.risk.pattern_target_pct * 100.0
    );
    tracing::info!("  Symbols: {}", symbols.len());
    tracing::info!("\nPress Ctrl+C to stop...\n");

    let trading = TradingLoop::new(gateway, &config);
    trading.run(&symbols, shutdown_signal()).await;

    tracing::info!("👋 PatternBot stopped");
    Ok(())
}

async fn scan(config: BotConfig, symbols: Vec<String>) -> Result<()> {
    // market data is public; keys are optional here
    let mut client = BybitClient::new(&config.exchange)?;
    if let Ok(credentials) = Credentials::from_env() {
        client = client.with_credentials(credentials);
    }

    let symbols = if symbols.is_empty() {
        resolve_symbols(&client, &config.trading.symbols).await?
    } else {
        symbols
    };

    let resolver = SignalResolver::new(&config);
    for symbol in &symbols {
        match resolver.resolve(&client, symbol).await {
            Ok(resolution) => println!("{:<16} {}", symbol, resolution),
            Err(e) => println!("{:<16} error: {}", symbol, e),
        }
    }

    Ok(())
}
