// Trend Trading Bot - command line entry point
// Backtests, window sweeps and live sessions from one binary

use std::path::PathBuf;
use clap::{Parser, Subcommand};
use tracing::{info, warn, error};
use trend_trading_bot::config::LoggingConfig;
use trend_trading_bot::logging::init_logging;
use trend_trading_bot::{Config, ConfigError, TradingResult};

// Load command modules from cli directory
#[path = "../cli/backtest_commands.rs"]
mod backtest_commands;
#[path = "../cli/trade_commands.rs"]
mod trade_commands;

#[derive(Parser)]
#[command(name = "trend-bot")]
#[command(version = "0.1.0")]
#[command(about = "Moving-average crossover trading bot", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Replay historical candles through the signal engine
    Backtest {
        /// Override the configured window size
        #[arg(short, long)]
        window: Option<usize>,

        /// Write the full result (trades and trace) as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Backtest a range of window sizes and rank them
    Sweep {
        /// Smallest window size
        #[arg(long, default_value = "5")]
        min: usize,

        /// Largest window size
        #[arg(long, default_value = "50")]
        max: usize,

        /// Step between window sizes
        #[arg(long, default_value = "5")]
        step: usize,

        /// Number of results to print
        #[arg(long, default_value = "5")]
        top: usize,
    },

    /// Run a live session against the market with paper order placement
    Trade {
        /// Start from the last portfolio in the execution log
        #[arg(long)]
        resume: bool,

        /// Stop after this many minutes
        #[arg(short, long)]
        minutes: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let outcome = match cli.command {
        // Init doesn't require config (it creates it)
        Commands::Init { force } => {
            init_logging(&LoggingConfig::default(), cli.verbose);
            init_workspace(&cli.config, force)
        }

        // All other commands require valid config
        Commands::Backtest { window, output } => {
            let config = load_config_or_exit(&cli.config, cli.verbose);
            backtest_commands::run_backtest(&config, window, output.as_deref()).await
        }
        Commands::Sweep { min, max, step, top } => {
            let config = load_config_or_exit(&cli.config, cli.verbose);
            backtest_commands::run_sweep(&config, min, max, step, top).await
        }
        Commands::Trade { resume, minutes } => {
            let mut config = load_config_or_exit(&cli.config, cli.verbose);
            if resume {
                config.session.resume = true;
            }
            trade_commands::start_trading(&config, minutes).await
        }
    };

    if let Err(e) = outcome {
        error!("❌ [{}] {}", e.category(), e.user_message());
        std::process::exit(1);
    }
}

/// Load config and start logging, or exit with a helpful error message
fn load_config_or_exit(path: &str, verbose: bool) -> Config {
    match Config::from_file(path) {
        Ok(config) => {
            init_logging(&config.logging, verbose);
            info!("🚀 Trend Trading Bot v0.1.0");
            info!("📁 Config: {}", path);
            config
        }
        Err(e) => {
            init_logging(&LoggingConfig::default(), verbose);
            error!("❌ Configuration Error");
            error!("{}", e);

            if matches!(e, ConfigError::FileNotFound(_)) {
                error!("");
                error!("💡 Quick fix:");
                error!("   1. Run: trend-bot init");
                error!("   2. Edit config.toml with your market and balances");
                error!("   3. Try again");
            }

            std::process::exit(1);
        }
    }
}

fn init_workspace(config_path: &str, force: bool) -> TradingResult<()> {
    info!("🔧 Initializing workspace...");

    let config = Config::default();
    if std::path::Path::new(config_path).exists() && !force {
        warn!("⚠️  {} already exists, skipping (use --force to overwrite)", config_path);
    } else {
        config.to_file(config_path)?;
        info!("📝 Created {}", config_path);
    }

    if let Some(parent) = config.logging.execution_log.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    info!("✅ Workspace initialized successfully!");
    info!("💡 Next steps:");
    info!("   1. Edit {} with your market and balances", config_path);
    info!("   2. Run: trend-bot backtest");
    info!("   3. Run: trend-bot trade");

    Ok(())
}
