use clap::Parser;
use gamebot_cli::{CliError, ConsoleRuntime, ConsoleTransport, LogConfig, Result};
use gamebot_core::{AppConfig, NotifierConfig, NotifierPolicy};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gamebot")]
#[command(version, about = "Turn-based chat games, played on the console")]
struct Cli {
    /// How the "your turn" message is refreshed
    #[arg(long, default_value_t = NotifierPolicy::DedupResend)]
    policy: NotifierPolicy,

    /// Quiet interval before the turn message is re-sent, in milliseconds
    #[arg(long, default_value_t = 5000)]
    quiet_interval_ms: u64,

    /// Display name of the bot opponent
    #[arg(long, default_value = "gamebot")]
    bot_name: String,

    /// Seed for first-player choice and bot moves
    #[arg(long)]
    seed: Option<u64>,

    /// Default log level (RUST_LOG overrides it)
    #[arg(long, default_value_t = tracing::Level::INFO)]
    log_level: tracing::Level,

    /// Verbose logging with spans and thread ids
    #[arg(long, conflicts_with = "quiet")]
    dev: bool,

    /// Only log warnings and errors
    #[arg(long)]
    quiet: bool,

    /// Write a Chrome trace file (needs the `chrome-trace` feature)
    #[arg(long)]
    chrome_trace: bool,
}

impl Cli {
    fn log_config(&self) -> LogConfig {
        let config = if self.dev {
            LogConfig::dev()
        } else if self.quiet {
            LogConfig::quiet()
        } else {
            LogConfig::default().with_level(self.log_level)
        };

        if self.chrome_trace {
            config.with_chrome_trace()
        } else {
            config
        }
    }

    fn app_config(&self) -> Result<AppConfig> {
        if self.quiet_interval_ms == 0 {
            return Err(CliError::InvalidConfig(
                "quiet interval must be greater than zero".to_string(),
            ));
        }

        let notifier = NotifierConfig::new()
            .with_policy(self.policy)
            .with_quiet_interval(Duration::from_millis(self.quiet_interval_ms));

        let config = AppConfig::new()
            .with_notifier(notifier)
            .with_bot_name(self.bot_name.clone());

        Ok(match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    cli.log_config().init().map_err(CliError::Logging)?;

    let config = cli.app_config()?;
    info!(policy = %cli.policy, quiet_interval_ms = cli.quiet_interval_ms, "🤖 Starting {}", cli.bot_name);

    let runtime = ConsoleRuntime::new(config, Arc::new(ConsoleTransport::new()))?;
    let report = runtime.run().await?;

    info!("📋 Shutdown report: {}", serde_json::to_string(&report)?);
    Ok(())
}
