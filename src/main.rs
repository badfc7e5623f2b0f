use clap::{ArgGroup, Parser};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use portfolio_alerts::api::{run_server, AppState};
use portfolio_alerts::config::{AppConfig, LoggingConfig};
use portfolio_alerts::constants::paths;
use portfolio_alerts::market::yahoo::YahooClient;
use portfolio_alerts::market::MarketData;
use portfolio_alerts::notify::telegram::TelegramClient;
use portfolio_alerts::notify::AlertDispatcher;
use portfolio_alerts::services::{AlertBot, SweepReport};
use portfolio_alerts::{Clock, PortfolioStore, SystemClock};

type MainResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(
    name = "portfolio_alerts",
    version,
    about = "Portfolio monitoring bot with Telegram and email alerts"
)]
#[command(group(ArgGroup::new("mode").args(["test", "test_alerts", "verify", "summary", "scan", "web"])))]
struct Cli {
    /// Settings file
    #[arg(long, default_value = paths::CONFIG_FILE)]
    config: PathBuf,

    /// Holdings and watchlist file
    #[arg(long, default_value = paths::PORTFOLIO_FILE)]
    portfolio: PathBuf,

    /// Run one check now, ignoring market hours
    #[arg(long)]
    test: bool,

    /// Verify the Telegram setup, then send a test message on every channel
    #[arg(long)]
    test_alerts: bool,

    /// Check Telegram credentials and chat id
    #[arg(long)]
    verify: bool,

    /// Print the portfolio summary and exit
    #[arg(long)]
    summary: bool,

    /// Scan the watchlist once for buy opportunities
    #[arg(long)]
    scan: bool,

    /// Serve the holdings editor
    #[arg(long)]
    web: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Run,
    Test,
    TestAlerts,
    Verify,
    Summary,
    Scan,
    Web,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.test {
            Mode::Test
        } else if self.test_alerts {
            Mode::TestAlerts
        } else if self.verify {
            Mode::Verify
        } else if self.summary {
            Mode::Summary
        } else if self.scan {
            Mode::Scan
        } else if self.web {
            Mode::Web
        } else {
            Mode::Run
        }
    }
}

/// Stdout always; a plain-text file as well when enabled. The guard must live
/// until exit or buffered lines are lost.
fn init_logging(config: &LoggingConfig) -> std::io::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if !config.log_to_file {
        tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
        return Ok(None);
    }

    let dir = config
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let file_name = config
        .log_file
        .file_name()
        .unwrap_or_else(|| OsStr::new("portfolio_alerts.log"));

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Ok(Some(guard))
}

fn log_sweep(label: &str, report: &SweepReport) {
    info!(
        "📋 [{}] Evaluated {} symbols, {} alerts sent",
        label,
        report.evaluated,
        report.alerts.len()
    );
    for alert in &report.alerts {
        info!("🚨 [{}] {} {}", label, alert.kind(), alert.symbol());
    }
    if !report.skipped.is_empty() {
        warn!("⚠️ [{}] No data for: {}", label, report.skipped.join(", "));
    }
}

async fn verify_telegram(config: &AppConfig) -> bool {
    info!("🔍 [TELEGRAM] Verifying bot token and chat id");
    let client = match TelegramClient::new(config.telegram.clone()) {
        Ok(c) => c,
        Err(e) => {
            error!("❌ [TELEGRAM] Cannot create HTTP client: {}", e);
            return false;
        }
    };
    match client.verify().await {
        Ok(username) => {
            info!("✅ [TELEGRAM] Setup verified, alerts will come from @{}", username);
            true
        }
        Err(e) => {
            error!("❌ [TELEGRAM] Verification failed: {}", e);
            if let Some(hint) = e.hint() {
                warn!("💡 [TELEGRAM] {}", hint);
            }
            false
        }
    }
}

fn print_telegram_checklist() {
    println!();
    println!("Telegram setup checklist:");
    println!("  1. Create a bot with @BotFather and copy the token");
    println!("  2. Send your bot a message (e.g. /start)");
    println!("  3. Get your chat id from @userinfobot");
    println!("  4. Put TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID in .env");
    println!("  5. Run again with --verify");
}

async fn send_test_alerts(config: &AppConfig, dispatcher: &AlertDispatcher) -> MainResult {
    if config.telegram.enabled && !verify_telegram(config).await {
        print_telegram_checklist();
    }

    info!("📤 [NOTIFY] Sending test message on every enabled channel");
    let report = dispatcher.send_test().await;
    for channel in &report.delivered {
        println!("✅ {}: working", channel);
    }
    for (channel, reason) in &report.failed {
        println!("❌ {}: {}", channel, reason);
    }
    for channel in &report.skipped {
        println!("⏭️ {}: disabled", channel);
    }

    if report.failed.iter().any(|(c, _)| *c == "telegram") {
        print_telegram_checklist();
    }
    if !report.any_delivered() {
        return Err("no notification channel delivered the test message".into());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> MainResult {
    let cli = Cli::parse();

    // Secrets live in .env; a missing file is fine
    let _ = dotenvy::dotenv();

    let config = AppConfig::load(&cli.config)?;
    let _log_guard = init_logging(&config.logging)?;

    info!("Starting Portfolio Alerts...");
    info!("⚙️ [CONFIG] Loaded {}", cli.config.display());
    info!("📁 [CONFIG] Portfolio file: {}", cli.portfolio.display());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.market.timezone));
    let market: Arc<dyn MarketData> = Arc::new(YahooClient::new(&config.data)?);
    let store = PortfolioStore::new(&cli.portfolio);

    match cli.mode() {
        Mode::Verify => {
            if !verify_telegram(&config).await {
                print_telegram_checklist();
                return Err("telegram verification failed".into());
            }
        }
        Mode::TestAlerts => {
            let dispatcher = AlertDispatcher::from_config(&config, clock)?;
            send_test_alerts(&config, &dispatcher).await?;
        }
        Mode::Web => {
            let state = AppState {
                store,
                market,
                config_path: cli.config.clone(),
            };
            run_server(state, &config.web.bind).await?;
        }
        Mode::Summary => {
            let dispatcher = AlertDispatcher::from_config(&config, clock.clone())?;
            let bot = AlertBot::new(&config, store, market, dispatcher, clock)?;
            println!("{}", bot.summary().await?.render());
        }
        Mode::Scan => {
            let dispatcher = AlertDispatcher::from_config(&config, clock.clone())?;
            let mut bot = AlertBot::new(&config, store, market, dispatcher, clock)?;
            info!("🔭 [SCAN] Scanning watchlist for buy opportunities");
            log_sweep("SCAN", &bot.scan_once().await?);
        }
        Mode::Test => {
            let dispatcher = AlertDispatcher::from_config(&config, clock.clone())?;
            let mut bot = AlertBot::new(&config, store, market, dispatcher, clock)?;
            let report = bot.run_test_check().await?;
            log_sweep("TEST", &report.portfolio);
            if let Some(watchlist) = &report.watchlist {
                log_sweep("WATCHLIST", watchlist);
            }
        }
        Mode::Run => {
            let dispatcher = AlertDispatcher::from_config(&config, clock.clone())?;
            let bot = AlertBot::new(&config, store, market, dispatcher, clock)?;
            bot.run().await?;
        }
    }

    Ok(())
}
