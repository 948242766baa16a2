//! TestingBot MCP Server - Entry Point
//!
//! Serves MCP over stdio. Logs go to stderr as JSON (stdout carries the
//! protocol), and also to `logs/debug.log` when `TESTINGBOT_DEBUG` is set.

use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};

use testingbot_mcp::{build_registry, Config, McpServer, SharedApi, TestingBotClient};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let directive = config
        .log_level
        .clone()
        .unwrap_or_else(|| config.default_log_level().to_string());
    let filter = EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| EnvFilter::new(config.default_log_level()));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .json();

    let file_layer = if config.debug_to_file {
        let path = config.debug_log_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Some(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .json(),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("TestingBot MCP Server v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage: testingbot-mcp");
        println!();
        println!("Runs an MCP server over stdio.");
        println!();
        println!("Environment variables:");
        println!("  TESTINGBOT_KEY           API key (or TB_KEY, TESTINGBOT_USERNAME)");
        println!("  TESTINGBOT_SECRET        API secret (or TB_SECRET, TESTINGBOT_ACCESS_KEY)");
        println!("  TESTINGBOT_API_URL       API base URL (default: https://api.testingbot.com/v1)");
        println!("  TESTINGBOT_TIMEOUT_SECS  HTTP timeout in seconds (default: 30)");
        println!("  TESTINGBOT_DEBUG         Also log to logs/debug.log");
        println!("  LOG_LEVEL / RUST_LOG     Log filter");
        return Ok(());
    }

    let config = Config::from_env()?;
    init_logging(&config)?;

    info!("TestingBot MCP Server v{}", env!("CARGO_PKG_VERSION"));
    info!(api_url = %config.api_url, "Configuration loaded");

    let api: SharedApi = Arc::new(TestingBotClient::new(&config)?);
    let registry = build_registry(&api)?;
    let server = McpServer::new(registry);
    server.run().await?;

    Ok(())
}
