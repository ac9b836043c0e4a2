//! Console entry point.

use std::{fs::OpenOptions, path::PathBuf, sync::Mutex};

use clap::Parser;
use luxlink_client::BridgeClient;
use luxlink_config::ConsoleConfig;
use luxlink_tui::Runtime;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Interactive console for a LAN lighting-control bridge
#[derive(Parser, Debug)]
#[command(name = "luxlink")]
#[command(about = "Terminal console for the luxlink lighting bridge")]
#[command(version)]
struct Args {
    /// Bridge URL (overrides the active profile)
    #[arg(short, long)]
    server: Option<String>,

    /// Named server profile from the config file
    #[arg(short, long)]
    profile: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API key (overrides config and environment)
    #[arg(long)]
    api_key: Option<String>,

    /// Log level for the console's own log file (trace, debug, info, warn,
    /// error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_logging(level: &str) {
    // stdout belongs to the alternate screen; tracing goes to a file.
    let path = luxlink_config::default_log_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config_path = args.config.clone().unwrap_or_else(luxlink_config::default_config_path);
    let mut config = ConsoleConfig::load(&config_path)?;
    if let Some(profile) = &args.profile {
        if !config.servers.contains_key(profile) {
            return Err(format!("no such profile: {profile}").into());
        }
        config.active_server = profile.clone();
    }

    let url = match (&args.server, config.active_profile()) {
        (Some(url), _) => url.clone(),
        (None, Some(profile)) => profile.url.clone(),
        (None, None) => "http://127.0.0.1:8000".to_string(),
    };
    let api_key = args.api_key.clone().or_else(|| config.api_key_for(&config.active_server));

    tracing::info!(%url, "console starting");
    let client = BridgeClient::new(&url, api_key)?;

    let runtime =
        Runtime::new(client, config, config_path, luxlink_config::default_history_path())?;
    Ok(runtime.run().await?)
}
