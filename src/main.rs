use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use watchly::app::{build_http_client, App, AppEvent, ChannelNavigator};
use watchly::auth::{FirebaseIdentity, IdentityService, MemoryIdentity, SessionGate};
use watchly::catalog::{CategoryFetcher, CategoryRow, RowState};
use watchly::config::Config;
use watchly::ui;

/// Get the config directory path (~/.config/watchly/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("watchly"))
}

#[derive(Parser, Debug)]
#[command(name = "watchly", about = "Browse trending and popular movies from the terminal")]
struct Args {
    /// Config file (default: ~/.config/watchly/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use a throwaway in-process account store instead of Firebase
    #[arg(long)]
    local_auth: bool,

    /// Fetch every home row once, print it and exit
    #[arg(long)]
    list: bool,

    /// Write logs to this file (otherwise logs go to stderr when RUST_LOG is set)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("watchly=info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        // The TUI owns stdout; stderr logging only when explicitly requested
        None if std::env::var_os("RUST_LOG").is_some() => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        None => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file.as_ref())?;

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config.apply_env();
    tracing::debug!(config = ?config, "Configuration loaded");

    let Some(tmdb_key) = config.tmdb_secret() else {
        eprintln!("Error: No TMDB API key configured.");
        eprintln!();
        eprintln!("Set TMDB_API_KEY in the environment, or add to {}:", config_path.display());
        eprintln!("  tmdb_api_key = \"<your key>\"");
        std::process::exit(1);
    };

    let http_client = build_http_client().context("Failed to build HTTP client")?;
    let fetcher = CategoryFetcher::new(http_client.clone(), config.catalog_url()?, tmdb_key);
    let image_base_url = config.image_url()?;
    let rows = config.home_rows();

    if args.list {
        return list_rows(fetcher, rows).await;
    }

    let identity: Arc<dyn IdentityService> = if args.local_auth {
        tracing::info!("Using local in-memory accounts");
        Arc::new(MemoryIdentity::new())
    } else {
        let Some(firebase_key) = config.firebase_secret() else {
            eprintln!("Error: No Firebase API key configured.");
            eprintln!();
            eprintln!("Set FIREBASE_API_KEY, add firebase_api_key to the config file,");
            eprintln!("or run with --local-auth to try the app without an account backend.");
            std::process::exit(1);
        };
        FirebaseIdentity::new(http_client, config.identity_url()?, firebase_key).into_shared()
    };

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    let mut app = App::new(identity.clone(), fetcher, rows, image_base_url);

    let gate = SessionGate::mount(
        identity.as_ref(),
        Arc::new(ChannelNavigator::new(event_tx.clone())),
    );

    let result = ui::run(&mut app, event_tx, event_rx).await;
    gate.teardown().await;
    result?;

    println!("Goodbye!");
    Ok(())
}

/// Mounts every row, waits for each to settle and prints the outcome.
async fn list_rows(
    fetcher: CategoryFetcher,
    descriptors: Vec<watchly::catalog::CategoryDescriptor>,
) -> Result<()> {
    let rows: Vec<CategoryRow> = descriptors
        .into_iter()
        .map(|d| CategoryRow::mount(fetcher.clone(), d))
        .collect();

    let settled = futures::future::join_all(rows.iter().map(|row| {
        let mut rx = row.subscribe();
        async move {
            rx.wait_for(|state| !matches!(state, RowState::Loading))
                .await
                .map(|state| (*state).clone())
        }
    }))
    .await;

    let mut failures = 0;
    for (row, state) in rows.iter().zip(settled) {
        println!("== {} ==", row.label());
        match state {
            Ok(RowState::Success(items)) if items.is_empty() => println!("  (no titles)"),
            Ok(RowState::Success(items)) => {
                for item in items {
                    println!("  {}", item.title);
                }
            }
            Ok(RowState::Failure(message)) => {
                failures += 1;
                println!("  error: {}", message);
            }
            Ok(RowState::Loading) | Err(_) => {
                failures += 1;
                println!("  error: row closed before loading finished");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} row(s) failed to load", failures);
    }
    Ok(())
}
