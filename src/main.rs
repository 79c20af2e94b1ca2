//! trie-router
//!
//! Serves a TOML-configured route table through a radix tree router.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ routing::Router::resolve ──▶ endpoint
//!                      (axum +          (per-method radix trees,     (echo /
//!                       tower layers)    redirects, 405)              text /
//!                                                                     files)
//!
//!     router.toml ──▶ config loader ──▶ route table ──▶ ArcSwap
//!          ▲                                              ▲
//!          └──── watcher (notify) ── reload ──────────────┘
//! ```

use std::error::Error;
use std::path::{Path, PathBuf};

use axum::http::Method;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use trie_router::config::load_config;
use trie_router::config::watcher::ConfigWatcher;
use trie_router::http::{describe, HttpServer};
use trie_router::lifecycle::{signals, Shutdown};
use trie_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "trie-router")]
#[command(about = "HTTP request router driven by a TOML route table", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "router.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server, reloading routes when the file changes
    Serve,
    /// Validate the configuration and compile the route table
    Check,
    /// Show how a request would be dispatched
    Lookup {
        /// HTTP method, e.g. GET
        method: String,
        /// Request path, e.g. /users/42
        path: String,
    },
    /// Print the radix tree of one method, or of all of them
    Tree {
        method: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => serve(&cli.config).await,
        Commands::Check => check(&cli.config),
        Commands::Lookup { method, path } => lookup(&cli.config, &method, &path),
        Commands::Tree { method } => tree(&cli.config, method.as_deref()),
    }
}

async fn serve(path: &Path) -> Result<(), Box<dyn Error>> {
    let config = load_config(path)?;
    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        config = %path.display(),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.listener.request_timeout_secs,
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let (watcher, config_updates) = ConfigWatcher::new(path);
    // dropping the watcher stops reloads
    let _watcher = match watcher.run() {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
            None
        }
    };

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn check(path: &Path) -> Result<(), Box<dyn Error>> {
    let config = load_config(path)?;
    let table = config.compile()?;

    println!("{}: {} routes", path.display(), table.route_count());
    for method in table.methods() {
        let count = table.tree(method).map_or(0, |tree| tree.len());
        println!("  {method:<8} {count}");
    }
    Ok(())
}

fn lookup(path: &Path, method: &str, request_path: &str) -> Result<(), Box<dyn Error>> {
    let table = load_config(path)?.compile()?;
    let method = parse_method(method)?;

    let resolution = table.resolve(&method, request_path);
    println!("{}", serde_json::to_string_pretty(&describe(&resolution))?);
    Ok(())
}

fn tree(path: &Path, method: Option<&str>) -> Result<(), Box<dyn Error>> {
    let table = load_config(path)?.compile()?;

    let methods = match method {
        Some(method) => vec![parse_method(method)?],
        None => table.methods().into_iter().cloned().collect(),
    };

    for method in methods {
        match table.tree(&method) {
            Some(tree) => print!("{method}\n{tree}"),
            None => println!("{method}\n  (no routes)"),
        }
    }
    Ok(())
}

fn parse_method(method: &str) -> Result<Method, Box<dyn Error>> {
    Ok(Method::from_bytes(method.to_ascii_uppercase().as_bytes())?)
}
