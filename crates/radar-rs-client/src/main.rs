mod config;
mod console;
mod session;

use std::sync::Arc;

use config::ClientConfig;
use console::Console;
use radar_rs_command::format::strip_colors;
use radar_rs_list::{HttpListFetcher, IdentifierResolver, ListRegistry, MojangProfileLookup};
use session::ConsoleSession;
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "radar.toml".into());
    let config = match ClientConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("radar-rs client v{} starting", env!("CARGO_PKG_VERSION"));
    info!("List directory: {}", config.storage.directory);

    let fetcher = match HttpListFetcher::new(config.reload.fetch_timeout()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {e}");
            std::process::exit(1);
        }
    };
    let lookup = match MojangProfileLookup::new(
        config.resolver.lookup_url.clone(),
        config.resolver.connect_timeout(),
        config.resolver.read_timeout(),
    ) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {e}");
            std::process::exit(1);
        }
    };

    let registry = Arc::new(ListRegistry::new(
        &config.storage.directory,
        Arc::new(fetcher),
    ));
    for list in &config.public_lists {
        if let Err(e) = registry
            .register_public_list(&list.namespace, &list.prefix, &list.url)
            .await
        {
            warn!("Could not register public list '{}': {e}", list.namespace);
        }
    }
    let loaded = registry.load_private_lists();
    info!("Loaded {loaded} private lists");
    let purged = registry.purge_expired();
    if purged > 0 {
        info!("Purged {purged} expired entries");
    }

    let session = Arc::new(ConsoleSession::new());
    let resolver = Arc::new(IdentifierResolver::new(
        session.clone(),
        Arc::new(lookup),
        &config.resolver,
    ));
    let console = Console::new(registry.clone(), resolver, session, config.chat.clone());

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    // Handle Ctrl+C
    let shutdown_tx_ctrlc = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx_ctrlc.send(true);
    });

    let reload_task = config
        .reload
        .interval()
        .map(|period| registry.spawn_periodic_reload(period, shutdown_rx.clone()));

    // Console REPL: read lines from stdin
    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    println!("Type 'help' for console commands, 'radar help' for list commands.");
    let mut shutdown_rx_console = shutdown_rx;
    loop {
        tokio::select! {
            line = console_rx.recv() => {
                let Some(line) = line else {
                    break; // stdin closed
                };
                let outcome = console.handle_line(&line).await;
                for out in &outcome.lines {
                    println!("{}", strip_colors(out));
                }
                if outcome.should_stop {
                    break;
                }
            }
            _ = shutdown_rx_console.changed() => {
                if *shutdown_rx_console.borrow() {
                    break;
                }
            }
        }
    }

    let _ = shutdown_tx.send(true);
    if let Some(task) = reload_task {
        task.await.ok();
    }
    info!("Client shut down.");
}
