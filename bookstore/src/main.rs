//! # Bookstore Entry Point
//!
//! 1. **Initialization**: parses command-line arguments with [`cli::Cli`] and installs the
//!    `tracing` subscriber (`RUST_LOG` overrides the default `info` filter).
//! 2. **Startup**: runs [`bookstore::app::start`]. Any startup failure is fatal.
//! 3. **Supervision**: waits for either server to stop (fatal) or for Ctrl-C (clean exit).

mod cli;

use bookstore::app;
use clap::Parser;
use cli::Cli;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let bookstore = match app::start(&args.into()).await {
        Ok(bookstore) => bookstore,
        Err(err) => {
            tracing::error!("{err}");
            process::exit(1);
        }
    };

    tokio::select! {
        err = bookstore.wait() => {
            tracing::error!("{err}");
            process::exit(1);
        }
        res = tokio::signal::ctrl_c() => {
            if let Err(err) = res {
                tracing::error!("Failed to listen for Ctrl-C: {err}");
                process::exit(1);
            }
            tracing::info!("Shutting down");
        }
    }
}
