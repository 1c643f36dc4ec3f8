use std::io;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::info;

use halberd_engine::{Engine, EngineOptions};
use halberd_uci::UciLoop;

fn main() -> Result<()> {
    // Stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    info!(version = env!("CARGO_PKG_VERSION"), "halberd starting");

    let engine = Engine::new(EngineOptions::default()).context("failed to start the engine")?;
    let mut uci = UciLoop::new(engine, Arc::new(Mutex::new(io::stdout())));
    uci.run(io::stdin().lock()).context("UCI loop failed")?;
    Ok(())
}
