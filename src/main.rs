//! Inex shell: an interactive front end over `libinex` ledger files.

extern crate pest;
#[macro_use]
extern crate pest_derive;

mod command;
mod render;
mod shell;

use libinex::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::io;

/// Logging filter, e.g. `INEX_LOG=libinex=debug`.
const LOG_ENV: &str = "INEX_LOG";

fn main() -> anyhow::Result<()> {
    // Logs go to stderr, stdout belongs to the record tables.
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = Config::from_env()?;
    tracing::debug!(data_dir = %config.data_dir.display(), "starting shell");

    println!("{}", render::BANNER);
    let stdin = io::stdin();
    shell::Shell::new(config, stdin.lock(), io::stdout()).run()
}
