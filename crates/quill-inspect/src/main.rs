//! Binary entrypoint: seal the standard manifest and print its report.
//!
//! Usage: `quill-inspect [config.yaml]`. Log filtering comes from `QUILL_LOG`.
use anyhow::Context;
use quill_core::EngineConfig;
use quill_engine::{startup, Manifest};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_ENV: &str = "QUILL_LOG";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => EngineConfig::default(),
    };
    let config = config.with_env_overrides()?;

    let registry = startup(config, Manifest::standard()).context("registration failed")?;
    let report = registry.report().context("registry did not produce a report")?;
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
