// ─────────────────────────────────────────────────────────────────────
// Nutrans — Telemetry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Process-wide `tracing` subscriber setup.
//!
//! The filter defaults to `info` and follows `RUST_LOG` when set.
//! `NUTRANS_LOG_ANSI=0` disables coloured output.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INIT_GUARD: OnceLock<Result<(), InitError>> = OnceLock::new();

#[derive(Debug, Clone, thiserror::Error)]
pub enum InitError {
    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadySet(String),
    #[error("invalid NUTRANS_LOG_ANSI value: {0}")]
    Env(String),
}

fn ansi_enabled() -> Result<bool, InitError> {
    match std::env::var("NUTRANS_LOG_ANSI") {
        Ok(raw) => match raw.trim() {
            "" => Ok(std::io::stdout().is_terminal()),
            "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            other => Err(InitError::Env(other.to_string())),
        },
        Err(std::env::VarError::NotPresent) => Ok(std::io::stdout().is_terminal()),
        Err(err) => Err(InitError::Env(err.to_string())),
    }
}

fn install() -> Result<(), InitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(ansi_enabled()?);
    Registry::default()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| InitError::AlreadySet(e.to_string()))
}

/// Install the subscriber once per process. Later calls return the first
/// outcome; a subscriber installed by someone else is accepted.
pub fn init_tracing() -> Result<(), InitError> {
    let result = INIT_GUARD.get_or_init(|| match install() {
        Err(InitError::AlreadySet(_)) => Ok(()),
        other => other,
    });
    if let Err(err) = result {
        warn!("failed to initialise tracing subscriber: {err}");
    }
    result.clone()
}
