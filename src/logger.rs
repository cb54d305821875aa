//! # Logging
//!
//! Installs a `tracing` subscriber from [`crate::config::Logger`]. Events are
//! filtered by `RUST_LOG` when it is set; otherwise by the configured
//! override filter, and failing that by the configured level applied to this
//! crate.

use serde::{Deserialize, Serialize};
use serde_variant::to_variant_name;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::{config, Error, Result};

const MODULE_WHITELIST: &[&str] = &["ecobuilder"];

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum LogLevel {
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "trace")]
    Trace,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "info")]
    #[default]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum Format {
    #[serde(rename = "compact")]
    #[default]
    Compact,
    #[serde(rename = "pretty")]
    Pretty,
    #[serde(rename = "json")]
    Json,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(to_variant_name(self).map_err(|_| std::fmt::Error)?)
    }
}

/// Installs the global subscriber.
///
/// Does nothing when logging is disabled.
///
/// # Errors
///
/// Fails when the filter does not parse or a global subscriber is already set.
pub fn init(config: &config::Logger) -> Result<()> {
    if !config.enable {
        return Ok(());
    }
    let layer = init_layer(std::io::stderr, config.format, true);
    let env_filter = init_env_filter(config.override_filter.as_deref(), config.level)?;
    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .try_init()
        .map_err(|err| Error::Logger(err.to_string()))
}

fn init_env_filter(override_filter: Option<&str>, level: LogLevel) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = override_filter.map_or_else(
        || {
            MODULE_WHITELIST
                .iter()
                .map(|module| format!("{module}={level}"))
                .collect::<Vec<_>>()
                .join(",")
        },
        str::to_string,
    );
    EnvFilter::try_new(&directives).map_err(|err| Error::Logger(format!("`{directives}`: {err}")))
}

fn init_layer<W>(make_writer: W, format: Format, ansi: bool) -> Box<dyn Layer<Registry> + Sync + Send>
where
    W: for<'writer> MakeWriter<'writer> + Sync + Send + 'static,
{
    match format {
        Format::Compact => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .compact()
            .boxed(),
        Format::Pretty => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .pretty()
            .boxed(),
        Format::Json => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .json()
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_displays_as_filter_directive() {
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Off.to_string(), "off");
    }

    #[test]
    fn rejects_malformed_override_filter() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(init_env_filter(Some("ecobuilder=loud"), LogLevel::Info).is_err());
        assert!(init_env_filter(None, LogLevel::Trace).is_ok());
    }
}
