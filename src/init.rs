use crate::config::LoggerConfig;
use crate::error::InitError;
use crate::layer::SinkLayer;
use crate::level::{Level, LevelGate};
use crate::remote::RemoteSink;
use crate::sink::Deliver;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// `tracing` has no panic severity; a panic threshold filters everything.
fn level_filter(level: Level) -> LevelFilter {
    match level {
        Level::Panic => LevelFilter::OFF,
        other => LevelFilter::from_level(other.as_tracing()),
    }
}

/// Install the global `tracing` subscriber described by `config`.
///
/// **Parameters**
/// - `config`: which outputs to enable and the minimum level.
/// - `deliver`: callback for remote output. Remote output is only wired
///   when `config.remote` is set and this is `Some`.
///
/// **Effects**
///
/// Builds a [`Registry`](tracing_subscriber::Registry) with a level filter,
/// a `fmt` layer when `config.console` is set and a
/// [`SinkLayer`]`<`[`RemoteSink`]`>` when remote output is wired, then
/// installs it as the process-wide default. A `panic` threshold turns the
/// bridge off, since no `tracing` event maps to panic. Afterwards plain
/// `tracing::info!(trace_id = "..", "..")` calls reach the callback as
/// envelopes.
///
/// **Returns**
/// - `Err(InitError::AlreadyInstalled)` if a global subscriber was set
///   before.
pub fn init_tracing(
    config: &LoggerConfig,
    deliver: Option<Arc<dyn Deliver>>,
) -> Result<(), InitError> {
    let level = config.min_level();

    let console_layer = config.console.then(tracing_subscriber::fmt::layer);
    let remote_layer = match (config.remote, deliver) {
        (true, Some(deliver)) => {
            Some(SinkLayer::new(RemoteSink::new(LevelGate::new(level), deliver)))
        }
        _ => None,
    };

    tracing_subscriber::registry()
        .with(level_filter(level))
        .with(console_layer)
        .with(remote_layer)
        .try_init()?;

    Ok(())
}
