use crate::field::{self, Field};
use crate::level::{Level, LevelGate};
use crate::record::LogRecord;
use crate::sink::LogSink;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

/// Human-readable sink. Each record becomes one line handed to a private
/// `tracing_subscriber::fmt` subscriber, which does the actual rendering.
///
/// The private dispatcher is only entered for the duration of a write, so
/// whatever global subscriber the application installed is not involved.
#[derive(Clone)]
pub struct ConsoleSink {
    gate: LevelGate,
    dispatch: Dispatch,
    fields: Vec<Field>,
}

impl ConsoleSink {
    /// Console sink writing ANSI-colored lines to stdout.
    pub fn new(gate: LevelGate) -> Self {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_target(false)
            .without_time()
            .finish();
        Self::from_dispatch(gate, Dispatch::new(subscriber))
    }

    /// Console sink writing plain lines to `writer`.
    pub fn with_writer<W>(gate: LevelGate, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_target(false)
            .without_time()
            .with_ansi(false)
            .with_writer(writer)
            .finish();
        Self::from_dispatch(gate, Dispatch::new(subscriber))
    }

    fn from_dispatch(gate: LevelGate, dispatch: Dispatch) -> Self {
        ConsoleSink {
            gate,
            dispatch,
            fields: Vec::new(),
        }
    }
}

/// `<created_at>\t<path>\t<message>[\t<fields as JSON>]`.
pub fn render_line(record: &LogRecord, fields: &[Field]) -> String {
    let mut line = format!("{}\t{}\t{}", record.created_at(), record.path(), record.message);
    if !fields.is_empty() {
        let object: Map<String, Value> = fields
            .iter()
            .map(|f| (f.key.clone(), f.value.clone()))
            .collect();
        line.push('\t');
        line.push_str(&Value::Object(object).to_string());
    }
    line
}

impl LogSink for ConsoleSink {
    fn enabled(&self, level: Level) -> bool {
        self.gate.enabled(level)
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn LogSink> {
        Arc::new(ConsoleSink {
            gate: self.gate.clone(),
            dispatch: self.dispatch.clone(),
            fields: field::merge(&self.fields, fields),
        })
    }

    fn write(&self, record: &LogRecord, fields: &[Field]) {
        let line = if self.fields.is_empty() {
            render_line(record, fields)
        } else {
            render_line(record, &field::merge(&self.fields, fields))
        };

        tracing::dispatcher::with_default(&self.dispatch, || match record.level {
            Level::Debug => tracing::debug!("{line}"),
            Level::Info => tracing::info!("{line}"),
            Level::Warn => tracing::warn!("{line}"),
            Level::Error => tracing::error!("{line}"),
            Level::Panic => tracing::error!(panic = true, "{line}"),
        });
    }
}
