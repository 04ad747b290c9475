use crate::field::Field;
use crate::level::{Level, LevelGate};
use crate::record::{Caller, LogRecord};
use crate::sink::LogSink;
use std::sync::Arc;

/// Logging entry point handed to application code.
///
/// A logger fans every record out to its sinks, synchronously and in the
/// order they were added. A logger with no sinks is inert: every emit call
/// returns before touching the clock or the caller location.
///
/// Cloning is cheap. [`with`](Logger::with) derives a new logger whose
/// sinks carry extra standing fields; the original is unaffected.
#[derive(Clone, Default)]
pub struct Logger {
    sinks: Vec<Arc<dyn LogSink>>,
    gate: Option<LevelGate>,
    add_caller: bool,
}

impl Logger {
    /// A logger that discards everything.
    pub fn noop() -> Self {
        Logger::default()
    }

    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Logger {
            sinks,
            gate: None,
            add_caller: false,
        }
    }

    /// Record the call site of each emit as the record's [`Caller`].
    pub fn with_caller(mut self, enabled: bool) -> Self {
        self.add_caller = enabled;
        self
    }

    /// Attach the gate the sinks were built with so
    /// [`set_level`](Logger::set_level) can move it.
    pub fn with_gate(mut self, gate: LevelGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn is_noop(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Current threshold of the shared gate, if the logger has one.
    pub fn level(&self) -> Option<Level> {
        self.gate.as_ref().map(LevelGate::level)
    }

    /// Move the shared threshold for every sink built on this logger's
    /// gate, derived loggers included. No-op without a gate.
    pub fn set_level(&self, level: Level) {
        if let Some(gate) = &self.gate {
            gate.set_level(level);
        }
    }

    /// True if at least one sink would accept `level`.
    pub fn enabled(&self, level: Level) -> bool {
        self.sinks.iter().any(|s| s.enabled(level))
    }

    /// Derive a logger whose records all carry `fields`.
    pub fn with(&self, fields: &[Field]) -> Logger {
        if fields.is_empty() || self.sinks.is_empty() {
            return self.clone();
        }
        Logger {
            sinks: self.sinks.iter().map(|s| s.with_fields(fields)).collect(),
            gate: self.gate.clone(),
            add_caller: self.add_caller,
        }
    }

    /// Emit one record at `level`.
    #[track_caller]
    pub fn log(&self, level: Level, message: &str, fields: &[Field]) {
        let mut enabled = self.sinks.iter().filter(|s| s.enabled(level)).peekable();
        if enabled.peek().is_none() {
            return;
        }

        // Called directly: passing `Caller::here` as a fn value would
        // report a location inside `bool::then`.
        let caller = if self.add_caller { Some(Caller::here()) } else { None };
        let record = LogRecord::new(level, message).with_caller(caller);
        for sink in enabled {
            sink.write(&record, fields);
        }
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.log(Level::Debug, message, fields)
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        self.log(Level::Info, message, fields)
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.log(Level::Warn, message, fields)
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field]) {
        self.log(Level::Error, message, fields)
    }

    /// Emits at [`Level::Panic`]. Does not unwind.
    #[track_caller]
    pub fn panic(&self, message: &str, fields: &[Field]) {
        self.log(Level::Panic, message, fields)
    }

    pub fn flush(&self) {
        for sink in &self.sinks {
            sink.flush();
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("sinks", &self.sinks.len())
            .field("level", &self.level())
            .field("add_caller", &self.add_caller)
            .finish()
    }
}
