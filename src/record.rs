use chrono::{DateTime, Local};
use serde::Serialize;

use crate::level::Level;

/// `chrono` format for `CreatedAt`: second precision, no zone.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One emitted log entry. Lives only for the duration of a single emit
/// call; sinks that need to keep anything copy it out.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub message: String,
    pub caller: Option<Caller>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogRecord {
            timestamp: Local::now(),
            level,
            message: message.into(),
            caller: None,
        }
    }

    pub fn with_caller(mut self, caller: Option<Caller>) -> Self {
        self.caller = caller;
        self
    }

    pub fn created_at(&self) -> String {
        self.timestamp.format(CREATED_AT_FORMAT).to_string()
    }

    /// Short `dir/file.rs:line` form of the caller, or `""`.
    pub fn path(&self) -> String {
        self.caller.map(|c| c.trimmed_path()).unwrap_or_default()
    }
}

/// Source location of the emitting call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
}

impl Caller {
    pub fn new(file: &'static str, line: u32) -> Self {
        Caller { file, line }
    }

    /// Location of the nearest caller not marked `#[track_caller]`.
    #[track_caller]
    pub fn here() -> Self {
        let loc = std::panic::Location::caller();
        Caller::new(loc.file(), loc.line())
    }

    /// Keeps only the last two path segments: `a/b/src/lib.rs` becomes
    /// `src/lib.rs:line`.
    pub fn trimmed_path(&self) -> String {
        format!("{}:{}", trim_file(self.file), self.line)
    }
}

/// Last two segments of `file`; `/` and `\` both separate.
pub fn trim_file(file: &str) -> &str {
    let is_sep = |c: char| c == '/' || c == '\\';
    match file.rfind(is_sep) {
        Some(last) => match file[..last].rfind(is_sep) {
            Some(prev) => &file[prev + 1..],
            None => file,
        },
        None => file,
    }
}

impl std::fmt::Display for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
