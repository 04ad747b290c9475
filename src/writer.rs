use std::io;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing_subscriber::fmt::MakeWriter;

use crate::level::{legacy_code, Level};
use crate::record::{trim_file, CREATED_AT_FORMAT};
use crate::remote::{Envelope, TRACE_ID_KEYS};
use crate::sink::Deliver;

/// `io::Write` adapter that re-encodes JSON log lines produced elsewhere
/// (for example by `fmt::layer().json()`) as [`Envelope`]s for a
/// [`Deliver`] callback.
///
/// Each `write` call is taken as one complete line. Lines that are not a
/// JSON object, or that cannot be re-encoded, reach the callback as the
/// raw bytes. Writes never fail.
///
/// ```no_run
/// use std::sync::Arc;
/// use tee_log_sink::{Deliver, EnvelopeWriter};
///
/// let deliver: Arc<dyn Deliver> = Arc::new(|payload: &[u8]| {
///     let _ = payload;
/// });
/// tracing_subscriber::fmt()
///     .json()
///     .with_file(true)
///     .with_line_number(true)
///     .with_writer(EnvelopeWriter::new(deliver))
///     .init();
/// ```
#[derive(Clone)]
pub struct EnvelopeWriter {
    deliver: Arc<dyn Deliver>,
}

impl EnvelopeWriter {
    pub fn new(deliver: Arc<dyn Deliver>) -> Self {
        EnvelopeWriter { deliver }
    }
}

impl io::Write for EnvelopeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match remap(buf) {
            Some(envelope) => self.deliver.deliver(&envelope),
            None => self.deliver.deliver(buf),
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for EnvelopeWriter {
    type Writer = EnvelopeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl std::fmt::Debug for EnvelopeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeWriter").finish_non_exhaustive()
    }
}

/// Keys understood in an encoded line. Both the flat layout
/// (`created_at`, `path`, `message`, `trace_id`) and the `tracing` JSON
/// layout (`timestamp`, `filename`/`line_number`, `fields`, `span`) are
/// accepted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EncodedLine {
    level: String,
    created_at: Option<String>,
    timestamp: Option<String>,
    path: Option<String>,
    filename: Option<String>,
    line_number: Option<u32>,
    message: Option<String>,
    trace_id: Option<Value>,
    #[serde(rename = "TraceId")]
    legacy_trace_id: Option<Value>,
    fields: Map<String, Value>,
    span: Map<String, Value>,
}

fn remap(line: &[u8]) -> Option<Vec<u8>> {
    let value: Value = serde_json::from_slice(line).ok()?;
    if !value.is_object() {
        return None;
    }
    let line = EncodedLine::deserialize(value).ok()?;
    serde_json::to_vec(&line.into_envelope()).ok()
}

impl EncodedLine {
    fn into_envelope(self) -> Envelope {
        let trace_id = [self.trace_id.as_ref(), self.legacy_trace_id.as_ref()]
            .into_iter()
            .chain(TRACE_ID_KEYS.iter().map(|k| self.fields.get(*k)))
            .chain(TRACE_ID_KEYS.iter().map(|k| self.span.get(*k)))
            .flatten()
            .find_map(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let message = self.message.or_else(|| {
            self.fields
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
        });

        let path = self.path.or_else(|| {
            let file = trim_file(self.filename.as_deref()?);
            Some(match self.line_number {
                Some(line) => format!("{file}:{line}"),
                None => file.to_string(),
            })
        });

        let created_at = self
            .created_at
            .or_else(|| self.timestamp.map(|ts| local_created_at(&ts).unwrap_or(ts)));

        // An absent level is "other", not the default threshold.
        let level = match self.level.as_str() {
            "" => legacy_code(None),
            name => legacy_code(name.parse::<Level>().ok()),
        };

        Envelope {
            path: path.unwrap_or_default(),
            level,
            content: message.unwrap_or_default(),
            trace_id,
            created_at: created_at.unwrap_or_default(),
        }
    }
}

fn local_created_at(rfc3339: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(rfc3339).ok()?;
    Some(parsed.with_timezone(&Local).format(CREATED_AT_FORMAT).to_string())
}
