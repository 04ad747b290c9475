use crate::field::{self, Field};
use crate::level::{Level, LevelGate};
use crate::record::LogRecord;
use crate::sink::{Deliver, LogSink};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Field names scanned, in order of appearance, for the trace id.
pub const TRACE_ID_KEYS: [&str; 2] = ["trace_id", "TraceId"];

/// Payload handed to the delivery callback, one JSON object per record.
///
/// Field names, their order and the integer `Level` codes are read by
/// existing downstream consumers and are not free to change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope {
    /// Trimmed `dir/file.rs:line` of the call site, or empty.
    pub path: String,
    /// Legacy integer code, see [`Level::legacy_code`].
    pub level: i64,
    pub content: String,
    /// First string-typed `trace_id`/`TraceId` field, or empty.
    pub trace_id: String,
    /// `YYYY-MM-DD HH:MM:SS`.
    pub created_at: String,
}

impl Envelope {
    pub fn from_record(record: &LogRecord, fields: &[Field]) -> Self {
        Envelope {
            path: record.path(),
            level: record.level.legacy_code(),
            content: record.message.clone(),
            trace_id: extract_trace_id(fields).unwrap_or_default().to_string(),
            created_at: record.created_at(),
        }
    }
}

/// First string value under one of [`TRACE_ID_KEYS`]; non-string values
/// under those keys are skipped.
pub fn extract_trace_id(fields: &[Field]) -> Option<&str> {
    fields
        .iter()
        .filter(|f| TRACE_ID_KEYS.contains(&f.key.as_str()))
        .find_map(Field::as_str)
}

/// Sink that re-encodes each record as an [`Envelope`] and passes the
/// JSON bytes to a [`Deliver`] callback.
///
/// Derived sinks share the gate and the callback but own their standing
/// fields.
#[derive(Clone)]
pub struct RemoteSink {
    gate: LevelGate,
    deliver: Option<Arc<dyn Deliver>>,
    fields: Vec<Field>,
}

impl RemoteSink {
    pub fn new(gate: LevelGate, deliver: Arc<dyn Deliver>) -> Self {
        RemoteSink {
            gate,
            deliver: Some(deliver),
            fields: Vec::new(),
        }
    }

    /// A sink with no callback; every write is ignored.
    pub fn unwired(gate: LevelGate) -> Self {
        RemoteSink {
            gate,
            deliver: None,
            fields: Vec::new(),
        }
    }

    pub fn standing_fields(&self) -> &[Field] {
        &self.fields
    }

    /// Copy of this sink with `fields` appended to its standing fields.
    pub fn derive(&self, fields: &[Field]) -> RemoteSink {
        RemoteSink {
            gate: self.gate.clone(),
            deliver: self.deliver.clone(),
            fields: field::merge(&self.fields, fields),
        }
    }

    /// Encode `record` with `standing ++ fields`. Returns `None` only if
    /// serialization fails.
    pub fn encode(&self, record: &LogRecord, fields: &[Field]) -> Option<Vec<u8>> {
        let envelope = if self.fields.is_empty() {
            Envelope::from_record(record, fields)
        } else {
            Envelope::from_record(record, &field::merge(&self.fields, fields))
        };
        serde_json::to_vec(&envelope).ok()
    }
}

impl LogSink for RemoteSink {
    fn enabled(&self, level: Level) -> bool {
        self.gate.enabled(level)
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn LogSink> {
        Arc::new(self.derive(fields))
    }

    fn write(&self, record: &LogRecord, fields: &[Field]) {
        let Some(deliver) = &self.deliver else {
            return;
        };
        // An envelope that fails to encode is dropped.
        if let Some(payload) = self.encode(record, fields) {
            deliver.deliver(&payload);
        }
    }
}

impl std::fmt::Debug for RemoteSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSink")
            .field("level", &self.gate.level())
            .field("wired", &self.deliver.is_some())
            .field("fields", &self.fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::record::Caller;
    use serde_json::Value;
    use std::sync::Mutex;

    fn capture(level: Level) -> (RemoteSink, Arc<Mutex<Vec<Vec<u8>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let deliver = move |b: &[u8]| sink.lock().unwrap().push(b.to_vec());
        (RemoteSink::new(LevelGate::new(level), Arc::new(deliver)), seen)
    }

    fn last_envelope(seen: &Mutex<Vec<Vec<u8>>>) -> Envelope {
        serde_json::from_slice(seen.lock().unwrap().last().unwrap()).unwrap()
    }

    #[test]
    fn encodes_fields_in_schema_order() {
        let (sink, seen) = capture(Level::Info);
        let record = LogRecord::new(Level::Warn, "disk low")
            .with_caller(Some(Caller::new("/x/src/main.rs", 7)));
        sink.write(&record, &fields!["trace_id" => "t-1"]);

        let raw = String::from_utf8(seen.lock().unwrap()[0].clone()).unwrap();
        let keys = ["\"Path\"", "\"Level\"", "\"Content\"", "\"TraceId\"", "\"CreatedAt\""];
        let order: Vec<usize> = keys
            .iter()
            .map(|k| raw.find(k).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{raw}");

        let env = last_envelope(&seen);
        assert_eq!(env.path, "src/main.rs:7");
        assert_eq!(env.level, 3);
        assert_eq!(env.content, "disk low");
        assert_eq!(env.trace_id, "t-1");
        assert_eq!(env.created_at, record.created_at());
    }

    #[test]
    fn trace_id_takes_first_string_match() {
        let f = fields![
            "TraceId" => 5,
            "other" => "x",
            "TraceId" => "legacy",
            "trace_id" => "later",
        ];
        assert_eq!(extract_trace_id(&f), Some("legacy"));
        assert_eq!(extract_trace_id(&fields!["traceid" => "nope"]), None);
    }

    #[test]
    fn standing_fields_come_before_call_site_fields() {
        let (sink, seen) = capture(Level::Info);
        let derived = sink.with_fields(&fields!["trace_id" => "standing"]);
        derived.write(&LogRecord::new(Level::Info, "m"), &fields!["trace_id" => "call"]);
        assert_eq!(last_envelope(&seen).trace_id, "standing");
    }

    #[test]
    fn derived_sinks_do_not_share_fields() {
        let (sink, seen) = capture(Level::Info);
        let base = sink.derive(&fields!["service" => "x"]);
        let a = base.derive(&fields!["trace_id" => "a"]);
        let b = base.derive(&fields!["span" => "b"]);

        assert_eq!(a.standing_fields(), &fields!["service" => "x", "trace_id" => "a"][..]);
        assert_eq!(b.standing_fields(), &fields!["service" => "x", "span" => "b"][..]);
        assert_eq!(base.standing_fields(), &fields!["service" => "x"][..]);
        assert!(sink.standing_fields().is_empty());

        b.write(&LogRecord::new(Level::Info, "from b"), &[]);
        assert_eq!(last_envelope(&seen).trace_id, "");
        a.write(&LogRecord::new(Level::Info, "from a"), &[]);
        assert_eq!(last_envelope(&seen).trace_id, "a");
    }

    #[test]
    fn unwired_sink_is_silent() {
        let sink = RemoteSink::unwired(LevelGate::new(Level::Debug));
        sink.write(&LogRecord::new(Level::Error, "dropped"), &[]);
        assert!(sink.enabled(Level::Debug));
    }

    #[test]
    fn gate_rejects_below_threshold() {
        let (sink, _) = capture(Level::Error);
        assert!(!sink.enabled(Level::Warn));
        assert!(sink.enabled(Level::Error));
        assert!(sink.enabled(Level::Panic));
    }

    #[test]
    fn envelope_keys_are_pascal_case() {
        let (sink, seen) = capture(Level::Debug);
        sink.write(&LogRecord::new(Level::Debug, "hello"), &[]);
        let value: Value = serde_json::from_slice(&seen.lock().unwrap()[0]).unwrap();
        let obj = value.as_object().unwrap();
        for key in ["Path", "Level", "Content", "TraceId", "CreatedAt"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj.len(), 5);
        assert_eq!(value["Level"], 6);
        assert_eq!(value["Path"], "");
        assert_eq!(value["TraceId"], "");
    }
}
