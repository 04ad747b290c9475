use crate::field::Field;
use crate::level::Level;
use crate::record::{Caller, LogRecord};
use crate::sink::LogSink;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::field::{Field as TracingField, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns `tracing` events into
/// [`LogRecord`]s and writes them to a [`LogSink`].
///
/// Fields recorded on enclosing spans act as standing fields (outermost
/// span first) and are followed by the event's own fields. `TRACE` events
/// have no level of their own here and are ignored.
///
/// Several `SinkLayer`s may be stacked on one registry. They share a single
/// copy of each span's fields, kept up to date by whichever layer saw the
/// span first.
pub struct SinkLayer<K> {
    sink: K,
    id: u64,
}

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(0);

impl<K: LogSink> SinkLayer<K> {
    pub fn new(sink: K) -> Self {
        SinkLayer {
            sink,
            id: NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

/// Fields recorded on a span, kept in its extensions.
struct SpanFields {
    owner: u64,
    fields: Vec<Field>,
}

impl<S, K> Layer<S> for SinkLayer<K>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    K: LogSink + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if extensions.get_mut::<SpanFields>().is_some() {
            return;
        }
        let mut fields = Vec::new();
        attrs.record(&mut FieldVisitor::new(&mut fields, None));
        extensions.insert(SpanFields {
            owner: self.id,
            fields,
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(span_fields) = extensions.get_mut::<SpanFields>() {
            if span_fields.owner == self.id {
                values.record(&mut FieldVisitor::new(&mut span_fields.fields, None));
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        let Some(level) = Level::from_tracing(meta.level()) else {
            return;
        };
        if !self.sink.enabled(level) {
            return;
        }

        let mut fields = Vec::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(span_fields) = span.extensions().get::<SpanFields>() {
                    fields.extend_from_slice(&span_fields.fields);
                }
            }
        }

        let mut message = None;
        event.record(&mut FieldVisitor::new(&mut fields, Some(&mut message)));

        let caller = match (meta.file(), meta.line()) {
            (Some(file), Some(line)) => Some(Caller::new(file, line)),
            _ => None,
        };
        let record = LogRecord::new(level, message.unwrap_or_default()).with_caller(caller);
        self.sink.write(&record, &fields);
    }
}

/// Collects `tracing` fields into an ordered field list. The `message`
/// field goes to `message` when a slot is given.
pub struct FieldVisitor<'a> {
    fields: &'a mut Vec<Field>,
    message: Option<&'a mut Option<String>>,
}

impl<'a> FieldVisitor<'a> {
    pub fn new(fields: &'a mut Vec<Field>, message: Option<&'a mut Option<String>>) -> Self {
        FieldVisitor { fields, message }
    }

    fn push(&mut self, field: &TracingField, value: Value) {
        if field.name() == "message" {
            if let Some(slot) = self.message.as_deref_mut() {
                *slot = Some(match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                });
                return;
            }
        }
        self.fields.push(Field::new(field.name(), value));
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &TracingField, value: &str) {
        self.push(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn std::fmt::Debug) {
        self.push(field, Value::String(format!("{:?}", value)));
    }
}
