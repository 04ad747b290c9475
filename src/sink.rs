use crate::field::Field;
use crate::level::Level;
use crate::record::LogRecord;
use async_trait::async_trait;
use std::sync::Arc;

/// Synchronous destination for [`LogRecord`]s fanned out by a
/// [`Logger`](crate::logger::Logger).
///
/// The logger asks [`enabled`](LogSink::enabled) before building a record,
/// and only calls [`write`](LogSink::write) on sinks that said yes. Writes
/// run on the producer's thread and must not fail or block; anything slow
/// belongs behind an [`AsyncRelay`](crate::relay::AsyncRelay).
pub trait LogSink: Send + Sync {
    /// Cheap severity check, done before any field work.
    fn enabled(&self, level: Level) -> bool;

    /// Derive a sink carrying `existing ++ fields` as standing fields.
    ///
    /// The receiver is left untouched, so siblings derived from the same
    /// sink never see each other's fields.
    fn with_fields(&self, fields: &[Field]) -> Arc<dyn LogSink>;

    /// Write one record together with its call-site fields.
    fn write(&self, record: &LogRecord, fields: &[Field]);

    /// Flush anything buffered. Default implementation is a no-op.
    fn flush(&self) {}
}

/// Final consumer of encoded envelope bytes.
///
/// Any `Fn(&[u8]) + Send + Sync` closure qualifies, as does
/// [`AsyncRelay`](crate::relay::AsyncRelay) itself, so a remote sink can be
/// pointed at a relay, a network writer or a test double unchanged.
pub trait Deliver: Send + Sync {
    fn deliver(&self, payload: &[u8]);
}

impl<F> Deliver for F
where
    F: Fn(&[u8]) + Send + Sync,
{
    fn deliver(&self, payload: &[u8]) {
        self(payload)
    }
}

/// Asynchronous consumer driven by a tokio-hosted relay worker.
///
/// The worker awaits each call before taking the next payload, so
/// implementations never run concurrently with themselves.
#[async_trait]
pub trait AsyncDeliver: Send + Sync {
    async fn deliver(&self, payload: Vec<u8>);
}
