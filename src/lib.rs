//! Structured logging facade that tees each record to a human-readable
//! console sink and a machine-readable remote callback.
//!
//! Remote output is a fixed JSON envelope
//! (`Path`, `Level`, `Content`, `TraceId`, `CreatedAt`). Put an
//! [`AsyncRelay`] in front of a slow callback to keep producers from ever
//! waiting on it; when its queue is full, payloads are dropped.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tee_log_sink::{fields, make_logger_from_config, AsyncRelay, Deliver, LoggerConfig};
//!
//! # fn main() -> Result<(), tee_log_sink::error::RelayError> {
//! let relay = Arc::new(AsyncRelay::new(1024, |payload: &[u8]| {
//!     // ship `payload` somewhere slow
//!     let _ = payload;
//! })?);
//!
//! let config = LoggerConfig { console: true, remote: true, level: "info".into() };
//! let deliver: Arc<dyn Deliver> = relay.clone();
//! let logger = make_logger_from_config(&config, Some(deliver));
//!
//! let request = logger.with(&fields!["trace_id" => "abc123"]);
//! request.info("order accepted", &fields!["items" => 3]);
//!
//! relay.close();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod console;
pub mod dispatcher;
pub mod error;
pub mod field;
pub mod init;
pub mod layer;
pub mod level;
pub mod logger;
pub mod record;
pub mod relay;
pub mod remote;
pub mod sink;
pub mod writer;

pub use config::LoggerConfig;
pub use dispatcher::make_logger_from_config;
pub use field::Field;
pub use level::{Level, LevelGate};
pub use logger::Logger;
pub use relay::{AsyncRelay, RelayStats};
pub use remote::{Envelope, RemoteSink};
pub use sink::{AsyncDeliver, Deliver, LogSink};
pub use writer::EnvelopeWriter;
