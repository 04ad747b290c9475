use std::sync::Arc;

use crate::config::LoggerConfig;
use crate::console::ConsoleSink;
use crate::level::LevelGate;
use crate::logger::Logger;
use crate::remote::RemoteSink;
use crate::sink::{Deliver, LogSink};

/// Build the sinks `cfg` asks for and compose them behind one [`Logger`].
///
/// - `console` adds a [`ConsoleSink`] on stdout.
/// - `remote` adds a [`RemoteSink`], but only when `deliver` is present;
///   a remote sink with nowhere to deliver is not built at all.
///
/// All sinks share one [`LevelGate`] seeded from [`LoggerConfig::min_level`].
/// With no sinks the returned logger is inert. Caller capture is on, since
/// only the entry point can see where a call came from.
pub fn make_logger_from_config(cfg: &LoggerConfig, deliver: Option<Arc<dyn Deliver>>) -> Logger {
    let gate = LevelGate::new(cfg.min_level());
    let console = cfg.console.then(|| ConsoleSink::new(gate.clone()));
    compose(cfg, gate, console, deliver)
}

/// Like [`make_logger_from_config`], with the console sink supplied by the
/// caller (for a custom writer). `console` is only used if `cfg.console`.
pub fn make_logger_with_console(
    cfg: &LoggerConfig,
    console: impl FnOnce(LevelGate) -> ConsoleSink,
    deliver: Option<Arc<dyn Deliver>>,
) -> Logger {
    let gate = LevelGate::new(cfg.min_level());
    let console = cfg.console.then(|| console(gate.clone()));
    compose(cfg, gate, console, deliver)
}

fn compose(
    cfg: &LoggerConfig,
    gate: LevelGate,
    console: Option<ConsoleSink>,
    deliver: Option<Arc<dyn Deliver>>,
) -> Logger {
    let mut sinks: Vec<Arc<dyn LogSink>> = Vec::with_capacity(2);
    if let Some(console) = console {
        sinks.push(Arc::new(console));
    }
    if cfg.remote {
        if let Some(deliver) = deliver {
            sinks.push(Arc::new(RemoteSink::new(gate.clone(), deliver)));
        }
    }

    if sinks.is_empty() {
        return Logger::noop();
    }
    Logger::new(sinks).with_gate(gate).with_caller(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use std::io;
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    fn discard() -> Option<Arc<dyn Deliver>> {
        let deliver: Arc<dyn Deliver> = Arc::new(|_: &[u8]| {});
        Some(deliver)
    }

    #[test]
    fn nothing_enabled_is_noop() {
        assert!(make_logger_from_config(&LoggerConfig::default(), discard()).is_noop());
    }

    #[test]
    fn remote_without_callback_is_not_built() {
        assert!(make_logger_from_config(&LoggerConfig::remote(), None).is_noop());
    }

    #[test]
    fn sink_count_follows_config() {
        let both = LoggerConfig {
            console: true,
            remote: true,
            level: String::new(),
        };
        assert_eq!(make_logger_from_config(&both, discard()).sink_count(), 2);
        assert_eq!(make_logger_from_config(&both, None).sink_count(), 1);
        assert_eq!(make_logger_from_config(&LoggerConfig::remote(), discard()).sink_count(), 1);
    }

    #[test]
    fn level_comes_from_config() {
        let cfg = LoggerConfig::remote().with_level("error");
        let logger = make_logger_from_config(&cfg, discard());
        assert_eq!(logger.level(), Some(Level::Error));
        assert!(!logger.enabled(Level::Warn));
    }

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn custom_console_shares_the_gate_with_remote() {
        let buf = Buffer::default();
        let sent = Arc::new(Mutex::new(Vec::<Vec<u8>>::new()));
        let deliver: Arc<dyn Deliver> = {
            let sent = Arc::clone(&sent);
            Arc::new(move |b: &[u8]| sent.lock().unwrap().push(b.to_vec()))
        };
        let cfg = LoggerConfig {
            console: true,
            remote: true,
            level: "warn".into(),
        };

        let writer = buf.clone();
        let logger = make_logger_with_console(
            &cfg,
            move |gate| ConsoleSink::with_writer(gate, writer),
            Some(deliver),
        );
        assert_eq!(logger.sink_count(), 2);

        logger.info("below threshold", &[]);
        logger.warn("disk almost full", &[]);

        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("disk almost full"), "{out}");
        assert!(!out.contains("below threshold"), "{out}");
        assert_eq!(sent.lock().unwrap().len(), 1);

        logger.set_level(Level::Info);
        logger.info("now both", &[]);
        assert_eq!(sent.lock().unwrap().len(), 2);
        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("now both"), "{out}");
    }

    #[test]
    fn custom_console_is_skipped_when_disabled() {
        let logger = make_logger_with_console(
            &LoggerConfig::remote(),
            |_| unreachable!("console disabled"),
            discard(),
        );
        assert_eq!(logger.sink_count(), 1);
    }
}
