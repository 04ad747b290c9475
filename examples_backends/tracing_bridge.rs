use std::sync::Arc;

use tee_log_sink::init::init_tracing;
use tee_log_sink::{AsyncRelay, Deliver, LoggerConfig};
use tracing::{error, info, info_span};

/// Plain `tracing` macros feeding both the console and a remote callback
/// through the global subscriber.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let relay = Arc::new(AsyncRelay::with_default_capacity(|payload: &[u8]| {
        println!("[remote] {}", String::from_utf8_lossy(payload));
    })?);
    let deliver: Arc<dyn Deliver> = relay.clone();

    let config = LoggerConfig::from_env();
    let config = LoggerConfig {
        console: true,
        remote: true,
        ..config
    };
    init_tracing(&config, Some(deliver))?;

    info!("tracing bridge example started");

    let span = info_span!("request", trace_id = "7f3a9c");
    let _guard = span.enter();
    error!(user_id = 42, reason = "invalid password", "authentication failed");

    relay.close();
    Ok(())
}
