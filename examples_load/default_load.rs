use std::sync::Arc;
use std::time::Instant;

use tee_log_sink::{fields, make_logger_from_config, AsyncRelay, Deliver, LoggerConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let relay = Arc::new(AsyncRelay::with_default_capacity(|_payload: &[u8]| {})?);
    let deliver: Arc<dyn Deliver> = relay.clone();
    let logger = make_logger_from_config(&LoggerConfig::remote(), Some(deliver));
    let logger = logger.with(&fields!["service" => "load", "trace_id" => "default-load"]);

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        logger.error("default load test error", &fields!["iteration" => i]);
    }

    let elapsed = start.elapsed();
    println!(
        "default config: sent {} records in {:?} (~{:.0} rec/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    relay.close();
    println!("relay: {:?}", relay.stats());
    Ok(())
}
