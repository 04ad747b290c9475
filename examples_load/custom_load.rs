use std::sync::Arc;
use std::time::{Duration, Instant};

use tee_log_sink::{fields, make_logger_from_config, AsyncRelay, Deliver, LoggerConfig};

/// Small queue in front of a deliberately slow consumer: shows that the
/// producer keeps its pace and the overflow is dropped.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let relay = Arc::new(AsyncRelay::new(256, |_payload: &[u8]| {
        std::thread::sleep(Duration::from_micros(50));
    })?);
    let deliver: Arc<dyn Deliver> = relay.clone();

    let config = LoggerConfig::remote().with_level("debug");
    let logger = make_logger_from_config(&config, Some(deliver));

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        logger.debug("custom load test", &fields!["iteration" => i]);
    }

    let elapsed = start.elapsed();
    println!(
        "custom config: sent {} records in {:?} (~{:.0} rec/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    relay.close();
    let stats = relay.stats();
    println!(
        "relay: enqueued={} dropped={} delivered={}",
        stats.enqueued, stats.dropped, stats.delivered
    );
    Ok(())
}
