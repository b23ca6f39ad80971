use anyhow::Result;
use sinklog::config::LoggerConfig;
use sinklog::{fields, logging};
use tracing::{debug, error, info, warn};

const WORKERS: usize = 4;

#[tokio::main]
async fn main() -> Result<()> {
    let config = LoggerConfig::from_env()?;
    let logger = config.build()?;
    logging::init_logging(&logger)?;

    info!(
        threshold = %config.level,
        format = %config.format,
        sinks = config.sinks.len(),
        "Logger initialized"
    );

    let mut handles = Vec::with_capacity(WORKERS);
    for worker in 0..WORKERS {
        let logger = logger.child(fields! { "worker" => worker });
        handles.push(tokio::spawn(async move {
            logger.info("worker started");
            if worker % 2 == 1 {
                logger.warn("worker running degraded");
            }
            logger.debug("worker internals");
        }));
    }
    for handle in handles {
        if let Err(e) = handle.await {
            error!("Worker task failed: {}", e);
        }
    }

    debug!("This is below the info threshold and is not written");
    error!(workers = WORKERS, "Demo error, written to both files");

    logger.flush()?;
    if logger.failed_writes() > 0 {
        warn!("{} log lines could not be written", logger.failed_writes());
    }
    Ok(())
}
