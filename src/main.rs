mod config;
mod prober;
mod progress;
mod timestamp;
mod util;

use config::ProbeConfig;
use progress::ProgressLog;

use reqwest::Client;
use std::io::Write;
use tracing::{debug, error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load config first to get log level
    let config = ProbeConfig::load().await?;
    let log_level = config.get_tracing_level()?;

    // stdout carries only the status code
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()
                         .add_directive(format!("crypto_probe={}", log_level.as_str().to_lowercase()).parse()?))
        .init();

    let client = prober::http::build_client(config.timeout())?;
    let mut stdout = std::io::stdout();
    run(&config, &client, &mut stdout).await
}

/// Probe once, bracketed by progress lines, and write the status code to `out`.
/// Nothing reaches `out` unless the request succeeds and the progress file
/// (when enabled) accepts both lines.
async fn run(config: &ProbeConfig, client: &Client, out: &mut impl Write) -> anyhow::Result<()> {
    let progress = config
        .enable_progress_log
        .then(|| ProgressLog::new(&config.log_file));
    if let Some(log) = &progress {
        info!("progress log at {}", log.path().display());
        log.log("Probe started")?;
    }

    let url = config.request_url()?;
    let outcome = match prober::http::probe_status(client, &url).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // detail travels with the returned error
            error!("probe failed");
            if let Some(log) = &progress {
                if let Err(log_err) = log.log("Probe failed") {
                    error!("could not record failure: {}", log_err);
                }
            }
            return Err(e);
        }
    };
    debug!("round trip took {:?}", outcome.elapsed);

    if let Some(log) = &progress {
        log.log(&format!("Probe complete: status {}", outcome.status_code()))?;
    }

    writeln!(out, "{}", outcome.status_code())?;
    Ok(())
}
