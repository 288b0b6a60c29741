use anyhow::Result;
use lazy_static::lazy_static;
use std::{process, sync::RwLock};
use tokio::runtime::Runtime;
use tracing::{debug, error};

use nodeselector_webhook::{cli, config::Config, tracing::setup_tracing, WebhookServer};

lazy_static! {
    static ref TRACE_SYSTEM_INITIALIZED: RwLock<bool> = RwLock::new(false);
}

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();

    // Configuration problems must stop the process before it accepts any connection
    let config = match Config::from_args(&matches) {
        Ok(config) => config,
        Err(e) => fatal_error(e.to_string()),
    };

    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(error) => fatal_error(format!("error initializing tokio runtime: {error}")),
    };

    rt.block_on(async {
        match setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color) {
            Err(err) => fatal_error(err.to_string()),
            Ok(_) => {
                debug!("tracing system ready");
                if let Ok(mut initialized) = TRACE_SYSTEM_INITIALIZED.write() {
                    *initialized = true;
                }
            }
        };

        let server = match WebhookServer::new_from_config(config).await {
            Ok(server) => server,
            Err(e) => fatal_error(e.to_string()),
        };

        if let Err(e) = server.run().await {
            fatal_error(e.to_string());
        }
    });

    Ok(())
}

fn fatal_error(msg: String) -> ! {
    let trace_system_ready = TRACE_SYSTEM_INITIALIZED
        .read()
        .map(|initialized| *initialized)
        .unwrap_or(false);
    if trace_system_ready {
        error!("{}", msg);
    } else {
        eprintln!("{msg}");
    }

    process::exit(1);
}
