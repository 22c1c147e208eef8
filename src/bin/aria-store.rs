//! aria-store tool server
//!
//! Reads one request per line from stdin:
//!
//! ```text
//! {"name": "knowledge_get", "arguments": {"nameOrId": "Transformer"}}
//! ```
//!
//! and writes one JSON response per line to stdout. Logs go to stderr;
//! `RUST_LOG` controls the level.

use anyhow::Context;
use aria_store::{StorageConfig, Toolkit};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Deserialize)]
struct Request {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = StorageConfig::load().context("loading storage config")?;
    info!(root = %config.root().display(), "aria-store ready");
    let toolkit = Toolkit::from_config(&config);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!(request = line, "request received");

        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => toolkit
                .invoke(&request.name, request.arguments)
                .await
                .unwrap_or_else(|e| json!({ "success": false, "error": e.to_string() })),
            Err(e) => {
                warn!(error = %e, "malformed request");
                json!({ "success": false, "error": format!("Malformed request: {e}") })
            }
        };

        let mut out = serde_json::to_string(&response)?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}
