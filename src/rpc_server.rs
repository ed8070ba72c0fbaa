//! autorefresh bridge: JSON-RPC over stdin/stdout for the browser-side shim.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"event", "params":{"event":"entity-removed","entityId":4}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Effects:  {"effect":"reload","entityId":4,"bypassCache":false}, one line each,
//!           written after the response or timer tick that produced them.
//!
//! Tracing goes to stderr so stdout stays a clean protocol channel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Stdout};
use tracing_subscriber::EnvFilter;

use autorefresh::app::App;
use autorefresh::clock::{Clock, SystemClock};
use autorefresh::database::Database;
use autorefresh::host::QueuedHost;
use autorefresh::platform;
use autorefresh::rpc_handler::{handle_method, BridgeApp};

/// Environment variable holding the tracing filter.
const LOG_ENV: &str = "AUTOREFRESH_LOG";

async fn write_line(out: &mut BufWriter<Stdout>, value: &Value) -> std::io::Result<()> {
    out.write_all(value.to_string().as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

/// Writes every queued effect, oldest first.
async fn flush_effects(app: &Mutex<BridgeApp>, out: &mut BufWriter<Stdout>) -> std::io::Result<()> {
    let effects = match app.lock() {
        Ok(mut a) => a.host.drain_effects(),
        Err(e) => {
            tracing::error!(error = %e, "app state poisoned");
            return Ok(());
        }
    };
    for effect in effects {
        match serde_json::to_value(&effect) {
            Ok(v) => write_line(out, &v).await?,
            Err(e) => tracing::warn!(error = %e, "failed to serialize effect"),
        }
    }
    Ok(())
}

/// Time until the earliest armed timer, if any.
fn next_wait(app: &Mutex<BridgeApp>, clock: &dyn Clock) -> Option<Duration> {
    let deadline = app.lock().ok()?.scheduler.next_deadline()?;
    let wait = (deadline - clock.now_ms()).max(0);
    Some(Duration::from_millis(wait as u64))
}

async fn handle_line(app: &Mutex<BridgeApp>, line: &str, out: &mut BufWriter<Stdout>) -> std::io::Result<()> {
    let req: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, raw_line = %line, "failed to parse request");
            return write_line(out, &json!({"id": null, "error": format!("parse error: {}", e)})).await;
        }
    };

    let id = req.get("id").cloned().unwrap_or(Value::Null);
    let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
    let params = req.get("params").cloned().unwrap_or(json!({}));

    let response = match handle_method(app, method, &params) {
        Ok(val) => json!({"id": id, "result": val}),
        Err(err) => {
            tracing::debug!(method, error = %err, "request failed");
            json!({"id": id, "error": err})
        }
    };
    write_line(out, &response).await?;
    flush_effects(app, out).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let db_path = platform::database_path();
    if let Some(dir) = db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::error!(dir = %dir.display(), error = %e, "cannot create data directory");
            std::process::exit(1);
        }
    }
    let db = match Database::open(&db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            tracing::error!(path = %db_path.display(), error = %e, "cannot open database");
            std::process::exit(1);
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let host = QueuedHost::new(db.clone(), clock.clone());
    let app = Mutex::new(App::new(db, host, clock.clone()));

    let mut out = BufWriter::new(tokio::io::stdout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    tracing::info!(db = %db_path.display(), "autorefresh bridge starting");
    let ready = json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")});
    if let Err(e) = write_line(&mut out, &ready).await {
        tracing::error!(error = %e, "stdout closed");
        return;
    }

    loop {
        let wait = next_wait(&app, clock.as_ref());

        let result = tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => Ok(()),
                Ok(Some(line)) => handle_line(&app, line.trim(), &mut out).await,
                Ok(None) => {
                    tracing::info!("stdin closed (EOF); shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to read from stdin");
                    break;
                }
            },
            _ = tokio::time::sleep(wait.unwrap_or_default()), if wait.is_some() => {
                let fired = match app.lock() {
                    Ok(mut a) => a.fire_due_timers().map(|f| f.len()),
                    Err(e) => {
                        tracing::error!(error = %e, "app state poisoned");
                        break;
                    }
                };
                match fired {
                    Ok(n) => tracing::debug!(fired = n, "timer tick"),
                    Err(e) => tracing::warn!(error = %e, "timer handling failed"),
                }
                flush_effects(&app, &mut out).await
            }
        };

        if let Err(e) = result {
            tracing::error!(error = %e, "stdout closed");
            break;
        }
    }

    tracing::info!("autorefresh bridge shut down cleanly");
}
