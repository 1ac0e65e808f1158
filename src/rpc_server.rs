//! Vault RPC Server: JSON-RPC over stdin/stdout for a desktop shell.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.add", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Events:   {"event":"ready", ...} and {"event":"bookmarks.changed","total":n}
//!
//! Requests are served concurrently, so responses may come back out of order;
//! clients match them by `id`.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use vault::app::App;
use vault::logging::init_tracing;
use vault::platform;
use vault::rpc_handler::handle_method;
use vault::types::bookmark::Bookmark;

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

/// Forwards every collection change to the client until the session ends.
fn spawn_change_notifier(mut changes: watch::Receiver<Vec<Bookmark>>, out: mpsc::UnboundedSender<Value>) {
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let total = changes.borrow_and_update().len();
            if out.send(json!({"event": "bookmarks.changed", "total": total})).is_err() {
                break;
            }
        }
        debug!("change notifier stopped");
    });
}

#[tokio::main]
async fn main() {
    init_tracing();

    let db_path = platform::default_database_path();
    let app = match App::new(&db_path.to_string_lossy()) {
        Ok(app) => Arc::new(app),
        Err(e) => {
            error!(path = %db_path.display(), error = %e, "failed to initialize vault");
            std::process::exit(1);
        }
    };
    if let Err(e) = app.startup().await {
        warn!(error = %e, "no bookmark session; configure account.user_id to sign in");
    }

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Value>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(message) = out_rx.recv().await {
            let line = format!("{}\n", message);
            if stdout.write_all(line.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
                break;
            }
        }
    });

    let _ = out_tx.send(json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));
    if let Ok(changes) = app.session().and_then(|s| s.subscribe_changes()) {
        spawn_change_notifier(changes, out_tx.clone());
    }

    // Max 200 RPC requests per second.
    let mut rate_limiter = RateLimiter::new(200);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let _ = out_tx.send(json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            let _ = out_tx.send(json!({"id": id, "error": "rate limit exceeded"}));
            continue;
        }

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let app = Arc::clone(&app);
        let out = out_tx.clone();
        tokio::spawn(async move {
            let response = match handle_method(&app, &method, &params).await {
                Ok(val) => json!({"id": id, "result": val}),
                Err(err) => json!({"id": id, "error": err}),
            };
            let _ = out.send(response);
        });
    }

    info!("stdin closed; shutting down");
    app.shutdown();
    drop(out_tx);
    let _ = writer.await;
}
