//! RPC method handler for the Vault JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls to the
//! session, the settings and theme engines and the notification center.

use serde_json::{json, Value};

use crate::app::{lock, App};
use crate::managers::notification_center::{NotificationCenter, NotificationCenterTrait};
use crate::services::bookmark_view::shown_summary;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::services::theme_engine::{parse_theme, ThemeEngine, ThemeEngineTrait};
use crate::services::url_normalizer::display_domain;
use crate::types::bookmark::{Bookmark, RecordId};

/// JSON shape of a bookmark on the wire.
pub fn bookmark_json(bookmark: &Bookmark) -> Value {
    json!({
        "id": bookmark.id,
        "title": bookmark.title,
        "url": bookmark.url,
        "domain": display_domain(&bookmark.url),
        "created_at": bookmark.created_at,
        "pending": bookmark.is_placeholder(),
    })
}

fn theme_json(engine: &ThemeEngine) -> Value {
    json!({
        "theme": engine.get_theme(),
        "effective": engine.effective_theme(),
        "css": engine.get_css_variables(),
    })
}

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

/// Record IDs may arrive as strings or numbers.
fn id_param(params: &Value) -> Result<RecordId, String> {
    let raw = params.get("id").cloned().ok_or("missing id")?;
    serde_json::from_value(raw).map_err(|e| format!("invalid id: {}", e))
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
/// Failed bookmark operations are also queued as error toasts.
pub async fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")})),

        // ─── Bookmarks ───
        "bookmark.list" => {
            let query = params.get("query").and_then(|v| v.as_str()).unwrap_or("");
            let session = app.report("Couldn't load bookmarks", app.session()).map_err(|e| e.to_string())?;
            let total = session.snapshot().map_err(|e| e.to_string())?.len();
            let shown = session.filter(query).map_err(|e| e.to_string())?;
            Ok(json!({
                "bookmarks": shown.iter().map(bookmark_json).collect::<Vec<_>>(),
                "total": total,
                "summary": shown_summary(shown.len(), total),
            }))
        }
        "bookmark.add" => {
            let title = str_param(params, "title")?;
            let url = str_param(params, "url")?;
            let session = app.report("Couldn't add bookmark", app.session()).map_err(|e| e.to_string())?;
            let created = app
                .report("Couldn't add bookmark", session.create(title, url).await)
                .map_err(|e| e.to_string())?;
            Ok(bookmark_json(&created))
        }
        "bookmark.update" => {
            let id = id_param(params)?;
            let title = str_param(params, "title")?;
            let url = str_param(params, "url")?;
            let session = app.report("Couldn't update bookmark", app.session()).map_err(|e| e.to_string())?;
            let updated = app
                .report("Couldn't update bookmark", session.update(&id, title, url).await)
                .map_err(|e| e.to_string())?;
            Ok(bookmark_json(&updated))
        }
        "bookmark.delete" => {
            let id = id_param(params)?;
            let session = app.report("Couldn't delete bookmark", app.session()).map_err(|e| e.to_string())?;
            app.report("Couldn't delete bookmark", session.delete(&id).await)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "bookmark.stats" => {
            let session = app.session().map_err(|e| e.to_string())?;
            let stats = session.stats().map_err(|e| e.to_string())?;
            Ok(json!({
                "total": stats.total,
                "domains": stats.domain_count(),
                "today": stats.today,
                "domain_list": stats.domains,
            }))
        }
        "bookmark.reload" => {
            let session = app.report("Couldn't load bookmarks", app.session()).map_err(|e| e.to_string())?;
            let total = app
                .report("Couldn't load bookmarks", session.reload().await)
                .map_err(|e| e.to_string())?;
            Ok(json!({"total": total}))
        }

        // ─── Sync ───
        "sync.status" => {
            let session = app.session().map_err(|e| e.to_string())?;
            let status = session.sync_status().map_err(|e| e.to_string())?;
            Ok(json!({
                "status": status,
                "load_error": session.load_error().map(|e| e.to_string()),
            }))
        }

        // ─── Notifications ───
        "notifications.list" => {
            let now = NotificationCenter::now_ms();
            let mut center = lock(&app.notifications);
            center.expire(now);
            Ok(json!(center.active(now)))
        }
        "notifications.dismiss" => {
            let id = params.get("id").and_then(|v| v.as_u64()).ok_or("missing id")?;
            let dismissed = lock(&app.notifications).dismiss(id);
            Ok(json!({"ok": dismissed}))
        }

        // ─── Appearance ───
        "theme.get" => {
            let engine = lock(&app.theme_engine);
            Ok(theme_json(&engine))
        }
        "theme.toggle" => {
            let mut engine = lock(&app.theme_engine);
            let next = engine.toggle();
            lock(&app.settings_engine)
                .set_value("appearance.theme", json!(next))
                .map_err(|e| e.to_string())?;
            Ok(theme_json(&engine))
        }
        "view.toggle" => {
            let mut settings = lock(&app.settings_engine);
            let next = settings.get_settings().appearance.view_mode.toggled();
            settings
                .set_value("appearance.view_mode", json!(next))
                .map_err(|e| e.to_string())?;
            Ok(json!({"view_mode": next}))
        }

        // ─── Settings ───
        "settings.get" => {
            let settings = lock(&app.settings_engine);
            serde_json::to_value(settings.get_settings()).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            if key == "appearance.theme" {
                let name = value.as_str().ok_or("theme must be a string")?;
                let mode = parse_theme(name).map_err(|e| e.to_string())?;
                lock(&app.settings_engine)
                    .set_value(key, json!(mode))
                    .map_err(|e| e.to_string())?;
                lock(&app.theme_engine).set_theme(mode);
            } else {
                lock(&app.settings_engine)
                    .set_value(key, value)
                    .map_err(|e| e.to_string())?;
            }
            Ok(json!({"ok": true}))
        }

        // ─── Auth ───
        "auth.user" => {
            let user = app.identity.current_user().await;
            Ok(json!({"user": user}))
        }
        "auth.sign_out" => {
            app.sign_out().await?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
