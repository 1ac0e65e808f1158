//! Vault: personal bookmark manager core.
//!
//! Console demo: two sessions of the same user share one in-memory store, so
//! every change made on one "device" reaches the other through the change feed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use vault::database::LocalStore;
use vault::logging::init_tracing;
use vault::managers::notification_center::{NotificationCenter, NotificationCenterTrait};
use vault::managers::vault_session::{SessionOptions, VaultSession};
use vault::services::bookmark_view::shown_summary;
use vault::services::identity_service::{IdentityService, LocalIdentity};
use vault::services::theme_engine::{ThemeEngine, ThemeEngineTrait};
use vault::services::url_normalizer::display_domain;
use vault::types::bookmark::{Bookmark, RecordId};
use vault::types::identity::Identity;
use vault::types::notification::ToastLevel;
use vault::types::settings::ThemeMode;

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn print_collection(label: &str, bookmarks: &[Bookmark]) {
    println!("  {} ({}):", label, bookmarks.len());
    for b in bookmarks {
        println!("    • {} — {} [{}]", b.title, display_domain(&b.url), b.id);
    }
}

/// Waits until `changes` reports a collection of `expected` entries.
async fn settle(changes: &mut watch::Receiver<Vec<Bookmark>>, expected: usize) {
    let wait = changes.wait_for(|c| c.len() == expected);
    if tokio::time::timeout(Duration::from_secs(2), wait).await.is_err() {
        println!("  ⚠ timed out waiting for {} bookmarks", expected);
    }
}

async fn start_device(store: &Arc<LocalStore>, identity: &Arc<dyn IdentityService>) -> Option<VaultSession> {
    match VaultSession::start(identity.clone(), store.clone(), store.clone(), SessionOptions::default()).await {
        Ok(session) => Some(session),
        Err(e) => {
            println!("  ✗ session failed to start: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Vault v{} — Demo Mode                   ║", env!("CARGO_PKG_VERSION"));
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let store = match LocalStore::open_in_memory() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            println!("  ✗ could not open store: {}", e);
            return;
        }
    };
    let identity: Arc<dyn IdentityService> = Arc::new(LocalIdentity::new(Some(Identity {
        id: "demo-user".to_string(),
        email: Some("demo@example.com".to_string()),
    })));

    section("Sessions");
    let (Some(laptop), Some(phone)) = (
        start_device(&store, &identity).await,
        start_device(&store, &identity).await,
    ) else {
        return;
    };
    println!("  ✓ two sessions for {} ({} feed subscribers)", laptop.identity().id, store.subscriber_count());
    let Ok(mut phone_changes) = phone.subscribe_changes() else {
        return;
    };

    section("Create");
    for (title, url) in [
        ("Rust", "rust-lang.org"),
        ("Docs", "https://docs.rs"),
        ("Crates", "https://www.crates.io"),
    ] {
        match laptop.create(title, url).await {
            Ok(b) => println!("  ✓ added {} → {}", b.title, b.url),
            Err(e) => println!("  ✗ {}", e),
        }
    }
    match laptop.create("   ", "example.com").await {
        Ok(_) => println!("  ✗ blank title was accepted"),
        Err(e) => println!("  ✓ rejected: {}", e),
    }
    settle(&mut phone_changes, 3).await;
    if let Ok(snapshot) = phone.snapshot() {
        print_collection("phone sees", &snapshot);
    }

    section("Filter & Stats");
    if let (Ok(shown), Ok(all)) = (laptop.filter("RS"), laptop.snapshot()) {
        println!("  query \"RS\": {}", shown_summary(shown.len(), all.len()));
    }
    if let Ok(stats) = laptop.stats() {
        println!("  total={} domains={} today={}", stats.total, stats.domain_count(), stats.today);
    }

    section("Update & Delete");
    let first = phone.snapshot().ok().and_then(|s| s.first().cloned());
    if let Some(first) = first {
        match phone.update(&first.id, "Crates registry", &first.url).await {
            Ok(b) => println!("  ✓ phone renamed → {}", b.title),
            Err(e) => println!("  ✗ {}", e),
        }
        match laptop.delete(&first.id).await {
            Ok(()) => println!("  ✓ laptop deleted {}", first.id),
            Err(e) => println!("  ✗ {}", e),
        }
    }
    match laptop.delete(&RecordId::from("missing")).await {
        Ok(()) => println!("  ✗ deleting an unknown ID succeeded"),
        Err(e) => println!("  ✓ rejected: {}", e),
    }
    settle(&mut phone_changes, 2).await;
    if let Ok(snapshot) = phone.snapshot() {
        print_collection("phone sees", &snapshot);
    }

    section("Notifications");
    let mut center = NotificationCenter::default();
    let now = NotificationCenter::now_ms();
    center.push(ToastLevel::Error, "Couldn't add bookmark", "Store unavailable", now);
    center.push(ToastLevel::Error, "Couldn't add bookmark", "Store unavailable", now);
    println!("  ✓ {} toast visible after a repeated error", center.active(now).len());
    println!("  ✓ {} toast expired after 5s", center.expire(now + 5_000));

    section("Theme");
    let mut theme = ThemeEngine::new(ThemeMode::Dark);
    let next = theme.toggle();
    let css = theme.get_css_variables();
    println!("  ✓ toggled to {:?}, --bg = {}", next, css.get("--bg").map(String::as_str).unwrap_or("?"));

    section("Dispose");
    phone.dispose();
    match phone.snapshot() {
        Ok(_) => println!("  ✗ disposed session still answers"),
        Err(e) => println!("  ✓ {}", e),
    }
    println!("  ✓ {} feed subscriber left", store.subscriber_count());
    drop(laptop);

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ Demo finished.");
    println!("═══════════════════════════════════════════════════════════════");
}
