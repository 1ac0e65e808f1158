//! Input validation and URL normalization for bookmark forms.
//!
//! Every URL that reaches the store or the screen passes through
//! [`normalize_url`], so it always carries an explicit `http://` or
//! `https://` scheme.

use url::Url;

use crate::types::bookmark::BookmarkDraft;
use crate::types::errors::BookmarkError;
use crate::types::stats::INVALID_DOMAIN;

const DEFAULT_SCHEME: &str = "https://";

fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Trims `raw` and prefixes `https://` when no http(s) scheme is present.
pub fn normalize_url(raw: &str) -> Result<String, BookmarkError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BookmarkError::Validation("URL is required".to_string()));
    }
    if has_http_scheme(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{}{}", DEFAULT_SCHEME, trimmed))
    }
}

/// Validates a title/URL pair and returns the normalized draft.
pub fn validate_input(title: &str, url: &str) -> Result<BookmarkDraft, BookmarkError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(BookmarkError::Validation("Title is required".to_string()));
    }
    let url = normalize_url(url)?;
    Ok(BookmarkDraft {
        title: title.to_string(),
        url,
    })
}

fn hostname(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(|h| h.to_ascii_lowercase())
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Hostname for display, without a leading `www.`; the raw URL if it does not parse.
pub fn display_domain(url: &str) -> String {
    match hostname(url) {
        Some(host) => strip_www(&host).to_string(),
        None => url.to_string(),
    }
}

/// Domain bucket used by the stats panel; unparsable URLs share one bucket.
pub fn domain_key(url: &str) -> String {
    match hostname(url) {
        Some(host) if !host.is_empty() => strip_www(&host).to_string(),
        _ => INVALID_DOMAIN.to_string(),
    }
}
