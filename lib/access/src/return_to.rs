//! Post-login destination validation.
//!
//! Any `return_to` value reaching the gate is caller-controlled. It is only
//! ever honoured when it points back at the application's own host and is
//! no longer than [`MAX_RETURN_TO_LEN`]. Nothing here fails: rejected input
//! degrades to a safe target.

use url::Url;

/// Longest accepted return target, in bytes.
pub const MAX_RETURN_TO_LEN: usize = 255;

/// Validates a caller-supplied post-login destination.
///
/// - Empty, oversized, or unparsable candidates yield `default`, as do
///   relative candidates that do not start with `/`.
/// - A candidate on `app_url`'s host (absolute paths included) is returned
///   unchanged.
/// - A candidate on any other host has its path and query re-anchored on
///   `app_url`'s origin, so the redirect never leaves the application.
///
/// The function is pure and idempotent: feeding its output back in returns
/// the same value, provided `default` itself points at the application.
#[must_use]
pub fn validate_return_to(candidate: Option<&str>, app_url: &Url, default: &str) -> String {
    let Some(candidate) = candidate.map(str::trim).filter(|c| !c.is_empty()) else {
        return default.to_string();
    };

    if candidate.len() > MAX_RETURN_TO_LEN || candidate.chars().any(char::is_control) {
        return default.to_string();
    }

    if Url::parse(candidate).is_err() && !candidate.starts_with('/') {
        return default.to_string();
    }

    let Ok(target) = app_url.join(candidate) else {
        return default.to_string();
    };

    if is_same_host(&target, app_url) {
        return candidate.to_string();
    }

    let mut anchored = app_url.clone();
    anchored.set_path(target.path());
    anchored.set_query(target.query());
    anchored.set_fragment(None);

    let anchored = anchored.to_string();
    if anchored.len() > MAX_RETURN_TO_LEN {
        return default.to_string();
    }
    anchored
}

fn is_same_host(target: &Url, app_url: &Url) -> bool {
    matches!(target.scheme(), "http" | "https")
        && target.host_str().is_some()
        && target.host_str() == app_url.host_str()
}
