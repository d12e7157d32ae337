//! Boundary-level path normalisation and username interpolation.
//!
//! These are deliberately thin: config loading and merging is treated as an
//! external collaborator, with username/path normalisation as its
//! straightforward plumbing.

use crate::error::BitdexError;

/// Rewrite `\` to `/`; when `is_dir`, ensure exactly one trailing `/`.
#[must_use]
pub fn normalize_path(entry: &str, is_dir: bool) -> String {
    let mut out = entry.replace('\\', "/");
    if is_dir && !out.ends_with('/') {
        out.push('/');
    }
    out
}

/// Replace every occurrence of the literal token `<USERNAME>` with `username`.
#[must_use]
pub fn expand_username(entry: &str, username: &str) -> String {
    entry.replace("<USERNAME>", username)
}

/// Resolve the current OS user's login name.
///
/// Some platforms report identity as `DOMAIN\user`; only the portion after
/// the last backslash is the login name we want to interpolate.
pub fn current_username() -> Result<String, BitdexError> {
    let raw = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .map_err(|e| BitdexError::UsernameResolution(e.to_string()))?;

    match raw.rsplit_once('\\') {
        Some((_, name)) => Ok(name.to_string()),
        None => Ok(raw),
    }
}
