//! Resource identifier normalization for stable cache keys.
//!
//! Callers hand us URLs with whatever scheme, host casing and slash habits
//! they have. Everything that names the same page must land on one key, or a
//! single resource fragments into several records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Separator used by [`cache_key_for`]; never appears in a normalized form.
pub const COMBINED_SEPARATOR: &str = "|";

const SCHEMES: [&str; 2] = ["https://", "http://"];
const WWW: &str = "www.";

/// Canonicalize a resource identifier.
///
/// Normalization steps:
/// 1. Trim and lowercase
/// 2. Strip leading `http://` / `https://` and `www.` labels, with any
///    whitespace they leave behind
/// 3. Drop the fragment (`#...`) and trailing whitespace
/// 4. Collapse runs of `/` in the path and end the path with exactly one `/`
/// 5. Keep the query string, after the path, as-is
///
/// Returns an empty string when nothing host-like remains.
pub fn normalize(id: &str) -> String {
    let mut s = id.trim().to_lowercase().replace(COMBINED_SEPARATOR, "%7c");

    loop {
        let stripped = SCHEMES
            .iter()
            .chain(std::iter::once(&WWW))
            .find_map(|prefix| s.strip_prefix(prefix).map(str::to_string));
        match stripped {
            Some(rest) => s = rest.trim_start().to_string(),
            None => break,
        }
    }

    if let Some(idx) = s.find('#') {
        s.truncate(idx);
    }
    s.truncate(s.trim_end().len());

    let (location, query) = match s.find('?') {
        Some(idx) => s.split_at(idx),
        None => (s.as_str(), ""),
    };
    let location = location.trim_end();

    let mut out = String::with_capacity(location.len() + query.len() + 1);
    for c in location.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }

    if out.is_empty() || out.starts_with('/') {
        return String::new();
    }
    if !out.ends_with('/') {
        out.push('/');
    }
    out.push_str(query);
    out
}

/// Host part of the normalized identifier.
pub fn domain(id: &str) -> String {
    let normalized = normalize(id);
    match normalized.split_once('/') {
        Some((host, _)) => host.to_string(),
        None => normalized,
    }
}

/// Path of the normalized identifier, starting at `/`, without the query.
pub fn path(id: &str) -> String {
    let normalized = normalize(id);
    match normalized.find('/') {
        Some(idx) => {
            let rest = &normalized[idx..];
            rest.split('?').next().unwrap_or(rest).to_string()
        }
        None => String::new(),
    }
}

/// True when the identifier has no path segments.
pub fn is_root(id: &str) -> bool {
    path(id) == "/"
}

/// Combine several identifiers into one order-independent key.
pub fn cache_key_for<S: AsRef<str>>(ids: &[S]) -> String {
    let mut keys: Vec<String> = ids
        .iter()
        .map(|id| normalize(id.as_ref()))
        .filter(|key| !key.is_empty())
        .collect();
    keys.sort();
    keys.join(COMBINED_SEPARATOR)
}

/// Whether two identifiers name the same resource.
pub fn equivalent(a: &str, b: &str) -> bool {
    let a = normalize(a);
    !a.is_empty() && a == normalize(b)
}

/// A normalized, non-empty cache key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Normalize `id`, rejecting identifiers that normalize to nothing.
    pub fn parse(id: &str) -> Result<Self, Error> {
        let key = normalize(id);
        if key.is_empty() {
            return Err(Error::InvalidInput(format!("cannot normalize resource identifier {id:?}")));
        }
        Ok(CacheKey(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
