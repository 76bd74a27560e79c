use std::fmt;

use serde::{Deserialize, Serialize};

use super::Alert;

/// Caller-supplied key naming "the same underlying problem" across
/// repeated alert creations. Alerts without a key never deduplicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An alert is a duplicate iff some candidate with the same key is still
/// active. Suppressed, resolved and closed alerts do not hold the key.
pub fn find_duplicate<'a, I>(key: &DedupKey, candidates: I) -> Option<&'a Alert>
where
    I: IntoIterator<Item = &'a Alert>,
{
    candidates
        .into_iter()
        .find(|a| a.status().is_active() && a.dedup_key() == Some(key))
}
