//! Bookmark identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::time_now_millis;

/// Identifier of a bookmark, e.g. `bookmark-1718000000000`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkId(String);

impl BookmarkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `prefix` followed by the decimal millisecond timestamp.
    pub fn from_millis(prefix: &str, millis: u64) -> Self {
        Self(format!("{prefix}{millis}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookmarkId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Source of creation timestamps.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        time_now_millis()
    }
}

impl<F: Fn() -> u64> Clock for F {
    fn now_millis(&self) -> u64 {
        self()
    }
}

/// Generator of session-unique, timestamp-derived ids.
///
/// Two bookmarks set within the same millisecond (or after the clock stepped
/// back) still get distinct ids: the timestamp never repeats or decreases
/// within one generator.
pub struct BookmarkIds {
    prefix: String,
    clock: Box<dyn Clock>,
    last_millis: Option<u64>,
}

impl BookmarkIds {
    pub fn new(prefix: impl Into<String>, clock: Box<dyn Clock>) -> Self {
        Self {
            prefix: prefix.into(),
            clock,
            last_millis: None,
        }
    }

    pub fn next_id(&mut self) -> BookmarkId {
        let mut millis = self.clock.now_millis();
        if let Some(last) = self.last_millis
            && millis <= last
        {
            millis = last + 1;
        }
        self.last_millis = Some(millis);
        BookmarkId::from_millis(&self.prefix, millis)
    }
}
