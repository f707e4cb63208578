//! Timeline data model: wire entries, normalized post records, and the
//! insertion-ordered collection the accumulator fills.

use crate::base36::permalink;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque numeric account identifier (kept as the digit string the service uses).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the `plurks` array returned by the timeline endpoint.
/// Only the fields we export are decoded; everything else is ignored.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RawPlurk {
    pub plurk_id: u64,
    pub posted: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_raw: String,
    #[serde(default)]
    pub response_count: u64,
}

/// A normalized timeline post, as written to every export format.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostRecord {
    pub plurk_id: u64,
    /// Service-native timestamp, kept verbatim.
    pub posted: String,
    pub content: String,
    pub content_raw: String,
    pub response_count: u64,
    pub link: String,
}

impl PostRecord {
    pub fn from_raw(raw: RawPlurk, base_url: &str) -> Self {
        Self {
            link: permalink(base_url, raw.plurk_id),
            plurk_id: raw.plurk_id,
            posted: raw.posted,
            content: raw.content,
            content_raw: raw.content_raw,
            response_count: raw.response_count,
        }
    }
}

/// Posts keyed by id in discovery order (newest first for a normal download).
///
/// Re-inserting a known id replaces the stored record in place: the position
/// and the length stay the same, so repeated pages collapse to one entry.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Timeline {
    posts: IndexMap<u64, PostRecord>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns `true` when the id was not seen before.
    pub fn upsert(&mut self, record: PostRecord) -> bool {
        self.posts.insert(record.plurk_id, record).is_none()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get(&self, plurk_id: u64) -> Option<&PostRecord> {
        self.posts.get(&plurk_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.posts.keys().copied()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PostRecord> + '_ {
        self.posts.values()
    }
}
