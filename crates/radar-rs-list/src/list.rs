//! A named, prefixed collection of list entries.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::ListEntry;
use crate::error::{RadarError, Result};
use crate::storage;

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

const MAX_NAMESPACE_LEN: usize = 32;

/// Who owns a list's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    /// Fetched from a remote URL; read-only locally.
    Public,
    /// Owned by this client and persisted to a local file.
    Private,
}

/// A radar list. Private lists are stored as one JSON file each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarList {
    #[serde(rename = "VERSION", default = "format_version")]
    version: u32,
    namespace: String,
    /// Local file path for private lists, remote URL for public ones.
    url: String,
    visibility: Visibility,
    prefix: String,
    #[serde(rename = "playerMap", with = "player_map", default)]
    entries: HashMap<Uuid, ListEntry>,
}

fn format_version() -> u32 {
    FORMAT_VERSION
}

impl RadarList {
    pub fn new(
        namespace: impl Into<String>,
        prefix: impl Into<String>,
        url: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        Self {
            version: FORMAT_VERSION,
            namespace: namespace.into(),
            url: url.into(),
            visibility,
            prefix: prefix.into(),
            entries: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Pure mutation; the owner persists and refreshes displays.
    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn entries(&self) -> &HashMap<Uuid, ListEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_member(&self, uuid: &Uuid) -> bool {
        self.entries.contains_key(uuid)
    }

    pub fn entry(&self, uuid: &Uuid) -> Option<&ListEntry> {
        self.entries.get(uuid)
    }

    /// Insert or overwrite an entry. Refused (returns `false`) for public lists.
    pub fn add_entry(&mut self, entry: ListEntry) -> bool {
        if !self.is_private() {
            return false;
        }
        self.entries.insert(entry.uuid, entry);
        true
    }

    pub fn remove_entry(&mut self, uuid: &Uuid) -> Option<ListEntry> {
        self.entries.remove(uuid)
    }

    /// Wholesale overwrite, used when a public list is re-fetched.
    pub(crate) fn replace_entries(&mut self, entries: Vec<ListEntry>) {
        self.entries = entries.into_iter().map(|e| (e.uuid, e)).collect();
    }

    /// Keep only entries for which `keep` holds. Returns how many were removed.
    pub(crate) fn retain_entries(&mut self, mut keep: impl FnMut(&ListEntry) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| keep(e));
        before - self.entries.len()
    }

    /// Write a private list to its file. Public lists are never written.
    pub fn persist(&self) -> Result<()> {
        if !self.is_private() {
            return Ok(());
        }
        storage::write_json(Path::new(&self.url), self)
    }

    /// Check a list read from disk before it is registered.
    pub fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(RadarError::UnsupportedVersion(self.version));
        }
        if self.namespace.trim().is_empty() {
            return Err(RadarError::InvalidNamespace(self.namespace.clone()));
        }
        if !self.is_private() {
            return Err(RadarError::NotPrivate(self.namespace.clone()));
        }
        for (key, entry) in &self.entries {
            if *key != entry.uuid {
                return Err(RadarError::InvalidEntry {
                    uuid: entry.uuid,
                    reason: format!("stored under key {key}"),
                });
            }
            if entry.updated_at < entry.created_at {
                return Err(RadarError::InvalidEntry {
                    uuid: entry.uuid,
                    reason: "updated before it was created".into(),
                });
            }
        }
        Ok(())
    }
}

/// Rules for a namespace given at creation time, where it becomes a file name.
/// Letters and digits of any script are fine; separators and dots are not.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    let ok = !namespace.is_empty()
        && namespace.chars().count() <= MAX_NAMESPACE_LEN
        && namespace
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(RadarError::InvalidNamespace(namespace.to_string()))
    }
}

/// `playerMap` is an array on the wire and a map keyed by UUID in memory.
mod player_map {
    use std::collections::HashMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use uuid::Uuid;

    use crate::entry::ListEntry;

    pub fn serialize<S: Serializer>(
        map: &HashMap<Uuid, ListEntry>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<&ListEntry> = map.values().collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.uuid.cmp(&b.uuid)));
        entries.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<HashMap<Uuid, ListEntry>, D::Error> {
        let entries = Vec::<ListEntry>::deserialize(d)?;
        Ok(entries.into_iter().map(|e| (e.uuid, e)).collect())
    }
}
