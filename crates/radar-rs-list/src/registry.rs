//! The set of all radar lists.
//!
//! The registry is the only authority for namespace uniqueness and for
//! cross-list subject uniqueness; individual lists are plain storage. All
//! state sits behind one coarse lock. List operations are human-triggered
//! and rare, so the lock is also held across the small file write that
//! follows a mutation. Remote fetches run with the lock released.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::entry::{self, ListEntry};
use crate::error::{RadarError, Result};
use crate::fetch::ListFetcher;
use crate::list::{validate_namespace, RadarList, Visibility};
use crate::storage;

pub struct ListRegistry {
    storage_dir: PathBuf,
    fetcher: Arc<dyn ListFetcher>,
    /// Keyed by lower-cased namespace.
    lists: Mutex<HashMap<String, RadarList>>,
}

impl ListRegistry {
    /// Create an empty registry storing private lists below `storage_dir`.
    pub fn new(storage_dir: impl Into<PathBuf>, fetcher: Arc<dyn ListFetcher>) -> Self {
        let storage_dir = storage_dir.into();
        if let Err(e) = fs::create_dir_all(&storage_dir) {
            error!(
                "Could not create list directory {}: {e}",
                storage_dir.display()
            );
        }
        Self {
            storage_dir,
            fetcher,
            lists: Mutex::new(HashMap::new()),
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    /// A copy of the list registered under `namespace` (case-insensitive).
    pub fn find_by_namespace(&self, namespace: &str) -> Option<RadarList> {
        self.lists.lock().get(&key(namespace)).cloned()
    }

    /// The entry for `uuid` in the first list holding it.
    ///
    /// Lists are searched public first, then private, each by namespace, so
    /// the answer is stable even if a subject ended up on several lists.
    pub fn find_by_subject(&self, uuid: &Uuid) -> Option<ListEntry> {
        let lists = self.lists.lock();
        first_holding(&lists, uuid).and_then(|list| list.entry(uuid).cloned())
    }

    /// Prefix of the first list holding `uuid`, or an empty string.
    pub fn prefix_for(&self, uuid: &Uuid) -> String {
        let lists = self.lists.lock();
        first_holding(&lists, uuid)
            .map(|list| list.prefix().to_string())
            .unwrap_or_default()
    }

    pub fn is_member(&self, uuid: &Uuid) -> bool {
        first_holding(&self.lists.lock(), uuid).is_some()
    }

    pub fn all_namespaces(&self) -> BTreeSet<String> {
        self.lists
            .lock()
            .values()
            .map(|list| list.namespace().to_string())
            .collect()
    }

    /// Every prefix in use. Display layers strip these before applying a
    /// fresh one, since membership may have changed in between.
    pub fn all_prefixes(&self) -> BTreeSet<String> {
        self.lists
            .lock()
            .values()
            .map(|list| list.prefix().to_string())
            .collect()
    }

    /// Copies of all lists in lookup order.
    pub fn snapshot(&self) -> Vec<RadarList> {
        let lists = self.lists.lock();
        ordered(&lists).into_iter().cloned().collect()
    }

    // ─── Entry mutations ────────────────────────────────────────────────────

    /// Put `uuid` on the private list `namespace`.
    ///
    /// Fails if the subject is already on any list, the list does not
    /// exist, or the list is public.
    pub fn add_entry(&self, namespace: &str, uuid: Uuid, name: &str, cause: &str) -> Result<()> {
        self.insert_entry(namespace, ListEntry::new(uuid, name, cause))
    }

    /// Like [`add_entry`](Self::add_entry) with an expiry in days (`-1` = never).
    pub fn add_entry_with_expiry(
        &self,
        namespace: &str,
        uuid: Uuid,
        name: &str,
        cause: &str,
        expiry_days: i32,
    ) -> Result<()> {
        self.insert_entry(
            namespace,
            ListEntry::new(uuid, name, cause).with_expiry_days(expiry_days),
        )
    }

    fn insert_entry(&self, namespace: &str, entry: ListEntry) -> Result<()> {
        let mut lists = self.lists.lock();
        if first_holding(&lists, &entry.uuid).is_some() {
            return Err(RadarError::AlreadyListed(entry.uuid));
        }
        let list = lists
            .get_mut(&key(namespace))
            .ok_or_else(|| RadarError::UnknownNamespace(namespace.to_string()))?;
        let uuid = entry.uuid;
        if !list.add_entry(entry) {
            return Err(RadarError::NotPrivate(list.namespace().to_string()));
        }
        info!("Added {uuid} to list '{}'", list.namespace());
        persist_logged(list);
        Ok(())
    }

    /// Take `uuid` off the private list `namespace` and save the list.
    pub fn remove_entry(&self, namespace: &str, uuid: &Uuid) -> Result<ListEntry> {
        let mut lists = self.lists.lock();
        let list = lists
            .get_mut(&key(namespace))
            .ok_or_else(|| RadarError::UnknownNamespace(namespace.to_string()))?;
        if !list.is_private() {
            return Err(RadarError::NotPrivate(list.namespace().to_string()));
        }
        let removed = list
            .remove_entry(uuid)
            .ok_or_else(|| RadarError::NotListed(*uuid, list.namespace().to_string()))?;
        info!("Removed {uuid} from list '{}'", list.namespace());
        persist_logged(list);
        Ok(removed)
    }

    /// Change a list's prefix. Private lists are saved; public ones keep the
    /// new prefix until the process exits. Returns the members whose display
    /// needs refreshing.
    pub fn set_prefix(&self, namespace: &str, prefix: &str) -> Result<Vec<Uuid>> {
        let mut lists = self.lists.lock();
        let list = lists
            .get_mut(&key(namespace))
            .ok_or_else(|| RadarError::UnknownNamespace(namespace.to_string()))?;
        list.set_prefix(prefix);
        persist_logged(list);
        Ok(list.entries().keys().copied().collect())
    }

    /// Delete expired entries from private lists. Returns how many went.
    pub fn purge_expired(&self) -> usize {
        let now = entry::now();
        let mut lists = self.lists.lock();
        let mut purged = 0;
        for list in lists.values_mut().filter(|l| l.is_private()) {
            let removed = list.retain_entries(|e| !e.is_expired(now));
            if removed > 0 {
                info!(
                    "Purged {removed} expired entries from list '{}'",
                    list.namespace()
                );
                persist_logged(list);
                purged += removed;
            }
        }
        purged
    }

    // ─── List lifecycle ─────────────────────────────────────────────────────

    /// Create an empty private list stored as `<storage_dir>/<namespace>.json`.
    pub fn register_private_list(&self, namespace: &str, prefix: &str) -> Result<()> {
        validate_namespace(namespace)?;
        let mut lists = self.lists.lock();
        if lists.contains_key(&key(namespace)) {
            return Err(RadarError::NamespaceTaken(namespace.to_string()));
        }

        let path = self.storage_dir.join(format!("{namespace}.json"));
        let list = RadarList::new(
            namespace,
            prefix,
            path.to_string_lossy(),
            Visibility::Private,
        );
        if let Err(e) = list.persist() {
            error!("Could not save new list '{namespace}': {e}");
            return Err(e);
        }

        info!("Registered private list '{namespace}'");
        lists.insert(key(namespace), list);
        Ok(())
    }

    /// Register a public list and fetch its initial contents.
    ///
    /// A failed initial fetch is logged; the list stays registered (empty)
    /// and is filled by the next reload.
    pub async fn register_public_list(&self, namespace: &str, prefix: &str, url: &str) -> Result<()> {
        validate_namespace(namespace)?;
        {
            let mut lists = self.lists.lock();
            if lists.contains_key(&key(namespace)) {
                return Err(RadarError::NamespaceTaken(namespace.to_string()));
            }
            lists.insert(
                key(namespace),
                RadarList::new(namespace, prefix, url, Visibility::Public),
            );
        }
        info!("Registered public list '{namespace}' from {url}");

        if let Err(e) = self.reload_list(namespace).await {
            warn!("Initial load of public list '{namespace}' failed: {e}");
        }
        Ok(())
    }

    /// Re-fetch one public list. On failure the previous entries stay.
    /// Private lists are loaded once at startup, so this is a no-op for them.
    pub async fn reload_list(&self, namespace: &str) -> Result<()> {
        let url = {
            let lists = self.lists.lock();
            let list = lists
                .get(&key(namespace))
                .ok_or_else(|| RadarError::UnknownNamespace(namespace.to_string()))?;
            if list.is_private() {
                return Ok(());
            }
            list.url().to_string()
        };

        let entries = self.fetcher.fetch_entries(&url).await?;

        let mut lists = self.lists.lock();
        // The list may have vanished while the fetch was in flight.
        if let Some(list) = lists.get_mut(&key(namespace)) {
            info!(
                "Loaded {} entries into public list '{}'",
                entries.len(),
                list.namespace()
            );
            list.replace_entries(entries);
        }
        Ok(())
    }

    /// Re-fetch every public list. Returns how many reloaded successfully.
    pub async fn reload_public_lists(&self) -> usize {
        let namespaces: Vec<String> = self
            .lists
            .lock()
            .values()
            .filter(|l| !l.is_private())
            .map(|l| l.namespace().to_string())
            .collect();

        let mut reloaded = 0;
        for namespace in namespaces {
            match self.reload_list(&namespace).await {
                Ok(()) => reloaded += 1,
                Err(e) => warn!("Could not reload public list '{namespace}': {e}"),
            }
        }
        reloaded
    }

    /// Reload public lists every `period` until `shutdown` turns true.
    pub fn spawn_periodic_reload(
        self: &Arc<Self>,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let reloaded = registry.reload_public_lists().await;
                        debug!("Periodic reload refreshed {reloaded} public lists");
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Delete a private list and its file. Returns its former members.
    pub fn unregister_list(&self, namespace: &str) -> Result<Vec<Uuid>> {
        let mut lists = self.lists.lock();
        let list = lists
            .get(&key(namespace))
            .ok_or_else(|| RadarError::UnknownNamespace(namespace.to_string()))?;
        if !list.is_private() {
            return Err(RadarError::NotPrivate(list.namespace().to_string()));
        }
        if let Err(e) = storage::remove_file(Path::new(list.url())) {
            error!("Could not delete file of list '{}': {e}", list.namespace());
            return Err(e);
        }

        let members: Vec<Uuid> = list.entries().keys().copied().collect();
        if let Some(list) = lists.remove(&key(namespace)) {
            info!("Deleted private list '{}'", list.namespace());
        }
        Ok(members)
    }

    /// Register every valid private list found below the storage directory.
    ///
    /// Unreadable, malformed or duplicate files are logged and skipped.
    /// Returns the number of lists registered.
    pub fn load_private_lists(&self) -> usize {
        let mut loaded = 0;
        for path in storage::scan_json_files(&self.storage_dir) {
            let mut list: RadarList = match storage::read_json(&path) {
                Ok(list) => list,
                Err(e) => {
                    warn!("Could not load list from {}: {e}", path.display());
                    continue;
                }
            };
            list.set_url(path.to_string_lossy());
            if let Err(e) = list.validate() {
                warn!("Skipping invalid list file {}: {e}", path.display());
                continue;
            }

            let mut lists = self.lists.lock();
            let k = key(list.namespace());
            if lists.contains_key(&k) {
                warn!(
                    "Skipping {}: a list named '{}' is already registered",
                    path.display(),
                    list.namespace()
                );
                continue;
            }
            info!(
                "Loaded private list '{}' with {} entries",
                list.namespace(),
                list.len()
            );
            lists.insert(k, list);
            loaded += 1;
        }
        loaded
    }
}

fn key(namespace: &str) -> String {
    namespace.to_lowercase()
}

/// Lists in lookup order: public before private, then by namespace.
fn ordered(lists: &HashMap<String, RadarList>) -> Vec<&RadarList> {
    let mut ordered: Vec<(&String, &RadarList)> = lists.iter().collect();
    ordered.sort_by(|(ka, a), (kb, b)| a.visibility().cmp(&b.visibility()).then(ka.cmp(kb)));
    ordered.into_iter().map(|(_, list)| list).collect()
}

/// First list (in lookup order) holding a live entry for `uuid`.
fn first_holding<'a>(lists: &'a HashMap<String, RadarList>, uuid: &Uuid) -> Option<&'a RadarList> {
    let now = entry::now();
    ordered(lists)
        .into_iter()
        .find(|list| list.entry(uuid).is_some_and(|e| !e.is_expired(now)))
}

fn persist_logged(list: &RadarList) {
    if let Err(e) = list.persist() {
        error!("Could not save list '{}': {e}", list.namespace());
    }
}
