//! Case-insensitive player name → UUID cache with a fixed time-to-live.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::session::PlayerInfo;

/// Default time-to-live: one day.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct NameCache {
    ttl: Duration,
    slots: Mutex<HashMap<String, (Uuid, Instant)>>,
}

impl NameCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, name: &str) -> Option<Uuid> {
        self.get_at(name, Instant::now())
    }

    pub fn put(&self, name: &str, uuid: Uuid) {
        self.put_at(name, uuid, Instant::now());
    }

    /// Insert every roster entry that has a UUID; the rest are skipped.
    pub fn put_all<'a>(&self, roster: impl IntoIterator<Item = &'a PlayerInfo>) {
        let now = Instant::now();
        for player in roster {
            if let Some(uuid) = player.uuid {
                self.put_at(&player.name, uuid, now);
            }
        }
    }

    /// Drop expired slots. Returns how many were dropped.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|_, (_, inserted)| now.saturating_duration_since(*inserted) < ttl);
        before - slots.len()
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Number of stored slots, expired ones included until pruned.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    fn get_at(&self, name: &str, now: Instant) -> Option<Uuid> {
        let slots = self.slots.lock();
        let (uuid, inserted) = slots.get(&key(name))?;
        if now.saturating_duration_since(*inserted) >= self.ttl {
            return None;
        }
        Some(*uuid)
    }

    fn put_at(&self, name: &str, uuid: Uuid, now: Instant) {
        self.slots.lock().insert(key(name), (uuid, now));
    }
}

impl Default for NameCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

fn key(name: &str) -> String {
    name.to_lowercase()
}
