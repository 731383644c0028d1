//! Player name → UUID resolution.
//!
//! Sources are tried from cheapest to most expensive: the name cache, the
//! session roster, then the external profile service. Every failure path
//! ends in `None`; nothing is surfaced to the caller except through logs.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::NameCache;
use crate::lookup::{ProfileLookup, MOJANG_PROFILE_URL};
use crate::session::SessionContext;

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_lookup_url")]
    pub lookup_url: String,
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Leading characters marking names the profile service cannot resolve
    /// (`!` Bedrock players, `~` nicked players).
    #[serde(default = "default_bypass_markers")]
    pub bypass_markers: Vec<char>,
}

fn default_lookup_url() -> String {
    MOJANG_PROFILE_URL.into()
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_bypass_markers() -> Vec<char> {
    vec!['!', '~']
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            lookup_url: default_lookup_url(),
            connect_timeout_ms: default_timeout_ms(),
            read_timeout_ms: default_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            bypass_markers: default_bypass_markers(),
        }
    }
}

impl ResolverConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

pub struct IdentifierResolver {
    session: Arc<dyn SessionContext>,
    lookup: Arc<dyn ProfileLookup>,
    cache: NameCache,
    bypass_markers: Vec<char>,
    /// Upper bound for one external lookup, whatever the lookup does itself.
    lookup_deadline: Duration,
}

impl IdentifierResolver {
    pub fn new(
        session: Arc<dyn SessionContext>,
        lookup: Arc<dyn ProfileLookup>,
        config: &ResolverConfig,
    ) -> Self {
        Self {
            session,
            lookup,
            cache: NameCache::new(config.cache_ttl()),
            bypass_markers: config.bypass_markers.clone(),
            lookup_deadline: config.connect_timeout() + config.read_timeout(),
        }
    }

    pub fn cache(&self) -> &NameCache {
        &self.cache
    }

    pub fn is_bypass_name(&self, name: &str) -> bool {
        name.chars()
            .next()
            .is_some_and(|c| self.bypass_markers.contains(&c))
    }

    /// Resolve `name` to a UUID, or `None` if no source knows it.
    pub async fn resolve(&self, name: &str) -> Option<Uuid> {
        if !self.session.is_in_world() {
            debug!("Not in a world, skipping resolution of '{name}'");
            return None;
        }

        if let Some(uuid) = self.cache.get(name) {
            debug!("Resolved '{name}' from cache");
            return Some(uuid);
        }

        let from_roster = self
            .session
            .roster()
            .into_iter()
            .filter(|p| p.name.eq_ignore_ascii_case(name))
            .find_map(|p| p.uuid);
        if let Some(uuid) = from_roster {
            debug!("Resolved '{name}' from session roster");
            self.cache.put(name, uuid);
            return Some(uuid);
        }

        if self.is_bypass_name(name) {
            debug!("'{name}' carries a bypass marker, not asking the profile service");
            return None;
        }

        if !is_valid_player_name(name) {
            debug!("'{name}' is not a valid player name");
            return None;
        }

        match tokio::time::timeout(self.lookup_deadline, self.lookup.lookup(name)).await {
            Ok(Ok(Some(uuid))) => {
                self.cache.put(name, uuid);
                Some(uuid)
            }
            Ok(Ok(None)) => {
                warn!("Profile service returned no usable id for '{name}'");
                None
            }
            Ok(Err(e)) => {
                warn!("Profile lookup for '{name}' failed: {e}");
                None
            }
            Err(_) => {
                warn!(
                    "Profile lookup for '{name}' timed out after {:?}",
                    self.lookup_deadline
                );
                None
            }
        }
    }

    /// Run [`resolve`](Self::resolve) as a background task. Abort the handle to cancel.
    pub fn spawn_resolve(self: &Arc<Self>, name: impl Into<String>) -> JoinHandle<Option<Uuid>> {
        let resolver = Arc::clone(self);
        let name = name.into();
        tokio::spawn(async move { resolver.resolve(&name).await })
    }
}

/// Java edition names: 1-16 characters of `[A-Za-z0-9_]`.
pub fn is_valid_player_name(name: &str) -> bool {
    (1..=16).contains(&name.len())
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
