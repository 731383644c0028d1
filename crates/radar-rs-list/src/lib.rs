//! Community radar lists: player UUID lists with prefixes, causes and timestamps.
//!
//! Lists are either **public** (fetched read-only from a URL and reloaded
//! periodically) or **private** (created by the user and stored as JSON files
//! under a local directory). The [`ListRegistry`] owns all of them and enforces
//! that a player appears on at most one list. The [`IdentifierResolver`] turns
//! typed player names into UUIDs using the session roster, a TTL cache and the
//! Mojang profile service.

pub mod cache;
pub mod entry;
pub mod error;
pub mod fetch;
pub mod list;
pub mod lookup;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod storage;

pub use cache::NameCache;
pub use entry::{ListEntry, NEVER_EXPIRES};
pub use error::{RadarError, Result};
pub use fetch::{HttpListFetcher, ListFetcher};
pub use list::{RadarList, Visibility};
pub use lookup::{MojangProfileLookup, ProfileLookup};
pub use registry::ListRegistry;
pub use resolver::{IdentifierResolver, ResolverConfig};
pub use session::{PlayerInfo, SessionContext};

/// Sent with every outgoing HTTP request.
pub const USER_AGENT: &str = concat!("radar-rs/", env!("CARGO_PKG_VERSION"));
