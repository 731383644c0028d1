//! What the host knows about the current game session.

use uuid::Uuid;

/// A player visible in the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub name: String,
    /// Unknown for some players, e.g. before their profile arrived.
    pub uuid: Option<Uuid>,
}

impl PlayerInfo {
    pub fn new(name: impl Into<String>, uuid: Option<Uuid>) -> Self {
        Self {
            name: name.into(),
            uuid,
        }
    }
}

/// Host collaborator: connection state and the roster of known players.
pub trait SessionContext: Send + Sync {
    /// Whether the user is currently connected to a world.
    fn is_in_world(&self) -> bool;

    /// Players currently known to the session.
    fn roster(&self) -> Vec<PlayerInfo>;
}
