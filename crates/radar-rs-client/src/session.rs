//! Simulated game session driven from the console.

use std::collections::BTreeSet;

use parking_lot::Mutex;
use radar_rs_command::format::decorate_name;
use radar_rs_list::{ListRegistry, PlayerInfo, SessionContext};
use uuid::Uuid;

struct ConsolePlayer {
    info: PlayerInfo,
    /// Name as shown in the tab list, with any list prefix.
    display: String,
}

#[derive(Default)]
struct SessionState {
    host: Option<String>,
    players: Vec<ConsolePlayer>,
}

#[derive(Default)]
pub struct ConsoleSession {
    state: Mutex<SessionState>,
}

impl ConsoleSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join_world(&self, host: &str) {
        let mut state = self.state.lock();
        state.host = Some(host.to_string());
        state.players.clear();
    }

    pub fn leave_world(&self) {
        let mut state = self.state.lock();
        state.host = None;
        state.players.clear();
    }

    pub fn host(&self) -> Option<String> {
        self.state.lock().host.clone()
    }

    /// Add or replace a roster player and decorate their name. Returns the display name.
    pub fn add_player(&self, registry: &ListRegistry, name: &str, uuid: Option<Uuid>) -> String {
        let display = match uuid {
            Some(uuid) => decorate_name(name, &registry.prefix_for(&uuid), &BTreeSet::new()),
            None => name.to_string(),
        };
        let mut state = self.state.lock();
        state
            .players
            .retain(|p| !p.info.name.eq_ignore_ascii_case(name));
        state.players.push(ConsolePlayer {
            info: PlayerInfo::new(name, uuid),
            display: display.clone(),
        });
        display
    }

    pub fn remove_player(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let before = state.players.len();
        state
            .players
            .retain(|p| !p.info.name.eq_ignore_ascii_case(name));
        state.players.len() != before
    }

    /// Display names of the roster, in join order.
    pub fn display_names(&self) -> Vec<String> {
        self.state
            .lock()
            .players
            .iter()
            .map(|p| p.display.clone())
            .collect()
    }

    /// Re-decorate the roster players in `refresh`. Returns their new display names.
    pub fn refresh(
        &self,
        registry: &ListRegistry,
        refresh: &[Uuid],
        stale_prefixes: &BTreeSet<String>,
    ) -> Vec<String> {
        let mut state = self.state.lock();
        let mut updated = Vec::new();
        for player in &mut state.players {
            let Some(uuid) = player.info.uuid.filter(|u| refresh.contains(u)) else {
                continue;
            };
            player.display = decorate_name(
                &player.display,
                &registry.prefix_for(&uuid),
                stale_prefixes,
            );
            updated.push(player.display.clone());
        }
        updated
    }

    /// Re-decorate every roster player with a known UUID, stripping any of
    /// `stale_prefixes` first. Returns the display names that changed.
    pub fn refresh_all(
        &self,
        registry: &ListRegistry,
        stale_prefixes: &BTreeSet<String>,
    ) -> Vec<String> {
        let mut state = self.state.lock();
        let mut updated = Vec::new();
        for player in &mut state.players {
            let Some(uuid) = player.info.uuid else {
                continue;
            };
            let display = decorate_name(
                &player.display,
                &registry.prefix_for(&uuid),
                stale_prefixes,
            );
            if display != player.display {
                player.display = display;
                updated.push(player.display.clone());
            }
        }
        updated
    }
}

impl SessionContext for ConsoleSession {
    fn is_in_world(&self) -> bool {
        self.state.lock().host.is_some()
    }

    fn roster(&self) -> Vec<PlayerInfo> {
        self.state
            .lock()
            .players
            .iter()
            .map(|p| p.info.clone())
            .collect()
    }
}
