//! Console commands.
//!
//! Besides the `/radar` subcommands the console simulates what a game client
//! would feed in: joining a world, players appearing in the tab list and
//! received chat lines.

use std::collections::BTreeSet;
use std::sync::Arc;

use radar_rs_command::{split_args, ChatAnnotator, RadarCommands};
use radar_rs_list::{IdentifierResolver, ListRegistry, PlayerInfo};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ChatSection;
use crate::session::ConsoleSession;

const CONSOLE_HELP: &[&str] = &[
    "join <host>            enter a world on <host>",
    "leave                  leave the world",
    "player <name> [uuid]   a player appears in the tab list",
    "gone <name>            a player leaves the tab list",
    "players                show the tab list",
    "chat <line...>         receive a chat line",
    "reload                 re-fetch the public lists",
    "purge                  delete expired private entries",
    "tab                    re-apply list prefixes to the whole tab list",
    "stop                   exit",
    "radar <args...>        run a /radar command",
];

/// What the console loop should do after a line.
pub struct ConsoleOutcome {
    pub lines: Vec<String>,
    pub should_stop: bool,
}

impl ConsoleOutcome {
    fn lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            should_stop: false,
        }
    }

    fn line(line: impl Into<String>) -> Self {
        Self::lines(vec![line.into()])
    }
}

pub struct Console {
    registry: Arc<ListRegistry>,
    resolver: Arc<IdentifierResolver>,
    session: Arc<ConsoleSession>,
    commands: RadarCommands,
    chat: ChatAnnotator,
    chat_hosts: ChatSection,
}

impl Console {
    pub fn new(
        registry: Arc<ListRegistry>,
        resolver: Arc<IdentifierResolver>,
        session: Arc<ConsoleSession>,
        chat_hosts: ChatSection,
    ) -> Self {
        Self {
            commands: RadarCommands::new(registry.clone(), resolver.clone(), session.clone()),
            chat: ChatAnnotator::new(registry.clone(), resolver.clone()),
            registry,
            resolver,
            session,
            chat_hosts,
        }
    }

    pub async fn handle_line(&self, line: &str) -> ConsoleOutcome {
        let (cmd, rest) = match line.trim().split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line.trim(), ""),
        };
        match cmd.to_lowercase().as_str() {
            "join" if !rest.is_empty() => {
                self.session.join_world(rest);
                self.resolver.cache().prune();
                info!("Joined world on {rest}");
                ConsoleOutcome::line(format!("Joined {rest}"))
            }
            "leave" => {
                self.session.leave_world();
                self.resolver.cache().clear();
                ConsoleOutcome::line("Left the world")
            }
            "player" if !rest.is_empty() => self.player_joined(rest),
            "gone" if !rest.is_empty() => {
                if self.session.remove_player(rest) {
                    ConsoleOutcome::line(format!("{rest} left"))
                } else {
                    ConsoleOutcome::line(format!("{rest} is not in the tab list"))
                }
            }
            "players" => ConsoleOutcome::lines(self.session.display_names()),
            "chat" => self.chat_received(rest).await,
            "reload" => {
                let before = self.registry.all_prefixes();
                let reloaded = self.registry.reload_public_lists().await;
                self.refresh_tab_list(before);
                ConsoleOutcome::line(format!("Reloaded {reloaded} public lists"))
            }
            "purge" => {
                let before = self.registry.all_prefixes();
                let purged = self.registry.purge_expired();
                self.refresh_tab_list(before);
                ConsoleOutcome::line(format!("Purged {purged} expired entries"))
            }
            "tab" => {
                let updated = self.refresh_tab_list(BTreeSet::new());
                ConsoleOutcome::line(format!("Updated {} tab list names", updated.len()))
            }
            "stop" | "quit" | "exit" => ConsoleOutcome {
                lines: vec!["Stopping...".to_string()],
                should_stop: true,
            },
            "help" | "?" => {
                ConsoleOutcome::lines(CONSOLE_HELP.iter().map(|s| s.to_string()).collect())
            }
            _ => self.radar(line).await,
        }
    }

    /// Re-decorate the whole tab list against the current prefixes plus `stale`.
    fn refresh_tab_list(&self, mut stale: BTreeSet<String>) -> Vec<String> {
        stale.extend(self.registry.all_prefixes());
        let updated = self.session.refresh_all(&self.registry, &stale);
        debug!("Refreshed {} tab list names", updated.len());
        updated
    }

    fn player_joined(&self, rest: &str) -> ConsoleOutcome {
        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or_default();
        let uuid = match words.next().map(Uuid::parse_str) {
            None => None,
            Some(Ok(uuid)) => Some(uuid),
            Some(Err(e)) => return ConsoleOutcome::line(format!("Invalid UUID: {e}")),
        };

        let display = self.session.add_player(&self.registry, name, uuid);
        self.resolver
            .cache()
            .put_all(&[PlayerInfo::new(name, uuid)]);
        ConsoleOutcome::line(format!("{display} joined"))
    }

    async fn chat_received(&self, line: &str) -> ConsoleOutcome {
        let annotate = self
            .session
            .host()
            .is_some_and(|host| self.chat_hosts.matches_host(&host));
        if !annotate {
            return ConsoleOutcome::line(line);
        }
        match self.chat.annotate(line).await {
            Some(annotated) => ConsoleOutcome::line(annotated),
            None => ConsoleOutcome::line(line),
        }
    }

    async fn radar(&self, line: &str) -> ConsoleOutcome {
        let args = split_args(line);
        let result = self.commands.execute(&args).await;
        let mut lines: Vec<String> = result
            .messages
            .iter()
            .map(|m| format!("{}{m}", radar_rs_command::MESSAGE_PREFIX))
            .collect();

        if !result.refresh.is_empty() {
            let updated =
                self.session
                    .refresh(&self.registry, &result.refresh, &result.stale_prefixes);
            debug!("Refreshed {} tab list names", updated.len());
            lines.extend(updated.into_iter().map(|name| format!("  tab list: {name}")));
        }
        ConsoleOutcome::lines(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use radar_rs_command::format::strip_colors;
    use radar_rs_list::{ListEntry, ListFetcher, ProfileLookup, ResolverConfig, Result};
    use tempfile::TempDir;

    const SCAMMER_URL: &str = "https://lists.example/scammer.json";

    struct NoLists;

    #[async_trait]
    impl ListFetcher for NoLists {
        async fn fetch_entries(&self, _url: &str) -> Result<Vec<ListEntry>> {
            Ok(vec![])
        }
    }

    /// Serves whatever was last handed to `serve`, nothing otherwise.
    #[derive(Default)]
    struct Pages(Mutex<HashMap<String, Vec<ListEntry>>>);

    impl Pages {
        fn serve(&self, url: &str, entries: Vec<ListEntry>) {
            self.0.lock().insert(url.to_string(), entries);
        }
    }

    #[async_trait]
    impl ListFetcher for Pages {
        async fn fetch_entries(&self, url: &str) -> Result<Vec<ListEntry>> {
            Ok(self.0.lock().get(url).cloned().unwrap_or_default())
        }
    }

    struct Offline;

    #[async_trait]
    impl ProfileLookup for Offline {
        async fn lookup(&self, _name: &str) -> Result<Option<Uuid>> {
            Ok(None)
        }
    }

    fn console() -> (TempDir, Console) {
        console_with(Arc::new(NoLists))
    }

    fn console_with(fetcher: Arc<dyn ListFetcher>) -> (TempDir, Console) {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(ListRegistry::new(dir.path(), fetcher));
        let session = Arc::new(ConsoleSession::new());
        let resolver = Arc::new(IdentifierResolver::new(
            session.clone(),
            Arc::new(Offline),
            &ResolverConfig::default(),
        ));
        let console = Console::new(registry, resolver, session, ChatSection::default());
        (dir, console)
    }

    async fn run(console: &Console, line: &str) -> Vec<String> {
        console
            .handle_line(line)
            .await
            .lines
            .iter()
            .map(|l| strip_colors(l))
            .collect()
    }

    #[tokio::test]
    async fn adding_a_player_redecorates_the_tab_list() {
        let (_dir, console) = console();
        let uuid = Uuid::new_v4();
        run(&console, "join mc.griefergames.net").await;
        run(&console, &format!("player Mallory {uuid}")).await;
        run(&console, "radar list add scammer &c[S]").await;

        let out = run(&console, "/radar player add scammer Mallory scam").await;
        assert_eq!(out.last().map(String::as_str), Some("  tab list: [S] Mallory"));
        assert_eq!(console.session.display_names(), vec!["§c[S] §rMallory"]);

        let chat = run(&console, "chat Spieler ┃ Mallory » hi").await;
        assert_eq!(chat, vec!["[S] Spieler ┃ Mallory » hi"]);

        run(&console, "radar player remove scammer Mallory").await;
        assert_eq!(console.session.display_names(), vec!["Mallory"]);
    }

    #[tokio::test]
    async fn chat_is_untouched_on_other_hosts() {
        let (_dir, console) = console();
        let uuid = Uuid::new_v4();
        run(&console, "join localhost").await;
        run(&console, &format!("player Mallory {uuid}")).await;
        run(&console, "radar list add scammer &c[S]").await;
        run(&console, "radar player add scammer Mallory scam").await;

        let chat = run(&console, "chat Spieler ┃ Mallory » hi").await;
        assert_eq!(chat, vec!["Spieler ┃ Mallory » hi"]);
    }

    #[tokio::test]
    async fn reload_redecorates_the_whole_tab_list() {
        let pages = Arc::new(Pages::default());
        let (_dir, console) = console_with(pages.clone());
        console
            .registry
            .register_public_list("scammer", "&c[S]", SCAMMER_URL)
            .await
            .unwrap();
        let mallory = Uuid::new_v4();
        run(&console, "join mc.griefergames.net").await;
        run(&console, &format!("player Mallory {mallory}")).await;
        run(&console, "player Steve").await;
        assert_eq!(console.session.display_names(), vec!["Mallory", "Steve"]);

        pages.serve(SCAMMER_URL, vec![ListEntry::new(mallory, "Mallory", "scam")]);
        run(&console, "reload").await;
        assert_eq!(
            console.session.display_names(),
            vec!["§c[S] §rMallory", "Steve"]
        );

        // dropped from the public list: the prefix goes away on the next reload
        pages.serve(SCAMMER_URL, vec![]);
        run(&console, "reload").await;
        assert_eq!(console.session.display_names(), vec!["Mallory", "Steve"]);
    }

    #[tokio::test]
    async fn tab_command_applies_changes_made_behind_the_console() {
        let (_dir, console) = console();
        let bob = Uuid::new_v4();
        run(&console, "join localhost").await;
        run(&console, &format!("player Bob {bob}")).await;
        console.registry.register_private_list("friends", "&a[F]").unwrap();
        console.registry.add_entry("friends", bob, "Bob", "nice").unwrap();
        assert_eq!(console.session.display_names(), vec!["Bob"]);

        let out = run(&console, "tab").await;
        assert_eq!(out, vec!["Updated 1 tab list names"]);
        assert_eq!(console.session.display_names(), vec!["§a[F] §rBob"]);

        // applying twice does not stack the prefix
        let out = run(&console, "tab").await;
        assert_eq!(out, vec!["Updated 0 tab list names"]);
        assert_eq!(console.session.display_names(), vec!["§a[F] §rBob"]);
    }

    #[tokio::test]
    async fn help_lists_console_commands() {
        let (_dir, console) = console();
        let out = run(&console, "help").await;
        assert_eq!(out.len(), CONSOLE_HELP.len());
        assert!(out.iter().any(|l| l.starts_with("tab ")));
    }

    #[tokio::test]
    async fn stop_and_bad_uuid() {
        let (_dir, console) = console();
        assert!(console.handle_line("stop").await.should_stop);
        let out = run(&console, "player Bob not-a-uuid").await;
        assert!(out[0].starts_with("Invalid UUID"));
    }
}
