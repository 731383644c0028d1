//! The `/radar` command surface, chat annotation and prefix formatting.

pub mod chat;
pub mod format;

use std::collections::BTreeSet;
use std::sync::Arc;

use radar_rs_list::{
    IdentifierResolver, ListEntry, ListRegistry, RadarError, SessionContext, Visibility,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::format::{format_date_time, translate_colors};

pub use chat::ChatAnnotator;

/// Put in front of every message shown to the user.
pub const MESSAGE_PREFIX: &str = "§8[§cCommunityRadar§8]§r ";

const MISSING_ARGS: &str = "§cNot enough arguments. Type '/radar help' for the correct syntax.";
const NAME_INVALID: &str = "§cThe player could not be found. Is the name correct?";
const NAME_INVALID_BEDROCK: &str = "§cThe player could not be found. Bedrock players must be in the same world as you to be added.";

/// `(usage, description)` for every subcommand, in help order.
const SUBCOMMANDS: &[(&str, &str)] = &[
    ("lists", "Show all lists"),
    ("list add <list> <prefix>", "Create a private list"),
    ("list prefix <list> <prefix>", "Change the prefix of a list"),
    ("list delete <list>", "Delete a private list"),
    ("list show <list>", "Show the players on a list"),
    ("check <name>", "Check whether a player is on a list"),
    ("check *", "Check every player in the world"),
    ("player add <list> <name> <cause...>", "Put a player on a list"),
    ("player remove <list> <name>", "Take a player off a list"),
    ("help", "Show this help"),
];

/// Result returned by a command.
#[derive(Debug, Default)]
pub struct CommandResult {
    /// Whether the command executed successfully.
    pub success: bool,
    /// Messages to show to the user, with `§` colour codes.
    pub messages: Vec<String>,
    /// Players whose name display must be rebuilt.
    pub refresh: Vec<Uuid>,
    /// Prefixes that were in use before the command ran.
    pub stale_prefixes: BTreeSet<String>,
}

impl CommandResult {
    /// Create a successful result with a single message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            messages: vec![message.into()],
            ..Self::default()
        }
    }

    /// Create a failed result with a single message.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
            ..Self::default()
        }
    }

    fn refreshing(mut self, refresh: Vec<Uuid>, stale_prefixes: BTreeSet<String>) -> Self {
        self.refresh = refresh;
        self.stale_prefixes = stale_prefixes;
        self
    }
}

/// Split a console or chat line into `/radar` arguments.
///
/// A leading `/radar` or `radar` is dropped.
pub fn split_args(line: &str) -> Vec<String> {
    let mut words = line.split_whitespace().peekable();
    if words
        .peek()
        .is_some_and(|w| w.trim_start_matches('/').eq_ignore_ascii_case("radar"))
    {
        words.next();
    }
    words.map(String::from).collect()
}

pub struct RadarCommands {
    registry: Arc<ListRegistry>,
    resolver: Arc<IdentifierResolver>,
    session: Arc<dyn SessionContext>,
}

impl RadarCommands {
    pub fn new(
        registry: Arc<ListRegistry>,
        resolver: Arc<IdentifierResolver>,
        session: Arc<dyn SessionContext>,
    ) -> Self {
        Self {
            registry,
            resolver,
            session,
        }
    }

    /// Execute `/radar <args...>`.
    pub async fn execute(&self, args: &[String]) -> CommandResult {
        let Some(sub) = args.first() else {
            return help();
        };
        debug!("Executing /radar {}", args.join(" "));
        match sub.to_lowercase().as_str() {
            "lists" => self.cmd_lists(),
            "list" => self.cmd_list(args),
            "check" => self.cmd_check(args).await,
            "player" => self.cmd_player(args).await,
            _ => help(),
        }
    }

    fn cmd_lists(&self) -> CommandResult {
        let lists = self.registry.snapshot();
        if lists.is_empty() {
            return CommandResult::ok("§7No lists were found.");
        }
        let names: Vec<String> = lists
            .iter()
            .map(|list| {
                let kind = match list.visibility() {
                    Visibility::Private => "PRIVATE",
                    Visibility::Public => "PUBLIC",
                };
                format!("§e{} §7(§c{kind}§7)", list.namespace())
            })
            .collect();
        CommandResult::ok(format!("§7Lists: {}", names.join(", ")))
    }

    fn cmd_list(&self, args: &[String]) -> CommandResult {
        let Some(action) = args.get(1) else {
            return CommandResult::err(MISSING_ARGS);
        };
        match action.to_lowercase().as_str() {
            "add" => {
                let [_, _, namespace, prefix] = args else {
                    return CommandResult::err(MISSING_ARGS);
                };
                match self.registry.register_private_list(namespace, prefix) {
                    Ok(()) => CommandResult::ok("§7The list was §acreated§7."),
                    Err(e) => CommandResult::err(format!("§cCould not create the list: {e}")),
                }
            }
            "prefix" => {
                let [_, _, namespace, prefix] = args else {
                    return CommandResult::err(MISSING_ARGS);
                };
                let stale = self.registry.all_prefixes();
                match self.registry.set_prefix(namespace, prefix) {
                    Ok(members) => CommandResult::ok(format!(
                        "§7The prefix was changed to §e{}§7.",
                        translate_colors(prefix)
                    ))
                    .refreshing(members, stale),
                    Err(e) => CommandResult::err(format!("§cCould not change the prefix: {e}")),
                }
            }
            "delete" => {
                let [_, _, namespace] = args else {
                    return CommandResult::err(MISSING_ARGS);
                };
                let stale = self.registry.all_prefixes();
                match self.registry.unregister_list(namespace) {
                    Ok(members) => {
                        CommandResult::ok("§7The list was §cdeleted§7.").refreshing(members, stale)
                    }
                    Err(e) => CommandResult::err(format!("§cCould not delete the list: {e}")),
                }
            }
            "show" => {
                let [_, _, namespace] = args else {
                    return CommandResult::err(MISSING_ARGS);
                };
                self.show_list(namespace)
            }
            _ => help(),
        }
    }

    fn show_list(&self, namespace: &str) -> CommandResult {
        let Some(list) = self.registry.find_by_namespace(namespace) else {
            return CommandResult::err(format!("§cThere is no list named '{namespace}'."));
        };
        let now = radar_rs_list::entry::now();
        let mut names: Vec<&str> = list
            .entries()
            .values()
            .filter(|e| !e.is_expired(now))
            .map(|e| e.name.as_str())
            .collect();
        if names.is_empty() {
            return CommandResult::ok("§7There are no players on this list.");
        }
        names.sort_unstable_by_key(|n| n.to_lowercase());
        CommandResult::ok(format!(
            "§7List: §e{}§7, Prefix: §e{}§7, Players: §e{}",
            list.namespace(),
            translate_colors(list.prefix()),
            names.join(", ")
        ))
    }

    async fn cmd_check(&self, args: &[String]) -> CommandResult {
        let [_, target] = args else {
            return CommandResult::err(MISSING_ARGS);
        };
        if target == "*" {
            return self.check_everyone();
        }

        let not_found = "§7The player was not found on §cany §7list.";
        let Some(uuid) = self.resolver.resolve(target).await else {
            return CommandResult::ok(not_found);
        };
        let Some(entry) = self.registry.find_by_subject(&uuid) else {
            return CommandResult::ok(not_found);
        };
        let mut result = CommandResult::ok("§7The player was found on a list:");
        result.messages.extend(self.describe(&entry));
        result
    }

    fn check_everyone(&self) -> CommandResult {
        let mut result = CommandResult::ok("§7Players in the world on a list:");
        for player in self.session.roster() {
            let Some(entry) = player.uuid.and_then(|u| self.registry.find_by_subject(&u)) else {
                continue;
            };
            result.messages.extend(self.describe(&entry));
        }
        if result.messages.len() == 1 {
            return CommandResult::ok("§cNo player in the world is on a list.");
        }
        result
    }

    fn describe(&self, entry: &ListEntry) -> Vec<String> {
        let mut lines = vec![
            format!(
                "§7Prefix: §e{}",
                translate_colors(&self.registry.prefix_for(&entry.uuid))
            ),
            format!("§7Name: §e{}", entry.name),
            format!("§7Cause: §e{}", entry.cause),
            format!("§7Added: §e{}", format_date_time(&entry.created_at)),
            format!("§7Last update: §e{}", format_date_time(&entry.updated_at)),
        ];
        if let Some(expires) = entry.expires_at() {
            lines.push(format!("§7Expires: §e{}", format_date_time(&expires)));
        }
        lines
    }

    async fn cmd_player(&self, args: &[String]) -> CommandResult {
        let Some(action) = args.get(1) else {
            return CommandResult::err(MISSING_ARGS);
        };
        match action.to_lowercase().as_str() {
            "add" => {
                let [_, _, namespace, name, cause @ ..] = args else {
                    return CommandResult::err(MISSING_ARGS);
                };
                if cause.is_empty() {
                    return CommandResult::err(MISSING_ARGS);
                }
                self.add_player(namespace, name, &cause.join(" ")).await
            }
            "remove" => {
                let [_, _, namespace, name] = args else {
                    return CommandResult::err(MISSING_ARGS);
                };
                self.remove_player(namespace, name).await
            }
            _ => help(),
        }
    }

    async fn add_player(&self, namespace: &str, name: &str, cause: &str) -> CommandResult {
        let add_failed = "§cThe player could not be added. Did you use a private list? Create one with '/radar list add <list> <prefix>'.";
        if self.registry.find_by_namespace(namespace).is_none() {
            return CommandResult::err(add_failed);
        }
        let Some(uuid) = self.resolver.resolve(name).await else {
            return CommandResult::err(name_invalid(name));
        };

        let stale = self.registry.all_prefixes();
        match self.registry.add_entry(namespace, uuid, name, cause) {
            Ok(()) => CommandResult::ok("§7The player was §aadded §7to the list.")
                .refreshing(vec![uuid], stale),
            Err(RadarError::AlreadyListed(_)) => {
                CommandResult::err("§7The player is already on a list.")
            }
            Err(RadarError::NotPrivate(_)) | Err(RadarError::UnknownNamespace(_)) => {
                CommandResult::err(add_failed)
            }
            Err(e) => {
                warn!("Adding {uuid} to '{namespace}' failed: {e}");
                CommandResult::err(format!("§c{e}"))
            }
        }
    }

    async fn remove_player(&self, namespace: &str, name: &str) -> CommandResult {
        let remove_failed = "§cThe player could not be removed. Did you use a private list?";
        if self.registry.find_by_namespace(namespace).is_none() {
            return CommandResult::err(remove_failed);
        }
        let Some(uuid) = self.resolver.resolve(name).await else {
            return CommandResult::err(name_invalid(name));
        };

        let stale = self.registry.all_prefixes();
        match self.registry.remove_entry(namespace, &uuid) {
            Ok(_) => CommandResult::ok("§7The player was §cremoved §7from the list.")
                .refreshing(vec![uuid], stale),
            Err(RadarError::NotListed(..)) => {
                CommandResult::err("§7The player is §cnot §7on this list.")
            }
            Err(RadarError::NotPrivate(_)) | Err(RadarError::UnknownNamespace(_)) => {
                CommandResult::err(remove_failed)
            }
            Err(e) => {
                warn!("Removing {uuid} from '{namespace}' failed: {e}");
                CommandResult::err(format!("§c{e}"))
            }
        }
    }
}

fn name_invalid(name: &str) -> &'static str {
    if name.starts_with('!') {
        NAME_INVALID_BEDROCK
    } else {
        NAME_INVALID
    }
}

fn help() -> CommandResult {
    let mut lines = vec!["§7§l--------- §eRadar help §7§l---------".to_string()];
    for (usage, description) in SUBCOMMANDS {
        lines.push(format!("§e/radar {usage} §7-> {description}"));
    }
    lines.push(format!("§eVersion §7-> §e{}", env!("CARGO_PKG_VERSION")));
    CommandResult {
        success: true,
        messages: lines,
        ..CommandResult::default()
    }
}
