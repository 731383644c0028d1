//! Prefixing received chat lines with the sender's list prefix.

use std::sync::{Arc, LazyLock};

use radar_rs_list::{IdentifierResolver, ListRegistry};
use regex::Regex;
use tracing::debug;

use crate::format::format_prefix;

/// `<rank> ┃ <name>`; nicked names start with `~`, Bedrock names with `!`.
const SENDER_PATTERN: &str = r"[A-Za-z\-+]+\s┃\s(~?!?\w{1,16})";

static SENDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SENDER_PATTERN).expect("valid regex"));

pub struct ChatAnnotator {
    registry: Arc<ListRegistry>,
    resolver: Arc<IdentifierResolver>,
}

impl ChatAnnotator {
    pub fn new(registry: Arc<ListRegistry>, resolver: Arc<IdentifierResolver>) -> Self {
        Self { registry, resolver }
    }

    /// The annotated line, or `None` if it should be shown unchanged.
    pub async fn annotate(&self, line: &str) -> Option<String> {
        let name = sender_name(line)?;
        if name.starts_with('~') {
            return None;
        }

        let uuid = self.resolver.resolve(name).await?;
        if !self.registry.is_member(&uuid) {
            return None;
        }
        let prefix = self.registry.prefix_for(&uuid);
        debug!("Annotating chat line from listed player '{name}'");
        Some(format!("{}{line}", format_prefix(&prefix)))
    }
}

/// Extract the sender name from a chat line.
pub fn sender_name(line: &str) -> Option<&str> {
    SENDER_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
