use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use radar_rs_list::ResolverConfig;

#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub reload: ReloadSection,
    #[serde(default)]
    pub chat: ChatSection,
    #[serde(default = "default_public_lists")]
    pub public_lists: Vec<PublicListConfig>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StorageSection {
    /// Private lists live here, one JSON file per list.
    #[serde(default = "default_storage_directory")]
    pub directory: String,
}

fn default_storage_directory() -> String {
    "radar/lists".into()
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            directory: default_storage_directory(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReloadSection {
    /// Public list reload interval in seconds. 0 = disabled.
    #[serde(default = "default_reload_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_reload_interval() -> u64 {
    1800
}

fn default_fetch_timeout() -> u64 {
    10
}

impl Default for ReloadSection {
    fn default() -> Self {
        Self {
            interval_secs: default_reload_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl ReloadSection {
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSection {
    /// Server host suffixes on which chat lines are annotated.
    #[serde(default = "default_chat_hosts")]
    pub hosts: Vec<String>,
}

fn default_chat_hosts() -> Vec<String> {
    vec![
        "griefergames.net".into(),
        "griefergames.de".into(),
        "griefergames.live".into(),
    ]
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            hosts: default_chat_hosts(),
        }
    }
}

impl ChatSection {
    /// Whether chat on `host` should be annotated. A trailing dot is ignored.
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.strip_suffix('.').unwrap_or(host).to_lowercase();
        self.hosts
            .iter()
            .any(|suffix| host.ends_with(&suffix.to_lowercase()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicListConfig {
    pub namespace: String,
    pub prefix: String,
    pub url: String,
}

fn default_public_lists() -> Vec<PublicListConfig> {
    vec![
        PublicListConfig {
            namespace: "scammer".into(),
            prefix: "&7[&cScammer&7]".into(),
            url: "https://lists.community-radar.de/versions/v1/scammer.json".into(),
        },
        PublicListConfig {
            namespace: "trusted".into(),
            prefix: "&7[&aTrusted&7]".into(),
            url: "https://lists.community-radar.de/versions/v1/trusted.json".into(),
        },
    ]
}

impl ClientConfig {
    /// Load `path`; a missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(toml::from_str("")?);
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.directory, "radar/lists");
        assert_eq!(config.reload.interval(), Some(Duration::from_secs(1800)));
        assert_eq!(config.resolver.connect_timeout_ms, 3000);
        assert_eq!(config.resolver.bypass_markers, vec!['!', '~']);
        // default public lists when absent
        assert_eq!(config.public_lists.len(), 2);
        assert_eq!(config.public_lists[0].namespace, "scammer");
        assert_eq!(config.public_lists[1].prefix, "&7[&aTrusted&7]");
    }

    #[test]
    fn parse_config() {
        let toml_str = r#"
            [logging]
            level = "debug"

            [storage]
            directory = "/tmp/radar"

            [resolver]
            lookup_url = "http://localhost:8080/profiles/"
            read_timeout_ms = 500

            [reload]
            interval_secs = 0

            [chat]
            hosts = ["example.net"]

            [[public_lists]]
            namespace = "cheater"
            prefix = "&4[C]"
            url = "https://example.net/cheater.json"
        "#;
        let config: ClientConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.storage.directory, "/tmp/radar");
        assert_eq!(config.resolver.lookup_url, "http://localhost:8080/profiles/");
        assert_eq!(config.resolver.read_timeout(), Duration::from_millis(500));
        assert_eq!(config.resolver.connect_timeout_ms, 3000); // default
        assert_eq!(config.reload.interval(), None);
        assert_eq!(config.reload.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.public_lists.len(), 1);
        assert_eq!(config.public_lists[0].namespace, "cheater");
        assert!(config.chat.matches_host("mc.example.net"));
        assert!(!config.chat.matches_host("griefergames.net"));
    }

    #[test]
    fn chat_host_matching() {
        let chat = ChatSection::default();
        assert!(chat.matches_host("GrieferGames.net"));
        assert!(chat.matches_host("proxy.griefergames.live."));
        assert!(!chat.matches_host("localhost"));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = ClientConfig::load("/nonexistent/radar.toml").unwrap();
        assert_eq!(config.public_lists.len(), 2);
    }
}
