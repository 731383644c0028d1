//! External name → UUID profile service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{RadarError, Result};

pub const MOJANG_PROFILE_URL: &str = "https://api.mojang.com/users/profiles/minecraft/";

/// Resolves a player name through a remote service.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    /// `Ok(None)` means the service answered but knows no such player.
    async fn lookup(&self, name: &str) -> Result<Option<Uuid>>;
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    id: String,
    #[allow(dead_code)]
    name: String,
}

/// Client for the Mojang `users/profiles/minecraft/{name}` endpoint.
pub struct MojangProfileLookup {
    client: reqwest::Client,
    base_url: String,
}

impl MojangProfileLookup {
    pub fn new(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url_for(&self, name: &str) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{name}", self.base_url)
        } else {
            format!("{}/{name}", self.base_url)
        }
    }
}

#[async_trait]
impl ProfileLookup for MojangProfileLookup {
    async fn lookup(&self, name: &str) -> Result<Option<Uuid>> {
        let url = self.url_for(name);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(RadarError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }
        let profile = response.json::<ProfileResponse>().await?;
        Ok(parse_profile_id(&profile.id))
    }
}

/// Parse the service's dash-less 32 hex digit id into a UUID.
pub fn parse_profile_id(id: &str) -> Option<Uuid> {
    if id.len() != 32 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let hyphenated = format!(
        "{}-{}-{}-{}-{}",
        &id[0..8],
        &id[8..12],
        &id[12..16],
        &id[16..20],
        &id[20..32]
    );
    Uuid::parse_str(&hyphenated).ok()
}
