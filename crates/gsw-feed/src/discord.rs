//! REST client for the upstream chat API.
//!
//! The token is passed in by the caller (daemon) and sent verbatim in the
//! `Authorization` header; it never appears in logs or `Debug` output.

use async_trait::async_trait;
use gsw_schemas::{GuildInfo, RawMessage, RoleInfo};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::source::{ChannelSource, FetchError, RoleDirectory};

/// Identity returned by the login check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
}

impl CurrentUser {
    /// `name#1234`, or just `name` for accounts without a discriminator.
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if d != "0" && !d.is_empty() => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }
}

#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    /// Guild list captured at login, in API order.
    guilds: Vec<GuildInfo>,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url)
            .field("token", &"<REDACTED>")
            .field("guilds", &self.guilds.len())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl DiscordClient {
    pub fn new_with_base_url(token: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            token,
            guilds: Vec::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let resp = self
            .http
            .get(self.url(path))
            .query(query)
            .header(reqwest::header::AUTHORIZATION, self.token.as_str())
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(FetchError::Unauthorized);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let message = resp
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| "unknown".to_string());
            return Err(FetchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| FetchError::Decode(format!("{path}: {e}")))
    }

    /// Verify the token and capture the visible guilds.
    ///
    /// `Err(FetchError::Unauthorized)` here means no later call can succeed.
    pub async fn login(&mut self) -> Result<CurrentUser, FetchError> {
        let me: CurrentUser = self.get_json("/users/@me", &[]).await?;
        self.guilds = self.get_json("/users/@me/guilds", &[]).await?;
        debug!(guilds = self.guilds.len(), "login complete");
        Ok(me)
    }

    pub fn guilds(&self) -> &[GuildInfo] {
        &self.guilds
    }
}

#[async_trait]
impl ChannelSource for DiscordClient {
    async fn latest_message(&self, channel_id: &str) -> Result<Option<RawMessage>, FetchError> {
        let path = format!("/channels/{channel_id}/messages");
        let mut msgs: Vec<RawMessage> = self.get_json(&path, &[("limit", "1")]).await?;
        if msgs.is_empty() {
            return Ok(None);
        }
        Ok(Some(msgs.swap_remove(0)))
    }
}

#[async_trait]
impl RoleDirectory for DiscordClient {
    async fn guild_ids(&self) -> Result<Vec<String>, FetchError> {
        Ok(self.guilds.iter().map(|g| g.id.clone()).collect())
    }

    async fn guild_roles(&self, guild_id: &str) -> Result<Vec<RoleInfo>, FetchError> {
        self.get_json(&format!("/guilds/{guild_id}/roles"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_omits_zero_discriminator() {
        let mut u = CurrentUser {
            id: "1".into(),
            username: "watcher".into(),
            discriminator: Some("0".into()),
        };
        assert_eq!(u.tag(), "watcher");
        u.discriminator = Some("4242".into());
        assert_eq!(u.tag(), "watcher#4242");
    }

    #[test]
    fn debug_redacts_token() {
        let c = DiscordClient::new_with_base_url("very-secret".into(), "http://x".into());
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("very-secret"));
        assert!(dbg.contains("<REDACTED>"));
    }

    #[test]
    fn url_joins_without_double_slash() {
        let c = DiscordClient::new_with_base_url("t".into(), "http://x/api/".into());
        assert_eq!(c.url("/users/@me"), "http://x/api/users/@me");
    }
}
