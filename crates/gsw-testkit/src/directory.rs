use std::sync::Mutex;

use async_trait::async_trait;
use gsw_feed::{FetchError, RoleDirectory};
use gsw_schemas::RoleInfo;

/// Guilds and their roles, in insertion order.
#[derive(Default)]
pub struct FakeDirectory {
    guilds: Mutex<Vec<(String, Vec<RoleInfo>)>>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guild(self, guild_id: &str, roles: Vec<RoleInfo>) -> Self {
        self.guilds.lock().unwrap().push((guild_id.to_string(), roles));
        self
    }
}

#[async_trait]
impl RoleDirectory for FakeDirectory {
    async fn guild_ids(&self) -> Result<Vec<String>, FetchError> {
        Ok(self.guilds.lock().unwrap().iter().map(|(g, _)| g.clone()).collect())
    }

    async fn guild_roles(&self, guild_id: &str) -> Result<Vec<RoleInfo>, FetchError> {
        self.guilds
            .lock()
            .unwrap()
            .iter()
            .find(|(g, _)| g == guild_id)
            .map(|(_, r)| r.clone())
            .ok_or_else(|| FetchError::NotFound(format!("guild {guild_id}")))
    }
}
