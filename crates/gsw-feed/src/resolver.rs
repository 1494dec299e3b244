//! Role id -> label resolution with a bounded, wholesale-cleared cache.
//!
//! Absent results are cached too, so an unknown id costs one directory sweep
//! per cache generation. When the cache grows past its capacity it is dropped
//! entirely before the next lookup; there is no LRU.
//!
//! Concurrent misses for the same id may both sweep the directory. The sweep
//! is idempotent, so the cache lock is never held across an await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::source::RoleDirectory;

pub struct RoleResolver {
    directory: Arc<dyn RoleDirectory>,
    capacity: usize,
    cache: Mutex<HashMap<String, Option<String>>>,
}

impl RoleResolver {
    pub fn new(directory: Arc<dyn RoleDirectory>, capacity: usize) -> Self {
        Self {
            directory,
            capacity,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, Option<String>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Resolve `role_id` to its label.
    ///
    /// Guilds are swept in directory order; the first guild that knows the id
    /// wins. A guild whose roles cannot be fetched is skipped. If the guild
    /// list itself cannot be fetched the miss is **not** cached.
    pub async fn resolve(&self, role_id: &str) -> Option<String> {
        {
            let mut cache = self.cache();
            if cache.len() > self.capacity {
                info!(size = cache.len(), capacity = self.capacity, "role cache over capacity; clearing");
                cache.clear();
            }
            if let Some(hit) = cache.get(role_id) {
                return hit.clone();
            }
        }

        let guilds = match self.directory.guild_ids().await {
            Ok(g) => g,
            Err(e) => {
                warn!(role_id, error = %e, "guild listing failed; role unresolved");
                return None;
            }
        };

        let mut found: Option<String> = None;
        for guild_id in &guilds {
            match self.directory.guild_roles(guild_id).await {
                Ok(roles) => {
                    if let Some(role) = roles.into_iter().find(|r| r.id == role_id) {
                        found = Some(role.name);
                        break;
                    }
                }
                Err(e) => debug!(guild_id = %guild_id, error = %e, "role fetch failed; skipping guild"),
            }
        }

        self.cache().insert(role_id.to_string(), found.clone());
        found
    }

    /// Drop every cached entry. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut cache = self.cache();
        let n = cache.len();
        cache.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.cache().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
