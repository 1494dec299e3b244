//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"GSW_USER_TOKEN"`).
//! - At startup, callers invoke [`resolve_secrets`] once.
//! - The returned [`ResolvedSecrets`] is passed into constructors; never
//!   scatter `std::env::var` calls across the codebase.
//! - `Debug` redacts values. Error messages reference the env var **NAME**,
//!   never the value.

use anyhow::{bail, Result};

use crate::WatchConfig;

/// All runtime-resolved secrets for one watcher instance.
/// **Values are redacted in `Debug` output.**
#[derive(Clone)]
pub struct ResolvedSecrets {
    /// Upstream account token, sent verbatim in the `Authorization` header.
    pub user_token: String,
    /// Target webhook URL. Carries its own auth in the path.
    pub webhook_url: String,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("user_token", &"<REDACTED>")
            .field("webhook_url", &"<REDACTED>")
            .finish()
    }
}

/// Resolve a named environment variable.
/// Returns `None` if the variable is unset or its value is blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Resolve every secret the watcher needs. Both are required.
///
/// # Errors
/// Returns `Err` naming the first missing env var.
pub fn resolve_secrets(cfg: &WatchConfig) -> Result<ResolvedSecrets> {
    resolve_secrets_with(cfg, resolve_env)
}

/// Same as [`resolve_secrets`] with an injectable lookup (tests).
pub fn resolve_secrets_with<F>(cfg: &WatchConfig, lookup: F) -> Result<ResolvedSecrets>
where
    F: Fn(&str) -> Option<String>,
{
    let token_var = cfg.discord.token_env.as_str();
    let webhook_var = cfg.publish.webhook_url_env.as_str();

    let Some(user_token) = lookup(token_var) else {
        bail!("SECRETS_MISSING: required env var '{token_var}' (account token) is not set or empty");
    };
    let Some(webhook_url) = lookup(webhook_var) else {
        bail!("SECRETS_MISSING: required env var '{webhook_var}' (target webhook url) is not set or empty");
    };

    Ok(ResolvedSecrets {
        user_token,
        webhook_url,
    })
}
