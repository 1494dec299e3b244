//! gsw-config
//!
//! Layered YAML configuration for the stock watcher.
//!
//! - Documents merge in order: earlier docs are base, later docs override.
//! - The merged document is hashed (SHA-256 over canonical JSON) so a running
//!   daemon can report exactly which configuration it booted with.
//! - Literal secrets are refused. YAML stores env var NAMES only; see
//!   [`secrets`] for value resolution.

pub mod secrets;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs;
use std::sync::LazyLock;

pub use secrets::{resolve_secrets, resolve_secrets_with, ResolvedSecrets};

// Webhook URLs embed their own token; a user token is three dot-separated
// base64url segments. Either one in YAML aborts loading with
// CONFIG_SECRET_DETECTED.
static WEBHOOK_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:[a-z]+\.)?discord(?:app)?\.com/api(?:/v\d+)?/webhooks/\d+/\S+")
        .expect("valid webhook url regex")
});
static USER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:mfa\.[\w-]{20,}|[\w-]{20,}\.[\w-]{6,}\.[\w-]{20,})$")
        .expect("valid user token regex")
});
const PEM_PREFIX: &str = "-----BEGIN";

// ---------------------------------------------------------------------------
// Layered loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    // serde_json::Map is BTreeMap-backed here, so key order is canonical.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        if let Some(s) = v.pointer(&ptr).and_then(Value::as_str) {
            if looks_like_secret(s) {
                bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
            }
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    t.starts_with(PEM_PREFIX) || WEBHOOK_URL.is_match(t) || USER_TOKEN.is_match(t)
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => out.push(prefix.to_string()),
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

// ---------------------------------------------------------------------------
// Typed view
// ---------------------------------------------------------------------------

/// Typed watcher configuration. Unknown keys are rejected so a typo in YAML
/// fails at boot instead of silently falling back to a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    pub channels: ChannelConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscordConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// NAME of the env var holding the account token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Guild whose roles are pinged in the published summary.
    #[serde(default)]
    pub own_guild_id: Option<String>,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token_env: default_token_env(),
            own_guild_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    pub primary: PrimaryChannels,
    pub fallback: FallbackChannels,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrimaryChannels {
    pub seeds: String,
    pub gear: String,
    pub weather: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackChannels {
    pub seeds: String,
    pub gear: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    /// NAME of the env var holding the target webhook URL.
    #[serde(default = "default_webhook_url_env")]
    pub webhook_url_env: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            webhook_url_env: default_webhook_url_env(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_maintenance_interval_secs")]
    pub maintenance_interval_secs: u64,
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            maintenance_interval_secs: default_maintenance_interval_secs(),
            freshness_window_secs: default_freshness_window_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// IANA zone name used for weather wall-clock times and footer rendering.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}
fn default_token_env() -> String {
    "GSW_USER_TOKEN".to_string()
}
fn default_webhook_url_env() -> String {
    "GSW_TARGET_WEBHOOK_URL".to_string()
}
fn default_poll_interval_secs() -> u64 {
    30
}
fn default_maintenance_interval_secs() -> u64 {
    30 * 60
}
fn default_freshness_window_secs() -> u64 {
    5 * 60
}
fn default_cache_capacity() -> usize {
    100
}
fn default_state_path() -> String {
    "state.json".to_string()
}
fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

/// Upper bound for `schedule.freshness_window_secs` (one week).
pub const MAX_FRESHNESS_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

impl WatchConfig {
    /// Deserialize from a loaded (merged) config and validate.
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        Self::from_config_json(&loaded.config_json)
    }

    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let parsed: WatchConfig =
            serde_json::from_value(cfg.clone()).context("CONFIG_INVALID: watcher config")?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        let ids = [
            ("channels.primary.seeds", &self.channels.primary.seeds),
            ("channels.primary.gear", &self.channels.primary.gear),
            ("channels.primary.weather", &self.channels.primary.weather),
            ("channels.fallback.seeds", &self.channels.fallback.seeds),
            ("channels.fallback.gear", &self.channels.fallback.gear),
        ];
        for (key, id) in ids {
            if id.trim().is_empty() {
                bail!("CONFIG_INVALID: {key} must be a non-empty channel id");
            }
        }

        if self.schedule.poll_interval_secs == 0 {
            bail!("CONFIG_INVALID: schedule.poll_interval_secs must be > 0");
        }
        if self.schedule.maintenance_interval_secs == 0 {
            bail!("CONFIG_INVALID: schedule.maintenance_interval_secs must be > 0");
        }
        if self.schedule.freshness_window_secs > MAX_FRESHNESS_WINDOW_SECS {
            bail!(
                "CONFIG_INVALID: schedule.freshness_window_secs must be <= {MAX_FRESHNESS_WINDOW_SECS}"
            );
        }
        if self.resolver.cache_capacity == 0 {
            bail!("CONFIG_INVALID: resolver.cache_capacity must be > 0");
        }
        self.timezone()?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<chrono_tz::Tz> {
        self.display
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("CONFIG_INVALID: display.timezone: {e}"))
    }

    /// Own guild id, ignoring blank values.
    pub fn own_guild_id(&self) -> Option<&str> {
        self.discord
            .own_guild_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_urls_are_secrets_on_every_host_variant() {
        assert!(looks_like_secret("https://discord.com/api/webhooks/123/abc-def"));
        assert!(looks_like_secret("https://discordapp.com/api/webhooks/123/abc"));
        assert!(looks_like_secret("https://ptb.discord.com/api/v10/webhooks/1/x"));
        assert!(looks_like_secret("  HTTPS://Canary.Discord.com/api/webhooks/9/t  "));
        assert!(!looks_like_secret("https://discord.com/api/v10"));
    }

    #[test]
    fn token_shape_is_a_secret_but_ids_and_names_are_not() {
        assert!(looks_like_secret(
            "MTIzNDU2Nzg5MDEyMzQ1Njc4OQ.GhIjKl.abcdefghijklmnopqrstuvwxyz0123"
        ));
        assert!(looks_like_secret("mfa.abcdefghijklmnopqrstuvwxyz"));
        assert!(!looks_like_secret("1234567890123456789"));
        assert!(!looks_like_secret("GSW_USER_TOKEN"));
        assert!(!looks_like_secret("state.json"));
        assert!(!looks_like_secret("America/New_York"));
    }

    #[test]
    fn deep_merge_overrides_leaves_and_keeps_siblings() {
        let a = serde_json::json!({"a": {"x": 1, "y": 2}});
        let b = serde_json::json!({"a": {"y": 3}});
        assert_eq!(deep_merge(a, b), serde_json::json!({"a": {"x": 1, "y": 3}}));
    }

    #[test]
    fn leaf_pointers_escape_tokens() {
        let v = serde_json::json!({"a/b": {"c~d": 1}, "list": [true]});
        let mut out = Vec::new();
        collect_leaf_pointers(&v, "", &mut out);
        out.sort();
        assert_eq!(out, vec!["/a~1b/c~0d".to_string(), "/list/0".to_string()]);
    }
}
