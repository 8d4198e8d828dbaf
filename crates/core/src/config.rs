use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).as_deref() {
        Some("true") | Some("1") | Some("yes") => true,
        Some("false") | Some("0") | Some("no") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub rules: RulesConfig,
    pub analysis: AnalysisConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SENSOR_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SENSOR_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            rules: RulesConfig::from_env_profiled(p),
            analysis: AnalysisConfig::from_env_profiled(p),
            storage: StorageConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  rules:     dir={}, watch={}", self.rules.dir.display(), self.rules.watch);
        tracing::info!("  analysis:  lock_prune_threshold={}", self.analysis.lock_prune_threshold);
        tracing::info!(
            "  storage:   events_file={}, attacks_file={}",
            self.storage.events_file.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "(none)".into()),
            self.storage.attacks_file.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "(stdout)".into()),
        );
    }
}

// ── Rules ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Directory holding detection point and system group YAML documents.
    pub dir: PathBuf,
    /// Reload policies when files under `dir` change.
    pub watch: bool,
}

impl RulesConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            dir: PathBuf::from(profiled_env_or(p, "RULES_DIR", "data/rules")),
            watch: profiled_env_bool(p, "RULES_WATCH", false),
        }
    }
}

// ── Analysis ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Idle per-group locks are pruned once the lock table grows past this.
    pub lock_prune_threshold: usize,
}

impl AnalysisConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            lock_prune_threshold: profiled_env_usize(p, "ANALYSIS_LOCK_PRUNE_THRESHOLD", 1024),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lock_prune_threshold: 1024,
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// NDJSON file of events to replay.
    pub events_file: Option<PathBuf>,
    /// NDJSON file confirmed attacks are written to.
    pub attacks_file: Option<PathBuf>,
    /// Capacity of the attack broadcast channel.
    pub attack_channel_capacity: usize,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            events_file: profiled_env_opt(p, "EVENTS_FILE").map(PathBuf::from),
            attacks_file: profiled_env_opt(p, "ATTACKS_FILE").map(PathBuf::from),
            attack_channel_capacity: profiled_env_usize(p, "ATTACK_CHANNEL_CAPACITY", 256),
        }
    }
}
