use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use folio_core::{PendingPolicy, RetryPolicy};
use folio_store::InMemoryStore;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub mutation: MutationConfig,
}

/// Settings for the in-memory store used by the CLI.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub latency_ms: u64,
    /// Reject a second like/follow row for the same pair.
    #[serde(default = "default_true")]
    pub unique_pairs: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { latency_ms: 0, unique_pairs: true }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MutationConfig {
    #[serde(default)]
    pub pending_policy: PendingPolicy,
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    /// The file at `path` if present, otherwise defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn config_path(root: &Path) -> PathBuf {
        root.join(".folio").join("folio.toml")
    }

    pub fn build_store(&self) -> InMemoryStore {
        let mut store = InMemoryStore::new().with_latency(Duration::from_millis(self.store.latency_ms));
        if self.store.unique_pairs {
            store = store
                .with_unique(crate::LIKES, &["user_id", "bite_id"])
                .with_unique(crate::FOLLOWS, &["follower_id", "following_id"]);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Delay;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = Config::config_path(dir.path());
        let mut cfg = Config::default();
        cfg.retry = RetryPolicy::exponential(5, Duration::from_millis(100), Duration::from_secs(2));
        cfg.mutation.pending_policy = PendingPolicy::RejectWhilePending;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let cfg: Config = toml::from_str("[store]\nlatency_ms = 25\n").unwrap();
        assert_eq!(cfg.store.latency_ms, 25);
        assert!(cfg.store.unique_pairs);
        assert_eq!(cfg.retry, RetryPolicy::default());
        assert_eq!(cfg.mutation.pending_policy, PendingPolicy::Allow);
    }

    #[test]
    fn parses_fixed_retry_table() {
        let cfg: Config =
            toml::from_str("[retry]\nmax_attempts = 4\n\n[retry.delay]\nstrategy = \"fixed\"\ndelay_ms = 250\n").unwrap();
        assert_eq!(cfg.retry.max_attempts, 4);
        assert_eq!(cfg.retry.delay, Delay::Fixed { delay_ms: 250 });
    }

    #[test]
    fn retry_section_without_delay_uses_default_delay() {
        let cfg: Config = toml::from_str("[retry]\nmax_attempts = 4\n").unwrap();
        assert_eq!(cfg.retry.max_attempts, 4);
        assert_eq!(cfg.retry.delay, Delay::Fixed { delay_ms: 1000 });
    }

    #[test]
    fn load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }
}
