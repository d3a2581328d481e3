// src/config/checker.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::checker::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT};
use crate::probe::DEFAULT_USER_AGENT;

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/feedcheck.toml";
pub const DEFAULT_CATALOG_DIR: &str = "opinionated";

pub const ENV_CONFIG_PATH: &str = "FEEDCHECK_CONFIG_PATH";
pub const ENV_CATALOG_DIR: &str = "FEEDCHECK_CATALOG_DIR";
pub const ENV_CONCURRENCY: &str = "FEEDCHECK_CONCURRENCY";
pub const ENV_TIMEOUT_SECS: &str = "FEEDCHECK_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "FEEDCHECK_USER_AGENT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Directory holding the `*.json` catalog documents.
    pub catalog_dir: PathBuf,
    /// Maximum probes in flight.
    pub concurrency: usize,
    /// Per-probe bound on connect + response.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            catalog_dir: PathBuf::from(DEFAULT_CATALOG_DIR),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CheckerConfig {
    /// Read a TOML file; missing keys keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading checker config from {}", path.display()))?;
        let mut cfg: CheckerConfig = toml::from_str(&data)
            .with_context(|| format!("parsing checker config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Resolve config the way the binary does:
    /// 1) $FEEDCHECK_CONFIG_PATH (must exist)
    /// 2) config/feedcheck.toml if present
    /// 3) built-in defaults
    ///
    /// then apply `FEEDCHECK_*` env overrides on top.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        cfg.apply_overrides(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Apply `FEEDCHECK_*` overrides from `lookup`. Unparsable numbers are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_CATALOG_DIR).filter(|s| !s.trim().is_empty()) {
            self.catalog_dir = PathBuf::from(dir.trim());
        }
        if let Some(n) = parse_env_number::<usize>(ENV_CONCURRENCY, lookup(ENV_CONCURRENCY)) {
            self.concurrency = n;
        }
        if let Some(n) = parse_env_number::<u64>(ENV_TIMEOUT_SECS, lookup(ENV_TIMEOUT_SECS)) {
            self.timeout_secs = n;
        }
        if let Some(ua) = lookup(ENV_USER_AGENT) {
            self.user_agent = ua;
        }
        self.sanitize();
    }

    /// Clamp values into a usable range.
    pub fn sanitize(&mut self) {
        if self.concurrency == 0 {
            self.concurrency = 1;
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = DEFAULT_TIMEOUT.as_secs();
        }
        let ua = self.user_agent.trim();
        self.user_agent = if ua.is_empty() {
            DEFAULT_USER_AGENT.to_string()
        } else {
            ua.to_string()
        };
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_env_number<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable config override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_reference_behaviour() {
        let cfg = CheckerConfig::default();
        assert_eq!(cfg.concurrency, 20);
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.user_agent, "Mozilla/5.0 RSS Bot");
    }

    #[test]
    fn overrides_apply_and_bad_numbers_are_ignored() {
        let env: HashMap<&str, &str> = [
            (ENV_CATALOG_DIR, " feeds "),
            (ENV_CONCURRENCY, "oops"),
            (ENV_TIMEOUT_SECS, "3"),
            (ENV_USER_AGENT, "   "),
        ]
        .into_iter()
        .collect();

        let mut cfg = CheckerConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.catalog_dir, PathBuf::from("feeds"));
        assert_eq!(cfg.concurrency, 20);
        assert_eq!(cfg.timeout_secs, 3);
        assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn sanitize_clamps_zeroes() {
        let mut cfg = CheckerConfig {
            concurrency: 0,
            timeout_secs: 0,
            ..CheckerConfig::default()
        };
        cfg.sanitize();
        assert_eq!(cfg.concurrency, 1);
        assert_eq!(cfg.timeout_secs, 10);
    }
}
