use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per store call (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    /// Converts the config section into the core retry policy.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/rmu/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RmuConfig {
    /// Stdout progress granularity: one tick per this many bytes.
    pub progress_step_bytes: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Root of the local object-store backend (None = XDG data dir).
    #[serde(default)]
    pub store_root: Option<PathBuf>,
}

impl Default for RmuConfig {
    fn default() -> Self {
        Self {
            progress_step_bytes: 1024 * 1024,
            retry: None,
            store_root: None,
        }
    }
}

impl RmuConfig {
    /// Effective retry policy: the `[retry]` section or built-in defaults.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone().unwrap_or_default().policy()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rmu")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Default root for the local store backend: `~/.local/share/rmu/store`.
pub fn default_store_root() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rmu")?;
    Ok(xdg_dirs.get_data_home().join("store"))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RmuConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RmuConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: RmuConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = RmuConfig::default();
        assert_eq!(cfg.progress_step_bytes, 1024 * 1024);
        assert!(cfg.retry.is_none());
        assert!(cfg.store_root.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = RmuConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: RmuConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.progress_step_bytes, cfg.progress_step_bytes);
        assert!(parsed.retry.is_none());
    }

    #[test]
    fn config_toml_retry_section() {
        let toml = r#"
            progress_step_bytes = 65536
            store_root = "/tmp/rmu-store"

            [retry]
            max_attempts = 3
            base_delay_secs = 0.5
            max_delay_secs = 15
        "#;
        let cfg: RmuConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.progress_step_bytes, 65536);
        assert_eq!(cfg.store_root.as_deref(), Some(std::path::Path::new("/tmp/rmu-store")));
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, 3);
        assert!((retry.base_delay_secs - 0.5).abs() < 1e-9);
        assert_eq!(retry.max_delay_secs, 15);
    }

    #[test]
    fn retry_policy_conversion() {
        let cfg = RmuConfig {
            retry: Some(RetryConfig {
                max_attempts: 2,
                base_delay_secs: 0.1,
                max_delay_secs: 1,
            }),
            ..RmuConfig::default()
        };
        let policy = cfg.retry_policy();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.base_delay, Duration::from_millis(100));
        assert_eq!(policy.max_delay, Duration::from_secs(1));
    }
}
