use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::FetchOptions;
use crate::strategy::Strategy;
use crate::targets::TargetSource;

/// Retry policy parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per target (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl RetryConfig {
    /// Rejects values that cannot become a backoff delay.
    pub fn validate(&self) -> Result<()> {
        let base = self.base_delay_secs;
        if !base.is_finite() || base < 0.0 || Duration::try_from_secs_f64(base).is_err() {
            anyhow::bail!("retry.base_delay_secs must be a finite, non-negative number of seconds (got {base})");
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.25,
            max_delay_secs: 10,
        }
    }
}

/// Global configuration loaded from `~/.config/fanfetch/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanfetchConfig {
    /// Strategy used when `--strategy` is not given.
    #[serde(default)]
    pub strategy: Strategy,
    /// Directory payloads are written to (None = current directory).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Targets used when none are given on the command line.
    /// None = built-in list; an empty list disables the fallback.
    #[serde(default)]
    pub default_targets: Option<Vec<String>>,
    /// Bound on units running at once (None = all targets at once).
    #[serde(default)]
    pub max_in_flight: Option<usize>,
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout per target.
    pub timeout_secs: u64,
    /// Optional retry policy; if missing, each target is tried once.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for FanfetchConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            output_dir: None,
            default_targets: None,
            max_in_flight: None,
            connect_timeout_secs: 30,
            timeout_secs: 300,
            retry: None,
        }
    }
}

impl FanfetchConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        Ok(())
    }

    pub fn target_source(&self) -> TargetSource {
        match &self.default_targets {
            Some(list) => TargetSource::with_defaults(list.clone()),
            None => TargetSource::builtin(),
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            ..FetchOptions::default()
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fanfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FanfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FanfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<FanfetchConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: FanfetchConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = FanfetchConfig::default();
        assert_eq!(cfg.strategy, Strategy::CooperativeConcurrent);
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert_eq!(cfg.timeout_secs, 300);
        assert!(cfg.default_targets.is_none());
        assert!(cfg.retry.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = FanfetchConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: FanfetchConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            strategy = "isolated-process"
            output_dir = "/srv/images"
            max_in_flight = 4
            connect_timeout_secs = 5
            timeout_secs = 60
            default_targets = ["https://example.com/a.jpg"]

            [retry]
            max_attempts = 4
            base_delay_secs = 0.5
            max_delay_secs = 15
        "#;
        let cfg: FanfetchConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.strategy, Strategy::IsolatedProcess);
        assert_eq!(cfg.output_dir.as_deref(), Some(Path::new("/srv/images")));
        assert_eq!(cfg.max_in_flight, Some(4));
        assert_eq!(cfg.fetch_options().connect_timeout, Duration::from_secs(5));
        assert_eq!(cfg.target_source().defaults(), ["https://example.com/a.jpg"]);
        let retry = cfg.retry.unwrap();
        assert_eq!(retry.max_attempts, 4);
        assert!((retry.base_delay_secs - 0.5).abs() < 1e-9);
    }

    #[test]
    fn config_unknown_strategy_is_rejected() {
        let toml = r#"
            strategy = "green-threads"
            connect_timeout_secs = 5
            timeout_secs = 60
        "#;
        assert!(toml::from_str::<FanfetchConfig>(toml).is_err());
    }

    #[test]
    fn empty_default_targets_disables_fallback() {
        let toml = r#"
            default_targets = []
            connect_timeout_secs = 5
            timeout_secs = 60
        "#;
        let cfg: FanfetchConfig = toml::from_str(toml).unwrap();
        assert!(cfg.target_source().defaults().is_empty());
    }

    #[test]
    fn infinite_retry_delay_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "connect_timeout_secs = 1\ntimeout_secs = 2\n\n[retry]\nmax_attempts = 3\nbase_delay_secs = inf\nmax_delay_secs = 10\n",
        )
        .unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("base_delay_secs"), "{err:#}");
    }

    #[test]
    fn negative_or_nan_retry_delay_is_rejected() {
        for bad in [-1.0, f64::NAN, 1e300] {
            let retry = RetryConfig {
                base_delay_secs: bad,
                ..RetryConfig::default()
            };
            assert!(retry.validate().is_err(), "{bad}");
        }
        assert!(RetryConfig::default().validate().is_ok());
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "connect_timeout_secs = 1\ntimeout_secs = 2\n").unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.timeout_secs, 2);
        assert_eq!(cfg.strategy, Strategy::CooperativeConcurrent);
    }
}
