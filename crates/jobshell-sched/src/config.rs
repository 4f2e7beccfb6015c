//! Adaptor configuration.
//!
//! Configuration comes from a YAML or JSON document (by default
//! `~/.jobshell/config.yaml`), with environment overrides:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `JOBSHELL_BASE_DIR` | `base_dir` |
//! | `JOBSHELL_POLL_INTERVAL_MS` | `poll_interval_ms` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use jobshell_pty::SecurityContext;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SchedError, SchedResult};

/// Environment variable overriding the remote scratch directory.
pub const BASE_DIR_ENV: &str = "JOBSHELL_BASE_DIR";

/// Environment variable overriding the poll interval.
pub const POLL_INTERVAL_ENV: &str = "JOBSHELL_POLL_INTERVAL_MS";

const DEFAULT_BASE_DIR: &str = "$HOME/.jobshell";
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Configuration of one job adaptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdaptorConfig {
    /// Resource-manager URL, e.g. `slurm+ssh://login.cluster.org`.
    pub url: String,

    /// Security contexts offered to the shell.
    #[serde(default)]
    pub contexts: Vec<SecurityContext>,

    /// Remote scratch directory for generated scripts. Shell variables expand.
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// Interval between state polls while waiting, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_base_dir() -> String {
    DEFAULT_BASE_DIR.to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl AdaptorConfig {
    /// Configuration for `url` with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            contexts: Vec::new(),
            base_dir: default_base_dir(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    pub fn with_context(mut self, context: SecurityContext) -> Self {
        self.contexts.push(context);
        self
    }

    pub fn with_base_dir(mut self, dir: impl Into<String>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// Interval between state polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Default config file location: `~/.jobshell/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".jobshell").join("config.yaml"))
    }

    pub fn from_yaml_str(yaml: &str) -> SchedResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> SchedResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file; `.json` files are read as JSON, anything else as YAML.
    pub fn from_file(path: &Path) -> SchedResult<Self> {
        debug!("Loading adaptor config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> SchedResult<()> {
        self.apply_env_overrides_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`.
    pub fn apply_env_overrides_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> SchedResult<()> {
        if let Some(dir) = lookup(BASE_DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
            self.base_dir = dir;
        }
        if let Some(interval) = lookup(POLL_INTERVAL_ENV) {
            self.poll_interval_ms = interval.trim().parse().map_err(|_| {
                SchedError::Configuration(format!(
                    "{POLL_INTERVAL_ENV} must be a number of milliseconds, got '{interval}'"
                ))
            })?;
        }
        self.validate()
    }

    /// Check the settings for obvious mistakes.
    pub fn validate(&self) -> SchedResult<()> {
        if self.url.trim().is_empty() {
            return Err(SchedError::Configuration("url must not be empty".to_string()));
        }
        if self.base_dir.trim().is_empty() {
            return Err(SchedError::Configuration(
                "base_dir must not be empty".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(SchedError::Configuration(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AdaptorConfig::new("slurm://localhost");
        assert_eq!(config.base_dir, "$HOME/.jobshell");
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert!(config.contexts.is_empty());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
url: slurm+ssh://login.cluster.org
base_dir: /scratch/alice/.jobs
contexts:
  - type: ssh
    user_id: alice
    user_key: /home/alice/.ssh/id_ed25519
"#;
        let config = AdaptorConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.url, "slurm+ssh://login.cluster.org");
        assert_eq!(config.base_dir, "/scratch/alice/.jobs");
        assert_eq!(config.poll_interval_ms, 500);
        assert!(matches!(
            config.contexts.as_slice(),
            [SecurityContext::Ssh { user_id: Some(user), .. }] if user == "alice"
        ));
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        let json = r#"{"url": "pbs://localhost", "polling": 10}"#;
        assert!(matches!(
            AdaptorConfig::from_json_str(json),
            Err(SchedError::Json(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"url": "pbs+ssh://head", "poll_interval_ms": 2000}}"#).unwrap();

        let config = AdaptorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.url, "pbs+ssh://head");
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AdaptorConfig::new("slurm://localhost");
        config
            .apply_env_overrides_with(|key| match key {
                BASE_DIR_ENV => Some("/tmp/jobs".to_string()),
                POLL_INTERVAL_ENV => Some("250".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.base_dir, "/tmp/jobs");
        assert_eq!(config.poll_interval_ms, 250);
    }

    #[test]
    fn test_invalid_env_override() {
        let mut config = AdaptorConfig::new("slurm://localhost");
        let result = config.apply_env_overrides_with(|key| {
            (key == POLL_INTERVAL_ENV).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(SchedError::Configuration(_))));

        let result = config.apply_env_overrides_with(|key| {
            (key == POLL_INTERVAL_ENV).then(|| "0".to_string())
        });
        assert!(matches!(result, Err(SchedError::Configuration(_))));
    }
}
