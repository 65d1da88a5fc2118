//! Layered configuration (§10.3): defaults, then an optional TOML file,
//! then process environment overrides. Environment wins on conflict,
//! mirroring the teacher's `load_and_apply` precedence.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
}

/// Construction-time agent configuration. Defaults are the all-`None`/
/// all-default struct; a TOML file layers over that; environment
/// variables (`REAGENT_<FIELD>`) layer over the file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AgentConfig {
    pub agent_name: Option<String>,
    #[serde(default)]
    pub check_running: Option<bool>,
    pub session_backend: Option<String>,
    pub long_term_memory_mode: Option<String>,
}

impl AgentConfig {
    /// Loads defaults, merges an optional TOML file at `path` (ignored if
    /// absent), then applies `REAGENT_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = path {
            if path.exists() {
                let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                let from_file: AgentConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
                config.merge(from_file);
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    fn merge(&mut self, other: Self) {
        if other.agent_name.is_some() {
            self.agent_name = other.agent_name;
        }
        if other.check_running.is_some() {
            self.check_running = other.check_running;
        }
        if other.session_backend.is_some() {
            self.session_backend = other.session_backend;
        }
        if other.long_term_memory_mode.is_some() {
            self.long_term_memory_mode = other.long_term_memory_mode;
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("REAGENT_AGENT_NAME") {
            self.agent_name = Some(v);
        }
        if let Ok(v) = std::env::var("REAGENT_CHECK_RUNNING") {
            self.check_running = v.parse().ok();
        }
        if let Ok(v) = std::env::var("REAGENT_SESSION_BACKEND") {
            self.session_backend = Some(v);
        }
        if let Ok(v) = std::env::var("REAGENT_LONG_TERM_MEMORY_MODE") {
            self.long_term_memory_mode = Some(v);
        }
    }
}

impl AgentConfig {
    /// Parses `long_term_memory_mode` into the enum a caller passes to
    /// [`crate::react::AgentOptions::long_term_memory`] alongside its own
    /// backend instance — config can only name a mode, since it has no way
    /// to construct a concrete [`crate::longterm::LongTermMemory`] impl
    /// itself (§6 is a consumed interface). `None` if unset; `Some(Err(_))`
    /// if set to something unrecognized.
    pub fn long_term_memory_mode_parsed(&self) -> Option<Result<crate::longterm::LongTermMemoryMode, String>> {
        self.long_term_memory_mode.as_deref().map(str::parse)
    }
}

/// Locates the user's config directory per the XDG-ish convention the
/// teacher's `config` crate uses: `$XDG_CONFIG_HOME/<app_name>/config.toml`
/// or `~/.config/<app_name>/config.toml`.
pub fn default_config_path(app_name: &str) -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|dir| dir.join(app_name).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variable tests must not run concurrently with each
    // other in the same process.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn env_override_wins_over_file_value() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("REAGENT_AGENT_NAME", "from-env");
        let mut config = AgentConfig {
            agent_name: Some("from-file".into()),
            ..Default::default()
        };
        config.apply_env_overrides();
        assert_eq!(config.agent_name.as_deref(), Some("from-env"));
        std::env::remove_var("REAGENT_AGENT_NAME");
    }

    #[test]
    fn missing_config_file_is_not_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        let config = AgentConfig::load(Some(Path::new("/nonexistent/config.toml"))).unwrap();
        assert!(config.agent_name.is_none());
    }

    #[test]
    fn long_term_memory_mode_parsed_is_none_when_unset() {
        let config = AgentConfig::default();
        assert!(config.long_term_memory_mode_parsed().is_none());
    }

    #[test]
    fn long_term_memory_mode_parsed_rejects_unknown_values() {
        let config = AgentConfig {
            long_term_memory_mode: Some("sometimes".into()),
            ..Default::default()
        };
        assert!(config.long_term_memory_mode_parsed().unwrap().is_err());
    }

    #[test]
    fn long_term_memory_mode_parsed_accepts_known_values() {
        use crate::longterm::LongTermMemoryMode;

        let config = AgentConfig {
            long_term_memory_mode: Some("BOTH".into()),
            ..Default::default()
        };
        assert_eq!(config.long_term_memory_mode_parsed().unwrap().unwrap(), LongTermMemoryMode::Both);
    }
}
