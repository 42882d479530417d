//! Runner configuration with TOML file support.

use std::path::{Path, PathBuf};

use agora_utils::LogFormat;
use agora_voting::VotingParams;
use serde::{Deserialize, Serialize};

use crate::error::DaemonError;

/// Which clock stamps incoming commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    /// Wall-clock Unix seconds.
    #[default]
    System,
    /// Starts at zero and only moves on `advance` commands.
    Simulated,
}

/// Configuration for the Agora runner.
///
/// Can be loaded from a TOML file via [`DaemonConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// File the registry is restored from at start and saved to at exit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,

    /// Clock used to stamp commands.
    #[serde(default)]
    pub clock: ClockMode,

    /// Session time windows.
    #[serde(default)]
    pub params: VotingParams,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, DaemonError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DaemonError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, DaemonError> {
        toml::from_str(s).map_err(|e| DaemonError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, DaemonError> {
        toml::to_string_pretty(self).map_err(|e| DaemonError::Config(e.to_string()))
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            state_file: None,
            clock: ClockMode::default(),
            params: VotingParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = DaemonConfig::default();
        let toml_str = config.to_toml_string().expect("serializable");
        let parsed = DaemonConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.params, config.params);
        assert_eq!(parsed.log_level, config.log_level);
        assert_eq!(parsed.clock, ClockMode::System);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.params, VotingParams::default());
        assert_eq!(config.params.registration_window_secs, 121);
        assert_eq!(config.log_format, LogFormat::Human);
        assert!(config.state_file.is_none());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            clock = "simulated"
            log_format = "json"

            [params]
            voting_duration_secs = 3600
        "#;
        let config = DaemonConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.clock, ClockMode::Simulated);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.params.voting_duration_secs, 3600);
        assert_eq!(config.params.registration_window_secs, 121); // default
    }

    #[test]
    fn reads_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "state_file = \"/tmp/agora.state\"").unwrap();
        let config = DaemonConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.state_file, Some(PathBuf::from("/tmp/agora.state")));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = DaemonConfig::from_toml_file(Path::new("/nonexistent/agora.toml"));
        assert!(matches!(result, Err(DaemonError::Config(_))));
    }

    #[test]
    fn unknown_clock_rejected() {
        assert!(DaemonConfig::from_toml_str("clock = \"sundial\"").is_err());
    }
}
