//! Configuration types for the standings system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main standings configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingsConfig {
    /// Outcome source configuration
    pub source: OutcomeSourceConfig,

    /// Standings store configuration
    pub store: StoreConfig,

    /// Leagues this engine maintains standings for
    pub leagues: Vec<LeagueConfig>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl StandingsConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            source: OutcomeSourceConfig::default(),
            store: StoreConfig::default(),
            leagues: Vec::new(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.leagues.is_empty() {
            return Err(crate::Error::config("No leagues configured"));
        }

        let mut seen = std::collections::HashSet::new();
        for league in &self.leagues {
            if league.id.trim().is_empty() {
                return Err(crate::Error::config("League id cannot be empty"));
            }
            if !seen.insert(league.id.as_str()) {
                return Err(crate::Error::config(format!(
                    "Duplicate league id: {}",
                    league.id
                )));
            }
        }

        self.source.validate()?;

        Ok(())
    }
}

impl Default for StandingsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutcomeSourceConfig {
    /// JSON-lines result feed (one finalized match per line)
    Jsonl {
        /// Path to the feed file
        path: String,
        /// Poll interval for appended results, in seconds
        #[serde(default = "default_poll_interval_secs")]
        poll_interval_secs: u64,
    },

    /// Custom outcome source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl OutcomeSourceConfig {
    /// Validate the outcome source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            OutcomeSourceConfig::Jsonl {
                path,
                poll_interval_secs,
            } => {
                if path.is_empty() {
                    return Err(crate::Error::config("JSONL source path cannot be empty"));
                }
                if *poll_interval_secs == 0 {
                    return Err(crate::Error::config("JSONL poll interval must be > 0"));
                }
                Ok(())
            }
            OutcomeSourceConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom outcome source factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom outcome source config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the source type name
    pub fn type_name(&self) -> &str {
        match self {
            OutcomeSourceConfig::Jsonl { .. } => "jsonl",
            OutcomeSourceConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for OutcomeSourceConfig {
    fn default() -> Self {
        OutcomeSourceConfig::Jsonl {
            path: String::new(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

/// Standings store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// File-based standings store
    File {
        /// Path to the state file
        path: String,
    },

    /// In-memory standings store (not persistent)
    #[default]
    Memory,

    /// Custom standings store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

/// Per-league configuration
///
/// The configured league set doubles as the validation whitelist: outcomes
/// for a league that is absent or disabled here are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueConfig {
    /// Opaque league identifier, as supplied by the league-management collaborator
    pub id: String,

    /// Human-readable league name
    #[serde(default)]
    pub name: String,

    /// Whether ingestion is enabled for this league
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl LeagueConfig {
    /// Create a new league configuration
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            enabled: true,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enable or disable ingestion for the league
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of retry attempts for rebuilds that lose a version race
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay between rebuild retry attempts (in seconds)
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Capacity of the internal event channel
    ///
    /// When full, new engine events will be dropped (with a warning log).
    /// This prevents unbounded memory growth under high result churn.
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Additional metadata to attach to operations
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            metadata: HashMap::new(),
        }
    }
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> StandingsConfig {
        StandingsConfig {
            source: OutcomeSourceConfig::Jsonl {
                path: "/var/lib/standings/results.jsonl".to_string(),
                poll_interval_secs: 5,
            },
            store: StoreConfig::Memory,
            leagues: vec![LeagueConfig::new("premier-league")],
            engine: EngineConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn empty_league_set_is_rejected() {
        let mut config = base_config();
        config.leagues.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn duplicate_league_ids_are_rejected() {
        let mut config = base_config();
        config.leagues.push(LeagueConfig::new("premier-league"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn jsonl_source_requires_path() {
        let mut config = base_config();
        config.source = OutcomeSourceConfig::Jsonl {
            path: String::new(),
            poll_interval_secs: 5,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn league_builder_defaults() {
        let league = LeagueConfig::new("la-liga").with_name("La Liga");
        assert_eq!(league.id, "la-liga");
        assert_eq!(league.name, "La Liga");
        assert!(league.enabled);

        let disabled = LeagueConfig::new("serie-a").with_enabled(false);
        assert!(!disabled.enabled);
    }
}
