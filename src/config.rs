use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_POSITION_TRANSITION_MS: u64 = 500;
pub const DEFAULT_MOVE_HISTORY_LIMIT: usize = 20;
pub const DEFAULT_COMPLETION_TIMEOUT_MS: u64 = 30_000;

/// Tunables for the turn engine, loadable from a RON file.
///
/// ```ron
/// EngineConfig(
///     position_transition_ms: 500,
///     move_history_limit: 20,
///     completion_timeout_ms: Some(30000),
///     rng_seed: Some(7),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Duration of the field position tween awaited by the position manager.
    pub position_transition_ms: u64,
    /// Maximum number of entries kept per move history; oldest are trimmed.
    pub move_history_limit: usize,
    /// How long a phase may wait on a completion before the turn is declared
    /// stalled. `None` waits forever.
    pub completion_timeout_ms: Option<u64>,
    /// Seed for the turn RNG; entropy is used when absent.
    pub rng_seed: Option<u64>,
    /// Resolve presentation cues immediately instead of sleeping for them.
    pub instant_presentation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            position_transition_ms: DEFAULT_POSITION_TRANSITION_MS,
            move_history_limit: DEFAULT_MOVE_HISTORY_LIMIT,
            completion_timeout_ms: Some(DEFAULT_COMPLETION_TIMEOUT_MS),
            rng_seed: None,
            instant_presentation: true,
        }
    }
}

impl EngineConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.move_history_limit == 0 {
            return Err(ConfigError::Invalid(
                "move_history_limit must be at least 1".to_string(),
            ));
        }
        if self.completion_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "completion_timeout_ms must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn position_transition(&self) -> Duration {
        Duration::from_millis(self.position_transition_ms)
    }

    pub fn completion_timeout(&self) -> Option<Duration> {
        self.completion_timeout_ms.map(Duration::from_millis)
    }
}
