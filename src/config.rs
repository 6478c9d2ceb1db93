use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::error::TapError;
use crate::session::{
    SessionConfig, DEFAULT_BUTTON_COUNT, DEFAULT_GAME_DURATION_SECS,
    DEFAULT_PENALTY_PROBABILITY, DEFAULT_SPECIAL_PROBABILITY,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub button_count: usize,
    pub game_duration_secs: u32,
    pub special_probability: f64,
    pub penalty_probability: f64,
    pub tick_interval_ms: u64,
    pub sound: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            button_count: DEFAULT_BUTTON_COUNT,
            game_duration_secs: DEFAULT_GAME_DURATION_SECS,
            special_probability: DEFAULT_SPECIAL_PROBABILITY,
            penalty_probability: DEFAULT_PENALTY_PROBABILITY,
            tick_interval_ms: 1000,
            sound: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), TapError> {
        if self.button_count == 0 {
            return Err(TapError::NoButtons);
        }
        if self.game_duration_secs == 0 {
            return Err(TapError::ZeroDuration);
        }
        if self.tick_interval_ms == 0 {
            return Err(TapError::ZeroTickInterval);
        }
        for (name, value) in [
            ("special_probability", self.special_probability),
            ("penalty_probability", self.penalty_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TapError::ProbabilityOutOfRange { name, value });
            }
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            button_count: self.button_count,
            game_duration_secs: self.game_duration_secs,
            special_probability: self.special_probability,
            penalty_probability: self.penalty_probability,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), TapError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), TapError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            button_count: 8,
            game_duration_secs: 45,
            special_probability: 0.5,
            penalty_probability: 0.9,
            tick_interval_ms: 500,
            sound: false,
        };
        store.save(&cfg).unwrap();
        assert!(path.exists());
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nope.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "button_count": 3, "sound": false }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.button_count, 3);
        assert!(!cfg.sound);
        assert_eq!(cfg.game_duration_secs, DEFAULT_GAME_DURATION_SECS);
        assert_eq!(cfg.penalty_probability, DEFAULT_PENALTY_PROBABILITY);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let bad = |f: fn(&mut Config)| {
            let mut cfg = Config::default();
            f(&mut cfg);
            cfg.validate()
        };
        assert_matches!(bad(|c| c.button_count = 0), Err(TapError::NoButtons));
        assert_matches!(bad(|c| c.game_duration_secs = 0), Err(TapError::ZeroDuration));
        assert_matches!(bad(|c| c.tick_interval_ms = 0), Err(TapError::ZeroTickInterval));
        assert_matches!(
            bad(|c| c.special_probability = 1.5),
            Err(TapError::ProbabilityOutOfRange { name: "special_probability", .. })
        );
        assert_matches!(
            bad(|c| c.penalty_probability = -0.1),
            Err(TapError::ProbabilityOutOfRange { name: "penalty_probability", .. })
        );
        assert_matches!(
            bad(|c| c.penalty_probability = f64::NAN),
            Err(TapError::ProbabilityOutOfRange { .. })
        );
    }

    #[test]
    fn session_config_carries_game_fields() {
        let cfg = Config {
            button_count: 7,
            game_duration_secs: 30,
            special_probability: 0.1,
            penalty_probability: 0.4,
            ..Config::default()
        };
        let session = cfg.session_config();
        assert_eq!(session.button_count, 7);
        assert_eq!(session.game_duration_secs, 30);
        assert_eq!(session.special_probability, 0.1);
        assert_eq!(session.penalty_probability, 0.4);
        assert_eq!(cfg.tick_interval(), Duration::from_secs(1));
    }
}
