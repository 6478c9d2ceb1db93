use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "taptap")
            .map(|proj_dirs| proj_dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("taptap_config.json"))
    }

    /// Where the log file goes; the terminal itself belongs to the game.
    pub fn log_path() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("taptap")
                .join("taptap.log")
        } else {
            ProjectDirs::from("", "", "taptap")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("taptap.log"))
                .unwrap_or_else(|| PathBuf::from("taptap.log"))
        }
    }
}
