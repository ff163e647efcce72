use directories::{BaseDirs, ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_NAME: &str = "mod_vault";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub version: u8,
    /// The WWMI folder holding SavedMods, Mods and the manifest.
    pub game_root: PathBuf,
    /// Where archives are picked up from.
    pub downloads: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        let game_root = BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("XXMI Launcher").join("WWMI"))
            .unwrap_or_else(|| PathBuf::from("."));

        let downloads = UserDirs::new()
            .and_then(|dirs| {
                dirs.download_dir()
                    .map(|d| d.to_path_buf())
                    .or_else(|| Some(dirs.home_dir().join("Downloads")))
            })
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            version: 0,
            game_root,
            downloads,
        }
    }
}

impl AppSettings {
    pub fn load() -> Result<AppSettings, confy::ConfyError> {
        confy::load(APP_NAME, None)
    }

    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, None, self)
    }

    /// Applies command-line overrides on top of the stored values.
    pub fn with_overrides(mut self, game_root: Option<PathBuf>, downloads: Option<PathBuf>) -> Self {
        if let Some(root) = game_root {
            self.game_root = root;
        }
        if let Some(dir) = downloads {
            self.downloads = dir;
        }
        self
    }
}

/// Directory for log files, next to the application's local data.
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "martes", APP_NAME)
        .map(|dirs| dirs.data_local_dir().join("logs"))
        .or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|exe_path| exe_path.parent().map(|p| p.join("logs")))
        })
        .unwrap_or_else(|| PathBuf::from("logs"))
}
