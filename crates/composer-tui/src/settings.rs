use std::io;
use std::path::{Path, PathBuf};

use composer::ComposerConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const SETTINGS_DIR: &str = "mention-composer";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A named skill offered in the mention popup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SkillSetting {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// User settings of the terminal composer.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub placeholder: String,
    /// Repository name written into file and folder mention ids.
    pub repository: String,
    pub skills: Vec<SkillSetting>,
    pub composer: ComposerConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            placeholder: "Ask anything, @ to mention, / for commands".to_string(),
            repository: "local".to_string(),
            skills: Vec::new(),
            composer: ComposerConfig::default(),
        }
    }
}

impl Settings {
    /// Reads settings from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`Self::load`], but falls back to the defaults with a warning.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|error| {
            warn!(%error, "using default settings");

            Self::default()
        })
    }
}

/// Returns `<config dir>/mention-composer/settings.json`, if the platform
/// has a config directory.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
}
