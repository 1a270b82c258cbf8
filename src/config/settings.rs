use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::error::ErrorClass;
use crate::util::paths::config_path;
use crate::util::tools::resolve_git;

/// Manifest file looked up in the target directory
pub const DEFAULT_MANIFEST_FILENAME: &str = "go.mod";
/// Reserved sibling file holding the pre-strip manifest
pub const DEFAULT_BACKUP_FILENAME: &str = "go.mod.b";
/// Comment tag identifying the lines this tool owns inside git hooks
pub const DEFAULT_HOOK_TAG: &str = "AUTO-GENERATED by modstrip";
/// Command the installed hooks invoke
pub const DEFAULT_BASE_COMMAND: &str = "modstrip";
/// First line of hook scripts created from scratch
pub const DEFAULT_HOOK_SHEBANG: &str = "#!/bin/sh";

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ConfigError::NotFound(_) => ErrorClass::Precondition,
            ConfigError::Read { .. } => ErrorClass::Transport,
            ConfigError::Parse { .. } => ErrorClass::Validation,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Dependency manifest file name
    pub manifest_filename: String,
    /// Backup file name, created next to the manifest
    pub backup_filename: String,
    /// Comment tag of the managed hook lines
    pub hook_tag: String,
    /// Command written into the hooks unless overridden on the command line
    pub base_command: String,
    /// Shebang for newly created hook scripts
    pub hook_shebang: String,
    /// Explicit git binary; looked up on PATH when unset
    pub git_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_filename: DEFAULT_MANIFEST_FILENAME.to_string(),
            backup_filename: DEFAULT_BACKUP_FILENAME.to_string(),
            hook_tag: DEFAULT_HOOK_TAG.to_string(),
            base_command: DEFAULT_BASE_COMMAND.to_string(),
            hook_shebang: DEFAULT_HOOK_SHEBANG.to_string(),
            git_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlReplaceConfig {
    pub manifest: Option<String>,
    pub backup: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlHooksConfig {
    pub tag: Option<String>,
    pub base_command: Option<String>,
    pub shebang: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlToolsConfig {
    pub git: Option<PathBuf>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub replace: Option<TomlReplaceConfig>,
    pub hooks: Option<TomlHooksConfig>,
    pub tools: Option<TomlToolsConfig>,
}

impl Config {
    /// Load configuration, merging the file over the defaults.
    ///
    /// An explicit `path` must exist. Without one, the per-user config file is
    /// used when present and the defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_file = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                path.to_path_buf()
            }
            None => match config_path() {
                Some(default) if default.exists() => default,
                _ => {
                    tracing::debug!("No config file, using defaults");
                    return Ok(Config::default());
                }
            },
        };

        let contents = fs::read_to_string(&config_file).map_err(|source| ConfigError::Read {
            path: config_file.clone(),
            source,
        })?;

        let config = Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_file.clone(),
            source,
        })?;
        tracing::debug!(path = %config_file.display(), "Loaded config file");

        Ok(config)
    }

    /// Parse TOML contents and merge them over the defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let toml_config: TomlConfig = toml::from_str(contents)?;
        let mut config = Config::default();

        if let Some(replace) = toml_config.replace {
            if let Some(manifest) = replace.manifest {
                config.manifest_filename = manifest;
            }
            if let Some(backup) = replace.backup {
                config.backup_filename = backup;
            }
        }

        if let Some(hooks) = toml_config.hooks {
            if let Some(tag) = hooks.tag {
                config.hook_tag = tag;
            }
            if let Some(base_command) = hooks.base_command {
                config.base_command = base_command;
            }
            if let Some(shebang) = hooks.shebang {
                config.hook_shebang = shebang;
            }
        }

        if let Some(tools) = toml_config.tools {
            config.git_path = tools.git;
        }

        Ok(config)
    }

    /// Git binary to run: the configured one, else whatever is on PATH
    pub fn git_binary(&self) -> PathBuf {
        resolve_git(self.git_path.as_deref())
    }
}
