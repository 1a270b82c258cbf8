mod settings;

pub use settings::{
    Config, ConfigError, DEFAULT_BACKUP_FILENAME, DEFAULT_BASE_COMMAND, DEFAULT_HOOK_SHEBANG,
    DEFAULT_HOOK_TAG, DEFAULT_MANIFEST_FILENAME, EXAMPLE_CONFIG,
};
