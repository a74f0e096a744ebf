//! Fixed filesystem locations used by batch-users

use std::path::PathBuf;

/// System-wide configuration file, read only when present
pub const DEFAULT_CONFIG_PATH: &str = "/etc/batch-users/config.toml";

/// Presence of this file forces dry-run mode
pub const FORCE_DRY_RUN_PATH: &str = "/etc/batch-users/dryrun";

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_PATH)
}
