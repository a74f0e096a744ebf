//! Provisioning configuration
//!
//! Every field has a serde default, so an absent file and an empty file both
//! yield the stock setup: bash shell, `staff` group, RStudio preference file and
//! an optional shiny-server group.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed contents of the per-user preference file
pub const USER_SETTINGS_CONTENTS: &str = "alwaysSaveHistory='0'\nloadRData='0'\nsaveAction='0'\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Login shell for new accounts
    #[serde(default = "ProvisionConfig::default_shell")]
    pub shell: String,
    /// Secondary group every new account joins
    #[serde(default = "ProvisionConfig::default_group")]
    pub group: String,
    /// Preference directory, relative to the home directory
    #[serde(default = "ProvisionConfig::default_settings_dir")]
    pub settings_dir: PathBuf,
    #[serde(default = "ProvisionConfig::default_settings_file")]
    pub settings_file: String,
    /// Octal mode applied to the home directory after ownership is fixed
    #[serde(default = "ProvisionConfig::default_home_mode")]
    pub home_mode: String,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

/// Optional web-serving daemon whose group new and existing users join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "DaemonConfig::default_binary")]
    pub binary: PathBuf,
    #[serde(default = "DaemonConfig::default_group")]
    pub group: String,
}

impl ProvisionConfig {
    fn default_shell() -> String {
        "/bin/bash".to_string()
    }

    fn default_group() -> String {
        "staff".to_string()
    }

    fn default_settings_dir() -> PathBuf {
        PathBuf::from(".rstudio/monitored/user-settings")
    }

    fn default_settings_file() -> String {
        "user-settings".to_string()
    }

    fn default_home_mode() -> String {
        "700".to_string()
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("parsing config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serializing config")
    }

    fn validate(&self) -> Result<()> {
        self.home_mode_bits()?;
        if self.shell.trim().is_empty() {
            anyhow::bail!("shell must not be empty");
        }
        if self.group.trim().is_empty() {
            anyhow::bail!("group must not be empty");
        }
        if self.settings_dir.is_absolute() {
            anyhow::bail!(
                "settings_dir must be relative to the home directory, got {}",
                self.settings_dir.display()
            );
        }
        Ok(())
    }

    /// Parsed permission bits of `home_mode`
    pub fn home_mode_bits(&self) -> Result<u32> {
        let mode = u32::from_str_radix(self.home_mode.trim_start_matches("0o"), 8)
            .with_context(|| format!("home_mode '{}' is not an octal mode", self.home_mode))?;
        if mode > 0o7777 {
            anyhow::bail!("home_mode '{}' is out of range", self.home_mode);
        }
        Ok(mode)
    }

    /// Directory holding the preference file for a given home
    pub fn settings_dir_in(&self, home: &Path) -> PathBuf {
        home.join(&self.settings_dir)
    }
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            shell: Self::default_shell(),
            group: Self::default_group(),
            settings_dir: Self::default_settings_dir(),
            settings_file: Self::default_settings_file(),
            home_mode: Self::default_home_mode(),
            daemon: DaemonConfig::default(),
        }
    }
}

impl DaemonConfig {
    fn default_binary() -> PathBuf {
        PathBuf::from("/usr/bin/shiny-server")
    }

    fn default_group() -> String {
        "shiny".to_string()
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            binary: Self::default_binary(),
            group: Self::default_group(),
        }
    }
}
