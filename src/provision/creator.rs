use anyhow::{Context, Result};

use crate::common::config::{ProvisionConfig, USER_SETTINGS_CONTENTS};
use crate::ui::prelude::*;

use super::backend::{AccountBackend, CreateError};
use super::batch::AccountSpec;

/// What happened to a single account
#[derive(Debug)]
pub enum AccountOutcome {
    Created,
    Existing,
    CreateFailed(CreateError),
}

/// Creates one account and applies the fixed post-creation setup
pub struct AccountCreator<'a, B: AccountBackend> {
    backend: &'a B,
    config: &'a ProvisionConfig,
}

impl<'a, B: AccountBackend> AccountCreator<'a, B> {
    pub fn new(backend: &'a B, config: &'a ProvisionConfig) -> Self {
        Self { backend, config }
    }

    /// Create or skip one account.
    ///
    /// The closing "Done with user" line is logged even when a step fails.
    pub fn create(&self, spec: &AccountSpec) -> Result<AccountOutcome> {
        let result = self.provision(spec);
        let level = if result.is_ok() {
            Level::Success
        } else {
            Level::Info
        };
        emit(
            level,
            "account.done",
            &format!("Done with user {}", spec.username),
            None,
        );
        result
    }

    fn provision(&self, spec: &AccountSpec) -> Result<AccountOutcome> {
        let username = spec.username.as_str();

        let outcome = if self.backend.user_exists(username)? {
            emit(
                Level::Info,
                "account.exists",
                &format!("User {} already exists, nothing to do", username),
                None,
            );
            AccountOutcome::Existing
        } else {
            self.create_new(spec)?
        };

        // A failed creation leaves no account to add to the daemon group
        if !matches!(outcome, AccountOutcome::CreateFailed(_)) {
            self.join_daemon_group(username)?;
        }

        Ok(outcome)
    }

    fn create_new(&self, spec: &AccountSpec) -> Result<AccountOutcome> {
        let username = spec.username.as_str();
        emit(
            Level::Info,
            "account.create",
            &format!("Creating user {}", username),
            None,
        );

        if let Err(err) = self.backend.create_user(username, &self.config.shell) {
            emit(
                Level::Error,
                "account.create_failed",
                &format!("Failed to create user {}: {}", username, err),
                None,
            );
            return Ok(AccountOutcome::CreateFailed(err));
        }

        if !spec.has_password() {
            emit(
                Level::Info,
                "account.password_default",
                &format!("No password given for {}, defaulting to the username", username),
                None,
            );
        }
        self.backend
            .set_password(username, spec.effective_password())?;

        self.backend.add_to_group(username, &self.config.group)?;
        emit(
            Level::Debug,
            "account.group",
            &format!("Added {} to group {}", username, self.config.group),
            None,
        );

        let home = self.backend.home_dir(username)?;
        self.backend
            .write_file(
                &self.config.settings_dir_in(&home),
                &self.config.settings_file,
                USER_SETTINGS_CONTENTS,
            )
            .with_context(|| format!("writing preferences for {}", username))?;

        // Ownership first, then the restrictive mode on the home itself
        self.backend.chown_recursive(&home, username, username)?;
        self.backend.set_mode(&home, self.config.home_mode_bits()?)?;

        Ok(AccountOutcome::Created)
    }

    fn join_daemon_group(&self, username: &str) -> Result<()> {
        let daemon = &self.config.daemon;
        if !self.backend.is_executable(&daemon.binary) {
            return Ok(());
        }

        emit(
            Level::Info,
            "account.daemon_group",
            &format!("Adding {} to group {}", username, daemon.group),
            None,
        );
        self.backend.add_to_group(username, &daemon.group)
    }
}
