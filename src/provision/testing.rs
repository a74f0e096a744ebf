//! In-memory account backend for provisioning tests

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::backend::{AccountBackend, CreateError};

/// A mutating call seen by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateUser(String, String),
    /// The `user:password` line fed to the password facility
    SetPassword(String),
    AddToGroup(String, String),
    WriteFile(PathBuf, String),
    Chown(PathBuf, String),
    SetMode(PathBuf, u32),
}

#[derive(Default)]
pub struct RecordingBackend {
    users: RefCell<BTreeMap<String, Option<String>>>,
    calls: RefCell<Vec<Call>>,
    rejected: BTreeMap<String, Option<i32>>,
    daemon_installed: bool,
    fail_passwords: bool,
}

impl RecordingBackend {
    pub fn with_users(names: &[&str]) -> Self {
        let backend = Self::default();
        {
            let mut users = backend.users.borrow_mut();
            for name in names {
                users.insert(name.to_string(), None);
            }
        }
        backend
    }

    /// Make `useradd` exit with `code` for this name
    pub fn rejecting(mut self, username: &str, code: Option<i32>) -> Self {
        self.rejected.insert(username.to_string(), code);
        self
    }

    pub fn with_daemon(mut self) -> Self {
        self.daemon_installed = true;
        self
    }

    pub fn failing_passwords(mut self) -> Self {
        self.fail_passwords = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn password_of(&self, username: &str) -> Option<String> {
        self.users.borrow().get(username).cloned().flatten()
    }

    pub fn created_users(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::CreateUser(name, _) if !self.rejected.contains_key(name) => {
                    Some(name.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn group_calls(&self) -> Vec<(String, String)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::AddToGroup(user, group) => Some((user.clone(), group.clone())),
                _ => None,
            })
            .collect()
    }

    /// Distinct groups a user was added to
    pub fn groups_of(&self, username: &str) -> BTreeSet<String> {
        self.group_calls()
            .into_iter()
            .filter(|(user, _)| user == username)
            .map(|(_, group)| group)
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl AccountBackend for RecordingBackend {
    fn user_exists(&self, username: &str) -> Result<bool> {
        Ok(self.users.borrow().contains_key(username))
    }

    fn create_user(&self, username: &str, shell: &str) -> Result<(), CreateError> {
        self.record(Call::CreateUser(username.to_string(), shell.to_string()));
        if let Some(code) = self.rejected.get(username) {
            return Err(CreateError::from_exit_code(username, *code));
        }
        self.users.borrow_mut().insert(username.to_string(), None);
        Ok(())
    }

    fn home_dir(&self, username: &str) -> Result<PathBuf> {
        Ok(Path::new("/home").join(username))
    }

    fn set_password(&self, username: &str, password: &str) -> Result<()> {
        if self.fail_passwords {
            anyhow::bail!("chpasswd failed for {}", username);
        }
        self.record(Call::SetPassword(format!("{}:{}", username, password)));
        self.users
            .borrow_mut()
            .insert(username.to_string(), Some(password.to_string()));
        Ok(())
    }

    fn add_to_group(&self, username: &str, group: &str) -> Result<()> {
        self.record(Call::AddToGroup(username.to_string(), group.to_string()));
        Ok(())
    }

    fn write_file(&self, dir: &Path, file_name: &str, contents: &str) -> Result<()> {
        self.record(Call::WriteFile(dir.join(file_name), contents.to_string()));
        Ok(())
    }

    fn chown_recursive(&self, path: &Path, owner: &str, group: &str) -> Result<()> {
        self.record(Call::Chown(path.to_path_buf(), format!("{}:{}", owner, group)));
        Ok(())
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        self.record(Call::SetMode(path.to_path_buf(), mode));
        Ok(())
    }

    fn is_executable(&self, _path: &Path) -> bool {
        self.daemon_installed
    }
}
