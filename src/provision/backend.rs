use anyhow::Result;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// `useradd` exit codes that mean the name itself was refused
const USERADD_BAD_ARGUMENT: i32 = 3;
const USERADD_BAD_NAME: i32 = 19;

/// Why the OS refused to create an account
#[derive(Debug, Error)]
pub enum CreateError {
    #[error("invalid user name '{username}'")]
    InvalidName { username: String },
    #[error("useradd rejected '{username}' (exit status {code:?})")]
    Rejected { username: String, code: Option<i32> },
    #[error("failed to run useradd: {0}")]
    Spawn(#[from] std::io::Error),
}

impl CreateError {
    /// Classify a failed `useradd` exit code
    pub fn from_exit_code(username: &str, code: Option<i32>) -> Self {
        match code {
            Some(USERADD_BAD_ARGUMENT) | Some(USERADD_BAD_NAME) => CreateError::InvalidName {
                username: username.to_string(),
            },
            _ => CreateError::Rejected {
                username: username.to_string(),
                code,
            },
        }
    }
}

/// Narrow view of the OS account database and filesystem.
///
/// Implementations must not cache account state: each call observes what
/// earlier entries of the same batch have done.
pub trait AccountBackend {
    fn user_exists(&self, username: &str) -> Result<bool>;

    /// Create an account with a login shell and a freshly made home directory
    fn create_user(&self, username: &str, shell: &str) -> Result<(), CreateError>;

    fn home_dir(&self, username: &str) -> Result<PathBuf>;

    /// Set a password through the batch `user:password` facility
    fn set_password(&self, username: &str, password: &str) -> Result<()>;

    /// Append a secondary group membership
    fn add_to_group(&self, username: &str, group: &str) -> Result<()>;

    /// Create `dir` with parents and write `contents` to `dir/file_name`
    fn write_file(&self, dir: &Path, file_name: &str, contents: &str) -> Result<()>;

    fn chown_recursive(&self, path: &Path, owner: &str, group: &str) -> Result<()>;

    fn set_mode(&self, path: &Path, mode: u32) -> Result<()>;

    fn is_executable(&self, path: &Path) -> bool;
}
