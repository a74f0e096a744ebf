use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result};

use super::backend::{AccountBackend, CreateError};
use super::executor::CommandExecutor;

/// Account backend driving the shadow-utils tools of the host
pub struct SystemBackend {
    executor: CommandExecutor,
}

impl SystemBackend {
    pub fn new(dry_run: bool) -> Self {
        Self {
            executor: CommandExecutor::new(dry_run),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.executor.dry_run
    }
}

/// Fields of a passwd entry this tool cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswdEntry {
    pub home: PathBuf,
}

impl PasswdEntry {
    /// Parse a `name:pw:uid:gid:gecos:home:shell` line returned for `username`.
    ///
    /// `getent passwd` also resolves numeric arguments as UIDs, so a line whose
    /// name differs from the lookup is not a match.
    pub fn parse(line: &str, username: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim().split(':').collect();
        if fields.len() < 7 || fields[0] != username {
            return None;
        }
        Some(Self {
            home: PathBuf::from(fields[5]),
        })
    }
}

fn useradd_command(username: &str, shell: &str) -> Command {
    let mut command = Command::new("useradd");
    command.args(["-m", "-s", shell, "--", username]);
    command
}

fn usermod_append_command(username: &str, group: &str) -> Command {
    let mut command = Command::new("usermod");
    command.args(["-a", "-G", group, "--", username]);
    command
}

/// Look up a user in the live account database
pub fn get_passwd_entry(username: &str) -> Result<Option<PasswdEntry>> {
    let passwd = Command::new("getent")
        .args(["passwd", "--", username])
        .output()
        .with_context(|| format!("querying passwd entry for {}", username))?;

    if !passwd.status.success() {
        return Ok(None);
    }

    let line = String::from_utf8(passwd.stdout).context("parsing passwd entry")?;
    Ok(line
        .lines()
        .find_map(|entry| PasswdEntry::parse(entry, username)))
}

impl AccountBackend for SystemBackend {
    fn user_exists(&self, username: &str) -> Result<bool> {
        Ok(get_passwd_entry(username)?.is_some())
    }

    fn create_user(&self, username: &str, shell: &str) -> Result<(), CreateError> {
        let mut command = useradd_command(username, shell);
        match self.executor.status(&mut command)? {
            Some(status) if !status.success() => {
                Err(CreateError::from_exit_code(username, status.code()))
            }
            _ => Ok(()),
        }
    }

    fn home_dir(&self, username: &str) -> Result<PathBuf> {
        match get_passwd_entry(username)? {
            Some(entry) => Ok(entry.home),
            // The account was only pretended into existence
            None if self.is_dry_run() => Ok(Path::new("/home").join(username)),
            None => anyhow::bail!("no passwd entry for {} after creation", username),
        }
    }

    fn set_password(&self, username: &str, password: &str) -> Result<()> {
        let mut command = Command::new("chpasswd");
        self.executor
            .run_with_input(
                &mut command,
                &format!("{}:{}", username, password),
                &format!("{}:********", username),
            )
            .with_context(|| format!("setting password for {}", username))
    }

    fn add_to_group(&self, username: &str, group: &str) -> Result<()> {
        let mut command = usermod_append_command(username, group);
        self.executor
            .run(&mut command)
            .with_context(|| format!("adding {} to group {}", username, group))
    }

    fn write_file(&self, dir: &Path, file_name: &str, contents: &str) -> Result<()> {
        let path = dir.join(file_name);
        if self.is_dry_run() {
            println!("[DRY RUN] mkdir -p {}", dir.display());
            println!("[DRY RUN] Writing {}", path.display());
            return Ok(());
        }

        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    fn chown_recursive(&self, path: &Path, owner: &str, group: &str) -> Result<()> {
        let mut command = Command::new("chown");
        command
            .arg("-R")
            .arg(format!("{}:{}", owner, group))
            .arg(path);
        self.executor
            .run(&mut command)
            .with_context(|| format!("changing ownership of {}", path.display()))
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        if self.is_dry_run() {
            println!("[DRY RUN] chmod {:o} {}", mode, path.display());
            return Ok(());
        }

        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .with_context(|| format!("setting mode {:o} on {}", mode, path.display()))
    }

    fn is_executable(&self, path: &Path) -> bool {
        which::which(path).is_ok()
    }
}
