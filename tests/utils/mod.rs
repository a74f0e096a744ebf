use anyhow::Result;
use std::process::Command;

use super::common::TestEnvironment;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run the compiled binary against the test config.
///
/// `batch` becomes `BATCH_USER_CREATION`; `None` removes it from the
/// environment entirely.
pub fn run_batch_users(
    env: &TestEnvironment,
    batch: Option<&str>,
    args: &[&str],
) -> Result<CommandOutput> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_batch-users"));
    cmd.arg("--config")
        .arg(env.config_path())
        .arg("--no-color")
        .args(args)
        .current_dir(env.path());

    match batch {
        Some(value) => cmd.env("BATCH_USER_CREATION", value),
        None => cmd.env_remove("BATCH_USER_CREATION"),
    };

    let output = cmd.output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

pub fn has_getent() -> bool {
    which::which("getent").is_ok()
}
