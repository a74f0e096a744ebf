use anyhow::{Context, Result};
use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};

/// Runs mutating OS commands, or prints them when in dry-run mode
pub struct CommandExecutor {
    pub dry_run: bool,
}

impl CommandExecutor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Run a command and hand back its exit status.
    ///
    /// Returns `None` in dry-run mode. Spawn failures are the only error; a
    /// non-zero exit is left for the caller to interpret.
    pub fn status(&self, command: &mut Command) -> std::io::Result<Option<ExitStatus>> {
        if self.dry_run {
            self.print_dry_run(command, None);
            return Ok(None);
        }
        command.status().map(Some)
    }

    pub fn run(&self, command: &mut Command) -> Result<()> {
        let status = self
            .status(command)
            .with_context(|| format!("spawning {}", describe(command)))?;
        if let Some(status) = status
            && !status.success()
        {
            anyhow::bail!(
                "command {} failed with status {:?}",
                describe(command),
                status.code()
            );
        }
        Ok(())
    }

    /// Run a command feeding `input` on stdin.
    ///
    /// `shown` replaces the input in dry-run output so secrets stay off the
    /// terminal.
    pub fn run_with_input(&self, command: &mut Command, input: &str, shown: &str) -> Result<()> {
        if self.dry_run {
            self.print_dry_run(command, Some(shown));
            return Ok(());
        }

        command.stdin(Stdio::piped());
        command.stdout(Stdio::piped()); // Capture output to avoid clutter

        let mut child = command
            .spawn()
            .with_context(|| format!("spawning {}", describe(command)))?;

        if let Some(mut stdin) = child.stdin.take() {
            writeln!(stdin, "{}", input)
                .with_context(|| format!("writing to {}", describe(command)))?;
        }

        let status = child
            .wait()
            .with_context(|| format!("waiting for {}", describe(command)))?;
        if !status.success() {
            anyhow::bail!(
                "command {} failed with status {:?}",
                describe(command),
                status.code()
            );
        }
        Ok(())
    }

    fn print_dry_run(&self, command: &Command, input: Option<&str>) {
        let cmd_str = describe(command);
        match input {
            Some(input_str) => println!("[DRY RUN] echo '{}' | {}", input_str, cmd_str),
            None => println!("[DRY RUN] {}", cmd_str),
        }
    }
}

/// Render a command line for logs
pub fn describe(command: &Command) -> String {
    let program = command.get_program().to_string_lossy();
    let args: Vec<_> = command.get_args().map(|a| a.to_string_lossy()).collect();
    if args.is_empty() {
        program.into_owned()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_joins_program_and_args() {
        let mut command = Command::new("usermod");
        command.args(["-a", "-G", "staff", "alice"]);
        assert_eq!(describe(&command), "usermod -a -G staff alice");
        assert_eq!(describe(&Command::new("getent")), "getent");
    }

    #[test]
    fn test_dry_run_does_not_spawn() {
        let executor = CommandExecutor::new(true);
        let mut command = Command::new("/nonexistent/binary-that-cannot-run");
        assert!(executor.status(&mut command).unwrap().is_none());
        assert!(executor.run(&mut command).is_ok());
        assert!(
            executor
                .run_with_input(&mut command, "alice:secret", "alice:********")
                .is_ok()
        );
    }

    #[test]
    fn test_failed_command_is_an_error() {
        let executor = CommandExecutor::new(false);
        let mut command = Command::new("false");
        assert!(executor.run(&mut command).is_err());
    }
}
