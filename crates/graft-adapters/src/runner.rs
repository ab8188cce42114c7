//! Runs post-injection commands through the platform shell.

use std::path::Path;
use std::process::Command;

use tracing::{debug, instrument};

use graft_core::{
    application::{ApplicationError, CommandOutput, CommandRunner},
    error::GraftResult,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessCommandRunner;

impl ProcessCommandRunner {
    pub fn new() -> Self {
        Self
    }

    fn shell(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        }
    }
}

impl CommandRunner for ProcessCommandRunner {
    #[instrument(skip(self), fields(cwd = %cwd.display()))]
    fn run(&self, command: &str, cwd: &Path) -> GraftResult<CommandOutput> {
        let output = Self::shell(command)
            .current_dir(cwd)
            .output()
            .map_err(|e| ApplicationError::CommandFailed {
                command: command.to_string(),
                reason: e.to_string(),
            })?;

        debug!(status = ?output.status.code(), "Command finished");

        Ok(CommandOutput {
            success: output.status.success(),
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn captures_output_in_working_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();

        let out = ProcessCommandRunner.run("cat marker.txt", dir.path()).unwrap();
        assert!(out.success);
        assert_eq!(out.status, Some(0));
        assert_eq!(out.stdout, "here");
    }

    #[test]
    fn non_zero_exit_is_reported_not_raised() {
        let dir = TempDir::new().unwrap();
        let out = ProcessCommandRunner
            .run("echo broken >&2; exit 3", dir.path())
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.status, Some(3));
        assert_eq!(out.stderr.trim(), "broken");
    }

    #[test]
    fn missing_directory_is_a_command_failure() {
        let err = ProcessCommandRunner
            .run("true", Path::new("/definitely/not/here"))
            .unwrap_err();
        assert!(err.to_string().contains("true"));
    }
}
