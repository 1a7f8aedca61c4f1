use std::process::Command;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("could not run `{program}`: `{source}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{command}` failed with {status}\nStdout: {stdout}\nStderr: {stderr}")]
    Failed {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external tool to completion.
#[cfg_attr(test, mockall::automock)]
pub trait CliRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CliOutput, CliError>;
}

/// [CliRunner] executing the programs found in `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCli;

impl CliRunner for SystemCli {
    fn run(&self, program: &str, args: &[String]) -> Result<CliOutput, CliError> {
        let command = format!("{program} {}", args.join(" "));
        debug!(%command, "running");

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| CliError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(CliError::Failed {
                command,
                status: output.status.to_string(),
                stdout,
                stderr,
            });
        }
        Ok(CliOutput { stdout, stderr })
    }
}
