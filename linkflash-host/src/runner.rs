//! External command execution
//!
//! The orchestrator names a [`Step`]; a [`CommandRunner`] decides what
//! actually runs. [`ProcessRunner`] maps steps to the configured argument
//! vectors and runs them in the project directory.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::settings::Commands;

/// Replaced with the selected serial port in command arguments
pub const PORT_PLACEHOLDER: &str = "{port}";

/// One external command of a flash sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Clean,
    Build,
    Flash { port: String },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Clean => "clean",
            Step::Build => "build",
            Step::Flash { .. } => "flash",
        }
    }
}

/// Result of a command that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit code; `None` when killed by a signal
    pub code: Option<i32>,
    /// Standard output followed by standard error
    pub output: String,
}

impl CommandOutput {
    /// Last `n` lines of the combined output
    pub fn tail(&self, n: usize) -> Vec<String> {
        let lines: Vec<&str> = self.output.lines().collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].iter().map(|l| l.to_string()).collect()
    }
}

/// A command could not be started
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("no command configured for {0}")]
    NotConfigured(&'static str),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs the external commands of a flash sequence
pub trait CommandRunner: Send + Sync {
    /// Run `step` to completion, capturing its output
    fn run(&self, step: &Step) -> Result<CommandOutput, RunnerError>;
}

/// Runs configured commands as child processes
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    commands: Commands,
    workdir: PathBuf,
}

impl ProcessRunner {
    pub fn new(commands: Commands, workdir: impl Into<PathBuf>) -> Self {
        Self {
            commands,
            workdir: workdir.into(),
        }
    }

    /// Argument vector for a step with the port substituted
    pub fn argv(&self, step: &Step) -> Vec<String> {
        let template = match step {
            Step::Clean => &self.commands.clean,
            Step::Build => &self.commands.build,
            Step::Flash { .. } => &self.commands.flash,
        };
        match step {
            Step::Flash { port } => template
                .iter()
                .map(|arg| arg.replace(PORT_PLACEHOLDER, port))
                .collect(),
            _ => template.clone(),
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, step: &Step) -> Result<CommandOutput, RunnerError> {
        let argv = self.argv(step);
        let (program, args) = argv
            .split_first()
            .ok_or(RunnerError::NotConfigured(step.name()))?;

        info!("{}: {}", step.name(), argv.join(" "));
        let out = Command::new(program)
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RunnerError::Spawn {
                program: program.clone(),
                source,
            })?;

        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));
        debug!("{} exited with {:?}", step.name(), out.status.code());

        Ok(CommandOutput {
            success: out.status.success(),
            code: out.status.code(),
            output,
        })
    }
}
