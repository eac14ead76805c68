// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! External tool invocations and how they are carried out

use std::{
    io,
    path::Path,
    process::{Command, ExitStatus},
};

use itertools::Itertools;
use nix::{
    errno::Errno,
    mount::{MntFlags, umount2},
};
use thiserror::Error;

/// Errors from running an external tool
#[derive(Debug, Error)]
pub enum StepError {
    /// The program could not be started at all
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The program ran and reported failure
    #[error("`{command}` failed ({status}){}", stderr_suffix(.stderr))]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// One external command together with how it should be run
#[derive(Debug)]
pub struct Step {
    description: String,
    command: Command,
    interactive: bool,
    tolerate_failure: bool,
}

impl Step {
    pub fn new(description: impl Into<String>, command: Command) -> Self {
        Self {
            description: description.into(),
            command,
            interactive: false,
            tolerate_failure: false,
        }
    }

    /// Run attached to the terminal instead of capturing output, for tools that talk to the operator
    pub fn interactive(self) -> Self {
        Self {
            interactive: true,
            ..self
        }
    }

    /// Log a failure of this step instead of aborting
    pub fn tolerate_failure(self) -> Self {
        Self {
            tolerate_failure: true,
            ..self
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn tolerates_failure(&self) -> bool {
        self.tolerate_failure
    }

    /// Name of the program this step runs
    pub fn program(&self) -> String {
        self.command.get_program().to_string_lossy().into_owned()
    }

    pub fn args(&self) -> Vec<String> {
        self.command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// The command as it would be typed into a shell, for logs and previews
    pub fn command_line(&self) -> String {
        std::iter::once(self.program())
            .chain(self.args())
            .map(|arg| {
                if arg.is_empty() || arg.contains(char::is_whitespace) {
                    format!("'{arg}'")
                } else {
                    arg
                }
            })
            .join(" ")
    }
}

/// Carries out steps
pub trait Executor {
    fn execute(&mut self, step: Step) -> Result<(), StepError>;

    /// Forcibly and lazily detach whatever is mounted at `target`
    fn unmount(&mut self, target: &Path) -> Result<(), Errno>;

    /// Execute steps in order, stopping at the first fatal failure
    fn execute_all(&mut self, steps: Vec<Step>) -> Result<(), StepError> {
        for step in steps {
            self.execute(step)?;
        }
        Ok(())
    }
}

/// Runs steps on the live system
#[derive(Debug, Default)]
pub struct System;

impl System {
    fn failure(step: &Step, error: StepError) -> Result<(), StepError> {
        if step.tolerate_failure {
            log::warn!("{}: {error}, continuing", step.description);
            Ok(())
        } else {
            Err(error)
        }
    }
}

impl Executor for System {
    fn execute(&mut self, mut step: Step) -> Result<(), StepError> {
        let command = step.command_line();
        log::info!("{}", step.description);
        log::debug!("Running `{command}`");

        let result = if step.interactive {
            step.command.status().map(|status| (status, String::new()))
        } else {
            step.command.output().map(|output| {
                for line in String::from_utf8_lossy(&output.stdout).lines() {
                    log::debug!("{}: {line}", step.program());
                }
                (output.status, String::from_utf8_lossy(&output.stderr).trim().to_owned())
            })
        };

        match result {
            Ok((status, _)) if status.success() => Ok(()),
            Ok((status, stderr)) => Self::failure(
                &step,
                StepError::Failed {
                    command,
                    status,
                    stderr,
                },
            ),
            Err(source) => Self::failure(&step, StepError::Spawn { command, source }),
        }
    }

    fn unmount(&mut self, target: &Path) -> Result<(), Errno> {
        log::debug!("Unmounting {}", target.display());
        umount2(target, MntFlags::MNT_FORCE | MntFlags::MNT_DETACH)
    }
}

/// Logs and records steps without running anything
#[derive(Debug, Default)]
pub struct DryRun {
    /// Command lines of every step seen, in order
    pub recorded: Vec<String>,
}

impl DryRun {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Executor for DryRun {
    fn execute(&mut self, step: Step) -> Result<(), StepError> {
        let command = step.command_line();
        log::info!("[dry-run] {}: {command}", step.description);
        self.recorded.push(command);
        Ok(())
    }

    fn unmount(&mut self, target: &Path) -> Result<(), Errno> {
        let command = format!("umount --force --lazy {}", target.display());
        log::info!("[dry-run] {command}");
        self.recorded.push(command);
        Ok(())
    }
}
