// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Interactive disk selection and confirmation
//!
//! Reads the target disk, a yes/no confirmation and the wipe mode from any
//! line-oriented input. Every question is retried a bounded number of times;
//! a closed input stream ends the session with an error. This crate never
//! runs external commands.

use std::io::{self, BufRead, StdinLock, Stdout, Write};

use disks::DevicePath;
use thiserror::Error;
use types::WipeMode;

mod selection;
pub use selection::*;

/// How many times a question is asked before giving up
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

const DEVICE_PROMPT: &str = "\nDisk examples: /dev/sda or /dev/nvme0n1. \
Don't use partition numbers like: /dev/sda1 or /dev/nvme0n1p1.\n\
Input your desired disk, then press ENTER: ";

const WIPE_MODE_PROMPT: &str = "\nWipe mode, 'Secure' overwrites the whole disk, \
'Normal' only erases signatures and the partition table.\n\
Input Secure or Normal, then press ENTER: ";

/// Errors that end a prompt session
#[derive(Debug, Error)]
pub enum PromptError {
    /// Reading from or writing to the terminal failed
    #[error("terminal I/O: {0}")]
    Io(#[from] io::Error),

    /// The input stream ended before an answer was given
    #[error("input closed before an answer was given")]
    InputClosed,

    /// No acceptable answer within the retry limit
    #[error("no acceptable answer after {0} attempts")]
    TooManyAttempts(usize),
}

/// Line-oriented prompt over an input and an output stream
pub struct Prompt<R, W> {
    input: R,
    output: W,
    max_attempts: usize,
}

impl Prompt<StdinLock<'static>, Stdout> {
    /// A prompt on the process' standard input and output
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Limit every question to `max_attempts` tries (at least one)
    pub fn with_max_attempts(self, max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..self
        }
    }

    /// Give back the underlying streams
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Read one line with its `\n` or `\r\n` terminator removed
    fn read_line(&mut self) -> Result<String, PromptError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PromptError::InputClosed);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    fn ask(&mut self, text: &str) -> Result<String, PromptError> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        self.read_line()
    }

    fn notice(&mut self, text: &str) -> Result<(), PromptError> {
        writeln!(self.output, "\nNOTICE: {text}\n")?;
        Ok(())
    }

    /// Ask for a whole-disk device path until an acceptable one is entered
    ///
    /// The accepted path is returned exactly as typed.
    pub fn select_device(&mut self) -> Result<DevicePath, PromptError> {
        for attempt in 1..=self.max_attempts {
            let line = self.ask(DEVICE_PROMPT)?;
            match DevicePath::parse(&line) {
                Ok(device) => return Ok(device),
                Err(e) => {
                    log::debug!("Disk selection attempt {attempt}/{} refused: {e}", self.max_attempts);
                    let hint = if line.trim() != line && DevicePath::parse(line.trim()).is_ok() {
                        " Remove the spaces around the path."
                    } else {
                        ""
                    };
                    self.notice(&format!("An invalid disk has been selected, try again. {e}.{hint}"))?;
                }
            }
        }

        Err(PromptError::TooManyAttempts(self.max_attempts))
    }

    /// Ask a yes/no question once
    ///
    /// Returns `true` only for a case-insensitive `y`. Anything other than
    /// `y` or `n` also prints a notice; asking again is up to the caller.
    pub fn confirm(&mut self, question: &str) -> Result<bool, PromptError> {
        let line = self.ask(&format!("{question} [y/n]: "))?;
        match Answer::parse(&line) {
            Answer::Yes => Ok(true),
            Answer::No => Ok(false),
            Answer::Other => {
                self.notice("Please enter 'y' or 'n'.")?;
                Ok(false)
            }
        }
    }

    /// Ask for the wipe mode until a known one is entered
    pub fn select_wipe_mode(&mut self) -> Result<WipeMode, PromptError> {
        for attempt in 1..=self.max_attempts {
            let line = self.ask(WIPE_MODE_PROMPT)?;
            match line.parse::<WipeMode>() {
                Ok(mode) => return Ok(mode),
                Err(e) => {
                    log::debug!("Wipe mode attempt {attempt}/{} refused: {e}", self.max_attempts);
                    self.notice("Please enter 'Secure' or 'Normal'.")?;
                }
            }
        }

        Err(PromptError::TooManyAttempts(self.max_attempts))
    }

    /// Confirm an already known device, e.g. one passed on the command line
    pub fn confirm_device(&mut self, device: &DevicePath) -> Result<DeviceSelection, PromptError> {
        writeln!(self.output, "\nSelected {} disk: {device}\n", device.kind())?;
        let confirmed = self.confirm("Are you sure")?;
        Ok(DeviceSelection {
            raw_input: device.as_str().to_owned(),
            validated: true,
            confirmed,
        })
    }

    /// A complete selection session: pick a disk, then confirm it
    ///
    /// Declining the confirmation starts over with a new selection. Returns a
    /// validated and confirmed selection.
    pub fn run(&mut self) -> Result<DeviceSelection, PromptError> {
        for _ in 0..self.max_attempts {
            let device = self.select_device()?;
            let selection = self.confirm_device(&device)?;
            if selection.confirmed {
                log::debug!("Operator confirmed {device}");
                return Ok(selection);
            }
            log::info!("Selection of {device} was not confirmed");
        }

        Err(PromptError::TooManyAttempts(self.max_attempts))
    }
}
