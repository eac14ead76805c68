// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Erasing a disk before it is partitioned

use std::process::Command;

use disks::DevicePath;
use types::WipeMode;

use crate::{
    Executor, Step, StepError,
    crypt::{close_mapping, mapper_path},
};

/// Name of the throwaway dm-crypt mapping a secure wipe writes through
pub const WIPE_MAPPING: &str = "cleanit";

/// Sector size of the wipe mapping when the disk size is a multiple of it
const LARGE_SECTOR: u64 = 4096;

/// Sector size every block device supports
const SMALL_SECTOR: u64 = 512;

/// Erases a disk according to a [`WipeMode`]
///
/// A secure wipe opens a plain dm-crypt mapping keyed from `/dev/urandom` over
/// the disk and fills it with zeroes, so the disk ends up holding random data.
/// Both modes then remove filesystem signatures and the partition tables.
#[derive(Debug)]
pub struct Wiper<'a> {
    device: &'a DevicePath,
    mode: WipeMode,
    size: Option<u64>,
}

impl<'a> Wiper<'a> {
    pub fn new(device: &'a DevicePath, mode: WipeMode) -> Self {
        Self {
            device,
            mode,
            size: None,
        }
    }

    /// Bound the overwrite to `bytes`, normally the size of the disk
    pub fn with_size(self, bytes: u64) -> Self {
        Self {
            size: Some(bytes),
            ..self
        }
    }

    /// cryptsetup refuses a plain mapping whose sector size does not divide the device
    fn sector_size(&self) -> u64 {
        match self.size {
            Some(bytes) if bytes % LARGE_SECTOR == 0 => LARGE_SECTOR,
            _ => SMALL_SECTOR,
        }
    }

    fn open_mapping(&self) -> Step {
        let mut cmd = Command::new("cryptsetup");
        cmd.args(["open", "--type", "plain", "--key-file", "/dev/urandom", "--sector-size"]);
        cmd.arg(self.sector_size().to_string());
        cmd.arg(self.device.as_path());
        cmd.arg(WIPE_MAPPING);
        Step::new(format!("Opening random-key mapping over {}", self.device), cmd)
    }

    fn overwrite(&self) -> Step {
        let mut cmd = Command::new("ddrescue");
        cmd.arg("--force");
        if let Some(size) = self.size {
            cmd.arg(format!("--size={size}"));
        }
        cmd.arg("/dev/zero");
        cmd.arg(mapper_path(WIPE_MAPPING));
        Step::new(format!("Overwriting {}, this may take a long time", self.device), cmd)
    }

    fn erase_metadata(&self) -> Vec<Step> {
        let mut wipefs = Command::new("wipefs");
        wipefs.args(["--all", "--force"]);
        wipefs.arg(self.device.as_path());

        let mut zap = Command::new("sgdisk");
        zap.arg("--zap-all");
        zap.arg(self.device.as_path());

        vec![
            Step::new(format!("Removing signatures from {}", self.device), wipefs),
            Step::new(format!("Destroying partition tables on {}", self.device), zap),
        ]
    }

    /// Every step of the wipe, in order, for previews and tool checks
    pub fn steps(&self) -> Vec<Step> {
        let mut steps = match self.mode {
            WipeMode::Secure => vec![self.open_mapping(), self.overwrite(), close_mapping(WIPE_MAPPING)],
            WipeMode::Normal => vec![],
        };
        steps.extend(self.erase_metadata());
        steps
    }

    /// Wipe the disk
    ///
    /// Once opened, the wipe mapping is closed again even when the overwrite
    /// fails; the overwrite error takes precedence.
    pub fn run<E: Executor>(&self, executor: &mut E) -> Result<(), StepError> {
        log::info!("{} wipe of {}", self.mode, self.device);

        if self.mode == WipeMode::Secure {
            executor.execute(self.open_mapping())?;
            let overwritten = executor.execute(self.overwrite());
            let closed = executor.execute(close_mapping(WIPE_MAPPING));
            overwritten?;
            closed?;
        }

        executor.execute_all(self.erase_metadata())
    }
}
