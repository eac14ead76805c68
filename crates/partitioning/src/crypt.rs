// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! dm-crypt mappings: LUKS2 containers and cleanup of leftovers

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::{Step, wipe::WIPE_MAPPING};

/// Mapping name of the encrypted root container
pub const ROOT_MAPPING: &str = "root";

/// Device node of an open mapping
pub fn mapper_path(name: &str) -> PathBuf {
    Path::new("/dev/mapper").join(name)
}

/// Close an open mapping
pub fn close_mapping(name: &str) -> Step {
    let mut cmd = Command::new("cryptsetup");
    cmd.args(["close", name]);
    Step::new(format!("Closing mapping {name}"), cmd)
}

/// Close mappings an earlier, interrupted run may have left open
///
/// They usually do not exist, so failures are only logged.
pub fn close_stale_mappings() -> Vec<Step> {
    [WIPE_MAPPING, ROOT_MAPPING]
        .into_iter()
        .map(|name| close_mapping(name).tolerate_failure())
        .collect()
}

/// A LUKS2 container to be created on a partition
///
/// The passphrase is read by `cryptsetup` itself from the terminal.
#[derive(Debug)]
pub struct Luks2Container {
    pub partition: PathBuf,
    pub name: String,
    pub label: String,
}

impl Luks2Container {
    pub fn new(partition: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            partition: partition.into(),
            name: name.to_owned(),
            label: name.to_owned(),
        }
    }

    /// Where the unlocked container appears
    pub fn mapped_path(&self) -> PathBuf {
        mapper_path(&self.name)
    }

    fn format(&self) -> Step {
        let mut cmd = Command::new("cryptsetup");
        cmd.args(["luksFormat", "--batch-mode", "--type", "luks2", "--verify-passphrase", "--label"]);
        cmd.arg(&self.label);
        cmd.arg(&self.partition);
        Step::new(
            format!("Creating LUKS2 container on {}", self.partition.display()),
            cmd,
        )
        .interactive()
    }

    fn open(&self) -> Step {
        let mut cmd = Command::new("cryptsetup");
        cmd.args(["open", "--type", "luks2"]);
        cmd.arg(&self.partition);
        cmd.arg(&self.name);
        Step::new(format!("Unlocking {} as {}", self.partition.display(), self.name), cmd).interactive()
    }

    /// Create the container, then unlock it
    pub fn steps(&self) -> Vec<Step> {
        vec![self.format(), self.open()]
    }
}
