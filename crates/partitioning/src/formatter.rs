// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{path::Path, process::Command};

use types::{Filesystem, StandardFilesystemType};

use crate::Step;

/// Trait for generating filesystem-specific formatting commands and arguments
pub trait FilesystemExt {
    /// Returns the appropriate mkfs command for the filesystem
    fn mkfs_command(&self) -> &str;

    /// Arguments that must always be passed
    fn base_args(&self) -> Vec<String>;

    /// Returns the command-line arguments for setting UUID, if applicable
    fn uuid_arg(&self) -> Vec<String>;

    /// Returns the command-line arguments for setting filesystem label, if applicable
    fn label_arg(&self) -> Vec<String>;

    /// Returns the force format argument if applicable
    fn force_arg(&self) -> Vec<String>;
}

impl FilesystemExt for Filesystem {
    fn mkfs_command(&self) -> &str {
        match self {
            Filesystem::Fat32 { .. } => "mkfs.fat",
            Filesystem::Standard { filesystem_type, .. } => match filesystem_type {
                StandardFilesystemType::Btrfs => "mkfs.btrfs",
                StandardFilesystemType::F2fs => "mkfs.f2fs",
                StandardFilesystemType::Ext4 => "mkfs.ext4",
                StandardFilesystemType::Xfs => "mkfs.xfs",
                StandardFilesystemType::Swap => "mkswap",
            },
        }
    }

    fn base_args(&self) -> Vec<String> {
        match self {
            Filesystem::Fat32 { .. } => vec!["-F".to_owned(), "32".to_owned()],
            Filesystem::Standard { .. } => vec![],
        }
    }

    fn uuid_arg(&self) -> Vec<String> {
        match self {
            Filesystem::Fat32 { volume_id, .. } => volume_id
                .map(|id| vec!["-i".to_owned(), format!("{id:08X}")])
                .unwrap_or_default(),
            Filesystem::Standard {
                filesystem_type, uuid, ..
            } => match (filesystem_type, uuid) {
                (_, None) => vec![],
                (StandardFilesystemType::Xfs, Some(uuid)) => vec!["-m".to_owned(), format!("uuid={uuid}")],
                (_, Some(uuid)) => vec!["-U".to_owned(), uuid.clone()],
            },
        }
    }

    fn label_arg(&self) -> Vec<String> {
        match self {
            Filesystem::Fat32 { label, .. } => label
                .as_ref()
                .map(|label| vec!["-n".to_owned(), label.clone()])
                .unwrap_or_default(),
            Filesystem::Standard {
                filesystem_type, label, ..
            } => match (filesystem_type, label) {
                (_, None) => vec![],
                (StandardFilesystemType::F2fs, Some(label)) => vec!["-l".to_owned(), label.clone()],
                (_, Some(label)) => vec!["-L".to_owned(), label.clone()],
            },
        }
    }

    fn force_arg(&self) -> Vec<String> {
        match self {
            Filesystem::Fat32 { .. } => vec![],
            Filesystem::Standard { filesystem_type, .. } => match filesystem_type {
                StandardFilesystemType::Ext4 => vec!["-F".to_owned()],
                StandardFilesystemType::Btrfs
                | StandardFilesystemType::F2fs
                | StandardFilesystemType::Xfs
                | StandardFilesystemType::Swap => vec!["-f".to_owned()],
            },
        }
    }
}

/// Struct for formatting filesystems on devices
pub struct Formatter {
    pub filesystem: Filesystem,
    pub force: bool,
}

impl Formatter {
    /// Creates a new Formatter for the given filesystem
    pub fn new(filesystem: Filesystem) -> Self {
        Self {
            filesystem,
            force: false,
        }
    }

    /// Forces the format operation
    pub fn force(self) -> Self {
        Self { force: true, ..self }
    }

    /// Returns a Command configured to format the given device with the filesystem
    pub fn format(&self, device: &Path) -> Command {
        let mut cmd = Command::new(self.filesystem.mkfs_command());

        cmd.args(self.filesystem.base_args());
        cmd.args(self.filesystem.uuid_arg());
        cmd.args(self.filesystem.label_arg());
        if self.force {
            cmd.args(self.filesystem.force_arg());
        }

        cmd.arg(device);
        cmd
    }

    /// The format command wrapped as a [`Step`]
    pub fn step(&self, device: &Path) -> Step {
        let what = match (self.filesystem.is_swap(), self.filesystem.label()) {
            (true, _) => "Setting up swap on".to_owned(),
            (false, Some(label)) => format!("Creating {} filesystem '{label}' on", self.filesystem),
            (false, None) => format!("Creating {} filesystem on", self.filesystem),
        };
        Step::new(format!("{what} {}", device.display()), self.format(device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT_UUID: &str = "5b7c1f9e-3a3d-4c8e-9f3b-0d2f6a1e7c44";

    fn line(formatter: &Formatter, device: &str) -> String {
        formatter.step(Path::new(device)).command_line()
    }

    #[test]
    fn test_fat32_args() {
        let fs = Filesystem::Fat32 {
            label: Some("BOOT".to_string()),
            volume_id: Some(0x1234),
        };

        assert_eq!(fs.mkfs_command(), "mkfs.fat");
        assert_eq!(fs.base_args(), vec!["-F", "32"]);
        assert_eq!(fs.uuid_arg(), vec!["-i", "00001234"]);
        assert_eq!(fs.label_arg(), vec!["-n", "BOOT"]);
        assert!(fs.force_arg().is_empty());
    }

    #[test]
    fn test_ext4_args() {
        let fs = Filesystem::Standard {
            filesystem_type: StandardFilesystemType::Ext4,
            label: Some("root".to_string()),
            uuid: Some(ROOT_UUID.to_string()),
        };

        assert_eq!(fs.mkfs_command(), "mkfs.ext4");
        assert_eq!(fs.uuid_arg(), vec!["-U", ROOT_UUID]);
        assert_eq!(fs.label_arg(), vec!["-L", "root"]);
    }

    #[test]
    fn test_xfs_and_f2fs_args() {
        let xfs = Filesystem::Standard {
            filesystem_type: StandardFilesystemType::Xfs,
            label: Some("data".to_string()),
            uuid: Some(ROOT_UUID.to_string()),
        };
        assert_eq!(xfs.mkfs_command(), "mkfs.xfs");
        assert_eq!(xfs.uuid_arg(), vec!["-m".to_string(), format!("uuid={ROOT_UUID}")]);
        assert_eq!(xfs.label_arg(), vec!["-L", "data"]);

        let f2fs = Filesystem::standard(StandardFilesystemType::F2fs, Some("data"));
        assert_eq!(f2fs.label_arg(), vec!["-l", "data"]);
        assert!(f2fs.uuid_arg().is_empty());
    }

    #[test]
    fn test_format_steps() {
        let boot = Formatter::new(Filesystem::fat32("BOOT"));
        assert_eq!(line(&boot, "/dev/sda1"), "mkfs.fat -F 32 -n BOOT /dev/sda1");

        let swap = Formatter::new(Filesystem::standard(StandardFilesystemType::Swap, None)).force();
        assert_eq!(line(&swap, "/dev/sda2"), "mkswap -f /dev/sda2");
        assert!(swap.step(Path::new("/dev/sda2")).description().contains("swap"));

        let root = Formatter::new(Filesystem::standard(StandardFilesystemType::Ext4, Some("root"))).force();
        assert_eq!(line(&root, "/dev/mapper/root"), "mkfs.ext4 -L root -F /dev/mapper/root");
        assert_eq!(
            root.step(Path::new("/dev/mapper/root")).description(),
            "Creating ext4 filesystem 'root' on /dev/mapper/root"
        );

        let btrfs = Formatter::new(Filesystem::standard(StandardFilesystemType::Btrfs, None)).force();
        assert_eq!(line(&btrfs, "/dev/nvme0n1p3"), "mkfs.btrfs -f /dev/nvme0n1p3");
    }
}
