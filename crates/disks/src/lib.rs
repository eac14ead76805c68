// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Whole-disk block device handling
//!
//! The installer only ever targets whole disks. This crate decides which device
//! paths are acceptable, how their partitions are named, and reads the little
//! system information the partition layout depends on.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    sync::OnceLock,
};

use regex::Regex;
use thiserror::Error;

pub mod memory;
mod sizing;
pub use sizing::*;

/// Sysfs directory holding one entry per block device
pub const SYSFS_DIR: &str = "sys/class/block";

/// Size of the sectors sysfs reports sizes in, regardless of the logical block size
const SYSFS_SECTOR_SIZE: u64 = 512;

static SCSI_PATTERN: OnceLock<Regex> = OnceLock::new();
static NVME_PATTERN: OnceLock<Regex> = OnceLock::new();
static MMC_PATTERN: OnceLock<Regex> = OnceLock::new();
static PARTITION_PATTERN: OnceLock<Regex> = OnceLock::new();

fn pattern(cell: &'static OnceLock<Regex>, expr: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(expr).expect("Failed to initialise known-working regex"))
}

/// Reasons a device path is refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidDevice {
    #[error("no device path was given")]
    Empty,

    #[error("{0} is a partition, select the whole disk instead")]
    Partition(String),

    #[error("{0} is not a supported disk, expected e.g. /dev/sda or /dev/nvme0n1")]
    Unrecognised(String),
}

/// The bus family of a disk, which decides how its partitions are named
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// `/dev/sdX`, SATA and USB disks through libata/SCSI
    Scsi,
    /// `/dev/nvmeXn1`
    Nvme,
    /// `/dev/mmcXn1` and `/dev/mmcblkX`
    Mmc,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scsi => f.write_str("SSD"),
            Self::Nvme => f.write_str("NVMe"),
            Self::Mmc => f.write_str("MMC"),
        }
    }
}

/// A validated path to a whole disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePath {
    path: String,
    kind: DeviceKind,
}

impl DevicePath {
    /// Validate `input` as a whole-disk device path.
    ///
    /// The input must match one of the accepted patterns exactly; nothing is
    /// trimmed or normalised, so an accepted path is always the input unchanged.
    pub fn parse(input: &str) -> Result<Self, InvalidDevice> {
        if input.is_empty() {
            return Err(InvalidDevice::Empty);
        }

        let kind = if pattern(&SCSI_PATTERN, r"^/dev/sd[a-z]$").is_match(input) {
            DeviceKind::Scsi
        } else if let Some(captures) = pattern(&NVME_PATTERN, r"^/dev/(nvme|mmc)[0-9]+n1$").captures(input) {
            match &captures[1] {
                "nvme" => DeviceKind::Nvme,
                _ => DeviceKind::Mmc,
            }
        } else if pattern(&MMC_PATTERN, r"^/dev/mmcblk[0-9]+$").is_match(input) {
            DeviceKind::Mmc
        } else if pattern(
            &PARTITION_PATTERN,
            r"^/dev/(sd[a-z][0-9]+|(nvme|mmc)[0-9]+n[0-9]+p[0-9]+|mmcblk[0-9]+p[0-9]+)$",
        )
        .is_match(input)
        {
            return Err(InvalidDevice::Partition(input.to_owned()));
        } else {
            return Err(InvalidDevice::Unrecognised(input.to_owned()));
        };

        Ok(Self {
            path: input.to_owned(),
            kind,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.path)
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Kernel name of the device, e.g. `sda` or `nvme0n1`
    pub fn name(&self) -> &str {
        self.path.trim_start_matches("/dev/")
    }

    /// Device node of partition `number` on this disk
    ///
    /// Disks whose name ends in a digit get a `p` separator (`nvme0n1p1`),
    /// the others do not (`sda1`).
    pub fn partition(&self, number: u32) -> PathBuf {
        match self.kind {
            DeviceKind::Scsi => PathBuf::from(format!("{}{number}", self.path)),
            DeviceKind::Nvme | DeviceKind::Mmc => PathBuf::from(format!("{}p{number}", self.path)),
        }
    }

    /// Size of the disk in bytes as reported by sysfs under `sysroot`
    pub fn size_in_bytes_at(&self, sysroot: &Path) -> io::Result<u64> {
        let node = sysroot.join(SYSFS_DIR).join(self.name()).join("size");
        let sectors = fs::read_to_string(&node)?;
        let sectors: u64 = sectors
            .trim()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{}: {e}", node.display())))?;
        log::trace!("{} reports {sectors} sectors", node.display());
        Ok(sectors * SYSFS_SECTOR_SIZE)
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl FromStr for DevicePath {
    type Err = InvalidDevice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<Path> for DevicePath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_whole_disks() {
        for (input, kind) in [
            ("/dev/sda", DeviceKind::Scsi),
            ("/dev/sdz", DeviceKind::Scsi),
            ("/dev/nvme0n1", DeviceKind::Nvme),
            ("/dev/nvme12n1", DeviceKind::Nvme),
            ("/dev/mmc0n1", DeviceKind::Mmc),
            ("/dev/mmcblk0", DeviceKind::Mmc),
        ] {
            let device = DevicePath::parse(input).unwrap_or_else(|e| panic!("{input} rejected: {e}"));
            assert_eq!(device.as_str(), input);
            assert_eq!(device.kind(), kind);
        }
    }

    #[test]
    fn test_rejects_partitions() {
        for input in ["/dev/sda1", "/dev/nvme0n1p1", "/dev/mmcblk0p2"] {
            assert_eq!(
                DevicePath::parse(input),
                Err(InvalidDevice::Partition(input.to_owned())),
                "{input}"
            );
        }
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(DevicePath::parse(""), Err(InvalidDevice::Empty));
        for input in [
            "sda",
            "/dev/sd",
            "/dev/sdA",
            "/dev/sdaa",
            " /dev/sda",
            "/dev/sda ",
            "/dev/sda; rm -rf /",
            "/dev/nvme0n2",
            "/dev/nvmen1",
            "/dev/loop0",
            "/dev/null",
            "/dev/nvme\u{0663}n1",
            "/dev/mmc\u{0663}n1",
            "/dev/mmcblk\u{0967}",
            "/dev/sda\u{0661}",
            "/dev/nvme0n1p\u{0663}",
        ] {
            assert!(
                matches!(DevicePath::parse(input), Err(InvalidDevice::Unrecognised(_))),
                "{input:?} should be unrecognised"
            );
        }
    }

    #[test]
    fn test_partition_naming() {
        let sda: DevicePath = "/dev/sda".parse().unwrap();
        assert_eq!(sda.partition(3), PathBuf::from("/dev/sda3"));
        assert_eq!(sda.name(), "sda");

        let nvme: DevicePath = "/dev/nvme0n1".parse().unwrap();
        assert_eq!(nvme.partition(1), PathBuf::from("/dev/nvme0n1p1"));
        assert_eq!(nvme.name(), "nvme0n1");

        let mmc: DevicePath = "/dev/mmcblk1".parse().unwrap();
        assert_eq!(mmc.partition(2), PathBuf::from("/dev/mmcblk1p2"));
    }

    #[test_log::test]
    fn test_size_from_sysfs() {
        let root = tempfile::tempdir().unwrap();
        let node = root.path().join(SYSFS_DIR).join("nvme0n1");
        fs::create_dir_all(&node).unwrap();
        fs::write(node.join("size"), "1000215216\n").unwrap();

        let device: DevicePath = "/dev/nvme0n1".parse().unwrap();
        assert_eq!(device.size_in_bytes_at(root.path()).unwrap(), 1000215216 * 512);

        let missing: DevicePath = "/dev/sdb".parse().unwrap();
        assert!(missing.size_in_bytes_at(root.path()).is_err());
    }
}
