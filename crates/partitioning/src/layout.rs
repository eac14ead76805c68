// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Planning the partition table
//!
//! Sizes are resolved to whole mebibytes here; where partitions start and end
//! on disk is left to `sgdisk`.

use std::{collections::HashSet, fmt};

use disks::{MIB, bytes_to_mib_ceil, format_position, format_size};
use thiserror::Error;
use types::{Filesystem, PartitionRole, PartitionTypeGuid, StandardFilesystemType, StorageUnit};

use crate::PartitionAttributes;

/// Room for the protective MBR, both GPT copies and the 1 MiB start alignment
const TABLE_OVERHEAD_MIB: u64 = 2;

/// The smallest partition that may take up the remaining space
const MIN_REMAINING_MIB: u64 = 1;

/// Errors that can occur when planning a layout
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("no partitions were requested")]
    Empty,

    #[error("no partition takes the remaining space")]
    NoRemaining,

    #[error("only the last partition may take the remaining space, not the {0} partition")]
    RemainingNotLast(PartitionRole),

    #[error("the {0} role is used by more than one partition")]
    DuplicateRole(PartitionRole),

    #[error("the {0} partition would be empty")]
    ZeroSize(PartitionRole),

    #[error("disk holds {}, the layout needs at least {}", human(.available), human(.required))]
    DiskTooSmall { required: u64, available: u64 },
}

fn human(bytes: &u64) -> String {
    format_size(*bytes)
}

/// How large a partition should be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionSize {
    /// A fixed number of bytes, rounded up to a whole MiB
    Fixed(u64),
    /// As large as the installed memory, so the system can hibernate into it
    Ram,
    /// Whatever is left at the end of the disk
    Remaining,
}

impl fmt::Display for PartitionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(bytes) => f.write_str(&format_size(*bytes)),
            Self::Ram => f.write_str("ram"),
            Self::Remaining => f.write_str("remaining"),
        }
    }
}

/// A requested partition
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionSpec {
    pub role: PartitionRole,
    pub size: PartitionSize,
    pub partition_type: PartitionTypeGuid,
    pub filesystem: Option<Filesystem>,
}

impl PartitionSpec {
    /// 1 GiB EFI system partition, swap the size of RAM, the rest for root
    pub fn default_layout() -> Vec<Self> {
        vec![
            Self {
                role: PartitionRole::Boot,
                size: PartitionSize::Fixed(StorageUnit::Gibibytes.bytes()),
                partition_type: PartitionTypeGuid::EfiSystemPartition,
                filesystem: Some(Filesystem::fat32("BOOT")),
            },
            Self {
                role: PartitionRole::Swap,
                size: PartitionSize::Ram,
                partition_type: PartitionTypeGuid::LinuxSwap,
                filesystem: Some(Filesystem::standard(StandardFilesystemType::Swap, None)),
            },
            Self {
                role: PartitionRole::Root,
                size: PartitionSize::Remaining,
                partition_type: PartitionTypeGuid::LinuxFilesystem,
                filesystem: Some(Filesystem::standard(StandardFilesystemType::Ext4, Some("root"))),
            },
        ]
    }
}

/// A partition with its final number and size
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPartition {
    /// Partition number, starting at 1
    pub number: u32,
    /// Size in MiB, `None` for the partition that takes the remaining space
    pub size_mib: Option<u64>,
    pub attributes: PartitionAttributes,
}

/// The partition table to write
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    partitions: Vec<PlannedPartition>,
    disk_size: u64,
}

impl Layout {
    /// Resolve `specs` against the installed memory and the disk size, both in bytes
    pub fn plan(specs: &[PartitionSpec], memory: u64, disk_size: u64) -> Result<Self, LayoutError> {
        let (last, rest) = specs.split_last().ok_or(LayoutError::Empty)?;

        if let Some(early) = rest.iter().find(|s| s.size == PartitionSize::Remaining) {
            return Err(LayoutError::RemainingNotLast(early.role));
        }
        if last.size != PartitionSize::Remaining {
            return Err(LayoutError::NoRemaining);
        }

        let mut roles = HashSet::new();
        let mut partitions = Vec::with_capacity(specs.len());
        let mut required_mib = TABLE_OVERHEAD_MIB + MIN_REMAINING_MIB;

        for (spec, number) in specs.iter().zip(1u32..) {
            if !roles.insert(spec.role) {
                return Err(LayoutError::DuplicateRole(spec.role));
            }

            let size_mib = match spec.size {
                PartitionSize::Fixed(bytes) => Some(bytes_to_mib_ceil(bytes)),
                PartitionSize::Ram => Some(bytes_to_mib_ceil(memory)),
                PartitionSize::Remaining => None,
            };
            if size_mib == Some(0) {
                return Err(LayoutError::ZeroSize(spec.role));
            }
            required_mib = required_mib.saturating_add(size_mib.unwrap_or_default());

            partitions.push(PlannedPartition {
                number,
                size_mib,
                attributes: PartitionAttributes::for_role(spec.role, spec.partition_type, spec.filesystem.clone()),
            });
        }

        let required = required_mib.saturating_mul(MIB);
        if required > disk_size {
            return Err(LayoutError::DiskTooSmall {
                required,
                available: disk_size,
            });
        }

        Ok(Self { partitions, disk_size })
    }

    pub fn partitions(&self) -> &[PlannedPartition] {
        &self.partitions
    }

    pub fn disk_size(&self) -> u64 {
        self.disk_size
    }

    /// The partition serving `role`
    pub fn find(&self, role: PartitionRole) -> Option<&PlannedPartition> {
        self.partitions.iter().find(|p| p.attributes.role == role)
    }

    /// Human readable summary, one line per partition
    pub fn describe(&self) -> String {
        let fixed: u64 = self.partitions.iter().filter_map(|p| p.size_mib).sum::<u64>() * MIB;
        let mut offset = MIB;
        let mut lines = Vec::with_capacity(self.partitions.len());

        for partition in &self.partitions {
            let size = match partition.size_mib {
                Some(mib) => mib * MIB,
                None => self.disk_size.saturating_sub(fixed + TABLE_OVERHEAD_MIB * MIB),
            };
            let fs = partition
                .attributes
                .filesystem
                .as_ref()
                .map_or_else(|| "unformatted".to_owned(), ToString::to_string);
            lines.push(format!(
                "  {}: {:<5} {:>9} {:<6} at {} ({})",
                partition.number,
                partition.attributes.role.to_string(),
                format_size(size),
                fs,
                format_position(offset, self.disk_size),
                partition.attributes.table.type_guid,
            ));
            offset += size;
        }

        lines.join("\n")
    }
}
