// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{fmt, str::FromStr};

#[cfg(feature = "kdl")]
use crate::{get_kdl_entry, kdl_value_to_integer, kdl_value_to_string};

#[cfg(feature = "kdl")]
use super::FromKdlProperty;
#[cfg(feature = "kdl")]
use uuid::Uuid;

/// The filesystem information for a partition
/// This is used to format the partition with a filesystem
#[derive(Debug, Clone, PartialEq)]
pub enum Filesystem {
    Fat32 {
        label: Option<String>,
        volume_id: Option<u32>,
    },
    Standard {
        filesystem_type: StandardFilesystemType,
        label: Option<String>,
        uuid: Option<String>,
    },
}

impl Filesystem {
    /// A FAT32 filesystem with the given label
    pub fn fat32(label: &str) -> Self {
        Self::Fat32 {
            label: Some(label.to_owned()),
            volume_id: None,
        }
    }

    /// A non-FAT filesystem with an optional label
    pub fn standard(filesystem_type: StandardFilesystemType, label: Option<&str>) -> Self {
        Self::Standard {
            filesystem_type,
            label: label.map(str::to_owned),
            uuid: None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Fat32 { label, .. } | Self::Standard { label, .. } => label.as_deref(),
        }
    }

    pub fn is_swap(&self) -> bool {
        matches!(
            self,
            Self::Standard {
                filesystem_type: StandardFilesystemType::Swap,
                ..
            }
        )
    }
}

impl fmt::Display for Filesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fat32 { .. } => f.write_str("fat32"),
            Self::Standard { filesystem_type, .. } => filesystem_type.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFilesystemType {
    Btrfs,
    F2fs,
    Ext4,
    Xfs,
    Swap,
}

impl fmt::Display for StandardFilesystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Btrfs => f.write_str("btrfs"),
            Self::Ext4 => f.write_str("ext4"),
            Self::F2fs => f.write_str("f2fs"),
            Self::Xfs => f.write_str("xfs"),
            Self::Swap => f.write_str("swap"),
        }
    }
}

impl FromStr for StandardFilesystemType {
    type Err = crate::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "btrfs" => Ok(Self::Btrfs),
            "ext4" => Ok(Self::Ext4),
            "f2fs" => Ok(Self::F2fs),
            "xfs" => Ok(Self::Xfs),
            "swap" => Ok(Self::Swap),
            _ => Err(crate::Error::UnknownVariant(value.to_owned())),
        }
    }
}

#[cfg(feature = "kdl")]
impl FromKdlProperty<'_> for StandardFilesystemType {
    fn from_kdl_property(entry: &kdl::KdlEntry) -> Result<Self, crate::Error> {
        let value = kdl_value_to_string(entry)?;
        let v = value.parse().map_err(|_| crate::UnsupportedValue {
            at: entry.span(),
            advice: Some("'fat32', 'btrfs', 'ext4', 'f2fs', 'xfs' and 'swap' are supported".into()),
        })?;
        Ok(v)
    }
}

#[cfg(feature = "kdl")]
impl Filesystem {
    pub fn from_kdl_node(node: &kdl::KdlNode) -> Result<Self, crate::Error> {
        let mut fs_type = None;
        let mut label = None;
        let mut uuid = None;
        let mut volume_id = None;

        for entry in node.iter_children() {
            match entry.name().value() {
                "type" => fs_type = Some(get_kdl_entry(entry, &0)?),
                "label" => label = Some(kdl_value_to_string(get_kdl_entry(entry, &0)?)?),
                "uuid" => {
                    let value = get_kdl_entry(entry, &0)?;
                    let parsed = Uuid::parse_str(&kdl_value_to_string(value)?).map_err(|_| crate::UnsupportedValue {
                        at: value.span(),
                        advice: Some("expected a UUID such as 5b7c1f9e-3a3d-4c8e-9f3b-0d2f6a1e7c44".into()),
                    })?;
                    uuid = Some(parsed.hyphenated().to_string());
                }
                "volume_id" => {
                    let value = get_kdl_entry(entry, &0)?;
                    volume_id = Some(u32::try_from(kdl_value_to_integer(value)?).map_err(|_| {
                        crate::UnsupportedValue {
                            at: value.span(),
                            advice: Some("volume_id must fit in 32 bits".into()),
                        }
                    })?);
                }
                _ => {
                    return Err(crate::UnsupportedNode {
                        at: entry.span(),
                        name: entry.name().value().into(),
                    }
                    .into());
                }
            }
        }

        let fs_type = fs_type.ok_or_else(|| crate::MissingEntry {
            at: node.span(),
            id: "type".into(),
            advice: Some("add a child node such as type \"ext4\"".into()),
        })?;

        if kdl_value_to_string(fs_type)? == "fat32" {
            if uuid.is_some() {
                return Err(crate::InvalidArguments {
                    at: node.span(),
                    advice: Some("FAT32 does not support UUID, use volume_id".into()),
                }
                .into());
            }
            return Ok(Filesystem::Fat32 { label, volume_id });
        }

        let filesystem_type = StandardFilesystemType::from_kdl_property(fs_type)?;
        if volume_id.is_some() {
            return Err(crate::InvalidArguments {
                at: node.span(),
                advice: Some(format!("volume_id is only supported for FAT32, not {filesystem_type}")),
            }
            .into());
        }
        Ok(Filesystem::Standard {
            filesystem_type,
            label,
            uuid,
        })
    }
}
