// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{fmt, str::FromStr};

use gpt::partition_types::{self, Type as GptPartitionType};
use phf::phf_map;

#[cfg(feature = "kdl")]
use crate::{FromKdlType, UnsupportedValue, get_kdl_entry, kdl_value_to_string};

/// Type annotations accepted on a partition `type` node
#[cfg(feature = "kdl")]
pub enum PartitionTypeKDL {
    GUID,
}

#[cfg(feature = "kdl")]
impl<'a> FromKdlType<'a> for PartitionTypeKDL {
    fn from_kdl_type(id: &'a kdl::KdlEntry) -> Result<Self, crate::Error> {
        match id.ty().map(|ty| ty.value().to_lowercase()).as_deref() {
            Some("guid") => Ok(Self::GUID),
            _ => Err(UnsupportedValue {
                at: id.span(),
                advice: Some("annotate the type as (GUID)\"...\"".into()),
            }
            .into()),
        }
    }
}

/// GPT partition types a layout may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionTypeGuid {
    EfiSystemPartition,
    ExtendedBootLoader,
    LinuxSwap,
    LinuxFilesystem,
}

static NAMES: phf::Map<&'static str, PartitionTypeGuid> = phf_map! {
    "efi-system-partition" => PartitionTypeGuid::EfiSystemPartition,
    "linux-extended-boot" => PartitionTypeGuid::ExtendedBootLoader,
    "linux-swap" => PartitionTypeGuid::LinuxSwap,
    "linux-fs" => PartitionTypeGuid::LinuxFilesystem,
};

impl fmt::Display for PartitionTypeGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EfiSystemPartition => "EFI System Partition",
            Self::ExtendedBootLoader => "Linux Extended Boot",
            Self::LinuxFilesystem => "Linux Filesystem",
            Self::LinuxSwap => "Linux Swap",
        })
    }
}

impl FromStr for PartitionTypeGuid {
    type Err = crate::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        NAMES
            .get(value)
            .copied()
            .ok_or_else(|| crate::Error::UnknownVariant(value.to_owned()))
    }
}

impl PartitionTypeGuid {
    pub fn as_guid(&self) -> GptPartitionType {
        match self {
            Self::EfiSystemPartition => partition_types::EFI,
            Self::ExtendedBootLoader => partition_types::FREEDESK_BOOT,
            Self::LinuxSwap => partition_types::LINUX_SWAP,
            Self::LinuxFilesystem => partition_types::LINUX_FS,
        }
    }

    /// The type GUID in the upper-case hyphenated form `sgdisk --typecode` accepts
    pub fn typecode(&self) -> String {
        self.as_guid().guid.hyphenated().to_string().to_uppercase()
    }

    /// Parse the `(GUID)"name"` argument of a `type` node
    #[cfg(feature = "kdl")]
    pub fn from_kdl_node(node: &kdl::KdlNode) -> Result<Self, crate::Error> {
        let entry = get_kdl_entry(node, &0)?;
        kdl_value_to_string(entry)?.parse().map_err(|_| {
            UnsupportedValue {
                at: entry.span(),
                advice: Some(format!(
                    "supported types: {}",
                    NAMES.keys().copied().collect::<Vec<_>>().join(", ")
                )),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typecodes() {
        assert_eq!(
            PartitionTypeGuid::EfiSystemPartition.typecode(),
            "C12A7328-F81F-11D2-BA4B-00A0C93EC93B"
        );
        assert_eq!(
            PartitionTypeGuid::LinuxSwap.typecode(),
            "0657FD6D-A4AB-43C4-84E5-0933C84B4F4F"
        );
        assert_eq!(
            PartitionTypeGuid::LinuxFilesystem.typecode(),
            "0FC63DAF-8483-4772-8E79-3D69D8477DE4"
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "linux-swap".parse::<PartitionTypeGuid>().unwrap(),
            PartitionTypeGuid::LinuxSwap
        );
        assert!(matches!(
            "ntfs".parse::<PartitionTypeGuid>(),
            Err(crate::Error::UnknownVariant(v)) if v == "ntfs"
        ));
    }
}
