// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use types::{Filesystem, PartitionRole, PartitionTypeGuid};

/// Represents the table attributes of a GPT partition
#[derive(Debug, Clone, PartialEq)]
pub struct GptAttributes {
    /// The type GUID that identifies the partition type
    pub type_guid: PartitionTypeGuid,
    /// Partition name (PARTLABEL)
    pub name: String,
}

/// Represents the attributes of a partition
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionAttributes {
    pub table: GptAttributes,
    pub role: PartitionRole,
    pub filesystem: Option<Filesystem>,
}

impl PartitionAttributes {
    /// Attributes named after the role, as the partition labels `lsblk` shows
    pub fn for_role(role: PartitionRole, type_guid: PartitionTypeGuid, filesystem: Option<Filesystem>) -> Self {
        Self {
            table: GptAttributes {
                type_guid,
                name: role.to_string(),
            },
            role,
            filesystem,
        }
    }
}
