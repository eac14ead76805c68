// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use kdl::KdlNode;
use partitioning::{PartitionSize, PartitionSpec};

use crate::{
    Context, Filesystem, FromKdlProperty, FromKdlType, PartitionRole, PartitionTypeGuid, PartitionTypeKDL,
    get_kdl_entry, get_kdl_property, kdl_value_to_storage_size,
};

/// Command to add a partition to the layout
#[derive(Debug)]
pub struct Command {
    /// What the partition is used for
    pub role: PartitionRole,

    /// Requested size
    pub size: PartitionSize,

    /// The GUID of the partition type
    pub partition_type: Option<PartitionTypeGuid>,

    /// The filesystem to format the partition with
    pub filesystem: Option<Filesystem>,
}

impl Command {
    pub fn into_spec(self) -> PartitionSpec {
        let partition_type = self.partition_type.unwrap_or(match self.role {
            PartitionRole::Boot => PartitionTypeGuid::EfiSystemPartition,
            PartitionRole::Swap => PartitionTypeGuid::LinuxSwap,
            PartitionRole::Root => PartitionTypeGuid::LinuxFilesystem,
        });
        PartitionSpec {
            role: self.role,
            size: self.size,
            partition_type,
            filesystem: self.filesystem,
        }
    }
}

/// `size (GiB)4`, `size "ram"` or `size "remaining"`
fn parse_size(node: &KdlNode) -> Result<PartitionSize, crate::Error> {
    let entry = get_kdl_entry(node, &0)?;
    match entry.value().as_string() {
        Some("ram") => Ok(PartitionSize::Ram),
        Some("remaining") => Ok(PartitionSize::Remaining),
        Some(_) => Err(crate::UnsupportedValue {
            at: entry.span(),
            advice: Some("use a size such as (GiB)4, or \"ram\" or \"remaining\"".into()),
        }
        .into()),
        None => Ok(PartitionSize::Fixed(kdl_value_to_storage_size(entry)?)),
    }
}

/// Generate a command to add a partition
pub(crate) fn parse(context: Context<'_>) -> Result<super::Command, crate::Error> {
    let role = PartitionRole::from_kdl_property(get_kdl_property(context.node, "role")?)?;

    let mut size = PartitionSize::Remaining;
    let mut partition_type = None;
    let mut filesystem = None;

    for child in context.node.iter_children() {
        match child.name().value() {
            "size" => size = parse_size(child)?,
            "type" => {
                partition_type = match PartitionTypeKDL::from_kdl_type(get_kdl_entry(child, &0)?)? {
                    PartitionTypeKDL::GUID => Some(PartitionTypeGuid::from_kdl_node(child)?),
                }
            }
            "filesystem" => filesystem = Some(Filesystem::from_kdl_node(child)?),
            _ => {
                return Err(crate::UnsupportedNode {
                    at: child.span(),
                    name: child.name().value().into(),
                }
                .into());
            }
        }
    }

    if size == PartitionSize::Fixed(0) {
        return Err(crate::InvalidArguments {
            at: context.node.span(),
            advice: Some(format!("the {role} partition needs a size above zero")),
        }
        .into());
    }

    Ok(super::Command::Partition(Box::new(Command {
        role,
        size,
        partition_type,
        filesystem,
    })))
}
