// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{fmt, str::FromStr};

#[cfg(feature = "kdl")]
use crate::{FromKdlProperty, UnsupportedValue, kdl_value_to_string};

/// The purpose a partition serves in the installed system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionRole {
    /// EFI system partition, mounted at `/boot`
    Boot,
    /// Swap space
    Swap,
    /// Root filesystem
    Root,
}

impl fmt::Display for PartitionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boot => f.write_str("boot"),
            Self::Swap => f.write_str("swap"),
            Self::Root => f.write_str("root"),
        }
    }
}

impl FromStr for PartitionRole {
    type Err = crate::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "boot" => Ok(Self::Boot),
            "swap" => Ok(Self::Swap),
            "root" => Ok(Self::Root),
            _ => Err(crate::Error::UnknownVariant(value.to_owned())),
        }
    }
}

#[cfg(feature = "kdl")]
impl FromKdlProperty<'_> for PartitionRole {
    fn from_kdl_property(entry: &kdl::KdlEntry) -> Result<Self, crate::Error> {
        let value = kdl_value_to_string(entry)?;
        let v = value.parse().map_err(|_| UnsupportedValue {
            at: entry.span(),
            advice: Some("'boot', 'swap' and 'root' are supported".into()),
        })?;
        Ok(v)
    }
}
