// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{fmt, str::FromStr};

use phf::phf_map;

#[cfg(feature = "kdl")]
use crate::{FromKdlType, UnsupportedValue};

/// Storage units, valued in bytes
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageUnit {
    Bytes = 1,
    Kilobytes = 1000,
    Kibibytes = 1024,
    Megabytes = 1000 * 1000,
    Mebibytes = 1024 * 1024,
    Gigabytes = 1000 * 1000 * 1000,
    Gibibytes = 1024 * 1024 * 1024,
    Terabytes = 1000 * 1000 * 1000 * 1000,
    Tebibytes = 1024 * 1024 * 1024 * 1024,
}

static UNITS: phf::Map<&'static str, StorageUnit> = phf_map! {
    "b" => StorageUnit::Bytes,
    "kb" => StorageUnit::Kilobytes,
    "kib" => StorageUnit::Kibibytes,
    "mb" => StorageUnit::Megabytes,
    "mib" => StorageUnit::Mebibytes,
    "gb" => StorageUnit::Gigabytes,
    "gib" => StorageUnit::Gibibytes,
    "tb" => StorageUnit::Terabytes,
    "tib" => StorageUnit::Tebibytes,
};

impl StorageUnit {
    /// Number of bytes in one of this unit
    pub fn bytes(self) -> u64 {
        self as u64
    }
}

impl fmt::Display for StorageUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bytes => "B",
            Self::Kilobytes => "KB",
            Self::Kibibytes => "KiB",
            Self::Megabytes => "MB",
            Self::Mebibytes => "MiB",
            Self::Gigabytes => "GB",
            Self::Gibibytes => "GiB",
            Self::Terabytes => "TB",
            Self::Tebibytes => "TiB",
        })
    }
}

impl FromStr for StorageUnit {
    type Err = crate::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        UNITS
            .get(value.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| crate::Error::UnknownVariant(value.to_owned()))
    }
}

#[cfg(feature = "kdl")]
impl<'a> FromKdlType<'a> for StorageUnit {
    fn from_kdl_type(id: &'a kdl::KdlEntry) -> Result<Self, crate::Error> {
        let Some(ty) = id.ty() else {
            return Ok(Self::Bytes);
        };

        let v = ty.value().parse().map_err(|_| UnsupportedValue {
            at: id.span(),
            advice: Some("'B', 'KiB', 'MiB', 'GiB', 'TiB' and their decimal forms are supported".into()),
        })?;
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!("MiB".parse::<StorageUnit>().unwrap(), StorageUnit::Mebibytes);
        assert_eq!("gib".parse::<StorageUnit>().unwrap(), StorageUnit::Gibibytes);
        assert_eq!("GB".parse::<StorageUnit>().unwrap(), StorageUnit::Gigabytes);
        assert!("sectors".parse::<StorageUnit>().is_err());
    }

    #[test]
    fn test_unit_values() {
        assert_eq!(StorageUnit::Mebibytes.bytes(), 1_048_576);
        assert_eq!(StorageUnit::Tebibytes.bytes(), 1 << 40);
        assert_eq!(StorageUnit::Kilobytes.to_string(), "KB");
    }
}
