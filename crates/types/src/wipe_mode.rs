// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{fmt, str::FromStr};

use phf::phf_map;

#[cfg(feature = "kdl")]
use crate::{FromKdlProperty, UnsupportedValue, kdl_value_to_string};

/// How thoroughly the target disk is erased before partitioning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipeMode {
    /// Overwrite the whole device through a throwaway random-key dm-crypt mapping
    Secure,
    /// Only erase signatures and partition table metadata
    Normal,
}

static ALIASES: phf::Map<&'static str, WipeMode> = phf_map! {
    "secure" => WipeMode::Secure,
    "s" => WipeMode::Secure,
    "normal" => WipeMode::Normal,
    "n" => WipeMode::Normal,
};

impl fmt::Display for WipeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secure => f.write_str("Secure"),
            Self::Normal => f.write_str("Normal"),
        }
    }
}

impl FromStr for WipeMode {
    type Err = crate::Error;

    /// Case-insensitive, accepts the full name or its first letter
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ALIASES
            .get(value.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| crate::Error::UnknownVariant(value.to_owned()))
    }
}

#[cfg(feature = "kdl")]
impl FromKdlProperty<'_> for WipeMode {
    fn from_kdl_property(entry: &kdl::KdlEntry) -> Result<Self, crate::Error> {
        let value = kdl_value_to_string(entry)?;
        let v = value.parse().map_err(|_| UnsupportedValue {
            at: entry.span(),
            advice: Some("'secure' and 'normal' are supported".into()),
        })?;
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::WipeMode;

    #[test]
    fn test_parse_wipe_mode() {
        for (input, expected) in [
            ("Secure", WipeMode::Secure),
            ("SECURE", WipeMode::Secure),
            ("s", WipeMode::Secure),
            ("normal", WipeMode::Normal),
            ("N", WipeMode::Normal),
        ] {
            assert_eq!(input.parse::<WipeMode>().unwrap(), expected, "parsing {input}");
        }

        assert!("".parse::<WipeMode>().is_err());
        assert!("shred".parse::<WipeMode>().is_err());
    }
}
