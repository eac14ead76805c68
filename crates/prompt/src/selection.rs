// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use disks::DevicePath;

/// The outcome of one disk selection session
///
/// Created per session and handed to the caller; nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSelection {
    /// The line the operator typed, without its line terminator
    pub raw_input: String,
    /// Whether `raw_input` is an acceptable whole-disk path
    pub validated: bool,
    /// Whether the operator confirmed the selection
    pub confirmed: bool,
}

impl DeviceSelection {
    /// The validated device, if the input was accepted
    pub fn device(&self) -> Option<DevicePath> {
        if self.validated {
            DevicePath::parse(&self.raw_input).ok()
        } else {
            None
        }
    }
}

/// A reply to a yes/no question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// Anything other than a single `y` or `n`
    Other,
}

impl Answer {
    pub fn parse(line: &str) -> Self {
        if line.eq_ignore_ascii_case("y") {
            Self::Yes
        } else if line.eq_ignore_ascii_case("n") {
            Self::No
        } else {
            Self::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers() {
        assert_eq!(Answer::parse("y"), Answer::Yes);
        assert_eq!(Answer::parse("Y"), Answer::Yes);
        assert_eq!(Answer::parse("n"), Answer::No);
        assert_eq!(Answer::parse("N"), Answer::No);
        for other in ["", "yes", "YES", " y", "y ", "yy", "no", "1"] {
            assert_eq!(Answer::parse(other), Answer::Other, "{other:?}");
        }
    }

    #[test]
    fn test_selection_device() {
        let selection = DeviceSelection {
            raw_input: "/dev/nvme0n1".into(),
            validated: true,
            confirmed: false,
        };
        assert_eq!(selection.device().unwrap().as_str(), "/dev/nvme0n1");

        let rejected = DeviceSelection {
            raw_input: "/dev/sda1".into(),
            validated: false,
            confirmed: false,
        };
        assert_eq!(rejected.device(), None);
    }
}
