// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

mod attributes;
pub use attributes::*;
pub mod crypt;
pub use crypt::Luks2Container;
mod formatter;
pub use formatter::*;
mod layout;
pub use layout::*;
mod step;
pub use step::*;
mod teardown;
pub use teardown::*;
mod wipe;
pub use wipe::*;
mod writer;
pub use writer::*;

/// Columns shown when listing block devices
pub const LSBLK_COLUMNS: &str = "PATH,MODEL,PARTLABEL,FSTYPE,FSVER,SIZE,FSUSE%,FSAVAIL,MOUNTPOINTS";

/// Show the operator the block devices to choose from
pub fn list_disks() -> Step {
    let mut cmd = Command::new("lsblk");
    cmd.args(["-o", LSBLK_COLUMNS]);
    Step::new("Listing block devices", cmd).interactive().tolerate_failure()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_disks() {
        let step = list_disks();
        assert!(step.is_interactive());
        assert!(step.tolerates_failure());
        assert_eq!(
            step.command_line(),
            "lsblk -o PATH,MODEL,PARTLABEL,FSTYPE,FSVER,SIZE,FSUSE%,FSAVAIL,MOUNTPOINTS"
        );
    }
}
