// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

/// Bytes in one mebibyte, the unit partition sizes are handed to `sgdisk` in
pub const MIB: u64 = 1024 * 1024;

/// Format a byte size into a human-readable string with appropriate units
///
/// # Examples
///
/// ```
/// use disks::format_size;
/// assert_eq!(format_size(1500), "1.5KiB");
/// assert_eq!(format_size(1500000), "1.4MiB");
/// ```
pub fn format_size(size: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    const TB: f64 = GB * 1024.0;

    let size = size as f64;
    if size >= TB {
        format!("{:.1}TiB", size / TB)
    } else if size >= GB {
        format!("{:.1}GiB", size / GB)
    } else if size >= MB {
        format!("{:.1}MiB", size / MB)
    } else if size >= KB {
        format!("{:.1}KiB", size / KB)
    } else {
        format!("{size}B")
    }
}

/// Format a disk position as both a percentage and absolute size
///
/// # Examples
///
/// ```
/// use disks::format_position;
/// let total = 1000;
/// assert_eq!(format_position(500, total), "50% (500B)");
/// ```
pub fn format_position(pos: u64, total: u64) -> String {
    if total == 0 {
        return format!("?% ({})", format_size(pos));
    }
    format!("{}% ({})", (pos as f64 / total as f64 * 100.0) as u64, format_size(pos))
}

/// Whole mebibytes needed to hold `bytes`, rounding any remainder up
///
/// ```
/// use disks::bytes_to_mib_ceil;
/// assert_eq!(bytes_to_mib_ceil(1024 * 1024), 1);
/// assert_eq!(bytes_to_mib_ceil(1024 * 1024 + 1), 2);
/// assert_eq!(bytes_to_mib_ceil(0), 0);
/// ```
pub fn bytes_to_mib_ceil(bytes: u64) -> u64 {
    bytes.div_ceil(MIB)
}
