// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Physical memory size, used to size the swap partition

use std::{fs, io, path::Path};

/// Total physical memory in bytes according to a meminfo-formatted file
pub fn total_memory_from(path: &Path) -> io::Result<u64> {
    let contents = fs::read_to_string(path)?;
    parse_meminfo(&contents).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("no MemTotal entry in {}", path.display()),
        )
    })
}

/// Extract `MemTotal` from meminfo text, in bytes
///
/// The kernel reports the value in kibibytes even though it labels them `kB`.
pub fn parse_meminfo(contents: &str) -> Option<u64> {
    let line = contents.lines().find(|l| l.starts_with("MemTotal:"))?;
    let mut fields = line["MemTotal:".len()..].split_whitespace();
    let value: u64 = fields.next()?.parse().ok()?;
    let multiplier = match fields.next() {
        Some("kB") | Some("KiB") => 1024,
        None => 1,
        Some(other) => {
            log::warn!("Unexpected MemTotal unit {other:?}");
            return None;
        }
    };
    value.checked_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "MemTotal:       16303468 kB\nMemFree:         1284176 kB\nMemAvailable:    9635520 kB\n";

    #[test]
    fn test_parse_meminfo() {
        assert_eq!(parse_meminfo(SAMPLE), Some(16303468 * 1024));
    }

    #[test]
    fn test_parse_meminfo_missing() {
        assert_eq!(parse_meminfo("MemFree: 12 kB\n"), None);
        assert_eq!(parse_meminfo("MemTotal: lots kB\n"), None);
        assert_eq!(parse_meminfo("MemTotal: 12 pages\n"), None);
    }

    #[test_log::test]
    fn test_total_memory_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meminfo");
        fs::write(&path, SAMPLE).unwrap();
        assert_eq!(total_memory_from(&path).unwrap(), 16303468 * 1024);

        fs::write(&path, "SwapTotal: 0 kB\n").unwrap();
        let err = total_memory_from(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
