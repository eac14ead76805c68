// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Checks made before anything is asked or touched

use std::{
    collections::BTreeSet,
    env, fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use nix::unistd::Uid;
use partitioning::FilesystemExt;
use provisioning::Config;
use types::WipeMode;

/// Programs the run with `config` will invoke
pub fn required_tools(config: &Config) -> BTreeSet<String> {
    let mut tools: BTreeSet<String> = ["lsblk", "wipefs", "sgdisk", "partprobe", "cryptsetup"]
        .into_iter()
        .map(str::to_owned)
        .collect();

    // The mode may still be picked interactively
    if config.wipe != Some(WipeMode::Normal) {
        tools.insert("ddrescue".to_owned());
    }

    tools.extend(
        config
            .partitions
            .iter()
            .filter_map(|p| p.filesystem.as_ref())
            .map(|fs| fs.mkfs_command().to_owned()),
    );
    tools
}

/// Locate an executable `binary` in the directories of `path_env`
pub fn find_executable(binary: &str, path_env: &str) -> Option<PathBuf> {
    env::split_paths(path_env)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(binary))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

/// Tools from `tools` that cannot be found on `path_env`
pub fn missing_tools<'a>(tools: impl IntoIterator<Item = &'a String>, path_env: &str) -> Vec<String> {
    tools
        .into_iter()
        .filter(|tool| find_executable(tool, path_env).is_none())
        .cloned()
        .collect()
}

pub fn is_root() -> bool {
    Uid::effective().is_root()
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use partitioning::PartitionSpec;
    use types::{Filesystem, StandardFilesystemType};

    use super::*;

    fn touch(dir: &Path, name: &str, mode: u32) {
        let path = dir.join(name);
        File::create(&path).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn test_required_tools() {
        let tools = required_tools(&Config::default());
        for tool in ["lsblk", "sgdisk", "ddrescue", "mkfs.fat", "mkswap", "mkfs.ext4"] {
            assert!(tools.contains(tool), "{tool}");
        }

        let mut specs = PartitionSpec::default_layout();
        specs[2].filesystem = Some(Filesystem::standard(StandardFilesystemType::Xfs, None));
        let config = Config {
            partitions: specs,
            wipe: Some(WipeMode::Normal),
            ..Config::default()
        };
        let tools = required_tools(&config);
        assert!(!tools.contains("ddrescue"));
        assert!(!tools.contains("mkfs.ext4"));
        assert!(tools.contains("mkfs.xfs"));
    }

    #[test_log::test]
    fn test_missing_tools() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        touch(first.path(), "sgdisk", 0o755);
        touch(second.path(), "wipefs", 0o755);
        touch(second.path(), "lsblk", 0o644);

        let path_env = env::join_paths([first.path(), second.path()]).unwrap();
        let path_env = path_env.to_str().unwrap();

        assert_eq!(find_executable("wipefs", path_env), Some(second.path().join("wipefs")));

        let tools = ["sgdisk", "wipefs", "lsblk", "partprobe"].map(String::from);
        assert_eq!(missing_tools(&tools, path_env), vec!["lsblk", "partprobe"]);
    }
}
