// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{
    env,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use clap::Parser as _;
use disks::{DevicePath, InvalidDevice, memory::total_memory_from};
use miette::Diagnostic;
use partitioning::{
    DiskWriter, DryRun, Executor, Formatter, Layout, LayoutError, Luks2Container, StepError, System, Teardown,
    Wiper, WriteError, crypt::ROOT_MAPPING, list_disks,
};
use prompt::{Prompt, PromptError};
use provisioning::{Config, LoadError, Parser};
use thiserror::Error;
use types::{PartitionRole, WipeMode};

mod cli;
mod preflight;

use cli::Cli;

/// Memory statistics, relative to the system root
const MEMINFO: &str = "proc/meminfo";

#[derive(Debug, Diagnostic, Error)]
enum Error {
    #[diagnostic(transparent)]
    #[error(transparent)]
    Config(#[from] LoadError),

    #[error("disk preparation must be run as root")]
    #[diagnostic(help("re-run with sudo, or pass --dry-run to only see the commands"))]
    NotRoot,

    #[error("required tools not found on PATH: {}", .0.join(", "))]
    MissingTools(Vec<String>),

    #[error(transparent)]
    Device(#[from] InvalidDevice),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("failed to read the size of {device}")]
    DiskSize {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read the installed memory")]
    Memory(#[source] io::Error),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("encryption needs a root partition in the layout")]
    NoRootPartition,

    #[error(transparent)]
    Step(#[from] StepError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Everything decided before the disk is touched
struct Plan {
    device: DevicePath,
    mode: WipeMode,
    layout: Layout,
    encrypt_root: bool,
    unmount: Vec<PathBuf>,
}

fn disk_size(device: &DevicePath, sysroot: &Path) -> Result<u64, Error> {
    device.size_in_bytes_at(sysroot).map_err(|source| Error::DiskSize {
        device: device.to_string(),
        source,
    })
}

impl Plan {
    /// Teardown, wipe, partition, encrypt and format, in that order
    fn apply<E: Executor>(&self, executor: &mut E, current_size: u64) -> Result<(), Error> {
        Teardown::new(self.unmount.iter()).run(executor)?;

        Wiper::new(&self.device, self.mode)
            .with_size(self.layout.disk_size())
            .run(executor)?;

        DiskWriter::new(&self.device, &self.layout).write(executor, current_size)?;

        let mut root_target = None;
        if self.encrypt_root {
            let root = self.layout.find(PartitionRole::Root).ok_or(Error::NoRootPartition)?;
            let container = Luks2Container::new(self.device.partition(root.number), ROOT_MAPPING);
            executor.execute_all(container.steps())?;
            root_target = Some(container.mapped_path());
        }

        for partition in self.layout.partitions() {
            let Some(filesystem) = &partition.attributes.filesystem else {
                continue;
            };
            let target = match (&root_target, partition.attributes.role) {
                (Some(mapped), PartitionRole::Root) => mapped.clone(),
                _ => self.device.partition(partition.number),
            };
            executor.execute(Formatter::new(filesystem.clone()).force().step(&target))?;
        }

        Ok(())
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, Error> {
    match path {
        Some(path) => Ok(Parser::new_for_path(path)?.config),
        None => Ok(Config::default()),
    }
}

fn check_system(cli: &Cli, config: &Config) -> Result<(), Error> {
    if !cli.dry_run && !preflight::is_root() {
        return Err(Error::NotRoot);
    }

    let path_env = env::var("PATH").unwrap_or_default();
    let missing = preflight::missing_tools(&preflight::required_tools(config), &path_env);
    if missing.is_empty() {
        Ok(())
    } else if cli.dry_run {
        log::warn!("Not found on PATH: {}", missing.join(", "));
        Ok(())
    } else {
        Err(Error::MissingTools(missing))
    }
}

/// Select, confirm and prepare a disk
///
/// Returns `false` when the operator declined and the disk was left alone.
fn session<R: BufRead, W: Write, E: Executor>(
    device: Option<&str>,
    config: Config,
    prompt: &mut Prompt<R, W>,
    executor: &mut E,
    sysroot: &Path,
) -> Result<bool, Error> {
    let device = match device {
        Some(path) => {
            let device = DevicePath::parse(path)?;
            if !prompt.confirm_device(&device)?.confirmed {
                log::info!("{device} was not confirmed, nothing was changed");
                return Ok(false);
            }
            device
        }
        None => DevicePath::parse(&prompt.run()?.raw_input)?,
    };

    let mode = match config.wipe {
        Some(mode) => mode,
        None => prompt.select_wipe_mode()?,
    };

    let planned_size = disk_size(&device, sysroot)?;
    let memory = total_memory_from(&sysroot.join(MEMINFO)).map_err(Error::Memory)?;
    let layout = Layout::plan(&config.partitions, memory, planned_size)?;

    println!("\nNew layout of {} {device}:\n{}\n", device.kind(), layout.describe());

    let question = format!(
        "Wipe {device} ({mode}) and write {} partitions?",
        layout.partitions().len()
    );
    if !prompt.confirm(&question)? {
        log::info!("Aborted, nothing was changed");
        return Ok(false);
    }

    let plan = Plan {
        device,
        mode,
        layout,
        encrypt_root: config.encrypt_root,
        unmount: config.unmount,
    };
    // Checked against the planned size before anything is written
    let current_size = disk_size(&plan.device, sysroot)?;
    plan.apply(executor, current_size)?;

    Ok(true)
}

fn run(cli: Cli) -> Result<(), Error> {
    let mut config = load_config(cli.config.as_deref())?;
    cli.apply(&mut config);
    check_system(&cli, &config)?;

    if config.encrypt_root && !config.partitions.iter().any(|p| p.role == PartitionRole::Root) {
        return Err(Error::NoRootPartition);
    }

    // Read-only, so it runs for real even in a dry run
    System.execute(list_disks())?;

    let mut prompt = Prompt::stdio().with_max_attempts(config.prompt_attempts);
    let device = cli.device.as_deref();
    let sysroot = Path::new("/");

    if cli.dry_run {
        let mut executor = DryRun::new();
        if session(device, config, &mut prompt, &mut executor, sysroot)? {
            log::info!("Dry run complete, {} commands would have run", executor.recorded.len());
        }
    } else if session(device, config, &mut prompt, &mut System, sysroot)? {
        log::info!("Disk is ready");
    }

    Ok(())
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    run(cli)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{fs, io::Cursor};

    use disks::MIB;
    use partitioning::PartitionSpec;

    use super::*;

    const GIB: u64 = 1024 * MIB;

    fn plan(device: &str, mode: WipeMode, encrypt_root: bool) -> Plan {
        Plan {
            device: device.parse().unwrap(),
            mode,
            layout: Layout::plan(&PartitionSpec::default_layout(), 4 * GIB, 128 * GIB).unwrap(),
            encrypt_root,
            unmount: vec![PathBuf::from("/mnt")],
        }
    }

    #[test_log::test]
    fn test_dry_run_normal() {
        let mut executor = DryRun::new();
        plan("/dev/sda", WipeMode::Normal, false)
            .apply(&mut executor, 128 * GIB)
            .unwrap();

        assert_eq!(
            executor.recorded,
            vec![
                "umount --force --lazy /mnt",
                "cryptsetup close cleanit",
                "cryptsetup close root",
                "wipefs --all --force /dev/sda",
                "sgdisk --zap-all /dev/sda",
                "sgdisk --clear /dev/sda",
                "sgdisk --new=1:0:+1024M --typecode=1:C12A7328-F81F-11D2-BA4B-00A0C93EC93B --change-name=1:boot /dev/sda",
                "sgdisk --new=2:0:+4096M --typecode=2:0657FD6D-A4AB-43C4-84E5-0933C84B4F4F --change-name=2:swap /dev/sda",
                "sgdisk --new=3:0:0 --typecode=3:0FC63DAF-8483-4772-8E79-3D69D8477DE4 --change-name=3:root /dev/sda",
                "partprobe /dev/sda",
                "mkfs.fat -F 32 -n BOOT /dev/sda1",
                "mkswap -f /dev/sda2",
                "mkfs.ext4 -L root -F /dev/sda3",
            ]
        );
    }

    #[test_log::test]
    fn test_dry_run_secure_encrypted() {
        let mut executor = DryRun::new();
        plan("/dev/nvme0n1", WipeMode::Secure, true)
            .apply(&mut executor, 128 * GIB)
            .unwrap();

        let recorded = &executor.recorded;
        assert!(recorded.contains(&format!("ddrescue --force --size={} /dev/zero /dev/mapper/cleanit", 128 * GIB)));

        let luks = recorded
            .iter()
            .position(|c| c.starts_with("cryptsetup luksFormat"))
            .unwrap();
        assert!(recorded[luks].ends_with("/dev/nvme0n1p3"));
        assert_eq!(recorded[luks + 1], "cryptsetup open --type luks2 /dev/nvme0n1p3 root");
        assert_eq!(recorded[luks + 2], "mkfs.fat -F 32 -n BOOT /dev/nvme0n1p1");
        assert_eq!(recorded.last().unwrap(), "mkfs.ext4 -L root -F /dev/mapper/root");
    }

    #[test]
    fn test_size_change_stops_before_partitioning() {
        let mut executor = DryRun::new();
        let err = plan("/dev/sdb", WipeMode::Normal, false)
            .apply(&mut executor, 64 * GIB)
            .unwrap_err();

        assert!(matches!(err, Error::Write(WriteError::DeviceSizeChanged { .. })));
        assert!(!executor.recorded.iter().any(|c| c.starts_with("sgdisk --new")));
    }

    /// A system root with one disk of `disk_size` bytes and 4 GiB of memory
    fn sysroot(disk: &str, disk_size: u64) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let node = root.path().join(disks::SYSFS_DIR).join(disk);
        fs::create_dir_all(&node).unwrap();
        fs::write(node.join("size"), format!("{}\n", disk_size / 512)).unwrap();
        fs::create_dir_all(root.path().join("proc")).unwrap();
        fs::write(root.path().join(MEMINFO), "MemTotal:        4194304 kB\n").unwrap();
        root
    }

    fn prompt(input: &str) -> Prompt<Cursor<Vec<u8>>, Vec<u8>> {
        Prompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test_log::test]
    fn test_session_declined_at_final_confirmation() {
        let root = sysroot("sda", 128 * GIB);
        let mut prompt = prompt("/dev/sda\ny\nnormal\nn\n");
        let mut executor = DryRun::new();

        let applied = session(None, Config::default(), &mut prompt, &mut executor, root.path()).unwrap();

        assert!(!applied);
        assert!(executor.recorded.is_empty());
        let out = String::from_utf8(prompt.into_inner().1).unwrap();
        assert!(out.contains("Wipe /dev/sda (Normal) and write 3 partitions? [y/n]: "));
    }

    #[test_log::test]
    fn test_session_device_argument_declined() {
        let root = sysroot("sdb", 128 * GIB);
        let mut prompt = prompt("n\n");
        let mut executor = DryRun::new();

        let applied = session(Some("/dev/sdb"), Config::default(), &mut prompt, &mut executor, root.path()).unwrap();

        assert!(!applied);
        assert!(executor.recorded.is_empty());
        let out = String::from_utf8(prompt.into_inner().1).unwrap();
        assert!(out.contains("Selected SSD disk: /dev/sdb"));
        assert!(!out.contains("Wipe mode"));
    }

    #[test_log::test]
    fn test_session_device_argument_confirmed() {
        let root = sysroot("nvme0n1", 128 * GIB);
        let mut prompt = prompt("y\nsecure\ny\n");
        let mut executor = DryRun::new();

        let applied = session(
            Some("/dev/nvme0n1"),
            Config::default(),
            &mut prompt,
            &mut executor,
            root.path(),
        )
        .unwrap();

        assert!(applied);
        assert_eq!(executor.recorded.first().unwrap(), "umount --force --lazy /mnt");
        assert!(
            executor
                .recorded
                .contains(&format!("ddrescue --force --size={} /dev/zero /dev/mapper/cleanit", 128 * GIB))
        );
        assert_eq!(executor.recorded.last().unwrap(), "mkfs.ext4 -L root -F /dev/nvme0n1p3");
    }

    #[test]
    fn test_session_refuses_partition_argument() {
        let root = sysroot("sda", 128 * GIB);
        let mut executor = DryRun::new();

        let err = session(
            Some("/dev/sda1"),
            Config::default(),
            &mut prompt(""),
            &mut executor,
            root.path(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Device(InvalidDevice::Partition(_))));
        assert!(executor.recorded.is_empty());
    }

    #[test]
    fn test_load_config() {
        assert_eq!(load_config(None).unwrap(), Config::default());
        assert!(matches!(
            load_config(Some(Path::new("/nonexistent/diskprep.kdl"))),
            Err(Error::Config(LoadError::Io { .. }))
        ));
    }
}
