// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

use disks::DevicePath;
use thiserror::Error;

use crate::{DryRun, Executor, Layout, PlannedPartition, Step, StepError};

/// Errors that can occur when writing changes to disk
#[derive(Debug, Error)]
pub enum WriteError {
    /// Device size has changed since the plan was created
    #[error("device size changed since planning ({planned} bytes, now {current} bytes)")]
    DeviceSizeChanged { planned: u64, current: u64 },

    /// A partitioning tool failed
    #[error(transparent)]
    Step(#[from] StepError),
}

/// Writes a planned [`Layout`] to a disk with `sgdisk`
pub struct DiskWriter<'a> {
    /// The block device to write to
    pub device: &'a DevicePath,
    /// The partitions to create
    pub layout: &'a Layout,
}

impl<'a> DiskWriter<'a> {
    /// Create a new DiskWriter.
    pub fn new(device: &'a DevicePath, layout: &'a Layout) -> Self {
        Self { device, layout }
    }

    /// Fresh, empty GPT
    fn create_table(&self) -> Step {
        let mut cmd = Command::new("sgdisk");
        cmd.arg("--clear");
        cmd.arg(self.device.as_path());
        Step::new(format!("Creating GPT on {}", self.device), cmd)
    }

    fn create_partition(&self, partition: &PlannedPartition) -> Step {
        let n = partition.number;
        let end = match partition.size_mib {
            Some(mib) => format!("+{mib}M"),
            None => "0".to_owned(),
        };
        let table = &partition.attributes.table;

        let mut cmd = Command::new("sgdisk");
        cmd.arg(format!("--new={n}:0:{end}"));
        cmd.arg(format!("--typecode={n}:{}", table.type_guid.typecode()));
        cmd.arg(format!("--change-name={n}:{}", table.name));
        cmd.arg(self.device.as_path());
        Step::new(
            format!(
                "Adding {} partition {} ({})",
                partition.attributes.role,
                self.device.partition(n).display(),
                table.type_guid
            ),
            cmd,
        )
    }

    /// Have the kernel re-read the new table
    fn reload(&self) -> Step {
        let mut cmd = Command::new("partprobe");
        cmd.arg(self.device.as_path());
        Step::new(format!("Reloading partition table of {}", self.device), cmd)
    }

    /// All steps, in order
    pub fn steps(&self) -> Vec<Step> {
        std::iter::once(self.create_table())
            .chain(self.layout.partitions().iter().map(|p| self.create_partition(p)))
            .chain(std::iter::once(self.reload()))
            .collect()
    }

    /// Check the disk still has the size the layout was planned for
    pub fn validate(&self, current_size: u64) -> Result<(), WriteError> {
        let planned = self.layout.disk_size();
        if planned != current_size {
            return Err(WriteError::DeviceSizeChanged {
                planned,
                current: current_size,
            });
        }
        Ok(())
    }

    /// Simulate changes without writing to disk, returning the commands that would run
    pub fn simulate(&self) -> Result<Vec<String>, WriteError> {
        let mut executor = DryRun::new();
        self.validate(self.layout.disk_size())?;
        executor.execute_all(self.steps())?;
        Ok(executor.recorded)
    }

    /// Write the partition table
    pub fn write<E: Executor>(&self, executor: &mut E, current_size: u64) -> Result<(), WriteError> {
        self.validate(current_size)?;
        executor.execute_all(self.steps())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use disks::MIB;

    use crate::PartitionSpec;

    use super::*;

    const GIB: u64 = 1024 * MIB;

    #[test_log::test]
    fn test_default_layout_commands() {
        let device: DevicePath = "/dev/nvme0n1".parse().unwrap();
        let layout = Layout::plan(&PartitionSpec::default_layout(), 16 * GIB, 512 * GIB).unwrap();
        let commands = DiskWriter::new(&device, &layout).simulate().unwrap();

        assert_eq!(
            commands,
            vec![
                "sgdisk --clear /dev/nvme0n1",
                "sgdisk --new=1:0:+1024M --typecode=1:C12A7328-F81F-11D2-BA4B-00A0C93EC93B --change-name=1:boot /dev/nvme0n1",
                "sgdisk --new=2:0:+16384M --typecode=2:0657FD6D-A4AB-43C4-84E5-0933C84B4F4F --change-name=2:swap /dev/nvme0n1",
                "sgdisk --new=3:0:0 --typecode=3:0FC63DAF-8483-4772-8E79-3D69D8477DE4 --change-name=3:root /dev/nvme0n1",
                "partprobe /dev/nvme0n1",
            ]
        );
    }

    #[test]
    fn test_size_change_refused() {
        let device: DevicePath = "/dev/sda".parse().unwrap();
        let layout = Layout::plan(&PartitionSpec::default_layout(), GIB, 64 * GIB).unwrap();
        let writer = DiskWriter::new(&device, &layout);

        let mut executor = DryRun::new();
        let err = writer.write(&mut executor, 32 * GIB).unwrap_err();
        assert!(matches!(err, WriteError::DeviceSizeChanged { planned, current } if planned == 64 * GIB && current == 32 * GIB));
        assert!(executor.recorded.is_empty());

        writer.write(&mut executor, 64 * GIB).unwrap();
        assert_eq!(executor.recorded.len(), 5);
    }
}
