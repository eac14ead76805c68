// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use nix::errno::Errno;

use crate::{Executor, StepError, crypt::close_stale_mappings};

/// Releases the target disk from an earlier installation attempt
///
/// Mount points are detached and leftover dm-crypt mappings closed. Neither
/// is expected to exist on a clean system, so nothing here is fatal.
#[derive(Debug, Clone)]
pub struct Teardown {
    pub targets: Vec<PathBuf>,
}

impl Teardown {
    pub fn new(targets: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn run<E: Executor>(&self, executor: &mut E) -> Result<(), StepError> {
        for target in &self.targets {
            match executor.unmount(target) {
                Ok(()) => log::info!("Unmounted {}", target.display()),
                // Not a mount point, or missing entirely
                Err(Errno::EINVAL | Errno::ENOENT) => log::debug!("{} is not mounted", target.display()),
                Err(e) => log::warn!("Failed to unmount {}: {e}", target.display()),
            }
        }

        executor.execute_all(close_stale_mappings())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::{DryRun, Step};

    use super::*;

    struct Unmounted(Vec<Errno>);

    impl Executor for Unmounted {
        fn execute(&mut self, step: Step) -> Result<(), StepError> {
            assert!(step.tolerates_failure());
            Ok(())
        }

        fn unmount(&mut self, _target: &Path) -> Result<(), Errno> {
            Err(self.0.remove(0))
        }
    }

    #[test_log::test]
    fn test_dry_run() {
        let mut executor = DryRun::new();
        Teardown::new(["/mnt", "/mnt/archinstall"]).run(&mut executor).unwrap();
        assert_eq!(
            executor.recorded,
            vec![
                "umount --force --lazy /mnt",
                "umount --force --lazy /mnt/archinstall",
                "cryptsetup close cleanit",
                "cryptsetup close root",
            ]
        );
    }

    #[test_log::test]
    fn test_unmount_errors_tolerated() {
        let mut executor = Unmounted(vec![Errno::EINVAL, Errno::ENOENT, Errno::EBUSY]);
        Teardown::new(["/mnt", "/missing", "/busy"]).run(&mut executor).unwrap();
        assert!(executor.0.is_empty());
    }
}
