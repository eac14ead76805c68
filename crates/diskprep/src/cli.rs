// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use provisioning::Config;
use types::WipeMode;

/// Wipe, partition and format a whole disk for a fresh installation
#[derive(Debug, Parser)]
#[command(name = "diskprep", version)]
pub struct Cli {
    /// KDL file describing the partition layout and defaults
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Disk to prepare, e.g. /dev/sda or /dev/nvme0n1 (asked for when omitted)
    #[arg(short, long, value_name = "PATH")]
    pub device: Option<String>,

    /// How to erase the disk: secure or normal (asked for when omitted)
    #[arg(short, long, value_name = "MODE")]
    pub wipe_mode: Option<WipeMode>,

    /// Put the root filesystem inside a LUKS2 container
    #[arg(short, long)]
    pub encrypt: bool,

    /// Log the commands instead of running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// How often a question is asked before giving up
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub attempts: Option<u16>,

    /// More output, repeat for trace logging
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Let the command line override the configuration file
    pub fn apply(&self, config: &mut Config) {
        if let Some(mode) = self.wipe_mode {
            config.wipe = Some(mode);
        }
        if self.encrypt {
            config.encrypt_root = true;
        }
        if let Some(attempts) = self.attempts {
            config.prompt_attempts = usize::from(attempts);
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "diskprep",
            "--device",
            "/dev/nvme0n1",
            "--wipe-mode",
            "Secure",
            "--encrypt",
            "--attempts",
            "2",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.device.as_deref(), Some("/dev/nvme0n1"));
        assert_eq!(cli.log_level(), log::LevelFilter::Trace);

        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.wipe, Some(WipeMode::Secure));
        assert!(config.encrypt_root);
        assert_eq!(config.prompt_attempts, 2);
    }

    #[test]
    fn test_defaults_keep_config() {
        let cli = Cli::try_parse_from(["diskprep", "--dry-run"]).unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.log_level(), log::LevelFilter::Info);

        let mut config = Config {
            wipe: Some(WipeMode::Normal),
            encrypt_root: true,
            ..Config::default()
        };
        cli.apply(&mut config);
        assert_eq!(config.wipe, Some(WipeMode::Normal));
        assert!(config.encrypt_root);
        assert_eq!(config.prompt_attempts, provisioning::DEFAULT_PROMPT_ATTEMPTS);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["diskprep", "--wipe-mode", "shred"]).is_err());
        assert!(Cli::try_parse_from(["diskprep", "--attempts", "0"]).is_err());
    }
}
