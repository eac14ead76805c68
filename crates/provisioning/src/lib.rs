// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Loading the disk preparation settings from KDL

use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use kdl::{KdlDocument, KdlNode};
use miette::{Diagnostic, NamedSource};
use partitioning::PartitionSpec;
use thiserror::Error;

pub use types::*;

mod commands;
use commands::{Command, parse_command};

/// How many times an operator may answer a prompt wrongly by default
pub const DEFAULT_PROMPT_ATTEMPTS: usize = 5;

/// Mount point cleared before touching the disk by default
pub const DEFAULT_UNMOUNT: &str = "/mnt";

/// Errors from loading a configuration file
#[derive(Debug, Diagnostic, Error)]
pub enum LoadError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[diagnostic(transparent)]
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Parsing context passed to each command parser
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub node: &'a KdlNode,
}

/// Everything the configuration file controls
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Partitions to create, in table order
    pub partitions: Vec<PartitionSpec>,
    /// Wipe mode to use without asking, if any
    pub wipe: Option<WipeMode>,
    /// Put the root filesystem inside LUKS2
    pub encrypt_root: bool,
    pub prompt_attempts: usize,
    /// Mount points to detach before the disk is wiped
    pub unmount: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            partitions: PartitionSpec::default_layout(),
            wipe: None,
            encrypt_root: false,
            prompt_attempts: DEFAULT_PROMPT_ATTEMPTS,
            unmount: vec![PathBuf::from(DEFAULT_UNMOUNT)],
        }
    }
}

/// Configuration parser
#[derive(Debug)]
pub struct Parser {
    pub config: Config,
}

impl Parser {
    /// Load and parse the configuration file at `path`
    pub fn new_for_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;
        let name = path.display().to_string();
        Ok(Self::new(name, contents)?)
    }

    /// Parse a configuration document named `name`
    ///
    /// Every problem found in the document is reported, not only the first.
    pub fn new(name: String, contents: String) -> Result<Self, ParseError> {
        let source = Arc::new(contents);
        let mut diagnostics = vec![];

        let config = match KdlDocument::parse(source.as_str()) {
            Ok(document) => Self::apply(&document, &mut diagnostics),
            Err(e) => {
                diagnostics.push(e.into());
                Config::default()
            }
        };

        if diagnostics.is_empty() {
            log::debug!("Loaded configuration from {name}");
            Ok(Self { config })
        } else {
            Err(ParseError {
                src: NamedSource::new(name, source),
                diagnostics,
            })
        }
    }

    fn apply(document: &KdlDocument, diagnostics: &mut Vec<Error>) -> Config {
        let mut config = Config::default();
        let mut partitions = vec![];
        let mut seen = HashSet::new();

        for node in document.nodes() {
            let command = match parse_command(Context { node }) {
                Ok(command) => command,
                Err(e) => {
                    diagnostics.push(e);
                    continue;
                }
            };

            let name = node.name().value();
            if !matches!(command, Command::Partition(_)) && !seen.insert(name.to_owned()) {
                diagnostics.push(
                    DuplicateNode {
                        at: node.span(),
                        name: name.to_owned(),
                    }
                    .into(),
                );
                continue;
            }

            match command {
                Command::Partition(partition) => partitions.push(partition.into_spec()),
                Command::Wipe(mode) => config.wipe = Some(mode),
                Command::Encryption(enabled) => config.encrypt_root = enabled,
                Command::Prompt(attempts) => config.prompt_attempts = attempts,
                Command::Unmount(targets) => config.unmount = targets,
            }
        }

        if !partitions.is_empty() {
            config.partitions = partitions;
        }
        config
    }
}
