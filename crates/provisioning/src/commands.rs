// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
// SPDX-FileCopyrightText: Copyright © 2025 AerynOS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use crate::{
    Context, FromKdlProperty, WipeMode, get_kdl_property, get_property_bool, kdl_value_to_count, kdl_value_to_string,
};

mod partition;

/// A command
#[derive(Debug)]
pub enum Command {
    Partition(Box<partition::Command>),
    Wipe(WipeMode),
    Encryption(bool),
    Prompt(usize),
    Unmount(Vec<PathBuf>),
}

/// Command execution function
type CommandExec = for<'a> fn(Context<'a>) -> Result<Command, crate::Error>;

fn command(name: &str) -> Option<CommandExec> {
    Some(match name {
        "partition" => partition::parse,
        "wipe" => parse_wipe,
        "encryption" => parse_encryption,
        "prompt" => parse_prompt,
        "unmount" => parse_unmount,
        _ => return None,
    })
}

/// Parse a command from a node if possible
pub(crate) fn parse_command(context: Context<'_>) -> Result<Command, crate::Error> {
    let name = context.node.name().value();
    let func = command(name).ok_or_else(|| crate::UnsupportedNode {
        at: context.node.span(),
        name: name.into(),
    })?;

    func(context)
}

/// `wipe mode="secure"`
fn parse_wipe(context: Context<'_>) -> Result<Command, crate::Error> {
    let mode = WipeMode::from_kdl_property(get_kdl_property(context.node, "mode")?)?;
    Ok(Command::Wipe(mode))
}

/// `encryption enabled=#true`
fn parse_encryption(context: Context<'_>) -> Result<Command, crate::Error> {
    Ok(Command::Encryption(get_property_bool(context.node, "enabled")?))
}

/// `prompt attempts=5`
fn parse_prompt(context: Context<'_>) -> Result<Command, crate::Error> {
    let attempts = kdl_value_to_count(get_kdl_property(context.node, "attempts")?)?;
    Ok(Command::Prompt(attempts))
}

/// `unmount "/mnt" "/mnt/archinstall"`
fn parse_unmount(context: Context<'_>) -> Result<Command, crate::Error> {
    let targets = context
        .node
        .entries()
        .iter()
        .filter(|entry| entry.name().is_none())
        .map(|entry| kdl_value_to_string(entry).map(PathBuf::from))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Command::Unmount(targets))
}
