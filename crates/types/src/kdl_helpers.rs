// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::fmt;

use crate::{Error, InvalidType, MissingEntry, MissingProperty, StorageUnit, UnsupportedValue};
use kdl::{KdlEntry, KdlNode, NodeKey};

/// The kind of value a KDL entry was expected to hold
#[derive(Debug, Clone, Copy)]
pub enum KdlType {
    Boolean,
    String,
    Integer,
}

impl fmt::Display for KdlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KdlType::Boolean => f.write_str("boolean"),
            KdlType::String => f.write_str("string"),
            KdlType::Integer => f.write_str("integer"),
        }
    }
}

pub trait FromKdlProperty<'a>: Sized {
    fn from_kdl_property(entry: &'a KdlEntry) -> Result<Self, Error>;
}

pub trait FromKdlType<'a>: Sized {
    fn from_kdl_type(id: &'a KdlEntry) -> Result<Self, Error>;
}

// Get a property from a node
pub fn get_kdl_property<'a>(node: &'a KdlNode, name: &'static str) -> Result<&'a KdlEntry, Error> {
    let entry = node.entry(name).ok_or_else(|| MissingProperty {
        at: node.span(),
        id: name,
        advice: Some(format!("add `{name}=...` to bind the property")),
    })?;

    Ok(entry)
}

pub fn get_kdl_entry<'a, T>(node: &'a KdlNode, id: &'a T) -> Result<&'a KdlEntry, Error>
where
    T: Into<NodeKey> + ToString + Clone,
{
    let entry = node.entry(id.clone()).ok_or_else(|| MissingEntry {
        at: node.span(),
        id: id.to_string(),
        advice: None,
    })?;

    Ok(entry)
}

// Get a string property from a value
pub fn kdl_value_to_string(entry: &kdl::KdlEntry) -> Result<String, Error> {
    let value = entry.value().as_string().ok_or(InvalidType {
        at: entry.span(),
        expected_type: KdlType::String,
    })?;

    Ok(value.to_owned())
}

// Get an integer property from a value
pub fn kdl_value_to_integer(entry: &kdl::KdlEntry) -> Result<i128, Error> {
    let value = entry.value().as_integer().ok_or(InvalidType {
        at: entry.span(),
        expected_type: KdlType::Integer,
    })?;

    Ok(value)
}

pub fn kdl_value_to_bool(entry: &kdl::KdlEntry) -> Result<bool, Error> {
    let value = entry.value().as_bool().ok_or(InvalidType {
        at: entry.span(),
        expected_type: KdlType::Boolean,
    })?;

    Ok(value)
}

// Integers that must be positive and fit a usize, e.g. attempt counts
pub fn kdl_value_to_count(entry: &kdl::KdlEntry) -> Result<usize, Error> {
    let value = kdl_value_to_integer(entry)?;
    match usize::try_from(value) {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(UnsupportedValue {
            at: entry.span(),
            advice: Some("expected a positive integer".into()),
        }
        .into()),
    }
}

// Convert a KDL value to a storage size in bytes
pub fn kdl_value_to_storage_size(entry: &kdl::KdlEntry) -> Result<u64, Error> {
    let value = kdl_value_to_integer(entry)?;
    let value = u64::try_from(value).map_err(|_| UnsupportedValue {
        at: entry.span(),
        advice: Some("storage sizes cannot be negative".into()),
    })?;
    let units = StorageUnit::from_kdl_type(entry)?;
    value.checked_mul(units as u64).ok_or_else(|| {
        UnsupportedValue {
            at: entry.span(),
            advice: Some("storage size is too large".into()),
        }
        .into()
    })
}

pub fn get_property_bool(node: &KdlNode, name: &'static str) -> Result<bool, Error> {
    get_kdl_property(node, name).and_then(kdl_value_to_bool)
}
