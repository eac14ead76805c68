// SPDX-FileCopyrightText: Copyright © 2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

#[cfg(feature = "kdl")]
use std::sync::Arc;

#[cfg(feature = "kdl")]
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[cfg(feature = "kdl")]
use crate::KdlType;

/// Errors from parsing roles, modes, units and configuration nodes
#[cfg_attr(feature = "kdl", derive(Diagnostic))]
#[derive(Debug, Error)]
pub enum Error {
    /// A string did not name any known variant
    #[error("unknown variant: {0}")]
    UnknownVariant(String),

    #[cfg(feature = "kdl")]
    #[diagnostic(transparent)]
    #[error(transparent)]
    Kdl(#[from] kdl::KdlError),

    #[cfg(feature = "kdl")]
    #[diagnostic(transparent)]
    #[error(transparent)]
    InvalidArguments(#[from] InvalidArguments),

    #[cfg(feature = "kdl")]
    #[diagnostic(transparent)]
    #[error(transparent)]
    InvalidType(#[from] InvalidType),

    #[cfg(feature = "kdl")]
    #[diagnostic(transparent)]
    #[error(transparent)]
    UnsupportedNode(#[from] UnsupportedNode),

    #[cfg(feature = "kdl")]
    #[diagnostic(transparent)]
    #[error(transparent)]
    MissingEntry(#[from] MissingEntry),

    #[cfg(feature = "kdl")]
    #[diagnostic(transparent)]
    #[error(transparent)]
    MissingProperty(#[from] MissingProperty),

    #[cfg(feature = "kdl")]
    #[diagnostic(transparent)]
    #[error(transparent)]
    UnsupportedValue(#[from] UnsupportedValue),

    #[cfg(feature = "kdl")]
    #[diagnostic(transparent)]
    #[error(transparent)]
    DuplicateNode(#[from] DuplicateNode),
}

/// Every problem found in one configuration document
#[cfg(feature = "kdl")]
#[derive(Debug, Diagnostic, Error)]
#[error("invalid configuration")]
#[diagnostic(severity(error))]
pub struct ParseError {
    #[source_code]
    pub src: NamedSource<Arc<String>>,
    #[related]
    pub diagnostics: Vec<Error>,
}

#[cfg(feature = "kdl")]
#[derive(Debug, Diagnostic, Error)]
#[error("expected a {expected_type} value")]
#[diagnostic(severity(error))]
pub struct InvalidType {
    #[label]
    pub at: SourceSpan,

    pub expected_type: KdlType,
}

/// A `name=value` property the node requires is absent
#[cfg(feature = "kdl")]
#[derive(Debug, Diagnostic, Error)]
#[error("missing property: {id}")]
#[diagnostic(severity(error))]
pub struct MissingProperty {
    #[label]
    pub at: SourceSpan,

    pub id: &'static str,

    #[help]
    pub advice: Option<String>,
}

/// A positional argument the node requires is absent
#[cfg(feature = "kdl")]
#[derive(Debug, Diagnostic, Error)]
#[error("missing argument: {id}")]
#[diagnostic(severity(error))]
pub struct MissingEntry {
    #[label]
    pub at: SourceSpan,

    pub id: String,

    #[help]
    pub advice: Option<String>,
}

#[cfg(feature = "kdl")]
#[derive(Debug, Diagnostic, Error)]
#[error("unsupported node: {name}")]
#[diagnostic(severity(error))]
pub struct UnsupportedNode {
    #[label("not understood here")]
    pub at: SourceSpan,

    pub name: String,
}

#[cfg(feature = "kdl")]
#[derive(Debug, Diagnostic, Error)]
#[error("unsupported value")]
#[diagnostic(severity(error))]
pub struct UnsupportedValue {
    #[label]
    pub at: SourceSpan,

    #[help]
    pub advice: Option<String>,
}

/// Arguments that are valid alone but not together
#[cfg(feature = "kdl")]
#[derive(Debug, Diagnostic, Error)]
#[error("invalid arguments")]
#[diagnostic(severity(error))]
pub struct InvalidArguments {
    #[label]
    pub at: SourceSpan,

    #[help]
    pub advice: Option<String>,
}

/// A node that may only appear once was repeated
#[cfg(feature = "kdl")]
#[derive(Debug, Diagnostic, Error)]
#[error("duplicate {name}")]
#[diagnostic(severity(error))]
pub struct DuplicateNode {
    #[label("defined again here")]
    pub at: SourceSpan,

    pub name: String,
}
