// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use std::{
    error,
    fmt::{self, Display, Formatter},
    io,
};

use crate::NodeRef;

/// A specialized `Result` type for suffix tree construction.
pub type Result<T> = core::result::Result<T, Error>;

/// An error that aborts a suffix tree construction or maintenance step.
///
/// Every variant is fatal to the call that returned it: a tree is only guaranteed to be valid
/// between successful steps, so no partial result is ever handed back.
///
/// # Examples
///
/// ```
/// use suftree::{Error, build_pwotd};
///
/// let result = build_pwotd(Some(0), b"banana");
///
/// assert!(matches!(result, Err(Error::InvalidParameter(_))));
/// ```
#[derive(Debug)]
pub enum Error {
    /// A table could not grow to the requested number of records
    Allocation {
        /// The name of the table that failed to grow
        table: &'static str,
        /// The capacity that was requested
        requested: usize,
    },
    /// An internal invariant was broken
    Protocol(Violation),
    /// The edge map could not place an entry within its attempt budget
    HashExhausted(HashFailure),
    /// A configuration value was rejected
    InvalidParameter(String),
    /// The input collaborator failed
    Io(io::Error),
}

/// The invariant whose breakage caused an [`Error::Protocol`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Violation {
    /// A second branching node was created while another still waited for its suffix link
    PendingSuffixLink,
    /// A branching node was required but something else was passed
    NotABranch(NodeRef),
    /// A node reference did not resolve to a live record
    UnknownNode(NodeRef),
    /// The leaf for the oldest suffix of the window was not found
    MissingDeepestLeaf(u64),
    /// A window block had to be overwritten while edge labels still referenced it
    WindowTooSmall,
    /// An arena shrink was requested while recycled indices were outstanding
    ShrinkWithVacantSlots,
    /// Two suffixes of a group ended at the same depth
    DuplicateSuffixLength,
}

/// The way in which the edge map gave up on an insertion.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HashFailure {
    /// Placement failed and the table was configured not to rehash
    RehashDisallowed,
    /// Placement still failed after the maximum number of rehash attempts
    AttemptsExhausted,
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Violation::PendingSuffixLink => {
                write!(f, "a suffix link was still pending when a new branch was created")
            }
            Violation::NotABranch(node) => write!(f, "expected a branching node, found {node:?}"),
            Violation::UnknownNode(node) => write!(f, "node {node:?} is not present in the tree"),
            Violation::MissingDeepestLeaf(position) => {
                write!(f, "no leaf for the oldest suffix starting at {position}")
            }
            Violation::WindowTooSmall => {
                write!(f, "window block is still referenced by edge labels")
            }
            Violation::ShrinkWithVacantSlots => {
                write!(f, "cannot shrink an arena with recycled slots outstanding")
            }
            Violation::DuplicateSuffixLength => {
                write!(f, "two suffixes in one group have the same length")
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Error::Allocation { table, requested } => {
                write!(f, "failed to grow {table} table to {requested} records")
            }
            Error::Protocol(violation) => write!(f, "protocol violation: {violation}"),
            Error::HashExhausted(HashFailure::RehashDisallowed) => {
                write!(f, "edge map is full and rehashing is disabled")
            }
            Error::HashExhausted(HashFailure::AttemptsExhausted) => {
                write!(f, "edge map placement failed after exhausting rehash attempts")
            }
            Error::InvalidParameter(message) => write!(f, "invalid parameter: {message}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::Io(value)
    }
}

impl From<Violation> for Error {
    fn from(value: Violation) -> Self {
        Error::Protocol(value)
    }
}
