// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for advmesh

use core::fmt;

/// Result type for advmesh operations
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for advmesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Every pool slot is held
    PoolExhausted,

    /// Value or declared length out of range
    InvalidLength,

    /// Malformed payload or missing mesh AD structure
    InvalidData,

    /// Requested element not present
    NotFound,

    /// Packet handle was issued by another pool
    ForeignOwnership,

    /// Release of a slot whose reference count is already zero
    NotHeld,

    /// Reference count would wrap (unrecoverable, indicates a counting bug)
    RefcountOverflow,

    /// Local identity provider failed (radio stack not ready)
    IdentityUnavailable,

    /// Buffer too small for operation
    BufferTooSmall,

    /// Unknown or unsupported PDU header
    InvalidHeader,
}

impl Error {
    /// True for errors that leave pool bookkeeping untrustworthy.
    ///
    /// Callers should halt or escalate instead of retrying.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Error::RefcountOverflow)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PoolExhausted => write!(f, "Packet pool exhausted"),
            Error::InvalidLength => write!(f, "Invalid length"),
            Error::InvalidData => write!(f, "Invalid or missing mesh data"),
            Error::NotFound => write!(f, "Not found"),
            Error::ForeignOwnership => write!(f, "Packet handle belongs to another pool"),
            Error::NotHeld => write!(f, "Packet slot is not held"),
            Error::RefcountOverflow => write!(f, "Packet reference count overflow"),
            Error::IdentityUnavailable => write!(f, "Local identity unavailable"),
            Error::BufferTooSmall => write!(f, "Buffer too small"),
            Error::InvalidHeader => write!(f, "Invalid advertisement header"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
