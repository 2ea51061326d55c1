// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # advmesh - Mesh Values over Broadcast Advertisements
//!
//! Packet layer of a mesh that floods versioned values through
//! non-connectable radio advertisements. Each advertisement carries one
//! mesh AD structure (value handle, version, up to 23 data bytes) inside
//! the standard AD structure chain.
//!
//! ## Design Constraints
//!
//! - **No heap allocations** (const generics for the packet pool)
//! - **No panics on received data**: every parse is bounds checked and
//!   degrades to "not a mesh packet"
//! - **`no_std` compatible**
//!
//! ## Architecture
//!
//! ```text
//! +------------------------------------------+
//! |  Propagation / Transport (external)      |
//! +------------------------------------------+
//!        v acquire/release          ^ build / take_ownership
//! +------------------+   +----------------------------------+
//! |  PacketPool<N>   |-->|  AdvPacket                       |
//! |  (ref counts)    |   |  build / locate / sanitize       |
//! +------------------+   +----------------------------------+
//!                                   v stamp
//!                        +----------------------------------+
//!                        |  LocalIdentity (platform)        |
//!                        +----------------------------------+
//! ```
//!
//! ## Example
//!
//! ```
//! use advmesh::{AddressType, DeviceAddress, PacketPool, StaticIdentity, ValueHandle};
//!
//! let identity = StaticIdentity::new(DeviceAddress::new([1, 2, 3, 4, 5, 6], AddressType::Public));
//! let mut pool: PacketPool<4> = PacketPool::new(0);
//!
//! let handle = pool.acquire().expect("pool has free slots");
//! let packet = pool.get_mut(handle).expect("slot is held");
//! packet.build(&identity, ValueHandle(0x0010), 1, b"on").unwrap();
//! assert_eq!(packet.handle(), Some(ValueHandle(0x0010)));
//!
//! pool.release(handle).unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! - `std` -- `std::error::Error` impls and [`SharedPacketPool`]

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Advertisement packet format, AD chain walking, mesh AD structure
pub mod packet;

/// Reference-counted packet pool
pub mod pool;

/// Local identity provider and address stamping
pub mod identity;

/// Sanitizing and ownership transfer of received packets
pub mod ownership;

/// Error types for advmesh
pub mod error;

/// Packet pool shared between threads (requires `std` feature)
#[cfg(feature = "std")]
pub mod shared;

// Re-exports for convenience
pub use crate::error::{Error, Result};
pub use crate::identity::{
    stamp_local_address, DeviceAddress, LocalIdentity, StaticIdentity, UnavailableIdentity,
};
pub use crate::ownership::{sanitize, take_ownership};
pub use crate::packet::{AddressType, AdvHeader, AdvPacket, AppData, PduType, ValueHandle};
pub use crate::pool::{PacketHandle, PacketPool};
#[cfg(feature = "std")]
pub use crate::shared::{PooledPacket, SharedPacketPool};

/// Device address length
pub const ADDR_LEN: usize = 6;

/// Maximum advertisement payload (AD structure chain) size
pub const ADV_PAYLOAD_MAX_LEN: usize = 31;

/// Maximum mesh value data length
pub const MAX_VALUE_LEN: usize = 23;

/// Version of advmesh
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
