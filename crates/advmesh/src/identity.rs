// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Local device identity and source address stamping
//!
//! The local address comes from the platform: either a query to the radio
//! stack (which may not be ready yet) or a factory-programmed identity
//! register. [`LocalIdentity`] abstracts over both.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};
use crate::packet::{AddressType, AdvPacket};
use crate::ADDR_LEN;

/// Device address as carried in the advertisement
///
/// `bytes` are stored least significant byte first, the on-air order.
/// `Display` and `FromStr` use the conventional most significant byte first
/// colon notation (`C6:05:04:03:02:01`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceAddress {
    /// Address bytes, LSB first
    pub bytes: [u8; ADDR_LEN],
    /// Address type
    pub addr_type: AddressType,
}

impl DeviceAddress {
    /// Create a new device address
    pub const fn new(bytes: [u8; ADDR_LEN], addr_type: AddressType) -> Self {
        Self { bytes, addr_type }
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.bytes.iter().rev().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for DeviceAddress {
    type Err = Error;

    /// Parse `AA:BB:CC:DD:EE:FF` as a public address
    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; ADDR_LEN];
        let mut parts = s.split(':');

        for slot in bytes.iter_mut().rev() {
            let part = parts.next().ok_or(Error::InvalidData)?;
            if part.len() != 2 {
                return Err(Error::InvalidData);
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| Error::InvalidData)?;
        }

        if parts.next().is_some() {
            return Err(Error::InvalidData);
        }

        Ok(Self::new(bytes, AddressType::Public))
    }
}

/// Source of the local device address
pub trait LocalIdentity {
    /// Current local address.
    ///
    /// Returns `Err(Error::IdentityUnavailable)` while the platform cannot
    /// provide one.
    fn local_address(&self) -> Result<DeviceAddress>;
}

impl<T: LocalIdentity + ?Sized> LocalIdentity for &T {
    fn local_address(&self) -> Result<DeviceAddress> {
        (**self).local_address()
    }
}

/// Fixed identity (factory-programmed address register)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticIdentity {
    address: DeviceAddress,
}

impl StaticIdentity {
    /// Create an identity that always reports `address`
    pub const fn new(address: DeviceAddress) -> Self {
        Self { address }
    }
}

impl LocalIdentity for StaticIdentity {
    fn local_address(&self) -> Result<DeviceAddress> {
        Ok(self.address)
    }
}

/// Identity of a platform whose radio stack is not ready
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableIdentity;

impl LocalIdentity for UnavailableIdentity {
    fn local_address(&self) -> Result<DeviceAddress> {
        Err(Error::IdentityUnavailable)
    }
}

/// Write the local address and address type into `packet`.
///
/// On failure the packet is left unmodified and the provider's error is
/// returned.
pub fn stamp_local_address<I: LocalIdentity + ?Sized>(
    packet: &mut AdvPacket,
    identity: &I,
) -> Result<()> {
    let address = identity.local_address()?;
    packet.set_source_address(address);
    Ok(())
}
