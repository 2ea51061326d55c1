// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Advertisement packets carrying mesh values
//!
//! ## Layout
//!
//! ```text
//! +-----------+-------------------+-------------------------------------+
//! | Header 3B | Source address 6B | Payload 0..=31B (AD structure chain) |
//! +-----------+-------------------+-------------------------------------+
//! ```
//!
//! A packet built by this crate holds exactly one mesh AD structure at
//! payload offset 0. Received packets may carry other AD structures around
//! it; see [`crate::ownership`] for how those are stripped before relaying.

mod ad;
mod app;
mod header;

pub use ad::{find_app_data, has_foreign_structures, AdStructure, AdStructures};
pub use app::{
    AppData, ValueHandle, MESH_ADV_MAX_LEN, MESH_ADV_OVERHEAD, MESH_AD_TYPE, MESH_SERVICE_UUID,
};
pub use header::{AddressType, AdvHeader, PduType, PACKET_HEADER_LEN};

use crate::error::{Error, Result};
use crate::identity::{stamp_local_address, DeviceAddress, LocalIdentity};
use crate::{ADDR_LEN, ADV_PAYLOAD_MAX_LEN, MAX_VALUE_LEN};

/// Header length of a packet holding only a mesh AD structure with no data
pub const MESH_PACKET_OVERHEAD: usize = ADDR_LEN + 1 + MESH_ADV_OVERHEAD;

/// Largest encoded packet (header + address + full payload)
pub const MAX_PACKET_LEN: usize = PACKET_HEADER_LEN + ADDR_LEN + ADV_PAYLOAD_MAX_LEN;

/// One advertisement packet (a pool slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvPacket {
    /// PDU header
    pub header: AdvHeader,
    /// Source address, least significant byte first
    pub addr: [u8; ADDR_LEN],
    /// AD structure chain
    pub payload: [u8; ADV_PAYLOAD_MAX_LEN],
}

impl Default for AdvPacket {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl AdvPacket {
    /// Non-connectable advertisement with no payload
    pub const EMPTY: Self = Self {
        header: AdvHeader::EMPTY,
        addr: [0; ADDR_LEN],
        payload: [0; ADV_PAYLOAD_MAX_LEN],
    };

    /// Payload bytes in use according to the header length
    pub fn payload_len(&self) -> usize {
        usize::from(self.header.length)
            .saturating_sub(ADDR_LEN)
            .min(ADV_PAYLOAD_MAX_LEN)
    }

    /// Payload bytes in use
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.payload_len()]
    }

    /// Source address and type
    pub fn source_address(&self) -> DeviceAddress {
        DeviceAddress::new(self.addr, self.header.addr_type)
    }

    /// Overwrite the source address and type
    pub fn set_source_address(&mut self, address: DeviceAddress) {
        self.addr = address.bytes;
        self.header.addr_type = address.addr_type;
    }

    /// Fill this packet with a single mesh AD structure.
    ///
    /// Fails with [`Error::InvalidLength`] and leaves the packet untouched if
    /// `data` exceeds [`MAX_VALUE_LEN`]. The local address is stamped
    /// best-effort: an identity failure is logged and the previous address is
    /// kept. Use [`AdvPacket::build_strict`] to surface it instead.
    pub fn build<I: LocalIdentity + ?Sized>(
        &mut self,
        identity: &I,
        handle: ValueHandle,
        version: u16,
        data: &[u8],
    ) -> Result<()> {
        if data.len() > MAX_VALUE_LEN {
            return Err(Error::InvalidLength);
        }

        if let Err(e) = stamp_local_address(self, identity) {
            log::warn!("building {} without local address: {}", handle, e);
        }

        self.write_app(handle, version, data);
        Ok(())
    }

    /// Like [`AdvPacket::build`], but an identity failure aborts the build
    /// before anything is written.
    pub fn build_strict<I: LocalIdentity + ?Sized>(
        &mut self,
        identity: &I,
        handle: ValueHandle,
        version: u16,
        data: &[u8],
    ) -> Result<()> {
        if data.len() > MAX_VALUE_LEN {
            return Err(Error::InvalidLength);
        }

        let address = identity.local_address()?;
        self.set_source_address(address);
        self.write_app(handle, version, data);
        Ok(())
    }

    fn write_app(&mut self, handle: ValueHandle, version: u16, data: &[u8]) {
        let record_len = app::write_app_structure(&mut self.payload, handle, version, data);
        self.header.length = (ADDR_LEN + record_len) as u8;
        self.header.pdu_type = PduType::AdvNonconnInd;
    }

    /// Locate the mesh AD structure
    pub fn app_data(&self) -> Option<AppData<'_>> {
        find_app_data(&self.payload)
    }

    /// Like [`AdvPacket::app_data`], reporting absence as [`Error::NotFound`]
    pub fn try_app_data(&self) -> Result<AppData<'_>> {
        self.app_data().ok_or(Error::NotFound)
    }

    /// Value handle of the mesh AD structure, if any
    pub fn handle(&self) -> Option<ValueHandle> {
        self.app_data().map(|app| app.handle())
    }

    /// Check if the used payload holds AD structures other than mesh data
    pub fn has_foreign_structures(&self) -> bool {
        has_foreign_structures(&self.payload, self.payload_len())
    }

    /// Iterate the AD structures of the used payload
    pub fn ad_structures(&self) -> AdStructures<'_> {
        AdStructures::new(self.payload())
    }

    /// Encoded size of this packet
    pub fn encoded_len(&self) -> usize {
        PACKET_HEADER_LEN + ADDR_LEN + self.payload_len()
    }

    /// Encode to on-air bytes
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let length = usize::from(self.header.length);
        if !(ADDR_LEN..=ADDR_LEN + ADV_PAYLOAD_MAX_LEN).contains(&length) {
            return Err(Error::InvalidLength);
        }

        let total = PACKET_HEADER_LEN + length;
        if buf.len() < total {
            return Err(Error::BufferTooSmall);
        }

        let mut pos = self.header.encode(buf)?;
        buf[pos..pos + ADDR_LEN].copy_from_slice(&self.addr);
        pos += ADDR_LEN;
        buf[pos..total].copy_from_slice(self.payload());

        Ok(total)
    }

    /// Decode from on-air bytes.
    ///
    /// Payload bytes past the header length are zeroed so the capacity-bounded
    /// locator never sees stale data.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let header = AdvHeader::decode(buf)?;

        let length = usize::from(header.length);
        if !(ADDR_LEN..=ADDR_LEN + ADV_PAYLOAD_MAX_LEN).contains(&length) {
            return Err(Error::InvalidLength);
        }

        let total = PACKET_HEADER_LEN + length;
        if buf.len() < total {
            return Err(Error::BufferTooSmall);
        }

        let mut packet = Self {
            header,
            ..Self::EMPTY
        };
        let addr_start = PACKET_HEADER_LEN;
        let payload_start = addr_start + ADDR_LEN;
        packet
            .addr
            .copy_from_slice(&buf[addr_start..payload_start]);
        packet.payload[..total - payload_start].copy_from_slice(&buf[payload_start..total]);

        Ok(packet)
    }
}
