// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mesh AD structure layout
//!
//! ```text
//! +--------+---------+-----------+-----------+-----------+----------------+
//! | Length | AD type | UUID (LE) | Handle LE | Version LE| Data           |
//! |   1B   |  0x16   |  0xFEE4   |    2B     |    2B     | 0..=23 bytes   |
//! +--------+---------+-----------+-----------+-----------+----------------+
//! Length = 7 + data length
//! ```

use core::fmt;

use crate::{ADV_PAYLOAD_MAX_LEN, MAX_VALUE_LEN};

/// AD type carrying mesh data ("Service Data - 16-bit UUID")
pub const MESH_AD_TYPE: u8 = 0x16;

/// Service UUID identifying mesh traffic among co-channel advertisers
pub const MESH_SERVICE_UUID: u16 = 0xFEE4;

/// Bytes covered by the AD length field before the value data
/// (AD type + UUID + handle + version)
pub const MESH_ADV_OVERHEAD: usize = 1 + 2 + 2 + 2;

/// Largest legal value of a mesh AD length field
pub const MESH_ADV_MAX_LEN: usize = MESH_ADV_OVERHEAD + MAX_VALUE_LEN;

const UUID_OFFSET: usize = 2;
const HANDLE_OFFSET: usize = 4;
const VERSION_OFFSET: usize = 6;
const DATA_OFFSET: usize = 8;

/// Opaque identifier of a mesh-managed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ValueHandle(pub u16);

impl From<u16> for ValueHandle {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<ValueHandle> for u16 {
    fn from(handle: ValueHandle) -> Self {
        handle.0
    }
}

impl fmt::Display for ValueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// Validated view of a mesh AD structure inside a packet payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppData<'a> {
    offset: usize,
    record: &'a [u8],
}

impl<'a> AppData<'a> {
    /// Validate the record starting at `offset`.
    ///
    /// The caller has already matched the AD type and UUID. Returns `None`
    /// when the length field is out of range or the record would run past
    /// the end of `payload`.
    pub(crate) fn parse(payload: &'a [u8], offset: usize) -> Option<Self> {
        let length = usize::from(*payload.get(offset)?);
        if !(MESH_ADV_OVERHEAD..=MESH_ADV_MAX_LEN).contains(&length) {
            log::debug!("mesh AD at {} has invalid length {}", offset, length);
            return None;
        }

        let record = payload.get(offset..offset + 1 + length)?;
        Some(Self { offset, record })
    }

    /// Offset of the length byte within the payload
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total record size including the length byte
    pub fn record_len(&self) -> usize {
        self.record.len()
    }

    /// Raw record bytes, length byte first
    pub fn as_bytes(&self) -> &'a [u8] {
        self.record
    }

    /// Value handle
    pub fn handle(&self) -> ValueHandle {
        ValueHandle(read_u16(self.record, HANDLE_OFFSET))
    }

    /// Value version
    pub fn version(&self) -> u16 {
        read_u16(self.record, VERSION_OFFSET)
    }

    /// Value data
    pub fn data(&self) -> &'a [u8] {
        &self.record[DATA_OFFSET..]
    }
}

/// Check whether the AD structure at `offset` carries the mesh signature
pub(crate) fn has_mesh_signature(payload: &[u8], offset: usize) -> bool {
    match payload.get(offset + 1..offset + 1 + 1 + 2) {
        Some(sig) => {
            sig[0] == MESH_AD_TYPE && u16::from_le_bytes([sig[1], sig[2]]) == MESH_SERVICE_UUID
        }
        None => false,
    }
}

/// Write a mesh AD structure at the start of `payload`.
///
/// `data` must already be checked against `MAX_VALUE_LEN`. Bytes after the
/// record are zeroed. Returns the record size including the length byte.
pub(crate) fn write_app_structure(
    payload: &mut [u8; ADV_PAYLOAD_MAX_LEN],
    handle: ValueHandle,
    version: u16,
    data: &[u8],
) -> usize {
    debug_assert!(data.len() <= MAX_VALUE_LEN);

    let end = DATA_OFFSET + data.len();
    payload[0] = (MESH_ADV_OVERHEAD + data.len()) as u8;
    payload[1] = MESH_AD_TYPE;
    payload[UUID_OFFSET..HANDLE_OFFSET].copy_from_slice(&MESH_SERVICE_UUID.to_le_bytes());
    payload[HANDLE_OFFSET..VERSION_OFFSET].copy_from_slice(&handle.0.to_le_bytes());
    payload[VERSION_OFFSET..DATA_OFFSET].copy_from_slice(&version.to_le_bytes());
    payload[DATA_OFFSET..end].copy_from_slice(data);
    payload[end..].fill(0);

    end
}

fn read_u16(record: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([record[offset], record[offset + 1]])
}
