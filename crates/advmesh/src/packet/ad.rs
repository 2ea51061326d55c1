// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! AD structure chain walking
//!
//! An advertisement payload is a chain of `[length][ad type][data...]`
//! records. `length` counts the bytes after itself, so the next record
//! starts `1 + length` bytes further. A zero length byte is an empty
//! record of its own: the walk moves on by one byte.

use super::app::{has_mesh_signature, AppData, MESH_AD_TYPE, MESH_SERVICE_UUID};
use crate::ADV_PAYLOAD_MAX_LEN;

/// One AD structure of a payload chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdStructure<'a> {
    /// Offset of the length byte within the payload
    pub offset: usize,
    /// AD type, `None` for an empty record (zero length byte)
    pub ad_type: Option<u8>,
    /// Data following the AD type
    pub data: &'a [u8],
}

impl AdStructure<'_> {
    /// Record size including the length byte
    pub fn record_len(&self) -> usize {
        match self.ad_type {
            Some(_) => 2 + self.data.len(),
            None => 1,
        }
    }

    /// Check if this is an empty record
    pub fn is_empty(&self) -> bool {
        self.ad_type.is_none()
    }

    /// Check if this record carries the mesh signature
    pub fn is_mesh(&self) -> bool {
        self.ad_type == Some(MESH_AD_TYPE)
            && self.data.len() >= 2
            && u16::from_le_bytes([self.data[0], self.data[1]]) == MESH_SERVICE_UUID
    }
}

/// Iterator over the well-formed AD structures of a payload
///
/// Zero length bytes come out as one-byte empty records. Stops at the end
/// of the slice or at the first record that would run past it; the latter
/// is reported by [`AdStructures::truncated`].
#[derive(Debug, Clone)]
pub struct AdStructures<'a> {
    payload: &'a [u8],
    offset: usize,
    truncated: bool,
}

impl<'a> AdStructures<'a> {
    /// Walk `payload` from offset 0
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            offset: 0,
            truncated: false,
        }
    }

    /// True once the walk hit a record extending past the payload
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> Iterator for AdStructures<'a> {
    type Item = AdStructure<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offset;
        let length = usize::from(*self.payload.get(offset)?);

        if length == 0 {
            self.offset = offset + 1;
            return Some(AdStructure {
                offset,
                ad_type: None,
                data: &[],
            });
        }

        let end = offset + 1 + length;
        if end > self.payload.len() {
            self.truncated = true;
            self.offset = self.payload.len();
            return None;
        }

        self.offset = end;
        Some(AdStructure {
            offset,
            ad_type: Some(self.payload[offset + 1]),
            data: &self.payload[offset + 2..end],
        })
    }
}

/// Locate the mesh AD structure in a payload buffer.
///
/// The walk is bounded by the buffer capacity rather than a declared length,
/// so a corrupted length byte can never move the cursor outside the buffer.
/// A signature match with an out-of-range length discards the whole lookup.
/// Zero length bytes are stepped over one at a time.
pub fn find_app_data(payload: &[u8; ADV_PAYLOAD_MAX_LEN]) -> Option<AppData<'_>> {
    let mut offset = 0;

    while offset < ADV_PAYLOAD_MAX_LEN {
        if has_mesh_signature(payload, offset) {
            return AppData::parse(payload, offset);
        }

        offset += 1 + usize::from(payload[offset]);
    }

    None
}

/// Check whether the first `payload_len` bytes hold anything besides mesh
/// AD structures.
///
/// Empty and truncated records count as foreign data.
pub fn has_foreign_structures(payload: &[u8; ADV_PAYLOAD_MAX_LEN], payload_len: usize) -> bool {
    let mut structures = AdStructures::new(&payload[..payload_len.min(ADV_PAYLOAD_MAX_LEN)]);

    for structure in &mut structures {
        if !structure.is_mesh() {
            return true;
        }
    }

    structures.truncated()
}
