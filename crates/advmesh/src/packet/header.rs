// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Advertising PDU header

use crate::error::{Error, Result};
use crate::ADDR_LEN;

/// On-air header size in bytes (S0, LENGTH, S1)
pub const PACKET_HEADER_LEN: usize = 3;

/// TxAdd bit position in S0
const TX_ADD_SHIFT: u8 = 6;

/// PDU type mask in S0
const PDU_TYPE_MASK: u8 = 0x0F;

/// Advertising channel PDU type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PduType {
    /// Connectable undirected
    AdvInd = 0x00,
    /// Connectable directed
    AdvDirectInd = 0x01,
    /// Non-connectable undirected (the only type the mesh transmits)
    #[default]
    AdvNonconnInd = 0x02,
    /// Scan request
    ScanReq = 0x03,
    /// Scan response
    ScanRsp = 0x04,
    /// Connect request
    ConnectReq = 0x05,
    /// Scannable undirected
    AdvScanInd = 0x06,
}

impl PduType {
    /// Parse from the low nibble of S0
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits & PDU_TYPE_MASK {
            0x00 => Ok(PduType::AdvInd),
            0x01 => Ok(PduType::AdvDirectInd),
            0x02 => Ok(PduType::AdvNonconnInd),
            0x03 => Ok(PduType::ScanReq),
            0x04 => Ok(PduType::ScanRsp),
            0x05 => Ok(PduType::ConnectReq),
            0x06 => Ok(PduType::AdvScanInd),
            _ => Err(Error::InvalidHeader),
        }
    }

    /// Get raw value
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Source address type (TxAdd bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressType {
    /// Public (IEEE-assigned) address
    #[default]
    Public,
    /// Random (static or private) address
    Random,
}

impl AddressType {
    /// Create from the TxAdd bit
    pub const fn from_tx_add(bit: bool) -> Self {
        if bit {
            AddressType::Random
        } else {
            AddressType::Public
        }
    }

    /// TxAdd bit value
    pub const fn tx_add(self) -> bool {
        matches!(self, AddressType::Random)
    }
}

/// Advertising PDU header
///
/// ```text
/// +---------------------------+--------+-------+
/// | S0                        | LENGTH | S1    |
/// | type 4b | rfu 2b | TxAdd  |   1B   |  1B   |
/// |         |        | 1b|rfu |        | (0)   |
/// +---------------------------+--------+-------+
/// Total: 3 bytes
/// ```
///
/// `length` counts the source address and the payload bytes in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvHeader {
    /// Total length following the header
    pub length: u8,
    /// PDU type
    pub pdu_type: PduType,
    /// Source address type
    pub addr_type: AddressType,
}

impl AdvHeader {
    /// Header of an empty non-connectable advertisement
    pub const EMPTY: Self = Self {
        length: ADDR_LEN as u8,
        pdu_type: PduType::AdvNonconnInd,
        addr_type: AddressType::Public,
    };

    /// Encode header to buffer
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < PACKET_HEADER_LEN {
            return Err(Error::BufferTooSmall);
        }

        buf[0] = self.pdu_type.bits() | ((self.addr_type.tx_add() as u8) << TX_ADD_SHIFT);
        buf[1] = self.length;
        buf[2] = 0;

        Ok(PACKET_HEADER_LEN)
    }

    /// Decode header from buffer
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < PACKET_HEADER_LEN {
            return Err(Error::BufferTooSmall);
        }

        let pdu_type = PduType::from_bits(buf[0])?;
        let addr_type = AddressType::from_tx_add((buf[0] >> TX_ADD_SHIFT) & 0x01 != 0);

        Ok(Self {
            length: buf[1],
            pdu_type,
            addr_type,
        })
    }
}
