// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ownership transfer of received packets
//!
//! A packet received from another node may carry AD structures besides the
//! mesh data (flags, names, manufacturer data of the original advertiser).
//! Before it is relayed as this node's own advertisement those are stripped
//! and the source address is replaced with the local one.

use crate::error::{Error, Result};
use crate::identity::{stamp_local_address, LocalIdentity};
use crate::packet::{AdvPacket, PduType};
use crate::ADDR_LEN;

/// Compact the payload down to the mesh AD structure alone.
///
/// The structure is moved to payload offset 0 if needed, the header length
/// is trimmed to cover exactly that structure, and the rest of the payload
/// is zeroed. Fails with [`Error::InvalidData`] if the packet carries no
/// valid mesh AD structure; the packet is unchanged in that case.
pub fn sanitize(packet: &mut AdvPacket) -> Result<()> {
    let (offset, record_len) = match packet.app_data() {
        Some(app) => (app.offset(), app.record_len()),
        None => return Err(Error::InvalidData),
    };

    if offset != 0 {
        // Source and destination may overlap; copy_within has memmove semantics
        packet.payload.copy_within(offset..offset + record_len, 0);
        log::debug!("moved mesh AD structure from offset {} to 0", offset);
    }
    packet.payload[record_len..].fill(0);
    packet.header.length = (ADDR_LEN + record_len) as u8;

    Ok(())
}

/// Prepare a received packet for relaying as a locally originated one.
///
/// Foreign AD structures are stripped with [`sanitize`], the PDU type is
/// forced to non-connectable, and the local address is stamped. The address
/// is stamped even when sanitizing fails; the sanitize error is reported
/// first.
pub fn take_ownership<I: LocalIdentity + ?Sized>(
    packet: &mut AdvPacket,
    identity: &I,
) -> Result<()> {
    let sanitized = if packet.has_foreign_structures() {
        sanitize(packet)
    } else {
        Ok(())
    };

    packet.header.pdu_type = PduType::AdvNonconnInd;
    let stamped = stamp_local_address(packet, identity);

    sanitized.and(stamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{DeviceAddress, StaticIdentity, UnavailableIdentity};
    use crate::packet::{AddressType, ValueHandle, MESH_ADV_OVERHEAD};
    use crate::ADV_PAYLOAD_MAX_LEN;

    const LOCAL: DeviceAddress = DeviceAddress::new([1, 2, 3, 4, 5, 6], AddressType::Public);
    const REMOTE: DeviceAddress = DeviceAddress::new([9, 9, 9, 9, 9, 9], AddressType::Random);

    /// Packet from REMOTE with `before` and `after` around a mesh structure
    fn received(before: &[u8], data: &[u8], after: &[u8]) -> AdvPacket {
        let mut mesh = AdvPacket::EMPTY;
        mesh.build(&StaticIdentity::new(REMOTE), ValueHandle(0x55), 12, data)
            .expect("mesh data fits");
        let record = mesh.payload();

        let mut packet = AdvPacket::EMPTY;
        packet.set_source_address(REMOTE);
        packet.header.pdu_type = PduType::AdvInd;

        let mut pos = 0;
        for part in [before, record, after] {
            packet.payload[pos..pos + part.len()].copy_from_slice(part);
            pos += part.len();
        }
        packet.header.length = (ADDR_LEN + pos) as u8;
        packet
    }

    #[test]
    fn test_sanitize_moves_to_start() {
        let mut packet = received(&[0x02, 0x01, 0x06], b"abc", &[0x02, 0x0A, 0x00]);
        assert_eq!(packet.app_data().unwrap().offset(), 3);

        sanitize(&mut packet).unwrap();

        let app = packet.app_data().unwrap();
        assert_eq!(app.offset(), 0);
        assert_eq!(app.handle(), ValueHandle(0x55));
        assert_eq!(app.version(), 12);
        assert_eq!(app.data(), b"abc");
        assert_eq!(packet.payload_len(), 1 + MESH_ADV_OVERHEAD + 3);
        assert!(!packet.has_foreign_structures());
    }

    #[test]
    fn test_sanitize_heavy_overlap() {
        // Record longer than the shift distance
        let data = [0xA5u8; 21];
        let mut packet = received(&[0x01, 0xFF], &data, &[]);
        assert_eq!(packet.payload_len(), ADV_PAYLOAD_MAX_LEN);

        sanitize(&mut packet).unwrap();

        let app = packet.app_data().unwrap();
        assert_eq!(app.offset(), 0);
        assert_eq!(app.data(), &data[..]);
        assert!(packet.payload[app.record_len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sanitize_trims_trailing() {
        let mut packet = received(&[], b"v", &[0x03, 0x19, 0x00, 0x02]);
        sanitize(&mut packet).unwrap();

        assert_eq!(packet.app_data().unwrap().offset(), 0);
        assert_eq!(packet.payload_len(), 1 + MESH_ADV_OVERHEAD + 1);
        assert_eq!(packet.ad_structures().count(), 1);
    }

    #[test]
    fn test_sanitize_idempotent() {
        let mut packet = received(&[0x02, 0x01, 0x06], b"xyz", &[0x02, 0x0A, 0x00]);

        sanitize(&mut packet).unwrap();
        let once = packet;
        sanitize(&mut packet).unwrap();

        assert_eq!(packet, once);
    }

    #[test]
    fn test_sanitize_without_mesh_data() {
        let mut packet = received(&[0x02, 0x01, 0x06], b"", &[]);
        packet.payload[3..].fill(0);
        packet.header.length = (ADDR_LEN + 3) as u8;
        let before = packet;

        assert_eq!(sanitize(&mut packet), Err(Error::InvalidData));
        assert_eq!(packet, before);
    }

    #[test]
    fn test_take_ownership_strips_foreign() {
        let before = [0x02, 0x01, 0x06, 0x03, 0x03, 0xAA, 0xFE];
        let mut packet = received(&before, b"hi", &[0x02, 0x0A, 0x04]);
        assert!(packet.has_foreign_structures());

        take_ownership(&mut packet, &StaticIdentity::new(LOCAL)).unwrap();

        assert!(!packet.has_foreign_structures());
        assert_eq!(packet.ad_structures().count(), 1);
        assert_eq!(packet.app_data().unwrap().offset(), 0);
        assert_eq!(packet.app_data().unwrap().data(), b"hi");
        assert_eq!(packet.source_address(), LOCAL);
        assert_eq!(packet.header.pdu_type, PduType::AdvNonconnInd);
    }

    #[test]
    fn test_take_ownership_strips_data_behind_zero_length() {
        let mut packet = received(&[], b"c", &[0x00, 0x02, 0x01, 0x06]);
        assert!(packet.has_foreign_structures());

        take_ownership(&mut packet, &StaticIdentity::new(LOCAL)).unwrap();

        assert_eq!(packet.payload_len(), 1 + MESH_ADV_OVERHEAD + 1);
        assert!(packet.payload[packet.payload_len()..].iter().all(|&b| b == 0));
        assert!(!packet.has_foreign_structures());
        assert_eq!(packet.app_data().unwrap().data(), b"c");
    }

    #[test]
    fn test_take_ownership_after_leading_zero_length() {
        let mut packet = received(&[0x00], b"c", &[]);
        assert_eq!(packet.app_data().unwrap().offset(), 1);

        take_ownership(&mut packet, &StaticIdentity::new(LOCAL)).unwrap();

        let app = packet.app_data().unwrap();
        assert_eq!(app.offset(), 0);
        assert_eq!(app.handle(), ValueHandle(0x55));
        assert_eq!(packet.ad_structures().count(), 1);
    }

    #[test]
    fn test_take_ownership_clean_packet() {
        let mut packet = received(&[], b"ok", &[]);
        let payload_before = packet.payload;

        take_ownership(&mut packet, &StaticIdentity::new(LOCAL)).unwrap();

        assert_eq!(packet.payload, payload_before);
        assert_eq!(packet.source_address(), LOCAL);
    }

    #[test]
    fn test_take_ownership_identity_failure() {
        let mut packet = received(&[0x02, 0x01, 0x06], b"ok", &[]);

        let result = take_ownership(&mut packet, &UnavailableIdentity);

        assert_eq!(result, Err(Error::IdentityUnavailable));
        assert_eq!(packet.app_data().unwrap().offset(), 0);
        assert_eq!(packet.source_address(), REMOTE);
    }

    #[test]
    fn test_take_ownership_without_mesh_data_still_stamps() {
        let mut packet = AdvPacket::EMPTY;
        packet.set_source_address(REMOTE);
        packet.payload[..3].copy_from_slice(&[0x02, 0x01, 0x06]);
        packet.header.length = (ADDR_LEN + 3) as u8;

        let result = take_ownership(&mut packet, &StaticIdentity::new(LOCAL));

        assert_eq!(result, Err(Error::InvalidData));
        assert_eq!(packet.source_address(), LOCAL);
    }
}
