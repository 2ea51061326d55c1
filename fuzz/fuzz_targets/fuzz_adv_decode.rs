// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use advmesh::packet::MAX_PACKET_LEN;
use advmesh::{take_ownership, AddressType, AdvPacket, DeviceAddress, StaticIdentity};
use libfuzzer_sys::fuzz_target;

const LOCAL: DeviceAddress = DeviceAddress::new([1, 2, 3, 4, 5, 6], AddressType::Public);

fuzz_target!(|data: &[u8]| {
    let Ok(mut packet) = AdvPacket::decode(data) else {
        return;
    };

    // Decoded packets always re-encode
    let mut out = [0u8; MAX_PACKET_LEN];
    let len = packet.encode(&mut out).unwrap();
    assert_eq!(&out[3..len], &data[3..len]);

    let had_app = packet.app_data().is_some();
    let result = take_ownership(&mut packet, &StaticIdentity::new(LOCAL));
    if had_app {
        assert!(result.is_ok());
        assert!(!packet.has_foreign_structures());
    }
    assert_eq!(packet.source_address(), LOCAL);
});
