// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use advmesh::packet::{find_app_data, has_foreign_structures, AdStructures};
use advmesh::{AdvPacket, ADDR_LEN, ADV_PAYLOAD_MAX_LEN, MAX_VALUE_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte drives the declared length, the rest fills the payload
    let Some((&length, rest)) = data.split_first() else {
        return;
    };

    let mut packet = AdvPacket::EMPTY;
    let n = rest.len().min(ADV_PAYLOAD_MAX_LEN);
    packet.payload[..n].copy_from_slice(&rest[..n]);
    packet.header.length = length;

    if let Some(app) = find_app_data(&packet.payload) {
        assert!(app.offset() + app.record_len() <= ADV_PAYLOAD_MAX_LEN);
        assert!(app.data().len() <= MAX_VALUE_LEN);
    }

    let payload_len = usize::from(length).saturating_sub(ADDR_LEN);
    let _ = has_foreign_structures(&packet.payload, payload_len);

    for ad in AdStructures::new(packet.payload()) {
        assert!(ad.offset + ad.record_len() <= packet.payload_len());
    }

    if advmesh::sanitize(&mut packet).is_ok() {
        assert_eq!(packet.app_data().map(|app| app.offset()), Some(0));
        assert!(!packet.has_foreign_structures());
    }
});
