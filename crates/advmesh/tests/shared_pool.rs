// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// SharedPacketPool under contention: a receive context fills slots while a
// relay context retains, rewrites and releases them.

use std::sync::{Arc, Barrier};
use std::thread;

use advmesh::{
    AddressType, AdvPacket, DeviceAddress, PooledPacket, SharedPacketPool, StaticIdentity,
    ValueHandle,
};

const POOL_SIZE: usize = 8;

fn identity(last: u8) -> StaticIdentity {
    StaticIdentity::new(DeviceAddress::new([1, 2, 3, 4, 5, last], AddressType::Public))
}

#[test]
fn guards_share_and_release_slots() {
    let pool = Arc::new(SharedPacketPool::<POOL_SIZE>::new(1));
    let barrier = Arc::new(Barrier::new(2));

    let rx_guard = pool.acquire_owned().unwrap();
    rx_guard
        .with_mut(|p| p.build(&identity(0xAA), ValueHandle(3), 1, b"rx"))
        .unwrap()
        .unwrap();

    let relay_guard: PooledPacket<POOL_SIZE> = rx_guard.try_clone().unwrap();
    let relay = {
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            relay_guard
                .with_mut(|p| advmesh::take_ownership(p, &identity(0xBB)))
                .unwrap()
                .unwrap();
            relay_guard.with(|p| p.source_address().bytes[5]).unwrap()
        })
    };

    barrier.wait();
    let relayed_by = relay.join().unwrap();
    assert_eq!(relayed_by, 0xBB);

    // Receive side still sees the packet, now stamped by the relay
    assert_eq!(rx_guard.with(AdvPacket::handle).unwrap(), Some(ValueHandle(3)));
    assert_eq!(pool.ref_count(rx_guard.handle()), Ok(1));

    drop(rx_guard);
    assert_eq!(pool.available(), POOL_SIZE);
}

#[test]
fn contended_acquire_release() {
    let pool = Arc::new(SharedPacketPool::<POOL_SIZE>::new(2));
    let workers = 4;
    let barrier = Arc::new(Barrier::new(workers));

    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let id = identity(worker as u8);
                for round in 0..2_000u16 {
                    let Some(guard) = pool.acquire_owned() else {
                        continue;
                    };
                    guard
                        .with_mut(|p| p.build(&id, ValueHandle(round), round, &[worker as u8]))
                        .unwrap()
                        .unwrap();
                    let extra = guard.try_clone().unwrap();
                    assert_eq!(extra.with(|p| p.handle()).unwrap(), Some(ValueHandle(round)));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(pool.available(), POOL_SIZE);
    assert_eq!(pool.shutdown(), 0);
}
