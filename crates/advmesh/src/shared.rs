// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packet pool shared between execution contexts
//!
//! Wraps [`PacketPool`] in a single `parking_lot::Mutex`. Every operation
//! holds the lock for one bounded O(N) pool call and never blocks inside it.
//! Packet contents are only reachable through closures so no reference
//! outlives the lock.
//!
//! [`PooledPacket`] is an owning guard: it releases its reference on drop,
//! and [`PooledPacket::try_clone`] registers an additional owner.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::packet::AdvPacket;
use crate::pool::{PacketHandle, PacketPool};

/// Thread-safe packet pool
pub struct SharedPacketPool<const N: usize> {
    inner: Mutex<PacketPool<N>>,
}

impl<const N: usize> SharedPacketPool<N> {
    /// Create a shared pool with all slots free
    pub fn new(pool_id: u16) -> Self {
        Self {
            inner: Mutex::new(PacketPool::new(pool_id)),
        }
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        N
    }

    /// Number of free slots
    pub fn available(&self) -> usize {
        self.inner.lock().available()
    }

    /// See [`PacketPool::acquire`]
    pub fn acquire(&self) -> Option<PacketHandle> {
        self.inner.lock().acquire()
    }

    /// See [`PacketPool::try_acquire`]
    pub fn try_acquire(&self) -> Result<PacketHandle> {
        self.inner.lock().try_acquire()
    }

    /// See [`PacketPool::retain`]
    pub fn retain(&self, handle: PacketHandle) -> Result<u8> {
        self.inner.lock().retain(handle)
    }

    /// See [`PacketPool::release`]
    pub fn release(&self, handle: PacketHandle) -> Result<u8> {
        self.inner.lock().release(handle)
    }

    /// See [`PacketPool::ref_count`]
    pub fn ref_count(&self, handle: PacketHandle) -> Result<u8> {
        self.inner.lock().ref_count(handle)
    }

    /// Run `f` on the packet of a held slot
    pub fn with_packet<R>(
        &self,
        handle: PacketHandle,
        f: impl FnOnce(&AdvPacket) -> R,
    ) -> Result<R> {
        let pool = self.inner.lock();
        pool.get(handle).map(f).ok_or(Error::NotHeld)
    }

    /// Run `f` on the mutable packet of a held slot
    pub fn with_packet_mut<R>(
        &self,
        handle: PacketHandle,
        f: impl FnOnce(&mut AdvPacket) -> R,
    ) -> Result<R> {
        let mut pool = self.inner.lock();
        pool.get_mut(handle).map(f).ok_or(Error::NotHeld)
    }

    /// See [`PacketPool::shutdown`]
    pub fn shutdown(&self) -> usize {
        self.inner.lock().shutdown()
    }

    /// Acquire a slot wrapped in an owning guard
    pub fn acquire_owned(self: &Arc<Self>) -> Option<PooledPacket<N>> {
        let handle = self.acquire()?;
        Some(PooledPacket {
            pool: Arc::clone(self),
            handle,
        })
    }
}

impl<const N: usize> fmt::Debug for SharedPacketPool<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedPacketPool")
            .field("inner", &*self.inner.lock())
            .finish()
    }
}

/// One counted reference to a pool slot, released on drop
pub struct PooledPacket<const N: usize> {
    pool: Arc<SharedPacketPool<N>>,
    handle: PacketHandle,
}

impl<const N: usize> PooledPacket<N> {
    /// Underlying handle
    pub fn handle(&self) -> PacketHandle {
        self.handle
    }

    /// Register another owner of the same slot
    pub fn try_clone(&self) -> Result<Self> {
        self.pool.retain(self.handle)?;
        Ok(Self {
            pool: Arc::clone(&self.pool),
            handle: self.handle,
        })
    }

    /// Run `f` on the packet.
    ///
    /// Fails with [`Error::NotHeld`] only if the pool was shut down or the
    /// handle released behind the guard's back.
    pub fn with<R>(&self, f: impl FnOnce(&AdvPacket) -> R) -> Result<R> {
        self.pool.with_packet(self.handle, f)
    }

    /// Run `f` on the mutable packet
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut AdvPacket) -> R) -> Result<R> {
        self.pool.with_packet_mut(self.handle, f)
    }
}

impl<const N: usize> fmt::Debug for PooledPacket<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledPacket")
            .field("handle", &self.handle)
            .finish()
    }
}

impl<const N: usize> Drop for PooledPacket<N> {
    fn drop(&mut self) {
        if let Err(e) = self.pool.release(self.handle) {
            log::error!("pooled packet {:?} release failed: {}", self.handle, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaticIdentity;
    use crate::packet::ValueHandle;
    use std::thread;

    #[test]
    fn test_shared_basic() {
        let pool: SharedPacketPool<2> = SharedPacketPool::new(3);
        let h = pool.acquire().unwrap();
        let identity = StaticIdentity::new(Default::default());

        pool.with_packet_mut(h, |p| p.build(&identity, ValueHandle(4), 1, b"d"))
            .unwrap()
            .unwrap();
        assert_eq!(pool.with_packet(h, |p| p.handle()), Ok(Some(ValueHandle(4))));

        assert_eq!(pool.release(h), Ok(0));
        assert_eq!(pool.with_packet(h, |p| p.handle()), Err(Error::NotHeld));
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let pool = Arc::new(SharedPacketPool::<2>::new(0));

        let first = pool.acquire_owned().unwrap();
        let second = first.try_clone().unwrap();
        assert_eq!(pool.ref_count(first.handle()), Ok(2));
        assert_eq!(pool.available(), 1);

        drop(first);
        assert_eq!(pool.ref_count(second.handle()), Ok(1));
        second.with_mut(|p| p.header.length = 6).unwrap();
        assert_eq!(second.with(|p| p.payload_len()), Ok(0));

        drop(second);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_guard_exhaustion() {
        let pool = Arc::new(SharedPacketPool::<1>::new(0));
        let held = pool.acquire_owned().unwrap();
        assert!(pool.acquire_owned().is_none());
        drop(held);
        assert!(pool.acquire_owned().is_some());
    }

    #[test]
    fn test_concurrent_retain_release() {
        let pool = Arc::new(SharedPacketPool::<4>::new(0));
        let h = pool.acquire().unwrap();

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        pool.retain(h).unwrap();
                        pool.release(h).unwrap();
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(pool.ref_count(h), Ok(1));
        assert_eq!(pool.release(h), Ok(0));
        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn test_concurrent_acquire() {
        let pool = Arc::new(SharedPacketPool::<16>::new(0));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let mut held = Vec::new();
                    while let Some(h) = pool.acquire() {
                        held.push(h);
                    }
                    held
                })
            })
            .collect();

        let mut all: Vec<_> = workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect();
        all.sort_by_key(|h| h.index());
        all.dedup();

        assert_eq!(all.len(), 16);
        assert_eq!(pool.available(), 0);
    }
}
