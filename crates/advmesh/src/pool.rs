// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-size, reference-counted packet pool
//!
//! A packet slot is free while its reference count is zero. [`PacketPool::acquire`]
//! hands out the first free slot with a count of one; every additional owner
//! registers itself with [`PacketPool::retain`] and drops out with
//! [`PacketPool::release`]. The slot is reused once the last owner released it.
//!
//! Slots are identified by [`PacketHandle`]s which carry the issuing pool's
//! id, so a handle presented to the wrong pool is rejected instead of
//! silently touching an unrelated slot.
//!
//! No allocation, O(N) worst case for every operation.

use crate::error::{Error, Result};
use crate::packet::AdvPacket;

/// Handle to a pool slot
///
/// Encoded as: upper 16 bits = pool_id, lower 16 bits = slot index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketHandle(u32);

impl PacketHandle {
    const fn new(pool_id: u16, index: u16) -> Self {
        Self(((pool_id as u32) << 16) | index as u32)
    }

    /// Id of the issuing pool
    pub const fn pool_id(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Slot index within the issuing pool
    pub const fn index(self) -> usize {
        (self.0 & 0xFFFF) as usize
    }

    /// Raw encoded value
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Fixed-size packet pool with per-slot reference counts
///
/// `N` must be between 1 and 65536.
pub struct PacketPool<const N: usize> {
    pool_id: u16,
    packets: [AdvPacket; N],
    refs: [u8; N],
}

impl<const N: usize> PacketPool<N> {
    const VALID_SIZE: () = assert!(N > 0 && N <= 1 << 16, "pool size must be 1..=65536");

    /// Create a pool with all slots free.
    ///
    /// `pool_id` is embedded in every handle this pool issues; pools that
    /// coexist should use distinct ids.
    pub const fn new(pool_id: u16) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_SIZE;

        Self {
            pool_id,
            packets: [AdvPacket::EMPTY; N],
            refs: [0; N],
        }
    }

    /// Reset every reference count to zero.
    ///
    /// Invalidates all outstanding handles; only call while no slot is in use.
    pub fn init(&mut self) {
        self.refs = [0; N];
    }

    /// Id embedded in handles issued by this pool
    pub fn pool_id(&self) -> u16 {
        self.pool_id
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of free slots
    pub fn available(&self) -> usize {
        self.refs.iter().filter(|&&count| count == 0).count()
    }

    /// Number of held slots
    pub fn in_use(&self) -> usize {
        N - self.available()
    }

    /// Acquire the first free slot.
    ///
    /// The slot is reset to an empty packet and its reference count set to
    /// one. Returns `None` when every slot is held.
    pub fn acquire(&mut self) -> Option<PacketHandle> {
        let Some(index) = self.refs.iter().position(|&count| count == 0) else {
            log::warn!("packet pool {} exhausted ({} slots)", self.pool_id, N);
            return None;
        };

        self.refs[index] = 1;
        self.packets[index] = AdvPacket::EMPTY;
        log::debug!("packet pool {}: acquired slot {}", self.pool_id, index);

        Some(PacketHandle::new(self.pool_id, index as u16))
    }

    /// Like [`PacketPool::acquire`], reporting exhaustion as
    /// [`Error::PoolExhausted`]
    pub fn try_acquire(&mut self) -> Result<PacketHandle> {
        self.acquire().ok_or(Error::PoolExhausted)
    }

    /// Register an additional owner of a held slot.
    ///
    /// Returns the new reference count. Fails with
    /// [`Error::ForeignOwnership`] for a handle from another pool, with
    /// [`Error::NotHeld`] for a slot that was already released, and with
    /// [`Error::RefcountOverflow`] if the count would wrap. The last one is
    /// fatal (see [`Error::is_fatal`]); the count is left unchanged in every
    /// error case.
    pub fn retain(&mut self, handle: PacketHandle) -> Result<u8> {
        let index = self.index_of(handle)?;

        let count = self.refs[index];
        if count == 0 {
            log::warn!("packet pool {}: retain of free slot {}", self.pool_id, index);
            return Err(Error::NotHeld);
        }

        match count.checked_add(1) {
            Some(count) => {
                self.refs[index] = count;
                Ok(count)
            }
            None => {
                log::error!(
                    "packet pool {}: reference count overflow on slot {}",
                    self.pool_id,
                    index
                );
                Err(Error::RefcountOverflow)
            }
        }
    }

    /// Drop one owner of a slot.
    ///
    /// Returns the remaining reference count; the slot becomes free when it
    /// reaches zero. Releasing a slot whose count is already zero fails with
    /// [`Error::NotHeld`] and changes nothing.
    pub fn release(&mut self, handle: PacketHandle) -> Result<u8> {
        let index = self.index_of(handle)?;

        let count = self.refs[index];
        if count == 0 {
            log::warn!("packet pool {}: double release of slot {}", self.pool_id, index);
            return Err(Error::NotHeld);
        }

        self.refs[index] = count - 1;
        if count == 1 {
            log::debug!("packet pool {}: slot {} free", self.pool_id, index);
        }
        Ok(count - 1)
    }

    /// Current reference count of a slot
    pub fn ref_count(&self, handle: PacketHandle) -> Result<u8> {
        let index = self.index_of(handle)?;
        Ok(self.refs[index])
    }

    /// Packet in a held slot
    pub fn get(&self, handle: PacketHandle) -> Option<&AdvPacket> {
        let index = self.held_index(handle)?;
        Some(&self.packets[index])
    }

    /// Mutable packet in a held slot
    pub fn get_mut(&mut self, handle: PacketHandle) -> Option<&mut AdvPacket> {
        let index = self.held_index(handle)?;
        Some(&mut self.packets[index])
    }

    /// Tear the pool down, freeing every slot.
    ///
    /// Returns how many slots were still held; each is logged as a leak.
    pub fn shutdown(&mut self) -> usize {
        let mut leaked = 0;
        for (index, count) in self.refs.iter_mut().enumerate() {
            if *count > 0 {
                log::warn!(
                    "packet pool {}: slot {} leaked with {} reference(s)",
                    self.pool_id,
                    index,
                    count
                );
                leaked += 1;
                *count = 0;
            }
        }
        leaked
    }

    fn index_of(&self, handle: PacketHandle) -> Result<usize> {
        if handle.pool_id() != self.pool_id || handle.index() >= N {
            log::warn!(
                "packet pool {}: rejected handle {:#010x}",
                self.pool_id,
                handle.raw()
            );
            return Err(Error::ForeignOwnership);
        }
        Ok(handle.index())
    }

    fn held_index(&self, handle: PacketHandle) -> Option<usize> {
        let index = self.index_of(handle).ok()?;
        (self.refs[index] > 0).then_some(index)
    }
}

impl<const N: usize> Default for PacketPool<N> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<const N: usize> core::fmt::Debug for PacketPool<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PacketPool")
            .field("pool_id", &self.pool_id)
            .field("capacity", &N)
            .field("in_use", &self.in_use())
            .finish()
    }
}
