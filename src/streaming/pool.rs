//! Chunk slot pool
//!
//! - Bounded free-list of idle slots for reuse
//! - Slots released beyond capacity are discarded
//! - Allocation fails once the active limit is reached

use crate::core::error::Error;
use crate::core::types::Result;
use crate::streaming::slot::ChunkSlot;
use crate::voxel::ChunkCoord;

/// Default number of idle slots kept
pub const DEFAULT_POOL_CAPACITY: usize = 50;

/// Pool of reusable chunk slots
#[derive(Debug)]
pub struct ChunkPool {
    /// Idle slots ready for reuse
    free: Vec<ChunkSlot>,
    /// Maximum idle slots retained
    capacity: usize,
    /// Maximum slots in use at once
    max_active: usize,
    /// Next id for freshly allocated slots
    next_id: u64,
}

impl ChunkPool {
    /// Create a pool keeping up to `capacity` idle slots
    pub fn new(capacity: usize, max_active: usize) -> Self {
        log::info!(
            "Chunk pool created: {} idle slots, {} active max",
            capacity,
            max_active
        );
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
            max_active,
            next_id: 1,
        }
    }

    /// Get a slot for `coord`, reusing an idle one if available
    ///
    /// `active` is the number of slots currently handed out.
    pub fn acquire(&mut self, coord: ChunkCoord, active: usize) -> Result<ChunkSlot> {
        if active >= self.max_active {
            return Err(Error::SlotExhausted { limit: self.max_active });
        }
        if let Some(mut slot) = self.free.pop() {
            log::trace!("Reusing slot {} for chunk {}", slot.id(), coord);
            slot.assign(coord);
            return Ok(slot);
        }
        let id = self.next_id;
        self.next_id += 1;
        log::trace!("Allocated slot {} for chunk {}", id, coord);
        Ok(ChunkSlot::new(id, coord))
    }

    /// Return a slot; returns `false` when the pool is full and the slot is dropped
    pub fn release(&mut self, mut slot: ChunkSlot) -> bool {
        slot.reset();
        if self.free.len() < self.capacity {
            self.free.push(slot);
            true
        } else {
            log::trace!("Pool full, discarding slot {}", slot.id());
            false
        }
    }

    /// Idle slots currently pooled
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    /// Drop every pooled slot
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_slots_get_unique_ids() {
        let mut pool = ChunkPool::new(4, 10);
        let a = pool.acquire(ChunkCoord::new(0, 0, 0), 0).unwrap();
        let b = pool.acquire(ChunkCoord::new(1, 0, 0), 1).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(b.coord(), ChunkCoord::new(1, 0, 0));
    }

    #[test]
    fn test_reuse() {
        let mut pool = ChunkPool::new(4, 10);
        let slot = pool.acquire(ChunkCoord::new(0, 0, 0), 0).unwrap();
        let id = slot.id();
        assert!(pool.release(slot));
        assert_eq!(pool.len(), 1);

        let reused = pool.acquire(ChunkCoord::new(5, 5, 5), 0).unwrap();
        assert_eq!(reused.id(), id);
        assert_eq!(reused.coord(), ChunkCoord::new(5, 5, 5));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_capacity_cap() {
        let mut pool = ChunkPool::new(2, 10);
        let slots: Vec<_> = (0..3).map(|i| pool.acquire(ChunkCoord::new(i, 0, 0), i as usize).unwrap()).collect();
        let pooled: Vec<bool> = slots.into_iter().map(|s| pool.release(s)).collect();
        assert_eq!(pooled, vec![true, true, false]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_exhaustion() {
        let mut pool = ChunkPool::new(2, 3);
        assert!(pool.acquire(ChunkCoord::new(0, 0, 0), 2).is_ok());
        match pool.acquire(ChunkCoord::new(0, 0, 0), 3) {
            Err(Error::SlotExhausted { limit }) => assert_eq!(limit, 3),
            other => panic!("unexpected {:?}", other.map(|s| s.id())),
        }
    }

    #[test]
    fn test_release_resets_slot() {
        let mut pool = ChunkPool::new(2, 10);
        let mut slot = pool.acquire(ChunkCoord::new(0, 0, 0), 0).unwrap();
        let epoch = slot.begin_generation();
        pool.release(slot);

        let slot = pool.acquire(ChunkCoord::new(1, 0, 0), 0).unwrap();
        assert!(!slot.is_generating());
        assert!(!slot.is_current(epoch));
    }
}
