use crate::error::{BridgeError, BridgeResult};

/// Reusable identifier pool for collider records.
///
/// Hands out identifiers in [0, capacity); released identifiers return to the
/// pool and may be handed out again in any order.
#[derive(Debug)]
pub struct IdPool {
    capacity: usize,
    free: Vec<u32>,
}

impl IdPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            free: (0..capacity as u32).rev().collect(),
        }
    }

    /// Take an unused identifier, or fail once all of them are live.
    pub fn allocate(&mut self) -> BridgeResult<u32> {
        self.free.pop().ok_or(BridgeError::IdPoolExhausted {
            capacity: self.capacity,
        })
    }

    /// Return an identifier to the pool. Callers only release identifiers
    /// they allocated.
    pub fn release(&mut self, id: u32) {
        debug_assert!((id as usize) < self.capacity, "id {} out of range", id);
        debug_assert!(!self.free.contains(&id), "double release of id {}", id);
        self.free.push(id);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_use(&self) -> usize {
        self.capacity - self.free.len()
    }
}
