//! Pool of reusable color identifiers bounded by the palette size.

use std::collections::BTreeSet;

use thiserror::Error;

/// Index into the theme palette.
pub type ColorId = usize;

/// Error type for color pool operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Every id is in use
    #[error("color palette exhausted: all {capacity} colors are in use")]
    Exhausted { capacity: usize },
    /// Released an id that is currently free
    #[error("color id {id} is not allocated")]
    NotAllocated { id: ColorId },
    /// Released an id outside `0..capacity`
    #[error("color id {id} is outside the palette (0..{capacity})")]
    OutOfRange { id: ColorId, capacity: usize },
}

/// Allocator of ids `0..capacity`, handing out the lowest free id first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorIdPool {
    capacity: usize,
    free: BTreeSet<ColorId>,
}

impl ColorIdPool {
    /// Create a pool with every id in `0..capacity` free.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            free: (0..capacity).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn in_use_count(&self) -> usize {
        self.capacity - self.free.len()
    }

    /// Whether `id` is currently handed out.
    pub fn is_allocated(&self, id: ColorId) -> bool {
        id < self.capacity && !self.free.contains(&id)
    }

    /// Take the lowest free id.
    pub fn allocate(&mut self) -> Result<ColorId, PoolError> {
        self.free.pop_first().ok_or(PoolError::Exhausted {
            capacity: self.capacity,
        })
    }

    /// Return an allocated id to the pool.
    pub fn release(&mut self, id: ColorId) -> Result<(), PoolError> {
        if id >= self.capacity {
            return Err(PoolError::OutOfRange {
                id,
                capacity: self.capacity,
            });
        }
        if !self.free.insert(id) {
            return Err(PoolError::NotAllocated { id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_lowest_free_id() {
        let mut pool = ColorIdPool::new(4);
        assert_eq!(pool.allocate(), Ok(0));
        assert_eq!(pool.allocate(), Ok(1));
        assert_eq!(pool.allocate(), Ok(2));

        pool.release(1).unwrap();
        assert_eq!(pool.allocate(), Ok(1));
        assert_eq!(pool.allocate(), Ok(3));
    }

    #[test]
    fn exhaustion_is_an_error() {
        let mut pool = ColorIdPool::new(2);
        pool.allocate().unwrap();
        pool.allocate().unwrap();
        assert_eq!(pool.allocate(), Err(PoolError::Exhausted { capacity: 2 }));
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn double_release_is_rejected() {
        let mut pool = ColorIdPool::new(3);
        let id = pool.allocate().unwrap();
        pool.release(id).unwrap();
        assert_eq!(pool.release(id), Err(PoolError::NotAllocated { id }));
    }

    #[test]
    fn release_out_of_range_is_rejected() {
        let mut pool = ColorIdPool::new(3);
        assert_eq!(
            pool.release(7),
            Err(PoolError::OutOfRange { id: 7, capacity: 3 })
        );
    }

    #[test]
    fn counts_track_allocations() {
        let mut pool = ColorIdPool::new(5);
        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();
        assert_eq!(pool.in_use_count(), 2);
        assert_eq!(pool.free_count(), 3);
        assert!(pool.is_allocated(a));
        assert!(pool.is_allocated(b));
        assert!(!pool.is_allocated(4));
        assert!(!pool.is_allocated(99));
    }
}
