//! Free-list object pool for high-churn entities (bullets, particles)
//!
//! Slots are never freed: releasing marks the slot inactive and pushes its
//! index onto the free list. `get` pops a free slot (or grows the backing
//! vector) and hands back a freshly reset, active instance.

use serde::{Deserialize, Serialize};

/// Implemented by anything stored in a [`Pool`]
pub trait Poolable: Default {
    /// Restore every field to its default and mark the instance active
    fn reset(&mut self);
    fn is_active(&self) -> bool;
    fn deactivate(&mut self);
}

/// Index of a slot in a pool. Must not be used after release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub usize);

#[derive(Debug, Clone, Default)]
pub struct Pool<T: Poolable> {
    items: Vec<T>,
    free: Vec<usize>,
}

impl<T: Poolable> Pool<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Pre-allocate `capacity` inactive slots
    pub fn with_capacity(capacity: usize) -> Self {
        let items = (0..capacity)
            .map(|_| {
                let mut item = T::default();
                item.deactivate();
                item
            })
            .collect();
        // Reversed so the lowest slots are handed out first
        let free = (0..capacity).rev().collect();
        Self { items, free }
    }

    /// Acquire a reset, active instance
    pub fn get(&mut self) -> Handle {
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                self.items.push(T::default());
                self.items.len() - 1
            }
        };
        self.items[index].reset();
        Handle(index)
    }

    /// Return an instance to the free list. Releasing an inactive slot is a no-op.
    pub fn release(&mut self, handle: Handle) {
        let Some(item) = self.items.get_mut(handle.0) else {
            return;
        };
        if !item.is_active() {
            return;
        }
        item.deactivate();
        self.free.push(handle.0);
    }

    /// Release every active instance
    pub fn release_all(&mut self) {
        for i in 0..self.items.len() {
            self.release(Handle(i));
        }
    }

    pub fn get_ref(&self, handle: Handle) -> Option<&T> {
        self.items.get(handle.0).filter(|item| item.is_active())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.items.get_mut(handle.0).filter(|item| item.is_active())
    }

    /// Handles of all active instances, in slot order
    pub fn active_handles(&self) -> Vec<Handle> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_active())
            .map(|(i, _)| Handle(i))
            .collect()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter(|item| item.is_active())
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut().filter(|item| item.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.items.len() - self.free.len()
    }

    /// Total slots ever allocated
    pub fn capacity(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Dummy {
        active: bool,
        value: u32,
        flag: bool,
    }

    impl Default for Dummy {
        fn default() -> Self {
            Self {
                active: true,
                value: 0,
                flag: false,
            }
        }
    }

    impl Poolable for Dummy {
        fn reset(&mut self) {
            *self = Self::default();
        }
        fn is_active(&self) -> bool {
            self.active
        }
        fn deactivate(&mut self) {
            self.active = false;
        }
    }

    #[test]
    fn test_release_then_get_reuses_reset_slot() {
        let mut pool: Pool<Dummy> = Pool::new();
        let h = pool.get();
        {
            let d = pool.get_mut(h).unwrap();
            d.value = 42;
            d.flag = true;
        }
        pool.release(h);
        let h2 = pool.get();
        assert_eq!(h, h2);
        assert_eq!(pool.capacity(), 1);
        assert_eq!(pool.get_ref(h2), Some(&Dummy::default()));
    }

    #[test]
    fn test_double_release_is_noop() {
        let mut pool: Pool<Dummy> = Pool::new();
        let h = pool.get();
        pool.release(h);
        pool.release(h);
        assert_eq!(pool.active_count(), 0);
        // Only one free entry, so two gets must allocate a second slot
        let a = pool.get();
        let b = pool.get();
        assert_ne!(a, b);
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn test_with_capacity_starts_inactive() {
        let pool: Pool<Dummy> = Pool::with_capacity(8);
        assert_eq!(pool.capacity(), 8);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.iter_active().count(), 0);
    }

    #[test]
    fn test_released_handle_is_not_readable() {
        let mut pool: Pool<Dummy> = Pool::new();
        let h = pool.get();
        pool.release(h);
        assert!(pool.get_ref(h).is_none());
        assert!(pool.get_mut(h).is_none());
    }

    proptest! {
        #[test]
        fn active_set_matches_outstanding_handles(ops in proptest::collection::vec(any::<bool>(), 1..64)) {
            let mut pool: Pool<Dummy> = Pool::new();
            let mut outstanding: Vec<Handle> = Vec::new();
            for get in ops {
                if get || outstanding.is_empty() {
                    outstanding.push(pool.get());
                } else {
                    let h = outstanding.remove(0);
                    pool.release(h);
                }
            }
            let mut active = pool.active_handles();
            active.sort();
            outstanding.sort();
            prop_assert_eq!(active, outstanding);
        }
    }
}
