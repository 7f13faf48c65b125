//! Dense integer id allocator with recycling.
//!
//! Ids are minted in increasing order starting at 0. Returned ids go into an ascending free list
//! and are handed out again before any fresh id is minted. The most recently minted side of the
//! free list wins: `get` pops the *largest* recycled id, which keeps `get` O(1).

#[cfg(feature = "use_serde")]
use serde::{Serialize, Deserialize};

use thiserror::Error;

/// Misuse of [`IdAllocator::put`]. The allocator is left untouched when one of these is returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    /// The id was never handed out by this allocator.
    #[error("id {id} was never issued (only {issued} ids issued so far)")]
    OutOfRange { id: u32, issued: u32 },
    /// The id is already sitting in the free list.
    #[error("id {0} was already released")]
    DuplicateRelease(u32),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
pub struct IdAllocator {
    /// Count of ids ever minted. Every id below this has been issued at least once.
    next_fresh: u32,
    /// Previously issued, currently unused ids. Strictly ascending.
    free: Vec<u32>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out an id nobody currently holds.
    ///
    /// # Panics
    ///
    /// Panics if all `u32::MAX` ids are held at once.
    pub fn get(&mut self) -> u32 {
        match self.free.pop() {
            Some(id) => id,
            None => {
                let id = self.next_fresh;
                self.next_fresh = self.next_fresh.checked_add(1).expect("IdAllocator: u32 id space exhausted");
                id
            }
        }
    }

    /// Gives `id` back so a later `get` can reuse it.
    pub fn put(&mut self, id: u32) -> Result<(), IdError> {
        if id >= self.next_fresh {
            log::warn!("rejected release of id {id}: only {} ids issued", self.next_fresh);
            return Err(IdError::OutOfRange { id, issued: self.next_fresh });
        }
        match self.free.binary_search(&id) {
            Ok(_) => {
                log::warn!("rejected duplicate release of id {id}");
                Err(IdError::DuplicateRelease(id))
            },
            Err(pos) => {
                self.free.insert(pos, id);
                Ok(())
            }
        }
    }

    /// Number of issued ids currently waiting in the free list.
    #[inline]
    pub fn unused(&self) -> usize {
        self.free.len()
    }

    /// Number of ids ever minted.
    #[inline]
    pub fn issued(&self) -> u32 {
        self.next_fresh
    }

    /// Number of ids currently held by someone.
    #[inline]
    pub fn in_use(&self) -> usize {
        self.next_fresh as usize - self.free.len()
    }

    /// The free list, ascending.
    #[inline]
    pub fn free_ids(&self) -> &[u32] {
        &self.free
    }

    /// True when every id ever issued has been put back.
    pub fn is_fully_returned(&self) -> bool {
        self.free.len() == self.next_fresh as usize
            && self.free.iter().enumerate().all(|(i, id)| i as u32 == *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_sequential() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.get(), 0);
        assert_eq!(ids.get(), 1);
        assert_eq!(ids.get(), 2);
        assert_eq!(ids.issued(), 3);
        assert_eq!(ids.unused(), 0);
        assert_eq!(ids.in_use(), 3);
    }

    #[test]
    fn put_rejects_never_issued() {
        let mut ids = IdAllocator::new();
        ids.get();
        assert_eq!(ids.put(1), Err(IdError::OutOfRange { id: 1, issued: 1 }));
        assert_eq!(ids.put(17), Err(IdError::OutOfRange { id: 17, issued: 1 }));
        assert_eq!(ids.unused(), 0);
    }

    #[test]
    fn put_rejects_duplicates() {
        let mut ids = IdAllocator::new();
        for _ in 0..4 {
            ids.get();
        }
        ids.put(2).unwrap();
        assert_eq!(ids.put(2), Err(IdError::DuplicateRelease(2)));
        assert_eq!(ids.free_ids(), &[2]);
    }

    #[test]
    fn free_list_stays_ascending() {
        let mut ids = IdAllocator::new();
        for _ in 0..10 {
            ids.get();
        }
        for id in [7, 1, 9, 4, 0, 5] {
            ids.put(id).unwrap();
        }
        assert_eq!(ids.free_ids(), &[0, 1, 4, 5, 7, 9]);
        // largest recycled id comes back first
        assert_eq!(ids.get(), 9);
        assert_eq!(ids.get(), 7);
        assert_eq!(ids.free_ids(), &[0, 1, 4, 5]);
    }

    #[test]
    fn recycled_before_fresh() {
        let mut ids = IdAllocator::new();
        let a = ids.get();
        let _b = ids.get();
        ids.put(a).unwrap();
        assert_eq!(ids.get(), a);
        assert_eq!(ids.get(), 2);
    }

    #[test]
    fn fully_returned() {
        let mut ids = IdAllocator::new();
        assert!(ids.is_fully_returned());
        let taken: Vec<u32> = (0..5).map(|_| ids.get()).collect();
        assert!(!ids.is_fully_returned());
        for id in taken.into_iter().rev() {
            ids.put(id).unwrap();
        }
        assert!(ids.is_fully_returned());
    }

    #[test]
    fn no_live_id_is_handed_out_twice() {
        let mut ids = IdAllocator::new();
        let mut live: Vec<u32> = Vec::new();
        // deterministic pseudo-random churn
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..2000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            if seed % 3 != 0 || live.is_empty() {
                let id = ids.get();
                assert!(!live.contains(&id), "id {id} handed out while still live");
                live.push(id);
            } else {
                let victim = live.swap_remove(seed as usize % live.len());
                ids.put(victim).unwrap();
            }
            assert!(ids.free_ids().windows(2).all(|w| w[0] < w[1]));
            assert_eq!(ids.in_use(), live.len());
        }
    }
}
