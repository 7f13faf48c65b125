//! Fixed-slot pool for values of one type, addressed by recyclable slot ids.
//!
//! A block, once created, stays in the pool until the pool is dropped; freeing a slot only hands
//! its id back to the pool's private [`IdAllocator`] so the next `alloc` reuses the block. This
//! keeps the backing allocator out of attach/detach churn.
//!
//! `alloc` only reserves a block. Putting a live value into it is a separate step
//! ([`SlotPool::construct`]), because the value may need arguments the pool knows nothing about.

use hashbrown::HashMap;
use thiserror::Error;

#[cfg(feature = "use_serde")]
use serde::{Serialize, Deserialize};

use crate::{IdAllocator, PoolBackend, PoolConfig};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Creating a new block failed, either because the backing allocation failed or because the
    /// configured slot cap was reached.
    #[error("slot pool out of memory ({slots} slots in use)")]
    OutOfMemory { slots: usize },
}

/// Handle to one slot of a [`SlotPool`].
///
/// The generation changes every time the slot is freed, so a handle kept past `free` no longer
/// resolves to whatever value later reuses the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
pub struct SlotHandle {
    id: u32,
    generation: u32,
}

impl SlotHandle {
    #[inline]
    pub fn id(self) -> u32 {
        self.id
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for SlotHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot {}#{}", self.id, self.generation)
    }
}

/// Lifecycle of a single slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState<T> {
    /// Free. May still hold the last value until the block is handed out again.
    Vacant(Option<T>),
    /// Handed out, no live value yet.
    Reserved,
    /// Handed out and holding a live value.
    Constructed(T),
}

#[derive(Debug, Clone)]
struct Block<T> {
    generation: u32,
    state: SlotState<T>,
}

#[derive(Debug, Clone)]
enum Blocks<T> {
    Dense(Vec<Block<T>>),
    Keyed(HashMap<u32, Block<T>>),
}

impl<T> Blocks<T> {
    fn new(backend: PoolBackend, capacity: usize) -> Self {
        match backend {
            PoolBackend::Dense => Blocks::Dense(Vec::with_capacity(capacity)),
            PoolBackend::Keyed => Blocks::Keyed(HashMap::with_capacity(capacity)),
        }
    }

    fn len(&self) -> usize {
        match self {
            Blocks::Dense(v) => v.len(),
            Blocks::Keyed(m) => m.len(),
        }
    }

    fn get(&self, id: u32) -> Option<&Block<T>> {
        match self {
            Blocks::Dense(v) => v.get(id as usize),
            Blocks::Keyed(m) => m.get(&id),
        }
    }

    fn get_mut(&mut self, id: u32) -> Option<&mut Block<T>> {
        match self {
            Blocks::Dense(v) => v.get_mut(id as usize),
            Blocks::Keyed(m) => m.get_mut(&id),
        }
    }

    /// Makes room for one more block. Returns false if the backing storage could not grow.
    fn try_reserve_one(&mut self) -> bool {
        match self {
            Blocks::Dense(v) => v.try_reserve(1).is_ok(),
            Blocks::Keyed(m) => m.try_reserve(1).is_ok(),
        }
    }

    fn insert(&mut self, id: u32, block: Block<T>) {
        match self {
            Blocks::Dense(v) => {
                debug_assert_eq!(id as usize, v.len(), "dense pool ids must be created in order");
                v.push(block);
            },
            Blocks::Keyed(m) => {
                m.insert(id, block);
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlotPool<T> {
    ids: IdAllocator,
    blocks: Blocks<T>,
    max_slots: Option<usize>,
}

impl<T> Default for SlotPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotPool<T> {
    pub fn new() -> Self {
        Self::with_config(&PoolConfig::default())
    }

    pub fn with_config(config: &PoolConfig) -> Self {
        SlotPool {
            ids: IdAllocator::new(),
            blocks: Blocks::new(config.backend, config.initial_capacity),
            max_slots: config.max_slots,
        }
    }

    pub fn backend(&self) -> PoolBackend {
        match self.blocks {
            Blocks::Dense(_) => PoolBackend::Dense,
            Blocks::Keyed(_) => PoolBackend::Keyed,
        }
    }

    /// Reserves a slot, reusing a freed block when there is one.
    ///
    /// Fails only when a new block is needed and cannot be created. The pool is unchanged in
    /// that case.
    pub fn alloc(&mut self) -> Result<SlotHandle, PoolError> {
        if self.ids.unused() > 0 {
            let id = self.ids.get();
            if let Some(block) = self.blocks.get_mut(id) {
                debug_assert!(matches!(block.state, SlotState::Vacant(_)), "slot {id} handed out twice");
                block.state = SlotState::Reserved;
                log::trace!("reused slot {id}#{}", block.generation);
                return Ok(SlotHandle { id, generation: block.generation });
            }
            unreachable!("recycled slot id {id} has no block");
        }

        // room first, id second: a failed growth must not consume an id
        let at_cap = self.max_slots.map_or(false, |max| self.blocks.len() >= max);
        if at_cap || !self.blocks.try_reserve_one() {
            log::warn!("slot pool out of memory at {} slots", self.blocks.len());
            return Err(PoolError::OutOfMemory { slots: self.live_count() });
        }
        let id = self.ids.get();
        self.blocks.insert(id, Block { generation: 0, state: SlotState::Reserved });
        log::debug!("slot pool grew to {} slots", self.blocks.len());
        Ok(SlotHandle { id, generation: 0 })
    }

    /// Returns the slot to the pool. The handle must not be used afterwards.
    ///
    /// A value still constructed in the slot stays in the block until the block is reused, unless
    /// `erase_content` is set, in which case it is dropped right away.
    pub fn free(&mut self, handle: SlotHandle, erase_content: bool) {
        let Some(block) = self.live_block_mut(handle) else {
            debug_assert!(false, "free of invalid or already freed {handle}");
            return;
        };
        let stale = match std::mem::replace(&mut block.state, SlotState::Vacant(None)) {
            SlotState::Constructed(value) if !erase_content => Some(value),
            _ => None,
        };
        block.state = SlotState::Vacant(stale);
        block.generation = block.generation.wrapping_add(1);
        let released = self.ids.put(handle.id);
        debug_assert!(released.is_ok());
        log::trace!("freed {handle}");
    }

    /// Stores `value` in a reserved slot and marks it constructed.
    ///
    /// Constructing an already constructed slot is a caller error.
    pub fn construct(&mut self, handle: SlotHandle, value: T) {
        let Some(block) = self.live_block_mut(handle) else {
            debug_assert!(false, "construct into invalid {handle}");
            return;
        };
        debug_assert!(
            !matches!(block.state, SlotState::Constructed(_)),
            "{handle} is already constructed"
        );
        block.state = SlotState::Constructed(value);
    }

    /// Takes the live value out of the slot, leaving it reserved.
    pub fn destruct(&mut self, handle: SlotHandle) -> Option<T> {
        let block = self.live_block_mut(handle)?;
        match std::mem::replace(&mut block.state, SlotState::Reserved) {
            SlotState::Constructed(value) => Some(value),
            other => {
                block.state = other;
                None
            }
        }
    }

    pub fn is_constructed(&self, handle: SlotHandle) -> bool {
        matches!(self.live_block(handle), Some(Block { state: SlotState::Constructed(_), .. }))
    }

    /// True while `handle` refers to a slot that has not been freed since.
    pub fn is_live(&self, handle: SlotHandle) -> bool {
        self.live_block(handle).is_some()
    }

    pub fn state(&self, handle: SlotHandle) -> Option<&SlotState<T>> {
        self.blocks
            .get(handle.id)
            .filter(|b| b.generation == handle.generation)
            .map(|b| &b.state)
    }

    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        match self.live_block(handle)? {
            Block { state: SlotState::Constructed(value), .. } => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        match self.live_block_mut(handle)? {
            Block { state: SlotState::Constructed(value), .. } => Some(value),
            _ => None,
        }
    }

    /// Blocks ever created, in use or free.
    #[inline]
    pub fn total_slot_count(&self) -> usize {
        self.blocks.len()
    }

    /// Slots currently handed out.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.ids.in_use()
    }

    /// Created blocks waiting for reuse.
    #[inline]
    pub fn free_count(&self) -> usize {
        self.total_slot_count() - self.live_count()
    }

    fn live_block(&self, handle: SlotHandle) -> Option<&Block<T>> {
        self.blocks
            .get(handle.id)
            .filter(|b| b.generation == handle.generation && !matches!(b.state, SlotState::Vacant(_)))
    }

    fn live_block_mut(&mut self, handle: SlotHandle) -> Option<&mut Block<T>> {
        self.blocks
            .get_mut(handle.id)
            .filter(|b| b.generation == handle.generation && !matches!(b.state, SlotState::Vacant(_)))
    }
}
