use std::any::Any;
use std::num::NonZeroU32;

use hashbrown::HashMap;
use smallvec::SmallVec;

#[cfg(feature = "use_serde")]
use serde::{Serialize, Deserialize};

use crate::{OwnerRef, SlotHandle};

/// Identifier of an [`Entity`], unique among the live entities of one [`Registry`](crate::Registry).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
pub struct EntityId(pub(crate) u32);

impl EntityId {
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Opaque key a [`ComponentManager`](crate::ComponentManager) files its entries under.
///
/// Tags start at 1; zero stays free to mean "unassigned".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
pub struct ComponentTag(pub(crate) NonZeroU32);

impl ComponentTag {
    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Which slot of a tag a lookup is interested in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotQuery {
    /// Any slot registered under the tag.
    Any,
    At(u32),
}

/// Where the component's value lives.
#[derive(Debug)]
pub enum MemoryHandle {
    /// A slot in the manager's pool.
    Slot(SlotHandle),
    /// A caller-owned resource, kept here as is.
    External(Box<dyn Any>),
}

impl MemoryHandle {
    pub fn slot(&self) -> Option<SlotHandle> {
        match self {
            MemoryHandle::Slot(h) => Some(*h),
            MemoryHandle::External(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct ComponentEntry {
    pub memory: MemoryHandle,
    /// Position of the entity in the manager's owner list for this slot.
    pub owner: Option<OwnerRef>,
}

type Slots = SmallVec<[Option<ComponentEntry>; 2]>;

/// Slot indices per tag must stay below this.
pub const SLOT_LIMIT: u32 = 1024;

/// A bag of component entries, keyed by `(tag, slot)`.
///
/// The entity never interprets tags or slots; both come from the managers.
///
/// An entity must end its life in [`Registry::destroy_entity`](crate::Registry::destroy_entity).
/// Dropping it anywhere else would leak its id and leave it in the owner lists of whatever it
/// still holds; debug builds panic when that happens.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    components: HashMap<ComponentTag, Slots>,
    released: bool,
}

impl Entity {
    pub(crate) fn new(id: EntityId) -> Self {
        Entity {
            id,
            components: HashMap::new(),
            released: false,
        }
    }

    /// Called by the registry once the id went back to its allocator.
    #[inline]
    pub(crate) fn mark_released(&mut self) {
        self.released = true;
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The entry at `(tag, slot)`. With [`SlotQuery::Any`], the lowest registered slot of `tag`.
    pub fn get_component(&self, tag: ComponentTag, slot: SlotQuery) -> Option<&ComponentEntry> {
        let slots = self.components.get(&tag)?;
        match slot {
            SlotQuery::Any => slots.iter().flatten().next(),
            SlotQuery::At(slot) => slots.get(slot as usize)?.as_ref(),
        }
    }

    pub fn get_component_mut(&mut self, tag: ComponentTag, slot: u32) -> Option<&mut ComponentEntry> {
        self.components.get_mut(&tag)?.get_mut(slot as usize)?.as_mut()
    }

    #[inline]
    pub fn has_component(&self, tag: ComponentTag, slot: SlotQuery) -> bool {
        self.get_component(tag, slot).is_some()
    }

    /// Points `(tag, slot)` at `memory`, inserting the entry if needed.
    ///
    /// Returns true if an entry already existed (its owner ref is kept), false if one was inserted.
    /// The slot list of a tag grows up to `slot`, so `slot` must be below [`SLOT_LIMIT`].
    pub fn set_or_insert_component(&mut self, tag: ComponentTag, slot: u32, memory: MemoryHandle) -> bool {
        debug_assert!(slot < SLOT_LIMIT, "slot {slot} is past the per-tag limit of {SLOT_LIMIT}");
        let slots = self.components.entry(tag).or_default();
        let slot = slot as usize;
        if slots.len() <= slot {
            slots.resize_with(slot + 1, || None);
        }
        match &mut slots[slot] {
            Some(entry) => {
                entry.memory = memory;
                true
            },
            vacant => {
                *vacant = Some(ComponentEntry { memory, owner: None });
                false
            }
        }
    }

    /// Records the owner-list position of `(tag, slot)`. False if there is no such entry.
    pub fn set_owner_ref(&mut self, tag: ComponentTag, slot: u32, owner: OwnerRef) -> bool {
        match self.get_component_mut(tag, slot) {
            Some(entry) => {
                entry.owner = Some(owner);
                true
            },
            None => false,
        }
    }

    /// Drops the entry at `(tag, slot)` and hands it back, if there was one.
    pub fn erase_component(&mut self, tag: ComponentTag, slot: u32) -> Option<ComponentEntry> {
        let slots = self.components.get_mut(&tag)?;
        let entry = slots.get_mut(slot as usize)?.take();
        while matches!(slots.last(), Some(None)) {
            slots.pop();
        }
        if slots.is_empty() {
            self.components.remove(&tag);
        }
        entry
    }

    /// True when no component is attached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component_count(&self) -> usize {
        self.components.values().map(|slots| slots.iter().flatten().count()).sum()
    }

    /// Tags with at least one attached slot, in no particular order.
    pub fn tags(&self) -> impl Iterator<Item = ComponentTag> + '_ {
        self.components.keys().copied()
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        if !self.released && !std::thread::panicking() {
            debug_assert!(
                false,
                "{} dropped without Registry::destroy_entity ({} components attached)",
                self.id,
                self.component_count()
            );
        }
    }
}
