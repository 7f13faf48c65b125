//! Per-type component managers.
//!
//! A [`ComponentManager`] owns the storage of one component type and the reverse links from each
//! slot index to the entities holding it. Attaching files the component under the manager's tag
//! in the entity's table, appends the entity to the owner list of that slot index, and stores the
//! returned [`OwnerRef`] back into the table entry so detaching unlinks the entity in O(1).
//!
//! How the value is stored depends on the kind `K`:
//!
//! * [`Class`]: the manager reserves a pool slot; the caller constructs the value into it later.
//! * [`Pod`]: the slot is zero-filled on attach and usable right away.
//! * [`External`]: no pool at all; the entity table holds a caller-supplied, reference-counted
//!   resource, released through [`ExternalResource::release`] on detach.
//!
//! Operations a kind does not support are simply absent from its `impl` block.

use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use hibitset::BitSet;

use crate::{
    ComponentEntry, ComponentTag, Entity, EntityId, MemoryHandle, OwnerList, PoolConfig, PoolError,
    Registry, SlotHandle, SlotPool, SlotQuery,
};

mod sealed {
    pub trait Sealed {}
}

/// Storage kind of a component type. Implemented by [`Class`], [`Pod`] and [`External`] only.
pub trait ComponentKind: sealed::Sealed + 'static {
    const NAME: &'static str;
}

/// Kinds backed by a [`SlotPool`].
pub trait Pooled: ComponentKind {}

/// Pool-backed values constructed by the caller after attaching.
pub enum Class {}
/// Pool-backed plain data, zero-filled on attach.
pub enum Pod {}
/// Caller-owned, reference-counted resources.
pub enum External {}

impl sealed::Sealed for Class {}
impl sealed::Sealed for Pod {}
impl sealed::Sealed for External {}

impl ComponentKind for Class {
    const NAME: &'static str = "class";
}
impl ComponentKind for Pod {
    const NAME: &'static str = "pod";
}
impl ComponentKind for External {
    const NAME: &'static str = "external";
}

impl Pooled for Class {}
impl Pooled for Pod {}

/// A handle whose lifetime follows its own reference-counting protocol.
pub trait ExternalResource: 'static {
    /// Gives up this holder's reference.
    fn release(self);
}

impl<R: ?Sized + 'static> ExternalResource for Rc<R> {
    #[inline]
    fn release(self) {
        drop(self)
    }
}

impl<R: ?Sized + Send + Sync + 'static> ExternalResource for Arc<R> {
    #[inline]
    fn release(self) {
        drop(self)
    }
}

/// Entity ids at or past this stay out of the owner bitsets, which cover `64^4` ids.
pub const OWNER_SET_LIMIT: u32 = 1 << 24;

/// Storage and owner lists of component type `T`, with up to `N` instances per entity.
pub struct ComponentManager<T, K: ComponentKind = Pod, const N: usize = 1> {
    tag: ComponentTag,
    /// Stays empty for `External`.
    pool: SlotPool<T>,
    owners: [OwnerList<EntityId>; N],
    /// Same membership as `owners`, indexed by entity id.
    owner_bits: [BitSet; N],
    _kind: PhantomData<K>,
}

impl<T, K: ComponentKind, const N: usize> ComponentManager<T, K, N> {
    pub fn new(registry: &mut Registry) -> Self {
        Self::with_config(registry, &PoolConfig::default())
    }

    pub fn with_config(registry: &mut Registry, config: &PoolConfig) -> Self {
        let tag = registry.mint_tag();
        log::debug!("{} component manager registered with tag {}", K::NAME, tag.get());
        ComponentManager {
            tag,
            pool: SlotPool::with_config(config),
            owners: std::array::from_fn(|_| OwnerList::new()),
            owner_bits: std::array::from_fn(|_| BitSet::new()),
            _kind: PhantomData,
        }
    }

    #[inline]
    pub fn tag(&self) -> ComponentTag {
        self.tag
    }

    /// Entities holding this component at `slot`, in attach order.
    pub fn get_owners(&self, slot: u32) -> &OwnerList<EntityId> {
        &self.owners[slot as usize]
    }

    pub fn owner_count(&self, slot: u32) -> usize {
        self.owners[slot as usize].len()
    }

    /// Owners of `slot` as a bitset of entity ids. Combine several with `hibitset::BitSetAnd`
    /// to find entities holding more than one component.
    ///
    /// Only ids below [`OWNER_SET_LIMIT`] are tracked here; [`get_owners`](Self::get_owners)
    /// lists every owner.
    pub fn owner_set(&self, slot: u32) -> &BitSet {
        &self.owner_bits[slot as usize]
    }

    /// Whether the entity with this id holds the component at `slot`, without touching the entity.
    ///
    /// O(1) for ids below [`OWNER_SET_LIMIT`], a walk of the owner list otherwise.
    #[inline]
    pub fn holds(&self, entity: EntityId, slot: u32) -> bool {
        if entity.0 < OWNER_SET_LIMIT {
            self.owner_bits[slot as usize].contains(entity.0)
        } else {
            self.owners[slot as usize].iter().any(|owner| *owner == entity)
        }
    }

    /// Whether `entity` has this component at `slot` (or at any slot).
    #[inline]
    pub fn has_component(&self, entity: &Entity, slot: SlotQuery) -> bool {
        entity.has_component(self.tag, slot)
    }

    pub fn pool(&self) -> &SlotPool<T> {
        &self.pool
    }

    fn attach(&mut self, entity: &mut Entity, slot: u32, memory: MemoryHandle) {
        debug_assert!((slot as usize) < N, "slot {slot} out of range for a manager of {N} slots");
        let existed = entity.set_or_insert_component(self.tag, slot, memory);
        debug_assert!(!existed, "component {} added twice to {} at slot {slot}", self.tag.get(), entity.id());

        let owner = self.owners[slot as usize].push_back(entity.id());
        entity.set_owner_ref(self.tag, slot, owner);
        if entity.id().0 < OWNER_SET_LIMIT {
            self.owner_bits[slot as usize].add(entity.id().0);
        }
        log::trace!("attached component {} to {} at slot {slot}", self.tag.get(), entity.id());
    }

    fn detach(&mut self, entity: &mut Entity, slot: u32) -> Option<ComponentEntry> {
        debug_assert!((slot as usize) < N, "slot {slot} out of range for a manager of {N} slots");
        let Some(entry) = entity.erase_component(self.tag, slot) else {
            debug_assert!(false, "{} has no component {} at slot {slot}", entity.id(), self.tag.get());
            return None;
        };
        if let Some(owner) = entry.owner {
            let unlinked = self.owners[slot as usize].erase(owner);
            debug_assert_eq!(unlinked, Some(entity.id()), "owner link out of sync");
        }
        if entity.id().0 < OWNER_SET_LIMIT {
            self.owner_bits[slot as usize].remove(entity.id().0);
        }
        log::trace!("detached component {} from {} at slot {slot}", self.tag.get(), entity.id());
        Some(entry)
    }
}

impl<T, K: Pooled, const N: usize> ComponentManager<T, K, N> {
    /// The pool slot backing `entity`'s component at `slot`.
    pub fn component_mem(&self, entity: &Entity, slot: u32) -> Option<SlotHandle> {
        entity.get_component(self.tag, SlotQuery::At(slot))?.memory.slot()
    }

    /// The component value, if attached and constructed.
    pub fn get_component_of(&self, entity: &Entity, slot: u32) -> Option<&T> {
        self.pool.get(self.component_mem(entity, slot)?)
    }

    pub fn get_component_of_mut(&mut self, entity: &Entity, slot: u32) -> Option<&mut T> {
        let handle = self.component_mem(entity, slot)?;
        self.pool.get_mut(handle)
    }

    fn alloc_and_attach(&mut self, entity: &mut Entity, slot: u32) -> Result<SlotHandle, PoolError> {
        let handle = self.pool.alloc()?;
        self.attach(entity, slot, MemoryHandle::Slot(handle));
        Ok(handle)
    }

    fn detach_slot(&mut self, entity: &mut Entity, slot: u32) -> Option<SlotHandle> {
        let entry = self.detach(entity, slot)?;
        let handle = entry.memory.slot();
        debug_assert!(handle.is_some(), "pooled component without a pool slot");
        handle
    }
}

impl<T, const N: usize> ComponentManager<T, Class, N> {
    /// Reserves a slot for the component. The value is supplied later via
    /// [`construct_component`](Self::construct_component); until then `get_component_of` reports
    /// nothing.
    ///
    /// Fails only if the pool cannot grow.
    pub fn add_component_to(&mut self, entity: &mut Entity, slot: u32) -> Result<(), PoolError> {
        self.alloc_and_attach(entity, slot).map(|_| ())
    }

    /// Moves `value` into the reserved slot and marks it constructed.
    pub fn construct_component(&mut self, entity: &Entity, slot: u32, value: T) {
        match self.component_mem(entity, slot) {
            Some(handle) => self.pool.construct(handle, value),
            None => debug_assert!(false, "{} has no component {} at slot {slot}", entity.id(), self.tag.get()),
        }
    }

    pub fn is_component_constructed(&self, entity: &Entity, slot: u32) -> bool {
        self.component_mem(entity, slot)
            .map_or(false, |handle| self.pool.is_constructed(handle))
    }

    /// Detaches the component and hands back its value, if one was constructed.
    pub fn remove_component_from(&mut self, entity: &mut Entity, slot: u32) -> Option<T> {
        let handle = self.detach_slot(entity, slot)?;
        let value = self.pool.destruct(handle);
        self.pool.free(handle, false);
        value
    }
}

impl<T: bytemuck::Pod, const N: usize> ComponentManager<T, Pod, N> {
    /// Attaches a zero-filled component. Fails only if the pool cannot grow.
    pub fn add_component_to(&mut self, entity: &mut Entity, slot: u32) -> Result<(), PoolError> {
        let handle = self.alloc_and_attach(entity, slot)?;
        self.pool.construct(handle, T::zeroed());
        Ok(())
    }

    pub fn remove_component_from(&mut self, entity: &mut Entity, slot: u32) {
        if let Some(handle) = self.detach_slot(entity, slot) {
            self.pool.free(handle, false);
        }
    }
}

impl<T: ExternalResource, const N: usize> ComponentManager<T, External, N> {
    /// Files `resource` in the entity's table. The manager takes over this reference.
    pub fn add_external_component_to(&mut self, entity: &mut Entity, resource: T, slot: u32) {
        self.attach(entity, slot, MemoryHandle::External(Box::new(resource)));
    }

    pub fn get_external_component_of<'e>(&self, entity: &'e Entity, slot: u32) -> Option<&'e T> {
        match &entity.get_component(self.tag, SlotQuery::At(slot))?.memory {
            MemoryHandle::External(resource) => resource.downcast_ref::<T>(),
            MemoryHandle::Slot(_) => None,
        }
    }

    /// Detaches the resource and releases the reference the manager held.
    pub fn remove_external_component_from(&mut self, entity: &mut Entity, slot: u32) {
        let Some(entry) = self.detach(entity, slot) else {
            return;
        };
        match entry.memory {
            MemoryHandle::External(resource) => match resource.downcast::<T>() {
                Ok(resource) => (*resource).release(),
                Err(_) => debug_assert!(false, "external component {} holds a foreign type", self.tag.get()),
            },
            MemoryHandle::Slot(_) => debug_assert!(false, "external component {} backed by a pool slot", self.tag.get()),
        }
    }
}
