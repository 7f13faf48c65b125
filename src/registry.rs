use std::num::NonZeroU32;

use crate::{ComponentTag, Entity, EntityId, IdAllocator, IdError};

/// Source of entity ids and component tags.
///
/// Everything that must be unique across managers comes from here, so two registries never
/// interfere with each other (handy in tests).
#[derive(Debug, Default)]
pub struct Registry {
    entity_ids: IdAllocator,
    last_tag: u32,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tag no other manager of this registry has. Tags are handed out 1, 2, 3, ...
    ///
    /// # Panics
    ///
    /// Panics once `u32::MAX` tags have been minted.
    pub fn mint_tag(&mut self) -> ComponentTag {
        self.last_tag = self.last_tag.checked_add(1).expect("Registry: component tags exhausted");
        match NonZeroU32::new(self.last_tag) {
            Some(tag) => ComponentTag(tag),
            None => unreachable!(),
        }
    }

    /// Number of tags minted so far.
    #[inline]
    pub fn tag_count(&self) -> u32 {
        self.last_tag
    }

    /// A fresh entity with an empty component table.
    ///
    /// # Panics
    ///
    /// Panics if the entity id space is exhausted, see [`IdAllocator::get`].
    pub fn create_entity(&mut self) -> Entity {
        let id = EntityId(self.entity_ids.get());
        log::trace!("created entity {id}");
        Entity::new(id)
    }

    /// Gives the entity's id back for reuse.
    ///
    /// Every component must have been removed beforehand; the managers still hold owner links
    /// and pool slots for whatever is left. An entity of another registry is rejected and dropped.
    pub fn destroy_entity(&mut self, mut entity: Entity) -> Result<(), IdError> {
        debug_assert!(entity.is_empty(), "entity {} destroyed with {} components attached", entity.id(), entity.component_count());
        entity.mark_released();
        self.entity_ids.put(entity.id().0)?;
        log::trace!("destroyed entity {}", entity.id());
        Ok(())
    }

    /// Entities created and not yet destroyed.
    #[inline]
    pub fn live_entities(&self) -> usize {
        self.entity_ids.in_use()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_unique_and_nonzero() {
        let mut registry = Registry::new();
        let a = registry.mint_tag();
        let b = registry.mint_tag();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(registry.tag_count(), 2);
    }

    #[test]
    fn registries_are_isolated() {
        let mut first = Registry::new();
        let mut second = Registry::new();
        first.mint_tag();
        first.mint_tag();
        assert_eq!(second.mint_tag().get(), 1);
        let e = first.create_entity();
        let f = second.create_entity();
        assert_eq!(e.id().index(), 0);
        assert_eq!(f.id().index(), 0);
        first.destroy_entity(e).unwrap();
        second.destroy_entity(f).unwrap();
        assert_eq!(first.live_entities(), 0);
        assert_eq!(second.live_entities(), 0);
    }

    #[test]
    fn entity_ids_recycle() {
        let mut registry = Registry::new();
        let a = registry.create_entity();
        let b = registry.create_entity();
        assert_ne!(a.id(), b.id());
        let a_id = a.id();
        registry.destroy_entity(a).unwrap();
        assert_eq!(registry.live_entities(), 1);
        let c = registry.create_entity();
        assert_eq!(c.id(), a_id);
        assert_eq!(registry.live_entities(), 2);
        registry.destroy_entity(b).unwrap();
        registry.destroy_entity(c).unwrap();
    }

    #[test]
    fn foreign_entity_is_rejected() {
        let mut registry = Registry::new();
        let mut other = Registry::new();
        let first = other.create_entity();
        let second = other.create_entity();
        let stranger = other.create_entity();
        assert_eq!(registry.destroy_entity(stranger), Err(IdError::OutOfRange { id: 2, issued: 0 }));
        other.destroy_entity(first).unwrap();
        other.destroy_entity(second).unwrap();
        // the stranger's id stays issued in its own registry
        assert_eq!(other.live_entities(), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "dropped without Registry::destroy_entity")]
    fn dropping_a_live_entity_is_caught() {
        let mut registry = Registry::new();
        let kept = registry.create_entity();
        {
            let _lost = registry.create_entity();
        }
        registry.destroy_entity(kept).unwrap();
    }
}
