//! Pooled entity/component storage addressed by recyclable integer ids.
//!
//! * [`IdAllocator`] hands out dense `u32` ids and takes them back for reuse.
//! * [`SlotPool`] keeps fixed slots for one value type, never giving a block back to the heap
//!   before the pool itself goes away.
//! * [`Entity`] maps `(tag, slot)` keys to where a component lives plus a back reference into the
//!   owning manager's [`OwnerList`].
//! * [`ComponentManager`] ties the three together for one component type and answers
//!   "which entities hold X" in O(1) per entity.
//!
//! Ids and tags come from an explicit [`Registry`] rather than process-wide counters.
//!
//! Nothing here is thread-safe; share a registry and its managers across threads only behind
//! your own synchronization.

pub mod genarena;

mod id_alloc;
pub use id_alloc::*;
mod owners;
pub use owners::*;
mod config;
pub use config::*;
mod pool;
pub use pool::*;
mod entity;
pub use entity::*;
mod registry;
pub use registry::*;
mod manager;
pub use manager::*;

pub use hibitset;
