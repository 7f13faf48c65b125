#[cfg(feature = "use_serde")]
use serde::{Serialize, Deserialize};

/// How a [`SlotPool`](crate::SlotPool) maps slot ids to blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
pub enum PoolBackend {
    /// Blocks in a `Vec`, indexed by slot id. Slot ids are dense, so this is the usual choice.
    #[default]
    Dense,
    /// Blocks in a hash map keyed by slot id.
    Keyed,
}

/// Construction parameters of a [`SlotPool`](crate::SlotPool).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "use_serde", serde(default))]
pub struct PoolConfig {
    pub backend: PoolBackend,
    /// Backing storage reserved up front. No blocks are created until they are allocated.
    pub initial_capacity: usize,
    /// Upper bound on blocks ever created. Growing past it reports out-of-memory.
    pub max_slots: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            backend: PoolBackend::Dense,
            initial_capacity: 0,
            max_slots: None,
        }
    }
}

impl PoolConfig {
    pub fn with_backend(mut self, backend: PoolBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.max_slots = Some(max_slots);
        self
    }
}
