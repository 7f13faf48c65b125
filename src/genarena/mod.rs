//! Generational arena backing the owner lists.
//!
//! Freed entries are chained into a free list and reused by later pushes, so the arena acts as a
//! cache of fixed-size node blocks. Each entry carries its own generation (instead of one global
//! generation for the whole arena), bumped on every removal, so an [`Index`] held past the removal
//! of its value can never reach the value that later reuses the entry.

#[cfg(feature = "use_serde")]
use serde::{Serialize, Deserialize};


#[derive(Debug, Clone)]
pub struct GenArena<T> {
    entries: Vec<Entry<T>>,
    /// Points to the next Free Entry. Free entries are a single-way linked list,
    /// so they may not be in order
    next_free: Option<usize>,
    /// Number of `Occupied` entries.
    length: usize,
}

#[derive(Debug, Clone)]
enum Entry<T> {
    Free { next_generation: u32, next_free: Option<usize> },
    Occupied { generation: u32, value: T },
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
pub struct Index {
    pub index: usize,
    pub generation: u32,
}

impl Index {
    pub fn new(index: usize, generation: u32) -> Self {
        Index { index, generation }
    }
}

impl std::fmt::Display for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#07x}#{:03}", self.index, self.generation)
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#08x}#{:04}", self.index, self.generation)
    }
}

impl<T> Default for GenArena<T> {
    fn default() -> GenArena<T> {
        Self::new()
    }
}

impl<T> GenArena<T> {
    /// An empty arena. Does not allocate until the first push.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut arena = GenArena {
            entries: Vec::new(),
            next_free: None,
            length: 0,
        };
        if capacity > 0 {
            arena.reserve_exact(capacity);
        }
        arena
    }

    /// Reserves exactly `added_capacity` new entries, and return the value of `next_free`, without option.
    fn internal_reserve_exact(&mut self, added_capacity: usize) -> usize {
        debug_assert!(added_capacity > 0);
        self.entries.reserve_exact(added_capacity);
        let reserve_start = self.entries.len();
        for i in 0..(added_capacity - 1) {
            self.entries.push(Entry::Free { next_generation: 0, next_free: Some(reserve_start + i + 1) });
        }
        self.entries.push(Entry::Free { next_generation: 0, next_free: self.next_free });
        self.next_free = Some(reserve_start);
        reserve_start
    }

    #[inline]
    pub fn reserve_exact(&mut self, added_capacity: usize) {
        if added_capacity > 0 {
            self.internal_reserve_exact(added_capacity);
        }
    }

    /// Frees every entry, bumping the generation of the occupied ones. Capacity is kept.
    pub fn clear(&mut self) {
        let len = self.entries.len();
        for (i, entry) in self.entries.iter_mut().enumerate() {
            let next_free = if i + 1 < len { Some(i + 1) } else { None };
            let next_generation = match *entry {
                Entry::Free { next_generation, .. } => next_generation,
                Entry::Occupied { generation, .. } => generation.wrapping_add(1),
            };
            *entry = Entry::Free { next_generation, next_free };
        }
        self.length = 0;
        self.next_free = if len > 0 { Some(0) } else { None };
    }

    fn force_insert_at(&mut self, index: usize, value: T) -> Index {
        if let Entry::Free { next_generation, next_free } = self.entries[index] {
            self.entries[index] = Entry::Occupied { generation: next_generation, value };
            self.next_free = next_free;
            self.length += 1;
            Index { generation: next_generation, index }
        } else {
            panic!("index {index} in genarena is already occupied for force_insert_at");
        }
    }

    /// Push `T` into the arena.
    pub fn push(&mut self, value: T) -> Index {
        match self.next_free {
            Some(next_free) => {
                self.force_insert_at(next_free, value)
            },
            None => {
                const MIN_RESERVE: usize = 8;
                // double the amount we have; an empty arena starts at MIN_RESERVE
                let next_free = self.internal_reserve_exact(std::cmp::max(self.entries.len(), MIN_RESERVE));
                self.force_insert_at(next_free, value)
            }
        }
    }

    pub fn remove(&mut self, index: Index) -> Option<T> {
        let entry = self.entries.get_mut(index.index)?;
        match entry {
            Entry::Occupied { generation, .. } if *generation == index.generation => {},
            _ => return None,
        }
        let new_entry = Entry::Free { next_generation: index.generation.wrapping_add(1), next_free: self.next_free };
        let removed_entry = std::mem::replace(entry, new_entry);
        self.next_free = Some(index.index);
        self.length -= 1;
        match removed_entry {
            Entry::Occupied { value, .. } => Some(value),
            Entry::Free { .. } => unreachable!("removed entry in remove is not Occupied variant"),
        }
    }

    #[inline]
    pub fn contains(&self, index: Index) -> bool {
        self.get(index).is_some()
    }

    pub fn get(&self, index: Index) -> Option<&T> {
        match self.entries.get(index.index) {
            Some(Entry::Occupied { generation, value }) if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, index: Index) -> Option<&mut T> {
        match self.entries.get_mut(index.index) {
            Some(Entry::Occupied { generation, value }) if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Total entries, free and occupied.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }
}

impl<T> std::ops::Index<Index> for GenArena<T> {
    type Output = T;

    fn index(&self, index: Index) -> &Self::Output {
        self.get(index).expect("GenArena.index(Index): no element found at index")
    }
}

impl<T> std::ops::IndexMut<Index> for GenArena<T> {
    fn index_mut(&mut self, index: Index) -> &mut Self::Output {
        self.get_mut(index).expect("GenArena.index_mut(Index): no element found at index")
    }
}
