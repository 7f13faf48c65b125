//! Arena-backed doubly-linked list.
//!
//! Every insertion returns an [`OwnerRef`] that erases exactly that node in O(1). Nodes live in a
//! [`GenArena`], so a ref that outlived its node is detected instead of corrupting a neighbour.

use crate::genarena::{GenArena, Index};

/// Handle to one node of an [`OwnerList`].
pub type OwnerRef = Index;

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    prev: Option<OwnerRef>,
    next: Option<OwnerRef>,
}

#[derive(Debug, Clone)]
pub struct OwnerList<T> {
    nodes: GenArena<Node<T>>,
    head: Option<OwnerRef>,
    tail: Option<OwnerRef>,
}

impl<T> Default for OwnerList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OwnerList<T> {
    pub fn new() -> Self {
        OwnerList {
            nodes: GenArena::new(),
            head: None,
            tail: None,
        }
    }

    pub fn push_back(&mut self, value: T) -> OwnerRef {
        let r = self.nodes.push(Node { value, prev: self.tail, next: None });
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(r),
            None => self.head = Some(r),
        }
        self.tail = Some(r);
        r
    }

    pub fn push_front(&mut self, value: T) -> OwnerRef {
        let r = self.nodes.push(Node { value, prev: None, next: self.head });
        match self.head {
            Some(head) => self.nodes[head].prev = Some(r),
            None => self.tail = Some(r),
        }
        self.head = Some(r);
        r
    }

    /// Unlinks the node `r` points to and returns its value, or `None` if `r` is stale.
    pub fn erase(&mut self, r: OwnerRef) -> Option<T> {
        let Node { value, prev, next } = self.nodes.remove(r)?;
        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
        Some(value)
    }

    #[inline]
    pub fn get(&self, r: OwnerRef) -> Option<&T> {
        self.nodes.get(r).map(|n| &n.value)
    }

    #[inline]
    pub fn contains(&self, r: OwnerRef) -> bool {
        self.nodes.contains(r)
    }

    pub fn front(&self) -> Option<&T> {
        self.head.map(|h| &self.nodes[h].value)
    }

    pub fn back(&self) -> Option<&T> {
        self.tail.map(|t| &self.nodes[t].value)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Drops every node. All refs handed out so far become stale.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            nodes: &self.nodes,
            curr: self.head,
            remaining: self.nodes.len(),
        }
    }
}

impl<'a, T> IntoIterator for &'a OwnerList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct Iter<'a, T> {
    nodes: &'a GenArena<Node<T>>,
    curr: Option<OwnerRef>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.get(self.curr?)?;
        self.curr = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}
