use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::marker::PhantomData;

use super::handle::{HandleIndex, HandleLike};

/// `HandlePool` hands out handles with continuous `index` fields, recycling
/// the smallest free index first, and tells whether a handle is still alive.
pub struct HandlePool<H: HandleLike> {
    versions: Vec<HandleIndex>,
    frees: BinaryHeap<Reverse<HandleIndex>>,
    _phantom: PhantomData<H>,
}

impl<H: HandleLike> Default for HandlePool<H> {
    fn default() -> Self {
        HandlePool::new()
    }
}

impl<H: HandleLike> HandlePool<H> {
    pub fn new() -> Self {
        HandlePool {
            versions: Vec::new(),
            frees: BinaryHeap::new(),
            _phantom: PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        HandlePool {
            versions: Vec::with_capacity(capacity),
            frees: BinaryHeap::with_capacity(capacity),
            _phantom: PhantomData,
        }
    }

    /// Creates an unused handle.
    pub fn create(&mut self) -> H {
        if let Some(Reverse(index)) = self.frees.pop() {
            let version = &mut self.versions[index as usize];
            *version += 1;
            H::new(index, *version)
        } else {
            self.versions.push(1);
            H::new(self.versions.len() as HandleIndex - 1, 1)
        }
    }

    /// Returns true if `handle` was created by this pool and has not been
    /// freed yet.
    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        let index = handle.index() as usize;
        self.is_alive_at(index) && self.versions[index] == handle.version()
    }

    #[inline]
    fn is_alive_at(&self, index: usize) -> bool {
        index < self.versions.len() && (self.versions[index] & 0x1) == 1
    }

    /// Recycles the handle index and marks its version as dead.
    pub fn free(&mut self, handle: H) -> bool {
        if !self.contains(handle) {
            return false;
        }

        self.versions[handle.index() as usize] += 1;
        self.frees.push(Reverse(handle.index()));
        true
    }

    /// Returns the number of alive handles.
    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len() - self.frees.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the alive handles, in index order.
    #[inline]
    pub fn iter(&self) -> Iter<H> {
        Iter {
            versions: &self.versions,
            index: 0,
            _phantom: PhantomData,
        }
    }
}

impl<'a, H: HandleLike> IntoIterator for &'a HandlePool<H> {
    type Item = H;
    type IntoIter = Iter<'a, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Immutable `HandlePool` iterator, created by `HandlePool::iter`.
pub struct Iter<'a, H: HandleLike> {
    versions: &'a [HandleIndex],
    index: usize,
    _phantom: PhantomData<H>,
}

impl<'a, H: HandleLike> Iterator for Iter<'a, H> {
    type Item = H;

    fn next(&mut self) -> Option<H> {
        while self.index < self.versions.len() {
            let index = self.index;
            let version = self.versions[index];
            self.index += 1;

            if version & 0x1 == 1 {
                return Some(H::new(index as HandleIndex, version));
            }
        }

        None
    }
}
