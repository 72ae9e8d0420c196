use super::handle::HandleLike;
use super::handle_pool::{HandlePool, Iter};

/// A named object collection. Every time a handle is created or freed, the
/// attached instance `T` is stored or taken back.
pub struct ObjectPool<H: HandleLike, T: Sized> {
    handles: HandlePool<H>,
    entries: Vec<Option<T>>,
}

impl<H: HandleLike, T: Sized> Default for ObjectPool<H, T> {
    fn default() -> Self {
        ObjectPool::new()
    }
}

impl<H: HandleLike, T: Sized> ObjectPool<H, T> {
    pub fn new() -> Self {
        ObjectPool {
            handles: HandlePool::new(),
            entries: Vec::new(),
        }
    }

    /// Stores `value` and names it with a fresh handle.
    pub fn create(&mut self, value: T) -> H {
        let handle = self.handles.create();
        let index = handle.index() as usize;

        if index >= self.entries.len() {
            self.entries.push(Some(value));
        } else {
            self.entries[index] = Some(value);
        }

        handle
    }

    #[inline]
    pub fn get(&self, handle: H) -> Option<&T> {
        if self.handles.contains(handle) {
            self.entries[handle.index() as usize].as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        if self.handles.contains(handle) {
            self.entries[handle.index() as usize].as_mut()
        } else {
            None
        }
    }

    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        self.handles.contains(handle)
    }

    /// Recycles the handle and returns the value it named.
    pub fn free(&mut self, handle: H) -> Option<T> {
        if self.handles.free(handle) {
            self.entries[handle.index() as usize].take()
        } else {
            None
        }
    }

    /// Frees every entry that `predicate` rejects.
    pub fn retain<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&T) -> bool,
    {
        let dead: Vec<H> = self
            .handles
            .iter()
            .filter(|&h| match self.entries[h.index() as usize] {
                Some(ref v) => !predicate(v),
                None => false,
            })
            .collect();

        for handle in dead {
            self.free(handle);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over the alive handles.
    #[inline]
    pub fn keys(&self) -> Iter<H> {
        self.handles.iter()
    }

    /// Returns an iterator over the stored values, in handle index order.
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().filter_map(Option::as_ref)
    }
}
