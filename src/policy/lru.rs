//! # Least Recently Used (LRU) chunk
//!
//! Single-threaded LRU keyed by `u64` cache keys with `Arc<V>` values. One
//! `LruCore` backs each chunk of [`SoftLongCache`](crate::store::soft::SoftLongCache);
//! the chunk's lock provides thread safety.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                          LruCore<V>                              │
//!   │                                                                  │
//!   │   FxHashMap<u64, usize>            slots: Vec<Option<Node<V>>>   │
//!   │   ┌────────┬──────┐                ┌────┬────┬────┬────┐         │
//!   │   │ key 10 │  0 ──┼──────────────► │ 0  │ 1  │ 2  │ .. │         │
//!   │   │ key 20 │  2 ──┼──────────────► └────┴────┴────┴────┘         │
//!   │   └────────┴──────┘                  free: Vec<usize> (recycled) │
//!   │                                                                  │
//!   │   head ──► [MRU] ◄──► [..] ◄──► [LRU] ◄── tail                   │
//!   │            prev/next are slot indices, not pointers              │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Method           | Complexity | Description                               |
//! |------------------|------------|-------------------------------------------|
//! | `insert(k, v)`   | O(1)*      | Insert or update, may evict LRU           |
//! | `get(k)`         | O(1)       | Get value, moves to MRU position          |
//! | `peek(k)`        | O(1)       | Get value without affecting LRU order     |
//! | `remove(k)`      | O(1)       | Remove entry by key                       |
//! | `pop_lru()`      | O(1)       | Remove and return least recently used     |
//! | `shrink_to(n)`   | O(k)       | Evict LRU entries until `len <= n`        |
//! | `clear()`        | O(n)       | Remove all entries                        |
//!
//! ## Thread Safety
//!
//! `LruCore` is **not** thread-safe on its own. It is `Send + Sync` when `V`
//! is, and callers wrap it in a lock.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

struct Node<V> {
    key: u64,
    value: Arc<V>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Single-threaded LRU cache over `u64` keys.
///
/// Capacity 0 creates a cache that accepts no items.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use blobcache::policy::lru::LruCore;
///
/// let mut lru: LruCore<&str> = LruCore::new(2);
/// lru.insert(1, Arc::new("a"));
/// lru.insert(2, Arc::new("b"));
/// lru.get(1);                   // 2 is now least recently used
/// lru.insert(3, Arc::new("c")); // evicts 2
///
/// assert!(lru.contains(1));
/// assert!(!lru.contains(2));
/// ```
pub struct LruCore<V> {
    map: FxHashMap<u64, usize>,
    slots: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: usize,
}

impl<V> LruCore<V> {
    /// Creates an empty LRU holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            capacity,
        }
    }

    #[inline]
    fn node(&self, idx: usize) -> &Node<V> {
        self.slots[idx]
            .as_ref()
            .expect("linked slot must be occupied")
    }

    #[inline]
    fn node_mut(&mut self, idx: usize) -> &mut Node<V> {
        self.slots[idx]
            .as_mut()
            .expect("linked slot must be occupied")
    }

    /// Unlink a slot from the recency list, keeping it in the index.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node(idx);
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }

    /// Link a slot at the MRU end.
    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn release(&mut self, idx: usize) -> Node<V> {
        let node = self.slots[idx]
            .take()
            .expect("released slot must be occupied");
        self.free.push(idx);
        node
    }

    fn allocate(&mut self, node: Node<V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            },
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            },
        }
    }

    #[cfg(debug_assertions)]
    fn validate_invariants(&self) {
        let mut count = 0usize;
        let mut current = self.head;
        while let Some(idx) = current {
            count += 1;
            let node = self.node(idx);
            debug_assert_eq!(self.map.get(&node.key), Some(&idx));
            current = node.next;
            assert!(count <= self.map.len(), "cycle detected in recency list");
        }
        debug_assert_eq!(count, self.map.len());
        debug_assert!(self.map.len() <= self.capacity);
    }

    /// Inserts or replaces the value for `key` and marks it most recently used.
    ///
    /// Returns the previous value if the key was present. Inserting a new key
    /// into a full cache evicts the least recently used entry first.
    pub fn insert(&mut self, key: u64, value: Arc<V>) -> Option<Arc<V>> {
        if let Some(&idx) = self.map.get(&key) {
            let previous = std::mem::replace(&mut self.node_mut(idx).value, value);
            self.detach(idx);
            self.attach_front(idx);
            return Some(previous);
        }

        if self.capacity == 0 {
            return None;
        }

        if self.map.len() >= self.capacity {
            self.pop_lru();
        }

        let idx = self.allocate(Node {
            key,
            value,
            prev: None,
            next: None,
        });
        self.map.insert(key, idx);
        self.attach_front(idx);

        #[cfg(debug_assertions)]
        self.validate_invariants();

        None
    }

    /// Returns the value for `key`, moving it to the MRU position.
    pub fn get(&mut self, key: u64) -> Option<&Arc<V>> {
        let idx = *self.map.get(&key)?;
        self.detach(idx);
        self.attach_front(idx);
        Some(&self.node(idx).value)
    }

    /// Returns the value for `key` without touching recency order.
    pub fn peek(&self, key: u64) -> Option<&Arc<V>> {
        let idx = *self.map.get(&key)?;
        Some(&self.node(idx).value)
    }

    pub fn contains(&self, key: u64) -> bool {
        self.map.contains_key(&key)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: u64) -> Option<Arc<V>> {
        let idx = self.map.remove(&key)?;
        self.detach(idx);
        Some(self.release(idx).value)
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(u64, Arc<V>)> {
        let idx = self.tail?;
        self.detach(idx);
        let node = self.release(idx);
        self.map.remove(&node.key);
        Some((node.key, node.value))
    }

    /// Returns the least recently used entry without removing it.
    pub fn peek_lru(&self) -> Option<(u64, &Arc<V>)> {
        self.tail.map(|idx| {
            let node = self.node(idx);
            (node.key, &node.value)
        })
    }

    /// Evicts least recently used entries until at most `len` remain.
    ///
    /// Returns how many entries were evicted.
    pub fn shrink_to(&mut self, len: usize) -> usize {
        let mut evicted = 0;
        while self.map.len() > len && self.pop_lru().is_some() {
            evicted += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }
}

impl<V> fmt::Debug for LruCore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCore")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
