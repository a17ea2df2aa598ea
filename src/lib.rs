//! # longmap
//!
//! A hash map keyed by `i64`, resolving collisions by separate chaining and
//! doubling its bucket array when the load factor is exceeded.
//!
//! ## Example
//!
//! ```rust
//! use longmap::LongMap;
//!
//! let mut map: LongMap<&str> = LongMap::new();
//! map.put(0, "a");
//! map.put(-90, "b");
//! map.put(999_999_999, "c");
//!
//! assert_eq!(map.get(0), Some(&"a"));
//! assert_eq!(map.get(-90), Some(&"b"));
//! assert_eq!(map.get(7), None);
//! assert_eq!(map.len(), 3);
//! ```
//!
//! Values that may be "null" are modelled with `V = Option<T>`. A present
//! key holding `None` then reads back as `Some(&None)`, which is distinct
//! from the `None` returned for a missing key. `Option<T>` has no
//! `Display`, so such maps render through
//! [`LongMap::display_nullable`], which writes `None` as `null`.
//!
//! The map does no locking. Mutation goes through `&mut self`, so sharing
//! one map between threads needs an external lock.

#![forbid(unsafe_code)]

mod config;
mod error;

pub use config::{MapConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR, MAXIMUM_CAPACITY};
pub use error::{Error, Result};

use log::{debug, trace};
use std::fmt;
use std::iter::FusedIterator;

// =============================================================================
// Chain storage
// =============================================================================

/// Head of a bucket, or the successor link of an entry.
type Link<V> = Option<Box<Entry<V>>>;

struct Entry<V> {
    key: i64,
    value: V,
    next: Link<V>,
}

/// Bucket for `key` in a table of `capacity` buckets.
///
/// Computed in `u64` on the magnitude of the key, so `i64::MIN` maps to
/// `2^63 % capacity` instead of overflowing. `k` and `-k` share a bucket.
#[inline]
fn bucket_index(key: i64, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    (key.unsigned_abs() % capacity as u64) as usize
}

#[inline]
fn threshold_for(capacity: usize, load_factor: f32) -> usize {
    // Saturates for an infinite load factor.
    (capacity as f64 * f64::from(load_factor)) as usize
}

fn empty_buckets<V>(capacity: usize) -> Vec<Link<V>> {
    std::iter::repeat_with(|| None).take(capacity).collect()
}

fn chain<V>(link: &Link<V>) -> impl Iterator<Item = &Entry<V>> {
    std::iter::successors(link.as_deref(), |entry| entry.next.as_deref())
}

/// Returns the link that holds `key`, or the empty tail link of the chain
/// when `key` is absent.
fn seek<V>(mut link: &mut Link<V>, key: i64) -> &mut Link<V> {
    // Count first, then step: stopping a `&mut` walk early on a match is
    // rejected by the borrow checker.
    let depth = chain(link).take_while(|entry| entry.key != key).count();
    for _ in 0..depth {
        if let Some(entry) = link {
            link = &mut entry.next;
        }
    }
    link
}

fn clone_chain<V: Clone>(link: &Link<V>) -> Link<V> {
    let mut head: Link<V> = None;
    let mut tail = &mut head;
    for entry in chain(link) {
        tail = &mut tail
            .insert(Box::new(Entry {
                key: entry.key,
                value: entry.value.clone(),
                next: None,
            }))
            .next;
    }
    head
}

/// Drops every chain node by node instead of through nested `Box` drops.
fn unlink_chains<V>(buckets: Vec<Link<V>>) {
    for mut link in buckets {
        while let Some(mut entry) = link {
            link = entry.next.take();
        }
    }
}

// =============================================================================
// LongMap
// =============================================================================

/// A chained hash map from `i64` keys to values of type `V`.
///
/// - Bucket array of chain heads, length = capacity
/// - Chains are singly linked, owned through `Box`
/// - Doubles (up to [`MAXIMUM_CAPACITY`]) once `len > capacity * load_factor`
/// - Never shrinks on removal
pub struct LongMap<V> {
    buckets: Vec<Link<V>>,
    size: usize,
    load_factor: f32,
    /// `capacity * load_factor`, recomputed whenever the capacity changes.
    threshold: usize,
}

impl<V> LongMap<V> {
    /// Creates an empty map with [`DEFAULT_INITIAL_CAPACITY`] buckets and
    /// [`DEFAULT_LOAD_FACTOR`].
    pub fn new() -> Self {
        Self::allocate(DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR)
    }

    pub fn with_capacity(initial_capacity: usize) -> Result<Self> {
        MapConfig::new()
            .with_initial_capacity(initial_capacity)
            .build()
    }

    pub fn with_capacity_and_load_factor(
        initial_capacity: usize,
        load_factor: f32,
    ) -> Result<Self> {
        MapConfig::new()
            .with_initial_capacity(initial_capacity)
            .with_load_factor(load_factor)
            .build()
    }

    /// Validates `config` and allocates the bucket array. A capacity above
    /// [`MAXIMUM_CAPACITY`] is clamped rather than rejected.
    pub fn with_config(config: MapConfig) -> Result<Self> {
        config.validate()?;
        let requested = config.initial_capacity();
        let capacity = requested.min(MAXIMUM_CAPACITY);
        if capacity < requested {
            debug!("longmap initial capacity {requested} clamped to {capacity}");
        }
        Ok(Self::allocate(capacity, config.load_factor()))
    }

    /// Builds a fresh table holding a copy of every entry in `source`.
    ///
    /// The new table uses the default load factor and
    /// `max(source.len(), DEFAULT_INITIAL_CAPACITY)` buckets. `None` yields an
    /// empty map.
    pub fn copy_of(source: Option<&LongMap<V>>) -> Self
    where
        V: Clone,
    {
        let Some(source) = source else {
            return Self::new();
        };
        let capacity = source
            .len()
            .max(DEFAULT_INITIAL_CAPACITY)
            .min(MAXIMUM_CAPACITY);
        let mut map = Self::allocate(capacity, DEFAULT_LOAD_FACTOR);
        for (key, value) in source {
            map.put(key, value.clone());
        }
        map
    }

    fn allocate(capacity: usize, load_factor: f32) -> Self {
        Self {
            buckets: empty_buckets(capacity),
            size: 0,
            load_factor,
            threshold: threshold_for(capacity, load_factor),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Current number of buckets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    #[inline]
    fn bucket_of(&self, key: i64) -> usize {
        bucket_index(key, self.buckets.len())
    }

    fn find(&self, key: i64) -> Option<&Entry<V>> {
        chain(&self.buckets[self.bucket_of(key)]).find(|entry| entry.key == key)
    }

    /// Doubles the table if linking one more entry would push `len` past the
    /// threshold.
    fn grow_for_insert(&mut self) {
        if self.size + 1 > self.threshold && self.capacity() < MAXIMUM_CAPACITY {
            let new_capacity = (self.capacity() * 2).min(MAXIMUM_CAPACITY);
            self.rehash(new_capacity);
        }
    }

    /// Relinks every entry into a fresh bucket array of `new_capacity`.
    fn rehash(&mut self, new_capacity: usize) {
        let old_capacity = self.capacity();
        let old = std::mem::replace(&mut self.buckets, empty_buckets(new_capacity));
        for mut link in old {
            while let Some(mut entry) = link {
                link = entry.next.take();
                let index = bucket_index(entry.key, new_capacity);
                entry.next = self.buckets[index].take();
                self.buckets[index] = Some(entry);
            }
        }
        self.threshold = threshold_for(new_capacity, self.load_factor);
        debug!(
            "longmap resized: capacity {old_capacity} -> {new_capacity}, size {}, threshold {}",
            self.size, self.threshold
        );
    }

    /// Stores `value` under `key`, returning the stored value and the value it
    /// displaced, if any.
    fn upsert(&mut self, key: i64, value: V) -> (&mut V, Option<V>) {
        if self.find(key).is_none() {
            self.grow_for_insert();
        }

        let index = self.bucket_of(key);
        let link = seek(&mut self.buckets[index], key);
        match link {
            Some(entry) => {
                let previous = std::mem::replace(&mut entry.value, value);
                (&mut entry.value, Some(previous))
            }
            None => {
                self.size += 1;
                let entry = link.insert(Box::new(Entry {
                    key,
                    value,
                    next: None,
                }));
                (&mut entry.value, None)
            }
        }
    }
}

impl<V> LongMap<V> {
    /// Associates `value` with `key` and returns a reference to the stored
    /// value.
    ///
    /// An existing entry is overwritten in place. A new key is appended to the
    /// tail of its chain and may double the table.
    pub fn put(&mut self, key: i64, value: V) -> &V {
        self.upsert(key, value).0
    }

    /// Like [`put`](Self::put), but returns the previous value for `key`.
    pub fn insert(&mut self, key: i64, value: V) -> Option<V> {
        self.upsert(key, value).1
    }

    pub fn get(&self, key: i64) -> Option<&V> {
        self.find(key).map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, key: i64) -> Option<&mut V> {
        let index = self.bucket_of(key);
        seek(&mut self.buckets[index], key)
            .as_mut()
            .map(|entry| &mut entry.value)
    }

    /// Unlinks the entry for `key` and returns its value. Capacity is kept.
    pub fn remove(&mut self, key: i64) -> Option<V> {
        let index = self.bucket_of(key);
        let link = seek(&mut self.buckets[index], key);
        let removed = link.take()?;
        let Entry { value, next, .. } = *removed;
        *link = next;
        self.size -= 1;
        Some(value)
    }

    /// True if `key` has an entry, whatever value it holds.
    pub fn contains_key(&self, key: i64) -> bool {
        self.find(key).is_some()
    }

    /// Scans every chain for a value equal to `value`. O(len).
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.iter().any(|(_, v)| v == value)
    }

    /// Snapshot of all keys in bucket/chain order.
    pub fn keys(&self) -> Vec<i64> {
        self.iter().map(|(key, _)| key).collect()
    }

    /// Snapshot of all values in the same order as [`keys`](Self::keys).
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.iter().map(|(_, value)| value.clone()).collect()
    }

    /// Drops every entry and resets the table to [`DEFAULT_INITIAL_CAPACITY`]
    /// buckets. The load factor is kept.
    pub fn clear(&mut self) {
        let old = std::mem::replace(
            &mut self.buckets,
            empty_buckets(DEFAULT_INITIAL_CAPACITY),
        );
        trace!(
            "longmap cleared: {} entries dropped, capacity {} -> {DEFAULT_INITIAL_CAPACITY}",
            self.size,
            old.len()
        );
        unlink_chains(old);
        self.size = 0;
        self.threshold = threshold_for(DEFAULT_INITIAL_CAPACITY, self.load_factor);
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: self.buckets.iter(),
            current: None,
            remaining: self.size,
        }
    }
}

impl<V> Default for LongMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Drop for LongMap<V> {
    fn drop(&mut self) {
        unlink_chains(std::mem::take(&mut self.buckets));
    }
}

/// Copies every chain into the same bucket, in order. No resize runs, so the
/// copy keeps the source's capacity and threshold.
impl<V: Clone> Clone for LongMap<V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.iter().map(clone_chain).collect(),
            size: self.size,
            load_factor: self.load_factor,
            threshold: self.threshold,
        }
    }
}

impl<V: PartialEq> PartialEq for LongMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<V: Eq> Eq for LongMap<V> {}

impl<V: fmt::Debug> fmt::Debug for LongMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Writes `[k=v,k=v]` in bucket/chain order, `[]` when empty.
fn write_entries<V>(
    f: &mut fmt::Formatter<'_>,
    map: &LongMap<V>,
    mut write_value: impl FnMut(&mut fmt::Formatter<'_>, &V) -> fmt::Result,
) -> fmt::Result {
    f.write_str("[")?;
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{key}=")?;
        write_value(f, value)?;
    }
    f.write_str("]")
}

impl<V: fmt::Display> fmt::Display for LongMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_entries(f, self, |f, value| write!(f, "{value}"))
    }
}

impl<T: fmt::Display> LongMap<Option<T>> {
    /// Same rendering as `Display`, with `None` values written as `null`.
    ///
    /// ```rust
    /// use longmap::LongMap;
    ///
    /// let mut map: LongMap<Option<&str>> = LongMap::new();
    /// map.put(22, None);
    /// assert_eq!(map.display_nullable().to_string(), "[22=null]");
    /// ```
    pub fn display_nullable(&self) -> DisplayNullable<'_, T> {
        DisplayNullable { map: self }
    }
}

/// Returned by [`LongMap::display_nullable`].
pub struct DisplayNullable<'a, T> {
    map: &'a LongMap<Option<T>>,
}

impl<T: fmt::Display> fmt::Display for DisplayNullable<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_entries(f, self.map, |f, value| match value {
            Some(value) => write!(f, "{value}"),
            None => f.write_str("null"),
        })
    }
}

impl<V> Extend<(i64, V)> for LongMap<V> {
    fn extend<I: IntoIterator<Item = (i64, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<V> FromIterator<(i64, V)> for LongMap<V> {
    fn from_iter<I: IntoIterator<Item = (i64, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

// =============================================================================
// Iteration
// =============================================================================

pub struct Iter<'a, V> {
    buckets: std::slice::Iter<'a, Link<V>>,
    current: Option<&'a Entry<V>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (i64, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current {
                self.current = entry.next.as_deref();
                self.remaining -= 1;
                return Some((entry.key, &entry.value));
            }
            self.current = self.buckets.next()?.as_deref();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

impl<'a, V> IntoIterator for &'a LongMap<V> {
    type Item = (i64, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct IntoIter<V> {
    buckets: std::vec::IntoIter<Link<V>>,
    current: Link<V>,
    remaining: usize,
}

impl<V> Iterator for IntoIter<V> {
    type Item = (i64, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.take() {
                let Entry { key, value, next } = *entry;
                self.current = next;
                self.remaining -= 1;
                return Some((key, value));
            }
            self.current = self.buckets.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}

impl<V> FusedIterator for IntoIter<V> {}

impl<V> Drop for IntoIter<V> {
    fn drop(&mut self) {
        for _ in self.by_ref() {}
    }
}

impl<V> IntoIterator for LongMap<V> {
    type Item = (i64, V);
    type IntoIter = IntoIter<V>;

    fn into_iter(mut self) -> Self::IntoIter {
        IntoIter {
            buckets: std::mem::take(&mut self.buckets).into_iter(),
            current: None,
            remaining: self.size,
        }
    }
}


#[cfg(test)]
mod proptests;
