//! Insertion-ordered map
//!
//! Steps and error details both need map lookups while keeping the order in
//! which keys were first seen: serialization follows it, and retention drops
//! the oldest entries first. Overwriting a key keeps its original position.

use serde::ser::SerializeMap;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// Vec-backed map that remembers first-insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K, V> OrderedMap<K, V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Keep only the newest `limit` entries, dropping from the front
    pub fn retain_last(&mut self, limit: usize) {
        if self.entries.len() > limit {
            let excess = self.entries.len() - limit;
            self.entries.drain(..excess);
        }
    }

    fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.entries.iter().position(|(k, _)| k.borrow() == key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.position(key).is_some()
    }

    /// Insert or overwrite, returning the previous value
    ///
    /// An overwritten key keeps its original position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V>
    where
        K: PartialEq,
    {
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Return the value for `key`, inserting `make()` first if it is absent
    pub fn get_or_insert_with<Q, F>(&mut self, key: &Q, make: F) -> &mut V
    where
        K: Borrow<Q>,
        Q: PartialEq + ToOwned<Owned = K> + ?Sized,
        F: FnOnce() -> V,
    {
        let index = match self.position(key) {
            Some(i) => i,
            None => {
                self.entries.push((key.to_owned(), make()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }
}

impl<K, V> OrderedMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Combine maps in order; later maps overwrite values of earlier keys
    ///
    /// Hash-indexed so that merging many large inputs stays linear.
    pub fn merged<'a, I>(maps: I) -> Self
    where
        I: IntoIterator<Item = &'a OrderedMap<K, V>>,
        K: 'a,
        V: 'a,
    {
        let mut index: HashMap<K, usize> = HashMap::new();
        let mut entries: Vec<(K, V)> = Vec::new();
        for map in maps {
            for (key, value) in &map.entries {
                match index.get(key) {
                    Some(&i) => entries[i].1 = value.clone(),
                    None => {
                        index.insert(key.clone(), entries.len());
                        entries.push((key.clone(), value.clone()));
                    }
                }
            }
        }
        Self { entries }
    }
}

impl<K: PartialEq, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Display, V: serde::Serialize> serde::Serialize for OrderedMap<K, V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}
