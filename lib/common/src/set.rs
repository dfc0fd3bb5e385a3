//! # Content-Addressed Sets
//!
//! [`Set`] is the container every stage of the advisor passes around: queries,
//! table schemas, columns and candidate indexes all live in one. Each element
//! supplies a deterministic string key through [`SetKey`], and the set maps
//! keys to elements.
//!
//! Iteration is always in ascending key order, so any algorithm that walks a
//! set visits elements in the same order on every run.
//!
//! ```
//! use common::{Set, SetKey};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Name(String);
//!
//! impl SetKey for Name {
//!     fn key(&self) -> String {
//!         self.0.clone()
//!     }
//! }
//!
//! let mut names = Set::new();
//! names.add(Name("b".into()));
//! names.add(Name("a".into()));
//! names.add(Name("a".into()));
//!
//! assert_eq!(names.len(), 2);
//! assert_eq!(names.keys().collect::<Vec<_>>(), vec!["a", "b"]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Supplies the key under which a value is stored in a [`Set`]. Two values
/// with equal keys are the same element as far as the set is concerned.
pub trait SetKey {
    fn key(&self) -> String;
}

/// A set of values addressed by their [`SetKey`].
///
/// Adding a value whose key is already present overwrites the stored value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "Vec<T>",
    into = "Vec<T>",
    bound(
        serialize = "T: Serialize + Clone",
        deserialize = "T: Deserialize<'de> + SetKey"
    )
)]
pub struct Set<T> {
    items: BTreeMap<String, T>,
}

impl<T> Set<T> {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.get(key)
    }

    pub fn remove_key(&mut self, key: &str) -> Option<T> {
        self.items.remove(key)
    }

    /// Iterates the elements in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// All keys joined by `,`. Two sets render the same string iff they hold
    /// the same keys.
    pub fn key_string(&self) -> String {
        self.keys().collect::<Vec<_>>().join(",")
    }
}

impl<T: SetKey> Set<T> {
    /// Adds `item`, replacing any element stored under the same key.
    pub fn add(&mut self, item: T) {
        self.items.insert(item.key(), item);
    }

    pub fn remove(&mut self, item: &T) -> Option<T> {
        self.items.remove(&item.key())
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains_key(&item.key())
    }
}

impl<T: SetKey + Clone> Set<T> {
    pub fn add_all(&mut self, other: &Set<T>) {
        for item in other.iter() {
            self.add(item.clone());
        }
    }

    pub fn remove_all(&mut self, other: &Set<T>) {
        for key in other.keys() {
            self.items.remove(key);
        }
    }

    /// Returns a copy of this set with `item` added.
    pub fn with(&self, item: T) -> Self {
        let mut set = self.clone();
        set.add(item);
        set
    }

    /// Returns a copy of this set with `item` removed.
    pub fn without(&self, item: &T) -> Self {
        let mut set = self.clone();
        set.remove(item);
        set
    }

    pub fn union(&self, other: &Set<T>) -> Self {
        let mut set = self.clone();
        set.add_all(other);
        set
    }

    pub fn intersection(&self, other: &Set<T>) -> Self {
        self.iter()
            .filter(|item| other.contains(item))
            .cloned()
            .collect()
    }

    pub fn difference(&self, other: &Set<T>) -> Self {
        self.iter()
            .filter(|item| !other.contains(item))
            .cloned()
            .collect()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.values().cloned().collect()
    }

    /// Every subset of exactly `k` elements, in lexicographic key order.
    pub fn combinations(&self, k: usize) -> Vec<Set<T>> {
        let items = self.to_vec();
        let n = items.len();
        if k > n {
            return Vec::new();
        }

        let mut result = Vec::new();
        let mut picks: Vec<usize> = (0..k).collect();
        loop {
            result.push(picks.iter().map(|&i| items[i].clone()).collect());

            // Advance the rightmost pick that still has room to move.
            let Some(pos) = (0..k).rev().find(|&i| picks[i] != i + n - k) else {
                break;
            };
            picks[pos] += 1;
            for i in pos + 1..k {
                picks[i] = picks[i - 1] + 1;
            }
        }

        result
    }
}

impl<T> Default for Set<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SetKey> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Set::new();
        for item in iter {
            set.add(item);
        }
        set
    }
}

impl<T: SetKey> Extend<T> for Set<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.add(item);
        }
    }
}

impl<T: SetKey> From<Vec<T>> for Set<T> {
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T> From<Set<T>> for Vec<T> {
    fn from(set: Set<T>) -> Self {
        set.items.into_values().collect()
    }
}

impl<T> IntoIterator for Set<T> {
    type Item = T;
    type IntoIter = std::collections::btree_map::IntoValues<String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_values()
    }
}

impl<'a, T> IntoIterator for &'a Set<T> {
    type Item = &'a T;
    type IntoIter = std::collections::btree_map::Values<'a, String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}

impl<T: fmt::Debug> fmt::Debug for Set<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.items.values()).finish()
    }
}

impl<T> fmt::Display for Set<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.key_string())
    }
}
