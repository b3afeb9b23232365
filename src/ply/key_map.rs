//! Ordered element map.
//!
//! A PLY model is an ordered collection of uniquely named elements; header
//! order and payload order both follow insertion order. [`KeyMap`] (currently
//! backed by [`indexmap::IndexMap`]) gives exactly that, plus cheap
//! index-of-name lookups for the cached vertex/face element indices.

use indexmap::IndexMap;
use super::Element;

/// Alias to reduce coupling with the map implementation.
pub type KeyMap<V> = IndexMap<String, V>;

/// Convenience trait to keep map keys consistent with the name attribute of
/// the stored value.
pub trait Addable<V: Key> {
    /// Takes a value that provides a key and stores it under that key.
    fn add(&mut self, new_value: V);
}

impl<V: Key> Addable<V> for KeyMap<V> {
    fn add(&mut self, value: V) {
        self.insert(value.get_key(), value);
    }
}

/// Provides the key under which a value is stored in a [`KeyMap`].
pub trait Key {
    /// Returns the storage key.
    fn get_key(&self) -> String;
}

impl Key for Element {
    fn get_key(&self) -> String {
        self.name().to_string()
    }
}
