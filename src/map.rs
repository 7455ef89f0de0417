use crate::any_value::Value;
use crate::descriptor::short_type_name;
use crate::key::KeyVariant;
use crate::typed::{Key, Storable};
use crate::MapError;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A heterogeneous container keyed by the closed set of [`KeyVariant`]s
///
/// Every value is checked against its key's descriptors when it is stored and
/// again every time it is read. Values are held as shared `Rc` references, so
/// a caller can keep using a value while it sits in the map. The map uses
/// `Rc` internally and is therefore neither `Send` nor `Sync`.
///
/// # Examples
///
/// ```
/// use sovran_keymap::{KeyVariant, MapError, TypeMap};
/// use std::rc::Rc;
///
/// let mut map = TypeMap::new();
/// map.put(KeyVariant::a_double()?, Rc::new(3.14159))?;
/// map.put(KeyVariant::another_double()?, Rc::new(2.71828))?;
///
/// assert_eq!(map.get(KeyVariant::a_double()?)?.as_deref(), Some(&3.14159));
/// assert_eq!(map.get(KeyVariant::another_double()?)?.as_deref(), Some(&2.71828));
///
/// assert!(map.remove(KeyVariant::a_double()?));
/// assert!(!map.contains_key(KeyVariant::ADouble));
/// # Ok::<(), MapError>(())
/// ```
#[derive(Clone, Default)]
pub struct TypeMap {
    items: HashMap<KeyVariant, Rc<dyn Value>>,
}

impl TypeMap {
    /// Creates a new, empty TypeMap
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
        }
    }

    /// Stores a value, returning the one it replaced
    ///
    /// `value` goes through the same check as [`TypeMap::get`], so anything
    /// stored can be read back. The previous value is re-checked against the
    /// key before anything is written, so a failed put never changes the map.
    ///
    /// # Errors
    ///
    /// Returns `MapError::TypeMismatch` if `value`, or the entry it would
    /// replace, fails one of the key's descriptors.
    pub fn put<T>(&mut self, key: Key<T>, value: Rc<T>) -> Result<Option<Rc<T>>, MapError>
    where
        T: Storable + ?Sized,
    {
        let value = key.admit(value)?;
        let previous = key.cast(self.items.get(&key.variant()).cloned())?;
        tracing::trace!(key = key.key_name(), replaced = previous.is_some(), "put");
        self.items.insert(key.variant(), value);
        Ok(previous)
    }

    /// Retrieves the value stored under `key`, checking it again
    ///
    /// # Errors
    ///
    /// Returns `MapError::TypeMismatch` if the stored value no longer
    /// satisfies the key.
    pub fn get<T>(&self, key: Key<T>) -> Result<Option<Rc<T>>, MapError>
    where
        T: Storable + ?Sized,
    {
        tracing::trace!(key = key.key_name(), "get");
        key.cast(self.items.get(&key.variant()).cloned())
    }

    /// Runs `f` on the value stored under `key` without cloning it out
    ///
    /// # Errors
    ///
    /// Returns `MapError::TypeMismatch` if the stored value no longer
    /// satisfies the key.
    pub fn with<T, F, R>(&self, key: Key<T>, f: F) -> Result<Option<R>, MapError>
    where
        T: Storable + ?Sized,
        F: FnOnce(&T) -> R,
    {
        Ok(self.get(key)?.map(|value| f(&value)))
    }

    /// Returns true if an entry exists for the key's variant
    pub fn contains_key(&self, key: impl Into<KeyVariant>) -> bool {
        self.items.contains_key(&key.into())
    }

    /// Removes the entry for the key's variant
    ///
    /// Returns `true` if an entry was present and removed.
    pub fn remove(&mut self, key: impl Into<KeyVariant>) -> bool {
        let variant = key.into();
        let removed = self.items.remove(&variant).is_some();
        tracing::trace!(key = variant.key_name(), removed, "remove");
        removed
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The variants with an entry, in declaration order
    pub fn keys(&self) -> Vec<KeyVariant> {
        let mut keys: Vec<KeyVariant> = self.items.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl fmt::Debug for TypeMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut map = f.debug_map();
        for key in self.keys() {
            if let Some(value) = self.items.get(&key) {
                map.entry(&key.key_name(), &short_type_name((**value).type_name()));
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::List;
    use std::collections::LinkedList;

    #[test]
    fn test_put_and_get() -> Result<(), MapError> {
        let mut map = TypeMap::new();
        assert!(map.is_empty());

        let greeting = Rc::new("Hi there, {}!".to_string());
        assert!(map.put(KeyVariant::string()?, Rc::clone(&greeting))?.is_none());
        assert!(map.put(KeyVariant::an_integer()?, Rc::new(-8))?.is_none());

        let stored = map.get(KeyVariant::string()?)?.unwrap();
        assert!(Rc::ptr_eq(&stored, &greeting));
        assert_eq!(map.get(KeyVariant::an_integer()?)?.as_deref(), Some(&-8));
        assert_eq!(map.len(), 2);
        Ok(())
    }

    #[test]
    fn test_get_absent_is_none() -> Result<(), MapError> {
        let map = TypeMap::new();
        assert!(map.get(KeyVariant::a_double()?)?.is_none());
        assert!(map.get(KeyVariant::floats_random_access()?)?.is_none());
        Ok(())
    }

    #[test]
    fn test_put_returns_previous() -> Result<(), MapError> {
        let mut map = TypeMap::new();
        let key = KeyVariant::an_integer()?;
        let first = Rc::new(1);
        map.put(key, Rc::clone(&first))?;
        let previous = map.put(key, Rc::new(2))?.unwrap();
        assert!(Rc::ptr_eq(&previous, &first));
        assert_eq!(map.get(key)?.as_deref(), Some(&2));
        assert_eq!(map.len(), 1);
        Ok(())
    }

    #[test]
    fn test_rejected_put_leaves_map_unchanged() -> Result<(), MapError> {
        let mut map = TypeMap::new();
        let key = KeyVariant::floats_random_access()?;
        let floats: Rc<dyn List> = Rc::new(vec![1.0f32]);
        map.put(key, Rc::clone(&floats))?;

        let linked: Rc<dyn List> = Rc::new(LinkedList::<f32>::new());
        assert!(matches!(
            map.put(key, linked),
            Err(MapError::TypeMismatch { .. })
        ));

        let stored = map.get(key)?.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(map.keys(), vec![KeyVariant::FloatsRandomAccess]);
        Ok(())
    }

    #[test]
    fn test_with() -> Result<(), MapError> {
        let mut map = TypeMap::new();
        let key = KeyVariant::string()?;
        assert_eq!(map.with(key, |s: &String| s.len())?, None);
        map.put(key, Rc::new("hello".to_string()))?;
        assert_eq!(map.with(key, |s: &String| s.len())?, Some(5));
        Ok(())
    }

    #[test]
    fn test_contains_and_remove() -> Result<(), MapError> {
        let mut map = TypeMap::new();
        let key = KeyVariant::another_double()?;
        assert!(!map.contains_key(key));
        assert!(!map.remove(key));

        map.put(key, Rc::new(2.71828))?;
        assert!(map.contains_key(key));
        assert!(map.contains_key(KeyVariant::AnotherDouble));
        assert!(!map.contains_key(KeyVariant::ADouble));

        assert!(map.remove(KeyVariant::AnotherDouble));
        assert!(!map.remove(key));
        assert!(!map.contains_key(key));
        Ok(())
    }

    #[test]
    fn test_keys_in_declaration_order() -> Result<(), MapError> {
        let mut map = TypeMap::new();
        map.put(KeyVariant::another_double()?, Rc::new(2.0))?;
        map.put(KeyVariant::string()?, Rc::new(String::new()))?;
        map.put(KeyVariant::a_double()?, Rc::new(1.0))?;
        assert_eq!(
            map.keys(),
            vec![KeyVariant::String, KeyVariant::ADouble, KeyVariant::AnotherDouble]
        );

        map.clear();
        assert!(map.keys().is_empty());
        Ok(())
    }

    #[test]
    fn test_clone_shares_values() -> Result<(), MapError> {
        let mut map = TypeMap::new();
        let key = KeyVariant::string()?;
        let text = Rc::new("shared".to_string());
        map.put(key, Rc::clone(&text))?;

        let mut copy = map.clone();
        copy.remove(key);
        assert!(map.contains_key(key));
        assert!(Rc::ptr_eq(&map.get(key)?.unwrap(), &text));
        Ok(())
    }

    #[test]
    fn test_debug_lists_entries() -> Result<(), MapError> {
        let mut map = TypeMap::default();
        map.put(KeyVariant::an_integer()?, Rc::new(3))?;
        assert_eq!(format!("{:?}", map), "{\"AN_INTEGER(i32)\": \"i32\"}");
        Ok(())
    }
}
