//! The compound tag: a key-unique map of name -> tag.

use std::collections::hash_map;
use std::collections::HashMap;

use crate::error::NbtError;
use crate::tag::{NbtList, NbtTag, TagKind};

/// Key-unique map of named tags. Iteration order carries no meaning and
/// equality is structural, so two compounds built in different orders
/// compare equal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NbtCompound {
    entries: HashMap<String, NbtTag>,
}

macro_rules! typed_get {
    ($get:ident, $try_get:ident, $kind:ident, $ty:ty, |$v:ident| $out:expr) => {
        pub fn $get(&self, key: &str) -> Result<$ty, NbtError> {
            match self.get(key)? {
                NbtTag::$kind($v) => Ok($out),
                other => Err(NbtError::mismatch(key, TagKind::$kind, other.kind())),
            }
        }

        pub fn $try_get(&self, key: &str) -> Option<$ty> {
            match self.try_get(key)? {
                NbtTag::$kind($v) => Some($out),
                _ => None,
            }
        }
    };
}

impl NbtCompound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Look up a key, failing with [`NbtError::MissingKey`] if absent.
    pub fn get(&self, key: &str) -> Result<&NbtTag, NbtError> {
        self.entries
            .get(key)
            .ok_or_else(|| NbtError::MissingKey(key.to_owned()))
    }

    pub fn try_get(&self, key: &str) -> Option<&NbtTag> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut NbtTag, NbtError> {
        self.entries
            .get_mut(key)
            .ok_or_else(|| NbtError::MissingKey(key.to_owned()))
    }

    /// Insert a new key. Fails with [`NbtError::DuplicateKey`] if the key
    /// is already present; use [`NbtCompound::set`] to replace.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<NbtTag>) -> Result<(), NbtError> {
        match self.entries.entry(key.into()) {
            hash_map::Entry::Occupied(e) => Err(NbtError::DuplicateKey(e.key().clone())),
            hash_map::Entry::Vacant(e) => {
                e.insert(value.into());
                Ok(())
            }
        }
    }

    /// Insert or replace a key, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<NbtTag>) -> Option<NbtTag> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<NbtTag> {
        self.entries.remove(key)
    }

    /// Remove a key and return its value, failing if absent.
    pub fn take(&mut self, key: &str) -> Result<NbtTag, NbtError> {
        self.entries
            .remove(key)
            .ok_or_else(|| NbtError::MissingKey(key.to_owned()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, NbtTag> {
        self.entries.iter()
    }

    pub fn keys(&self) -> hash_map::Keys<'_, String, NbtTag> {
        self.entries.keys()
    }

    /// Copy every entry of `self` into `target`. Existing keys in `target`
    /// are only replaced when `overwrite` is set.
    pub fn merge_into(&self, target: &mut NbtCompound, overwrite: bool) {
        for (key, value) in &self.entries {
            if !overwrite && target.contains_key(key) {
                continue;
            }
            target.set(key.clone(), value.clone());
        }
    }

    typed_get!(get_byte, try_get_byte, Byte, i8, |v| *v);
    typed_get!(get_short, try_get_short, Short, i16, |v| *v);
    typed_get!(get_int, try_get_int, Int, i32, |v| *v);
    typed_get!(get_long, try_get_long, Long, i64, |v| *v);
    typed_get!(get_float, try_get_float, Float, f32, |v| *v);
    typed_get!(get_double, try_get_double, Double, f64, |v| *v);
    typed_get!(get_string, try_get_string, String, &str, |v| v.as_str());
    typed_get!(get_byte_array, try_get_byte_array, ByteArray, &[i8], |v| v.as_slice());
    typed_get!(get_int_array, try_get_int_array, IntArray, &[i32], |v| v.as_slice());
    typed_get!(get_long_array, try_get_long_array, LongArray, &[i64], |v| v.as_slice());
    typed_get!(get_list, try_get_list, List, &NbtList, |v| v);
    typed_get!(get_compound, try_get_compound, Compound, &NbtCompound, |v| v);

    pub fn get_compound_mut(&mut self, key: &str) -> Result<&mut NbtCompound, NbtError> {
        match self.get_mut(key)? {
            NbtTag::Compound(c) => Ok(c),
            other => Err(NbtError::mismatch(key, TagKind::Compound, other.kind())),
        }
    }

    pub fn get_list_mut(&mut self, key: &str) -> Result<&mut NbtList, NbtError> {
        match self.get_mut(key)? {
            NbtTag::List(l) => Ok(l),
            other => Err(NbtError::mismatch(key, TagKind::List, other.kind())),
        }
    }
}

impl<'a> IntoIterator for &'a NbtCompound {
    type Item = (&'a String, &'a NbtTag);
    type IntoIter = hash_map::Iter<'a, String, NbtTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(String, NbtTag)> for NbtCompound {
    fn from_iter<I: IntoIterator<Item = (String, NbtTag)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
