//! Host property access
//!
//! [`Animatable`] is the only thing the animation engine needs from a host
//! object: read and write a top-level property by name. Nested key paths
//! (`frame.origin.x`) are resolved on top of it by [`target_value`] and
//! [`set_target_value`].

use rustc_hash::FxHashMap;

use crate::error::{KeyPathError, Result};
use crate::extract::{set_value_for_key_path, value_for_key_path};
use crate::value::Value;

/// An object whose properties can be animated
pub trait Animatable {
    /// Read a top-level property, `None` if the object has no such property
    fn value_for_key(&self, key: &str) -> Option<Value>;

    /// Write a top-level property
    fn set_value_for_key(&mut self, key: &str, value: Value) -> Result<()>;
}

fn split_key_path(key_path: &str) -> (&str, Option<&str>) {
    match key_path.split_once('.') {
        Some((property, rest)) => (property, Some(rest)),
        None => (key_path, None),
    }
}

/// Read the value at `key_path` on a target
pub fn target_value(target: &dyn Animatable, key_path: &str) -> Result<Value> {
    let (property, rest) = split_key_path(key_path);
    let value = target
        .value_for_key(property)
        .ok_or_else(|| KeyPathError::not_found(key_path, property))?;

    match rest {
        Some(rest) => value_for_key_path(&value, rest).map_err(|err| match err {
            KeyPathError::PathNotFound { segment, .. } => KeyPathError::PathNotFound {
                path: key_path.to_string(),
                segment,
            },
            other => other,
        }),
        None => Ok(value),
    }
}

/// Write `value` at `key_path` on a target
///
/// For nested paths the top-level property is read, updated through the
/// remaining segments, and written back whole.
pub fn set_target_value(target: &mut dyn Animatable, key_path: &str, value: Value) -> Result<()> {
    let (property, rest) = split_key_path(key_path);
    let mut current = target
        .value_for_key(property)
        .ok_or_else(|| KeyPathError::not_found(key_path, property))?;

    match rest {
        Some(rest) => {
            set_value_for_key_path(&mut current, value, rest)?;
            target.set_value_for_key(property, current)
        }
        None => {
            if !current.same_shape(&value) {
                return Err(KeyPathError::ShapeMismatch {
                    expected: current.kind(),
                    found: value.kind(),
                });
            }
            target.set_value_for_key(property, value)
        }
    }
}

/// A plain property map implementing [`Animatable`]
///
/// Useful for hosts without their own object model. Properties must be
/// inserted before they can be animated; writes keep each property's kind.
#[derive(Clone, Debug, Default)]
pub struct PropertyMap {
    properties: FxHashMap<String, Value>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property (builder pattern)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace a property
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.properties.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.properties.get(key).copied()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.properties.remove(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl Animatable for PropertyMap {
    fn value_for_key(&self, key: &str) -> Option<Value> {
        self.get(key)
    }

    fn set_value_for_key(&mut self, key: &str, value: Value) -> Result<()> {
        let slot = self
            .properties
            .get_mut(key)
            .ok_or_else(|| KeyPathError::not_found(key, key))?;
        if !slot.same_shape(&value) {
            return Err(KeyPathError::ShapeMismatch {
                expected: slot.kind(),
                found: value.kind(),
            });
        }
        *slot = value;
        Ok(())
    }
}
