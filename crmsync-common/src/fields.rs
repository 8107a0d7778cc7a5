//! Field values and name-addressed field access
//!
//! Field mappings address entity fields by name at runtime. Each entity type
//! registers a [`FieldTable`] once: a map from field name to a typed
//! getter/setter pair. Lookups of unregistered names fail with
//! [`Error::UnknownField`] instead of silently doing nothing.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A dynamically typed field value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// String normalisation used for change detection
    ///
    /// Null and `false` become the empty string, `true` becomes `"1"`, and
    /// integral floats print without a fractional part, so a numeric remote
    /// value and its textual local counterpart compare equal.
    pub fn as_sync_string(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(true) => "1".to_string(),
            FieldValue::Bool(false) => String::new(),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            FieldValue::Text(s) => s.clone(),
        }
    }

    /// True when the value normalises to the empty string
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            other => other.as_sync_string().is_empty(),
        }
    }

    /// Coerce into an integer field
    ///
    /// Null and blank text become 0; numeric text is parsed.
    pub fn to_i64(&self, field: &str) -> Result<i64> {
        match self {
            FieldValue::Null => Ok(0),
            FieldValue::Bool(b) => Ok(i64::from(*b)),
            FieldValue::Integer(n) => Ok(*n),
            FieldValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(*f as i64),
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(0);
                }
                if let Ok(n) = trimmed.parse::<i64>() {
                    return Ok(n);
                }
                match trimmed.parse::<f64>() {
                    Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
                    _ => Err(self.invalid_for(field)),
                }
            }
            FieldValue::Float(_) => Err(self.invalid_for(field)),
        }
    }

    /// Coerce into a floating point field
    pub fn to_f64(&self, field: &str) -> Result<f64> {
        match self {
            FieldValue::Null => Ok(0.0),
            FieldValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            FieldValue::Integer(n) => Ok(*n as f64),
            FieldValue::Float(f) => Ok(*f),
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(0.0);
                }
                trimmed.parse::<f64>().map_err(|_| self.invalid_for(field))
            }
        }
    }

    /// Coerce into a boolean field
    pub fn to_bool(&self, field: &str) -> Result<bool> {
        match self {
            FieldValue::Null => Ok(false),
            FieldValue::Bool(b) => Ok(*b),
            FieldValue::Integer(n) => Ok(*n != 0),
            FieldValue::Float(f) => Ok(*f != 0.0),
            FieldValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "" | "0" | "false" | "no" => Ok(false),
                "1" | "true" | "yes" => Ok(true),
                _ => Err(self.invalid_for(field)),
            },
        }
    }

    /// Coerce into an optional text column; Null stays absent
    pub fn into_optional_text(self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Text(s) => Some(s),
            other => Some(other.as_sync_string()),
        }
    }

    /// Interpret the value as a remote cross-reference
    ///
    /// Returns `None` for zero or empty values (the entity is unlinked).
    /// Non-numeric text cannot identify a remote record and is rejected.
    pub fn as_reference(&self, field: &str) -> Result<Option<i64>> {
        if self.is_blank() {
            return Ok(None);
        }
        match self.to_i64(field)? {
            0 => Ok(None),
            n => Ok(Some(n)),
        }
    }

    fn invalid_for(&self, field: &str) -> Error {
        Error::InvalidFieldValue {
            field: field.to_string(),
            value: self.as_sync_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_sync_string())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map(FieldValue::Text).unwrap_or(FieldValue::Null)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Text(value.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}

/// Getter half of a field accessor
pub type Getter<T> = fn(&T) -> FieldValue;

/// Setter half of a field accessor
pub type Setter<T> = fn(&mut T, FieldValue) -> Result<()>;

/// Typed getter/setter pair for one named field
pub struct FieldAccessor<T> {
    pub getter: Getter<T>,
    pub setter: Option<Setter<T>>,
}

impl<T> FieldAccessor<T> {
    pub fn new(getter: Getter<T>, setter: Setter<T>) -> Self {
        Self {
            getter,
            setter: Some(setter),
        }
    }

    pub fn read_only(getter: Getter<T>) -> Self {
        Self {
            getter,
            setter: None,
        }
    }
}

/// Registry of named accessors for one entity type
pub struct FieldTable<T> {
    entity: &'static str,
    entries: HashMap<&'static str, FieldAccessor<T>>,
}

impl<T> FieldTable<T> {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            entries: HashMap::new(),
        }
    }

    /// Register an accessor (builder style)
    pub fn with(mut self, name: &'static str, accessor: FieldAccessor<T>) -> Self {
        self.entries.insert(name, accessor);
        self
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn accessor(&self, name: &str) -> Option<&FieldAccessor<T>> {
        self.entries.get(name)
    }

    /// Registered field names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn read(&self, target: &T, name: &str) -> Result<FieldValue> {
        self.accessor(name)
            .map(|a| (a.getter)(target))
            .ok_or_else(|| self.unknown(name))
    }

    pub fn write(&self, target: &mut T, name: &str, value: FieldValue) -> Result<()> {
        let accessor = self.accessor(name).ok_or_else(|| self.unknown(name))?;
        match accessor.setter {
            Some(setter) => setter(target, value),
            None => Err(Error::ReadOnlyField {
                entity: self.entity,
                field: name.to_string(),
            }),
        }
    }

    fn unknown(&self, name: &str) -> Error {
        Error::UnknownField {
            entity: self.entity,
            field: name.to_string(),
        }
    }
}

/// Name-addressed read/write access to an entity's fields
pub trait FieldAccess {
    fn get_field(&self, name: &str) -> Result<FieldValue>;

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()>;
}

/// Build a [`FieldTable`] from `"Name" => struct_field: kind` entries
///
/// Kinds: `text`, `opt_text`, `int`, `float`, `bool`, `ro_int`, `ro_timestamp`.
#[macro_export]
macro_rules! field_table {
    (@accessor $ty:ty, $key:literal, $field:ident, text) => {
        $crate::fields::FieldAccessor::<$ty>::new(
            |r: &$ty| $crate::fields::FieldValue::Text(r.$field.clone()),
            |r: &mut $ty, v: $crate::fields::FieldValue| {
                r.$field = v.as_sync_string();
                Ok(())
            },
        )
    };
    (@accessor $ty:ty, $key:literal, $field:ident, opt_text) => {
        $crate::fields::FieldAccessor::<$ty>::new(
            |r: &$ty| $crate::fields::FieldValue::from(r.$field.clone()),
            |r: &mut $ty, v: $crate::fields::FieldValue| {
                r.$field = v.into_optional_text();
                Ok(())
            },
        )
    };
    (@accessor $ty:ty, $key:literal, $field:ident, int) => {
        $crate::fields::FieldAccessor::<$ty>::new(
            |r: &$ty| $crate::fields::FieldValue::Integer(r.$field),
            |r: &mut $ty, v: $crate::fields::FieldValue| {
                r.$field = v.to_i64($key)?;
                Ok(())
            },
        )
    };
    (@accessor $ty:ty, $key:literal, $field:ident, float) => {
        $crate::fields::FieldAccessor::<$ty>::new(
            |r: &$ty| $crate::fields::FieldValue::Float(r.$field),
            |r: &mut $ty, v: $crate::fields::FieldValue| {
                r.$field = v.to_f64($key)?;
                Ok(())
            },
        )
    };
    (@accessor $ty:ty, $key:literal, $field:ident, bool) => {
        $crate::fields::FieldAccessor::<$ty>::new(
            |r: &$ty| $crate::fields::FieldValue::Bool(r.$field),
            |r: &mut $ty, v: $crate::fields::FieldValue| {
                r.$field = v.to_bool($key)?;
                Ok(())
            },
        )
    };
    (@accessor $ty:ty, $key:literal, $field:ident, ro_int) => {
        $crate::fields::FieldAccessor::<$ty>::read_only(|r: &$ty| {
            $crate::fields::FieldValue::Integer(r.$field)
        })
    };
    (@accessor $ty:ty, $key:literal, $field:ident, ro_timestamp) => {
        $crate::fields::FieldAccessor::<$ty>::read_only(|r: &$ty| {
            $crate::fields::FieldValue::from(r.$field)
        })
    };
    ($ty:ty, $entity:literal, { $($key:literal => $field:ident : $kind:ident),* $(,)? }) => {
        $crate::fields::FieldTable::<$ty>::new($entity)
            $(.with($key, $crate::field_table!(@accessor $ty, $key, $field, $kind)))*
    };
}
