//! Keyed row collections and the key orderer.
//!
//! A [`KeyedRows`] collection carries a key-kind tag chosen by the caller.
//! The tag selects one [`KeyComparator`] per collection; the collection's own
//! iteration order is never used as report order.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::error::ReportError;
use crate::source::ReportRecord;
use crate::spec::EnumTypedValue;

////////////////////////////////////////////////////////////////////////////////
// #region KeyModels

/// Scalar type of a collection's keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumKeyKind {
    /// Integer keys.
    Integer,
    /// 32-bit float keys.
    Float32,
    /// 64-bit float keys.
    Float64,
    /// Text keys.
    Text,
    /// Timestamp keys.
    Timestamp,
    /// Boolean keys (not orderable).
    Boolean,
}

/// One key value.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumKeyValue {
    /// See [`EnumKeyKind::Integer`].
    Integer(i64),
    /// See [`EnumKeyKind::Float32`].
    Float32(f32),
    /// See [`EnumKeyKind::Float64`].
    Float64(f64),
    /// See [`EnumKeyKind::Text`].
    Text(String),
    /// See [`EnumKeyKind::Timestamp`].
    Timestamp(NaiveDateTime),
    /// See [`EnumKeyKind::Boolean`].
    Boolean(bool),
}

impl EnumKeyValue {
    /// Kind of this key.
    pub fn kind(&self) -> EnumKeyKind {
        match self {
            Self::Integer(_) => EnumKeyKind::Integer,
            Self::Float32(_) => EnumKeyKind::Float32,
            Self::Float64(_) => EnumKeyKind::Float64,
            Self::Text(_) => EnumKeyKind::Text,
            Self::Timestamp(_) => EnumKeyKind::Timestamp,
            Self::Boolean(_) => EnumKeyKind::Boolean,
        }
    }
}

impl From<i64> for EnumKeyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for EnumKeyValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f32> for EnumKeyValue {
    fn from(value: f32) -> Self {
        Self::Float32(value)
    }
}

impl From<f64> for EnumKeyValue {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<String> for EnumKeyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for EnumKeyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<NaiveDateTime> for EnumKeyValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl From<bool> for EnumKeyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Hashable identity of a key. Floats hash by bits with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum EnumKeySlot {
    Integer(i64),
    Float32(u32),
    Float64(u64),
    Text(String),
    Timestamp(NaiveDateTime),
    Boolean(bool),
}

impl From<&EnumKeyValue> for EnumKeySlot {
    fn from(value: &EnumKeyValue) -> Self {
        match value {
            EnumKeyValue::Integer(val) => Self::Integer(*val),
            EnumKeyValue::Float32(val) => Self::Float32((*val + 0.0).to_bits()),
            EnumKeyValue::Float64(val) => Self::Float64((*val + 0.0).to_bits()),
            EnumKeyValue::Text(val) => Self::Text(val.clone()),
            EnumKeyValue::Timestamp(val) => Self::Timestamp(*val),
            EnumKeyValue::Boolean(val) => Self::Boolean(*val),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region KeyComparators

/// Ascending comparator for one key kind.
pub trait KeyComparator {
    /// Kind this comparator orders.
    fn key_kind(&self) -> EnumKeyKind;

    /// Compare two keys of [`Self::key_kind`].
    fn compare(&self, a: &EnumKeyValue, b: &EnumKeyValue) -> Ordering;
}

struct IntegerKeyComparator;
struct Float32KeyComparator;
struct Float64KeyComparator;
struct TextKeyComparator;
struct TimestampKeyComparator;

impl KeyComparator for IntegerKeyComparator {
    fn key_kind(&self) -> EnumKeyKind {
        EnumKeyKind::Integer
    }

    fn compare(&self, a: &EnumKeyValue, b: &EnumKeyValue) -> Ordering {
        match (a, b) {
            (EnumKeyValue::Integer(x), EnumKeyValue::Integer(y)) => x.cmp(y),
            _ => Ordering::Equal,
        }
    }
}

impl KeyComparator for Float32KeyComparator {
    fn key_kind(&self) -> EnumKeyKind {
        EnumKeyKind::Float32
    }

    fn compare(&self, a: &EnumKeyValue, b: &EnumKeyValue) -> Ordering {
        match (a, b) {
            (EnumKeyValue::Float32(x), EnumKeyValue::Float32(y)) => x.total_cmp(y),
            _ => Ordering::Equal,
        }
    }
}

impl KeyComparator for Float64KeyComparator {
    fn key_kind(&self) -> EnumKeyKind {
        EnumKeyKind::Float64
    }

    fn compare(&self, a: &EnumKeyValue, b: &EnumKeyValue) -> Ordering {
        match (a, b) {
            (EnumKeyValue::Float64(x), EnumKeyValue::Float64(y)) => x.total_cmp(y),
            _ => Ordering::Equal,
        }
    }
}

impl KeyComparator for TextKeyComparator {
    fn key_kind(&self) -> EnumKeyKind {
        EnumKeyKind::Text
    }

    // `str` ordering is byte-wise.
    fn compare(&self, a: &EnumKeyValue, b: &EnumKeyValue) -> Ordering {
        match (a, b) {
            (EnumKeyValue::Text(x), EnumKeyValue::Text(y)) => x.as_bytes().cmp(y.as_bytes()),
            _ => Ordering::Equal,
        }
    }
}

impl KeyComparator for TimestampKeyComparator {
    fn key_kind(&self) -> EnumKeyKind {
        EnumKeyKind::Timestamp
    }

    fn compare(&self, a: &EnumKeyValue, b: &EnumKeyValue) -> Ordering {
        match (a, b) {
            (EnumKeyValue::Timestamp(x), EnumKeyValue::Timestamp(y)) => x.cmp(y),
            _ => Ordering::Equal,
        }
    }
}

/// Select the comparator for `kind`, refusing kinds without one.
pub fn derive_key_comparator(kind: EnumKeyKind) -> Result<&'static dyn KeyComparator, ReportError> {
    match kind {
        EnumKeyKind::Integer => Ok(&IntegerKeyComparator),
        EnumKeyKind::Float32 => Ok(&Float32KeyComparator),
        EnumKeyKind::Float64 => Ok(&Float64KeyComparator),
        EnumKeyKind::Text => Ok(&TextKeyComparator),
        EnumKeyKind::Timestamp => Ok(&TimestampKeyComparator),
        EnumKeyKind::Boolean => Err(ReportError::UnsupportedKeyType(kind)),
    }
}

/// Check that every key has kind `kind`.
pub fn validate_homogeneous_keys(
    kind: EnumKeyKind,
    keys: &[EnumKeyValue],
) -> Result<(), ReportError> {
    match keys.iter().find(|key| key.kind() != kind) {
        Some(key) => Err(ReportError::KeyTypeMismatch {
            expected: kind,
            found: key.kind(),
        }),
        None => Ok(()),
    }
}

/// Ascending order of `keys`, as indices into `keys`.
///
/// Equal keys keep their relative position in `keys`; callers must not rely
/// on that tie order.
pub fn order_keys(kind: EnumKeyKind, keys: &[EnumKeyValue]) -> Result<Vec<usize>, ReportError> {
    let comparator = derive_key_comparator(kind)?;
    validate_homogeneous_keys(comparator.key_kind(), keys)?;

    let mut l_idx: Vec<usize> = (0..keys.len()).collect();
    l_idx.sort_by(|a, b| comparator.compare(&keys[*a], &keys[*b]));
    Ok(l_idx)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region KeyedRowCollection

/// Object-safe view of a keyed row collection used by the layout engine.
pub trait KeyedRowSource {
    /// Kind tag of the collection.
    fn key_kind(&self) -> EnumKeyKind;

    /// Keys in storage order.
    fn keys(&self) -> &[EnumKeyValue];

    /// Field values of the row stored at `idx`.
    fn cells_at(&self, idx: usize) -> Option<Vec<EnumTypedValue>>;
}

/// Key-to-row mapping with one key kind per collection.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedRows<R> {
    key_kind: EnumKeyKind,
    keys: Vec<EnumKeyValue>,
    rows: Vec<R>,
    dict_idx_by_key: HashMap<EnumKeySlot, usize>,
}

impl<R> KeyedRows<R> {
    /// Empty collection keyed by `key_kind`.
    pub fn new(key_kind: EnumKeyKind) -> Self {
        Self {
            key_kind,
            keys: Vec::new(),
            rows: Vec::new(),
            dict_idx_by_key: HashMap::new(),
        }
    }

    /// Insert `row` under `key`, returning the row it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<EnumKeyValue>,
        row: R,
    ) -> Result<Option<R>, ReportError> {
        let key = key.into();
        if key.kind() != self.key_kind {
            return Err(ReportError::KeyTypeMismatch {
                expected: self.key_kind,
                found: key.kind(),
            });
        }

        let slot = EnumKeySlot::from(&key);
        if let Some(&n_idx) = self.dict_idx_by_key.get(&slot) {
            return Ok(Some(std::mem::replace(&mut self.rows[n_idx], row)));
        }
        self.dict_idx_by_key.insert(slot, self.keys.len());
        self.keys.push(key);
        self.rows.push(row);
        Ok(None)
    }

    /// Row stored under `key`.
    pub fn get(&self, key: &EnumKeyValue) -> Option<&R> {
        self.dict_idx_by_key
            .get(&EnumKeySlot::from(key))
            .map(|&n_idx| &self.rows[n_idx])
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Remove every row, keeping the key kind.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.rows.clear();
        self.dict_idx_by_key.clear();
    }

    /// Entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&EnumKeyValue, &R)> {
        self.keys.iter().zip(self.rows.iter())
    }
}

impl<R: ReportRecord> KeyedRowSource for KeyedRows<R> {
    fn key_kind(&self) -> EnumKeyKind {
        self.key_kind
    }

    fn keys(&self) -> &[EnumKeyValue] {
        &self.keys
    }

    fn cells_at(&self, idx: usize) -> Option<Vec<EnumTypedValue>> {
        self.rows.get(idx).map(ReportRecord::cells)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
