//! Partial-update SET clause builder.
//!
//! Turns a sparse, ordered list of field/value pairs into the `SET` part of an
//! `UPDATE` statement plus the values to bind, numbering placeholders `$1..$n`
//! in payload order.
//!
//! # Example
//!
//! ```ignore
//! use jobly::partial_update::{NameMap, UpdatePayload, sql_for_partial_update};
//!
//! const COLUMNS: NameMap = NameMap::new(&[("numEmployees", "num_employees")]);
//!
//! let payload = UpdatePayload::new().set("name", "New").set("numEmployees", 10);
//! let clause = sql_for_partial_update(&payload, &COLUMNS)?;
//! assert_eq!(clause.set_cols, r#""name"=$1, "num_employees"=$2"#);
//!
//! let sql = format!(
//!     "UPDATE companies SET {} WHERE handle = ${}",
//!     clause.set_cols,
//!     clause.next_placeholder()
//! );
//! ```

use crate::error::{JoblyError, JoblyResult};
use crate::ident::push_quoted;
use crate::value::SqlValue;
use std::fmt::Write;
use tokio_postgres::types::ToSql;

/// Static table translating external field names to storage column names.
///
/// Fields that are not listed are used verbatim as the column name.
#[derive(Debug, Clone, Copy)]
pub struct NameMap {
    entries: &'static [(&'static str, &'static str)],
}

impl NameMap {
    /// A map that translates nothing.
    pub const EMPTY: NameMap = NameMap::new(&[]);

    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// Resolve the storage column for `field`.
    pub fn column<'a>(&self, field: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(from, _)| *from == field)
            .map_or(field, |&(_, to)| to)
    }
}

/// Ordered field/value pairs for a partial update.
///
/// Field names are unique: setting a field twice replaces its value but keeps the
/// position of the first `set`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePayload {
    fields: Vec<(String, SqlValue)>,
}

impl UpdatePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field (builder form).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a field in place.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<SqlValue>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Set a field only when `value` is `Some`.
    pub fn insert_opt<T: Into<SqlValue>>(&mut self, field: &str, value: Option<T>) {
        if let Some(v) = value {
            self.insert(field, v);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a payload from a JSON object, in the object's iteration order.
    ///
    /// Returns `None` when `value` is not an object.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(map) => Some(map.into_iter().collect()),
            _ => None,
        }
    }
}

impl<K, V> FromIterator<(K, V)> for UpdatePayload
where
    K: Into<String>,
    V: Into<SqlValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (k, v) in iter {
            payload.insert(k, v);
        }
        payload
    }
}

/// The SET fragment of an UPDATE and the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    /// `"col_a"=$1, "col_b"=$2, ...`
    pub set_cols: String,
    /// `values[i]` binds to `$i+1`.
    pub values: Vec<SqlValue>,
}

impl SetClause {
    /// Placeholder index for the first parameter appended after the SET values.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }

    /// Append a trailing parameter (e.g. the WHERE key); returns its placeholder index.
    pub fn push_value(&mut self, value: impl Into<SqlValue>) -> usize {
        self.values.push(value.into());
        self.values.len()
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }
}

/// Build the SET clause for `payload`, translating field names through `name_map`.
///
/// Fails with [`JoblyError::Validation`] (`"No data"`) when the payload is empty.
pub fn sql_for_partial_update(
    payload: &UpdatePayload,
    name_map: &NameMap,
) -> JoblyResult<SetClause> {
    if payload.is_empty() {
        return Err(JoblyError::validation("No data"));
    }

    let mut set_cols = String::new();
    let mut values = Vec::with_capacity(payload.len());
    for (idx, (field, value)) in payload.iter().enumerate() {
        if idx > 0 {
            set_cols.push_str(", ");
        }
        push_quoted(&mut set_cols, name_map.column(field));
        let _ = write!(set_cols, "=${}", idx + 1);
        values.push(value.clone());
    }

    Ok(SetClause { set_cols, values })
}
