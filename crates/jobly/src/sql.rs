//! SQL-first dynamic builder.
//!
//! `Sql` stores SQL pieces and parameters separately and generates `$1, $2, ...`
//! placeholders in the final SQL string, so optional filters can be appended
//! without tracking indices by hand.
//!
//! # Example
//!
//! ```ignore
//! use jobly::sql::{Predicate, sql};
//!
//! let mut q = sql("SELECT handle, name FROM companies");
//! q.push_where_and(vec![
//!     Predicate::ilike_contains("name", "net"),
//!     Predicate::gte("num_employees", 10),
//! ]);
//! q.push(" ORDER BY name");
//!
//! assert_eq!(
//!     q.to_sql(),
//!     "SELECT handle, name FROM companies WHERE name ILIKE $1 AND num_employees >= $2 ORDER BY name"
//! );
//! ```

use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::row::FromRow;
use crate::value::SqlValue;
use std::fmt::Write;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

#[derive(Debug)]
enum SqlPart {
    Raw(String),
    Param,
}

/// A SQL-first, parameter-safe dynamic SQL builder.
#[derive(Debug)]
pub struct Sql {
    parts: Vec<SqlPart>,
    params: Vec<SqlValue>,
}

/// Start building a SQL statement.
pub fn sql(initial_sql: impl Into<String>) -> Sql {
    Sql::new(initial_sql)
}

impl Sql {
    /// Create a new builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            parts: vec![SqlPart::Raw(initial_sql.into())],
            params: Vec::new(),
        }
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a parameter placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<SqlValue>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value.into());
        self
    }

    /// Append a single predicate.
    pub fn push_predicate(&mut self, predicate: Predicate) -> &mut Self {
        match predicate {
            Predicate::Compare {
                column,
                operator,
                value,
            } => {
                self.push(column).push(" ").push(operator).push(" ");
                self.push_bind(value)
            }
            Predicate::Raw(sql) => self.push(sql),
        }
    }

    /// Append a `WHERE ...` clause composed of predicates joined by `AND`.
    ///
    /// If `predicates` is empty, this is a no-op.
    pub fn push_where_and(&mut self, predicates: Vec<Predicate>) -> &mut Self {
        for (i, predicate) in predicates.into_iter().enumerate() {
            self.push(if i == 0 { " WHERE " } else { " AND " });
            self.push_predicate(predicate);
        }
        self
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let mut idx: usize = 0;

        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => {
                    idx += 1;
                    let _ = write!(&mut out, "${}", idx);
                }
            }
        }
        out
    }

    /// Bound values, in placeholder order.
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }

    fn validate(&self) -> JoblyResult<()> {
        let placeholder_count = self
            .parts
            .iter()
            .filter(|p| matches!(p, SqlPart::Param))
            .count();

        if placeholder_count != self.params.len() {
            return Err(JoblyError::Validation(format!(
                "Sql: placeholders({}) and params({}) differ",
                placeholder_count,
                self.params.len()
            )));
        }
        Ok(())
    }

    /// Execute the built SQL and return all rows.
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> JoblyResult<Vec<Row>> {
        self.validate()?;
        let sql = self.to_sql();
        let params = self.params_ref();
        conn.query(&sql, &params).await
    }

    /// Execute the built SQL and return all rows mapped to `T`.
    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute the built SQL and return at most one row mapped to `T`.
    pub async fn fetch_opt_as<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> JoblyResult<Option<T>> {
        self.validate()?;
        let sql = self.to_sql();
        let params = self.params_ref();
        let row = conn.query_opt(&sql, &params).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Execute the built SQL and map the first row to `T`; `NotFound` if there is none.
    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<T> {
        self.validate()?;
        let sql = self.to_sql();
        let params = self.params_ref();
        let row = conn.query_one(&sql, &params).await?;
        T::from_row(&row)
    }

    /// Execute the built SQL and return affected row count.
    pub async fn execute(&self, conn: &impl GenericClient) -> JoblyResult<u64> {
        self.validate()?;
        let sql = self.to_sql();
        let params = self.params_ref();
        conn.execute(&sql, &params).await
    }
}

/// One condition of a dynamic `WHERE` clause.
///
/// Column names and operators are `'static` so only the values come from callers.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column <operator> $n`
    Compare {
        column: &'static str,
        operator: &'static str,
        value: SqlValue,
    },
    /// Fixed SQL with no parameters, e.g. `equity > 0`.
    Raw(&'static str),
}

impl Predicate {
    pub fn gte(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::Compare {
            column,
            operator: ">=",
            value: value.into(),
        }
    }

    pub fn lte(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::Compare {
            column,
            operator: "<=",
            value: value.into(),
        }
    }

    /// Case-insensitive substring match: `column ILIKE '%needle%'`.
    pub fn ilike_contains(column: &'static str, needle: &str) -> Self {
        Self::Compare {
            column,
            operator: "ILIKE",
            value: SqlValue::Text(format!("%{needle}%")),
        }
    }
}
