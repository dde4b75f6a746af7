//! # jobly
//!
//! PostgreSQL data layer for a companies-and-jobs service.
//!
//! ## Features
//!
//! - **Partial updates**: [`sql_for_partial_update`] turns an ordered field/value payload into a
//!   `SET "col"=$1, ...` clause plus aligned values, remapping external field names to columns
//! - **Dynamic filters**: [`Sql`] numbers placeholders for optional `WHERE` predicates
//! - **Models**: [`Company`] and [`Job`] CRUD over any [`GenericClient`] (connection, pool
//!   client or transaction)
//! - **Input validation**: typed, serde-shaped inputs checked before any SQL runs
//!
//! ```ignore
//! use jobly::{Company, CompanyPatch, DbConfig, create_pool};
//!
//! let pool = create_pool(&DbConfig::from_env()?)?;
//! let client = pool.get().await?;
//!
//! let patch: CompanyPatch = serde_json::from_str(r#"{"numEmployees": 12}"#)?;
//! let company = Company::apply_patch(&client, "acme", &patch).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod ident;
pub mod models;
pub mod partial_update;
pub mod row;
pub mod sql;
pub mod validate;
pub mod value;

pub use client::GenericClient;
pub use config::DbConfig;
pub use error::{JoblyError, JoblyResult};
pub use ident::quote_ident;
pub use models::{
    Company, CompanyDetail, CompanyFilter, CompanyPatch, Job, JobDetail, JobFilter, JobListing,
    JobPatch, NewCompany, NewJob,
};
pub use partial_update::{NameMap, SetClause, UpdatePayload, sql_for_partial_update};
pub use row::{FromRow, RowExt};
pub use sql::{Predicate, Sql, sql};
pub use validate::{ValidationCode, ValidationError, ValidationErrors};
pub use value::SqlValue;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{connect, create_pool};

#[cfg(feature = "migrate")]
pub mod migrate;
