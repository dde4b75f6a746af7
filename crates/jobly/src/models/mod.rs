//! Company and job models.
//!
//! Every operation takes `&impl GenericClient`, so it can run on a pooled
//! connection or inside a caller-managed transaction.

mod company;
mod job;

pub use company::{
    COMPANY_NAME_MAP, Company, CompanyDetail, CompanyFilter, CompanyPatch, NewCompany,
};
pub use job::{JOB_NAME_MAP, Job, JobDetail, JobFilter, JobListing, JobPatch, NewJob};

use serde::{Deserialize, Deserializer};

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

fn log_sql(op: &'static str, sql: &str, params: usize) {
    tracing::debug!(target: "jobly.sql", op, sql, params, "executing");
}
