use super::job::{JOB_COLUMNS, Job};
use super::{log_sql, nullable};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::partial_update::{NameMap, UpdatePayload, sql_for_partial_update};
use crate::row::{FromRow, RowExt};
use crate::sql::{Predicate, sql};
use crate::validate::ValidationErrors;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

const COMPANY_COLUMNS: &str = "handle, name, description, num_employees, logo_url";

/// External field names whose storage column differs.
pub const COMPANY_NAME_MAP: NameMap = NameMap::new(&[
    ("numEmployees", "num_employees"),
    ("logoUrl", "logo_url"),
]);

const HANDLE_MAX_LEN: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            description: row.try_get_column("description")?,
            num_employees: row.try_get_column("num_employees")?,
            logo_url: row.try_get_column("logo_url")?,
        })
    }
}

/// A company together with its open jobs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<Job>,
}

/// Input for [`Company::create`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub num_employees: Option<i32>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl NewCompany {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check_len("handle", &self.handle, 1, Some(HANDLE_MAX_LEN));
        errors.check_len("name", &self.name, 1, None);
        if let Some(n) = self.num_employees {
            errors.check_min("numEmployees", n, 0);
        }
        if let Some(url) = &self.logo_url {
            errors.check_url("logoUrl", url);
        }
        errors.into_result()
    }
}

/// Input for a partial company update. The handle cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub num_employees: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub logo_url: Option<Option<String>>,
}

impl CompanyPatch {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(name) = &self.name {
            errors.check_len("name", name, 1, None);
        }
        if let Some(Some(n)) = self.num_employees {
            errors.check_min("numEmployees", n, 0);
        }
        if let Some(Some(url)) = &self.logo_url {
            errors.check_url("logoUrl", url);
        }
        errors.into_result()
    }

    /// Present fields, keyed by their external names, in declaration order.
    pub fn to_payload(&self) -> UpdatePayload {
        let mut payload = UpdatePayload::new();
        payload.insert_opt("name", self.name.clone());
        payload.insert_opt("description", self.description.clone());
        payload.insert_opt("numEmployees", self.num_employees);
        payload.insert_opt("logoUrl", self.logo_url.clone());
        payload
    }
}

/// Optional criteria for [`Company::find_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub min_employees: Option<i32>,
    #[serde(default)]
    pub max_employees: Option<i32>,
}

impl CompanyFilter {
    pub fn validate(&self) -> JoblyResult<()> {
        if let (Some(min), Some(max)) = (self.min_employees, self.max_employees) {
            if min > max {
                return Err(JoblyError::bad_request(
                    "Minimum employees cannot exceed maximum employees",
                ));
            }
        }
        let mut errors = ValidationErrors::default();
        if let Some(name) = &self.name {
            errors.check_len("name", name, 1, None);
        }
        errors.into_result().map_err(JoblyError::from)
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(name) = &self.name {
            predicates.push(Predicate::ilike_contains("name", name));
        }
        if let Some(min) = self.min_employees {
            predicates.push(Predicate::gte("num_employees", min));
        }
        if let Some(max) = self.max_employees {
            predicates.push(Predicate::lte("num_employees", max));
        }
        predicates
    }
}

impl Company {
    /// Insert a new company.
    ///
    /// Fails with `BadRequest` if the handle is already taken.
    pub async fn create(conn: &impl GenericClient, input: &NewCompany) -> JoblyResult<Company> {
        input.validate()?;

        if Self::find_by_handle(conn, &input.handle).await?.is_some() {
            return Err(JoblyError::bad_request(format!(
                "Duplicate company: {}",
                input.handle
            )));
        }

        let mut q = sql("INSERT INTO companies (handle, name, description, num_employees, logo_url) VALUES (");
        q.push_bind(input.handle.as_str())
            .push(", ")
            .push_bind(input.name.as_str())
            .push(", ")
            .push_bind(input.description.as_str())
            .push(", ")
            .push_bind(input.num_employees)
            .push(", ")
            .push_bind(input.logo_url.clone())
            .push(") RETURNING ")
            .push(COMPANY_COLUMNS);

        log_sql("company.create", &q.to_sql(), q.params().len());
        q.fetch_one_as(conn).await
    }

    /// List companies matching `filter`, ordered by name.
    pub async fn find_all(
        conn: &impl GenericClient,
        filter: &CompanyFilter,
    ) -> JoblyResult<Vec<Company>> {
        filter.validate()?;

        let mut q = sql(format!("SELECT {COMPANY_COLUMNS} FROM companies"));
        q.push_where_and(filter.predicates());
        q.push(" ORDER BY name");

        log_sql("company.find_all", &q.to_sql(), q.params().len());
        q.fetch_all_as(conn).await
    }

    /// Fetch a company and its jobs.
    pub async fn get(conn: &impl GenericClient, handle: &str) -> JoblyResult<CompanyDetail> {
        let company = Self::find_by_handle(conn, handle)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))?;

        let mut q = sql(format!("SELECT {JOB_COLUMNS} FROM jobs WHERE company_handle = "));
        q.push_bind(handle).push(" ORDER BY id");

        log_sql("company.get.jobs", &q.to_sql(), q.params().len());
        let jobs = q.fetch_all_as(conn).await?;

        Ok(CompanyDetail { company, jobs })
    }

    /// Partially update a company.
    ///
    /// `payload` uses external field names (`numEmployees`, `logoUrl`). Fails with
    /// `Validation` when it is empty and `NotFound` when no company has `handle`.
    pub async fn update(
        conn: &impl GenericClient,
        handle: &str,
        payload: &UpdatePayload,
    ) -> JoblyResult<Company> {
        let mut clause = sql_for_partial_update(payload, &COMPANY_NAME_MAP)?;
        let handle_idx = clause.push_value(handle);

        let query = format!(
            "UPDATE companies SET {} WHERE handle = ${handle_idx} RETURNING {COMPANY_COLUMNS}",
            clause.set_cols
        );
        log_sql("company.update", &query, clause.values.len());

        let row = conn.query_opt(&query, &clause.params_ref()).await?;
        match row {
            Some(row) => Company::from_row(&row),
            None => Err(JoblyError::not_found(format!("No company: {handle}"))),
        }
    }

    /// Validate a typed patch and apply it.
    pub async fn apply_patch(
        conn: &impl GenericClient,
        handle: &str,
        patch: &CompanyPatch,
    ) -> JoblyResult<Company> {
        patch.validate()?;
        Self::update(conn, handle, &patch.to_payload()).await
    }

    /// Delete a company (and, by cascade, its jobs).
    pub async fn remove(conn: &impl GenericClient, handle: &str) -> JoblyResult<()> {
        let mut q = sql("DELETE FROM companies WHERE handle = ");
        q.push_bind(handle);

        log_sql("company.remove", &q.to_sql(), 1);
        match q.execute(conn).await? {
            0 => Err(JoblyError::not_found(format!("No company: {handle}"))),
            _ => Ok(()),
        }
    }

    pub(crate) async fn find_by_handle(
        conn: &impl GenericClient,
        handle: &str,
    ) -> JoblyResult<Option<Company>> {
        let mut q = sql(format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE handle = "));
        q.push_bind(handle);

        log_sql("company.find_by_handle", &q.to_sql(), 1);
        q.fetch_opt_as(conn).await
    }
}
