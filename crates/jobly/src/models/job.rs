use super::company::Company;
use super::{log_sql, nullable};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::partial_update::{NameMap, UpdatePayload, sql_for_partial_update};
use crate::row::{FromRow, RowExt};
use crate::sql::{Predicate, sql};
use crate::validate::ValidationErrors;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

pub(crate) const JOB_COLUMNS: &str = "id, title, salary, equity, company_handle";

const LISTING_SELECT: &str = "SELECT j.id, j.title, j.salary, j.equity, j.company_handle, \
     c.name AS company_name \
     FROM jobs j LEFT JOIN companies AS c ON c.handle = j.company_handle";

/// External field names whose storage column differs.
pub const JOB_NAME_MAP: NameMap = NameMap::new(&[("companyHandle", "company_handle")]);

const HANDLE_MAX_LEN: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl FromRow for Job {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

/// A job as listed by [`Job::find_all`], with the owning company's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
    pub company_name: Option<String>,
}

impl FromRow for JobListing {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
            company_name: row.try_get_column("company_name")?,
        })
    }
}

/// A job with its company embedded in place of the handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDetail {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company: Company,
}

/// Input for [`Job::create`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    /// Decimal string in `[0, 1]`, e.g. `"0.25"`.
    #[serde(default)]
    pub equity: Option<String>,
    pub company_handle: String,
}

impl NewJob {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check_len("title", &self.title, 1, None);
        if let Some(salary) = self.salary {
            errors.check_min("salary", salary, 0);
        }
        if let Some(equity) = &self.equity {
            errors.check_equity("equity", equity);
        }
        errors.check_len("companyHandle", &self.company_handle, 1, Some(HANDLE_MAX_LEN));
        errors.into_result()
    }
}

/// Input for a partial job update. Neither the id nor the company can be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub equity: Option<Option<String>>,
}

impl JobPatch {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(title) = &self.title {
            errors.check_len("title", title, 1, None);
        }
        if let Some(Some(salary)) = self.salary {
            errors.check_min("salary", salary, 0);
        }
        if let Some(Some(equity)) = &self.equity {
            errors.check_equity("equity", equity);
        }
        errors.into_result()
    }

    /// Present fields, keyed by their external names, in declaration order.
    pub fn to_payload(&self) -> UpdatePayload {
        let mut payload = UpdatePayload::new();
        payload.insert_opt("title", self.title.clone());
        payload.insert_opt("salary", self.salary);
        payload.insert_opt("equity", self.equity.clone());
        payload
    }
}

/// Optional criteria for [`Job::find_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobFilter {
    #[serde(default)]
    pub min_salary: Option<i32>,
    /// Only `Some(true)` filters; `false` means "don't care".
    #[serde(default)]
    pub has_equity: Option<bool>,
    #[serde(default)]
    pub title: Option<String>,
}

impl JobFilter {
    pub fn validate(&self) -> JoblyResult<()> {
        let mut errors = ValidationErrors::default();
        if let Some(min) = self.min_salary {
            errors.check_min("minSalary", min, 0);
        }
        if let Some(title) = &self.title {
            errors.check_len("title", title, 1, None);
        }
        errors.into_result().map_err(JoblyError::from)
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(min) = self.min_salary {
            predicates.push(Predicate::gte("j.salary", min));
        }
        if self.has_equity == Some(true) {
            predicates.push(Predicate::Raw("j.equity > 0"));
        }
        if let Some(title) = &self.title {
            predicates.push(Predicate::ilike_contains("j.title", title));
        }
        predicates
    }
}

impl Job {
    /// Insert a new job for an existing company.
    pub async fn create(conn: &impl GenericClient, input: &NewJob) -> JoblyResult<Job> {
        input.validate()?;

        let mut q = sql("INSERT INTO jobs (title, salary, equity, company_handle) VALUES (");
        q.push_bind(input.title.as_str())
            .push(", ")
            .push_bind(input.salary)
            .push(", ")
            .push_bind(input.equity.clone())
            .push(", ")
            .push_bind(input.company_handle.as_str())
            .push(") RETURNING ")
            .push(JOB_COLUMNS);

        log_sql("job.create", &q.to_sql(), q.params().len());
        q.fetch_one_as(conn).await
    }

    /// List jobs matching `filter`, ordered by title.
    pub async fn find_all(
        conn: &impl GenericClient,
        filter: &JobFilter,
    ) -> JoblyResult<Vec<JobListing>> {
        filter.validate()?;

        let mut q = sql(LISTING_SELECT);
        q.push_where_and(filter.predicates());
        q.push(" ORDER BY j.title");

        log_sql("job.find_all", &q.to_sql(), q.params().len());
        q.fetch_all_as(conn).await
    }

    /// Fetch a job with its company.
    pub async fn get(conn: &impl GenericClient, id: i32) -> JoblyResult<JobDetail> {
        let mut q = sql(format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = "));
        q.push_bind(id);

        log_sql("job.get", &q.to_sql(), 1);
        let job: Job = q
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job with id: {id}")))?;

        let company = Company::find_by_handle(conn, &job.company_handle)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {}", job.company_handle)))?;

        Ok(JobDetail {
            id: job.id,
            title: job.title,
            salary: job.salary,
            equity: job.equity,
            company,
        })
    }

    /// Partially update a job.
    ///
    /// Fails with `Validation` when `payload` is empty and `NotFound` when no job has `id`.
    pub async fn update(
        conn: &impl GenericClient,
        id: i32,
        payload: &UpdatePayload,
    ) -> JoblyResult<Job> {
        let mut clause = sql_for_partial_update(payload, &JOB_NAME_MAP)?;
        let id_idx = clause.push_value(id);

        let query = format!(
            "UPDATE jobs SET {} WHERE id = ${id_idx} RETURNING {JOB_COLUMNS}",
            clause.set_cols
        );
        log_sql("job.update", &query, clause.values.len());

        let row = conn.query_opt(&query, &clause.params_ref()).await?;
        match row {
            Some(row) => Job::from_row(&row),
            None => Err(JoblyError::not_found(format!("No job with id: {id}"))),
        }
    }

    /// Validate a typed patch and apply it.
    pub async fn apply_patch(
        conn: &impl GenericClient,
        id: i32,
        patch: &JobPatch,
    ) -> JoblyResult<Job> {
        patch.validate()?;
        Self::update(conn, id, &patch.to_payload()).await
    }

    pub async fn remove(conn: &impl GenericClient, id: i32) -> JoblyResult<()> {
        let mut q = sql("DELETE FROM jobs WHERE id = ");
        q.push_bind(id);

        log_sql("job.remove", &q.to_sql(), 1);
        match q.execute(conn).await? {
            0 => Err(JoblyError::not_found(format!("No job with id: {id}"))),
            _ => Ok(()),
        }
    }
}
