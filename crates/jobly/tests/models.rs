//! Model operations against a live database.
//!
//! Each test runs in a transaction over `TEMP` tables that shadow the real schema,
//! so nothing survives the test. Tests are skipped when `DATABASE_URL` is unset.

use jobly::{
    Company, CompanyFilter, CompanyPatch, Job, JobFilter, JobPatch, JoblyError, JoblyResult,
    NewCompany, NewJob, UpdatePayload,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use tokio_postgres::{NoTls, Transaction};

const SCHEMA: &str = "
CREATE TEMP TABLE companies (
  handle VARCHAR(25) PRIMARY KEY CHECK (handle = lower(handle)),
  name TEXT UNIQUE NOT NULL,
  num_employees INTEGER CHECK (num_employees >= 0),
  description TEXT NOT NULL,
  logo_url TEXT
);
CREATE TEMP TABLE jobs (
  id SERIAL PRIMARY KEY,
  title TEXT NOT NULL,
  salary INTEGER CHECK (salary >= 0),
  equity NUMERIC CHECK (equity <= 1.0),
  company_handle VARCHAR(25) NOT NULL REFERENCES companies ON DELETE CASCADE
);
INSERT INTO companies (handle, name, num_employees, description, logo_url)
VALUES ('c1', 'C1', 1, 'Desc1', 'http://c1.img'),
       ('c2', 'C2', 2, 'Desc2', 'http://c2.img'),
       ('c3', 'C3', 3, 'Desc3', 'http://c3.img');
";

async fn try_connect(test: &str) -> JoblyResult<Option<tokio_postgres::Client>> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            return Ok(None);
        }
    };

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls)
        .await
        .map_err(JoblyError::from_db_error)?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });
    Ok(Some(client))
}

/// Create the temp schema and three jobs on `c1`; returns the job ids.
async fn seed(tx: &Transaction<'_>) -> JoblyResult<Vec<i32>> {
    tx.batch_execute(SCHEMA)
        .await
        .map_err(JoblyError::from_db_error)?;

    let rows = tx
        .query(
            "INSERT INTO jobs (title, salary, equity, company_handle)
             VALUES ('testJob1', 1234, 0.1, 'c1'),
                    ('testJob2', 1, 0.2, 'c1'),
                    ('testJob3', 300, NULL, 'c1')
             RETURNING id",
            &[],
        )
        .await
        .map_err(JoblyError::from_db_error)?;
    Ok(rows.iter().map(|r| r.get::<_, i32>("id")).collect())
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("valid decimal")
}

// ==================== companies ====================

#[tokio::test]
async fn company_create_and_reject_duplicate() -> JoblyResult<()> {
    let Some(mut client) = try_connect("company_create_and_reject_duplicate").await? else {
        return Ok(());
    };
    let tx = client.transaction().await.map_err(JoblyError::from_db_error)?;
    seed(&tx).await?;

    let input = NewCompany {
        handle: "new".to_string(),
        name: "New".to_string(),
        description: "New Description".to_string(),
        num_employees: Some(1),
        logo_url: Some("http://new.img".to_string()),
    };
    let company = Company::create(&tx, &input).await?;
    assert_eq!(company.handle, "new");
    assert_eq!(company.num_employees, Some(1));

    let err = Company::create(&tx, &input).await.unwrap_err();
    assert!(matches!(err, JoblyError::BadRequest(ref m) if m == "Duplicate company: new"));
    Ok(())
}

#[tokio::test]
async fn company_find_all_filters() -> JoblyResult<()> {
    let Some(mut client) = try_connect("company_find_all_filters").await? else {
        return Ok(());
    };
    let tx = client.transaction().await.map_err(JoblyError::from_db_error)?;
    seed(&tx).await?;

    let all = Company::find_all(&tx, &CompanyFilter::default()).await?;
    let handles: Vec<_> = all.iter().map(|c| c.handle.as_str()).collect();
    assert_eq!(handles, ["c1", "c2", "c3"]);

    let filter = CompanyFilter {
        min_employees: Some(2),
        max_employees: Some(2),
        ..Default::default()
    };
    let found = Company::find_all(&tx, &filter).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].handle, "c2");

    let filter = CompanyFilter {
        name: Some("3".to_string()),
        ..Default::default()
    };
    let found = Company::find_all(&tx, &filter).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].handle, "c3");

    let filter = CompanyFilter {
        min_employees: Some(3),
        max_employees: Some(1),
        ..Default::default()
    };
    let err = Company::find_all(&tx, &filter).await.unwrap_err();
    assert!(matches!(err, JoblyError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn company_get_includes_jobs() -> JoblyResult<()> {
    let Some(mut client) = try_connect("company_get_includes_jobs").await? else {
        return Ok(());
    };
    let tx = client.transaction().await.map_err(JoblyError::from_db_error)?;
    let job_ids = seed(&tx).await?;

    let detail = Company::get(&tx, "c1").await?;
    assert_eq!(detail.company.name, "C1");
    let ids: Vec<_> = detail.jobs.iter().map(|j| j.id).collect();
    assert_eq!(ids, job_ids);

    let detail = Company::get(&tx, "c2").await?;
    assert!(detail.jobs.is_empty());

    let err = Company::get(&tx, "nope").await.unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn company_update_maps_field_names() -> JoblyResult<()> {
    let Some(mut client) = try_connect("company_update_maps_field_names").await? else {
        return Ok(());
    };
    let tx = client.transaction().await.map_err(JoblyError::from_db_error)?;
    seed(&tx).await?;

    let payload = UpdatePayload::new()
        .set("name", "New")
        .set("description", "New Description")
        .set("numEmployees", 10)
        .set("logoUrl", "http://new.img");
    let company = Company::update(&tx, "c1", &payload).await?;
    assert_eq!(company.name, "New");
    assert_eq!(company.num_employees, Some(10));
    assert_eq!(company.logo_url.as_deref(), Some("http://new.img"));

    let patch = CompanyPatch {
        num_employees: Some(None),
        logo_url: Some(None),
        ..Default::default()
    };
    let company = Company::apply_patch(&tx, "c1", &patch).await?;
    assert_eq!(company.num_employees, None);
    assert_eq!(company.logo_url, None);
    assert_eq!(company.name, "New");
    Ok(())
}

#[tokio::test]
async fn company_update_errors() -> JoblyResult<()> {
    let Some(mut client) = try_connect("company_update_errors").await? else {
        return Ok(());
    };
    let tx = client.transaction().await.map_err(JoblyError::from_db_error)?;
    seed(&tx).await?;

    let payload = UpdatePayload::new().set("name", "nope");
    let err = Company::update(&tx, "nope", &payload).await.unwrap_err();
    assert!(err.is_not_found());

    let err = Company::update(&tx, "c1", &UpdatePayload::new()).await.unwrap_err();
    assert!(matches!(err, JoblyError::Validation(_)));

    // A string for an integer column fails to bind instead of storing its bytes.
    let raw = UpdatePayload::from_json(serde_json::json!({"numEmployees": "1234"}))
        .expect("object payload");
    let err = Company::update(&tx, "c1", &raw).await.unwrap_err();
    assert!(matches!(err, JoblyError::Query(_)));
    assert_eq!(Company::get(&tx, "c1").await?.company.num_employees, Some(1));

    let err = Company::update(&tx, "c1", &UpdatePayload::new().set("name", "C2"))
        .await
        .unwrap_err();
    assert!(matches!(err, JoblyError::Duplicate(_)));
    Ok(())
}

#[tokio::test]
async fn company_remove() -> JoblyResult<()> {
    let Some(mut client) = try_connect("company_remove").await? else {
        return Ok(());
    };
    let tx = client.transaction().await.map_err(JoblyError::from_db_error)?;
    let job_ids = seed(&tx).await?;

    Company::remove(&tx, "c1").await?;
    assert!(Company::get(&tx, "c1").await.unwrap_err().is_not_found());
    assert!(Job::get(&tx, job_ids[0]).await.unwrap_err().is_not_found());

    assert!(Company::remove(&tx, "c1").await.unwrap_err().is_not_found());
    Ok(())
}

// ==================== jobs ====================

#[tokio::test]
async fn job_create() -> JoblyResult<()> {
    let Some(mut client) = try_connect("job_create").await? else {
        return Ok(());
    };
    let tx = client.transaction().await.map_err(JoblyError::from_db_error)?;
    seed(&tx).await?;

    let input = NewJob {
        title: "Test".to_string(),
        salary: Some(12345),
        equity: Some("0.2".to_string()),
        company_handle: "c1".to_string(),
    };
    let job = Job::create(&tx, &input).await?;
    assert_eq!(job.title, "Test");
    assert_eq!(job.salary, Some(12345));
    assert_eq!(job.equity, Some(dec("0.2")));
    assert_eq!(job.company_handle, "c1");

    let orphan = NewJob {
        company_handle: "nope".to_string(),
        ..input
    };
    let err = Job::create(&tx, &orphan).await.unwrap_err();
    assert!(matches!(err, JoblyError::ForeignKeyViolation(_)));
    Ok(())
}

#[tokio::test]
async fn job_find_all_filters() -> JoblyResult<()> {
    let Some(mut client) = try_connect("job_find_all_filters").await? else {
        return Ok(());
    };
    let tx = client.transaction().await.map_err(JoblyError::from_db_error)?;
    let ids = seed(&tx).await?;

    let titles = |jobs: &[jobly::JobListing]| -> Vec<String> {
        jobs.iter().map(|j| j.title.clone()).collect()
    };

    let all = Job::find_all(&tx, &JobFilter::default()).await?;
    assert_eq!(titles(&all), ["testJob1", "testJob2", "testJob3"]);
    assert_eq!(all[0].id, ids[0]);
    assert_eq!(all[0].company_name.as_deref(), Some("C1"));
    assert_eq!(all[2].equity, None);

    let equity = JobFilter {
        has_equity: Some(true),
        ..Default::default()
    };
    assert_eq!(
        titles(&Job::find_all(&tx, &equity).await?),
        ["testJob1", "testJob2"]
    );

    let min_salary = JobFilter {
        min_salary: Some(200),
        ..Default::default()
    };
    assert_eq!(
        titles(&Job::find_all(&tx, &min_salary).await?),
        ["testJob1", "testJob3"]
    );

    let both = JobFilter {
        min_salary: Some(200),
        has_equity: Some(true),
        ..Default::default()
    };
    assert_eq!(titles(&Job::find_all(&tx, &both).await?), ["testJob1"]);

    let title = JobFilter {
        title: Some("B1".to_string()),
        ..Default::default()
    };
    assert_eq!(titles(&Job::find_all(&tx, &title).await?), ["testJob1"]);
    Ok(())
}

#[tokio::test]
async fn job_get_embeds_company() -> JoblyResult<()> {
    let Some(mut client) = try_connect("job_get_embeds_company").await? else {
        return Ok(());
    };
    let tx = client.transaction().await.map_err(JoblyError::from_db_error)?;
    let ids = seed(&tx).await?;

    let job = Job::get(&tx, ids[0]).await?;
    assert_eq!(job.title, "testJob1");
    assert_eq!(job.salary, Some(1234));
    assert_eq!(job.equity, Some(dec("0.1")));
    assert_eq!(job.company.handle, "c1");
    assert_eq!(job.company.logo_url.as_deref(), Some("http://c1.img"));

    let err = Job::get(&tx, 0).await.unwrap_err();
    assert!(matches!(err, JoblyError::NotFound(ref m) if m == "No job with id: 0"));
    Ok(())
}

#[tokio::test]
async fn job_update() -> JoblyResult<()> {
    let Some(mut client) = try_connect("job_update").await? else {
        return Ok(());
    };
    let tx = client.transaction().await.map_err(JoblyError::from_db_error)?;
    let ids = seed(&tx).await?;

    let payload = UpdatePayload::new()
        .set("title", "Updated")
        .set("salary", 420)
        .set("equity", "0.6");
    let job = Job::update(&tx, ids[0], &payload).await?;
    assert_eq!(job.id, ids[0]);
    assert_eq!(job.title, "Updated");
    assert_eq!(job.salary, Some(420));
    assert_eq!(job.equity, Some(dec("0.6")));
    assert_eq!(job.company_handle, "c1");

    let patch = JobPatch {
        equity: Some(None),
        ..Default::default()
    };
    let job = Job::apply_patch(&tx, ids[0], &patch).await?;
    assert_eq!(job.equity, None);
    assert_eq!(job.salary, Some(420));

    let err = Job::update(&tx, 0, &UpdatePayload::new().set("title", "failTest"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = Job::update(&tx, ids[0], &UpdatePayload::new()).await.unwrap_err();
    assert!(err.is_bad_request());

    let err = Job::apply_patch(&tx, ids[0], &JobPatch::default()).await.unwrap_err();
    assert!(matches!(err, JoblyError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn job_remove() -> JoblyResult<()> {
    let Some(mut client) = try_connect("job_remove").await? else {
        return Ok(());
    };
    let tx = client.transaction().await.map_err(JoblyError::from_db_error)?;
    let ids = seed(&tx).await?;

    Job::remove(&tx, ids[0]).await?;
    let rows = tx
        .query("SELECT id FROM jobs WHERE id = $1", &[&ids[0]])
        .await
        .map_err(JoblyError::from_db_error)?;
    assert!(rows.is_empty());

    assert!(Job::remove(&tx, 0).await.unwrap_err().is_not_found());
    Ok(())
}
