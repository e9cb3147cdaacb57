//! Production job handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use printtrack_common::{
    db::{
        models::{Job, JobStatus, NewJob},
        Repository,
    },
    errors::{AppError, Result},
    metrics,
};

/// Create job request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    /// Recipe `sku_name` to build the job from
    #[validate(length(min = 1, max = 200))]
    pub sku: String,

    #[validate(length(min = 1, max = 100))]
    pub po_number: String,

    #[validate(range(min = 1))]
    pub po_quantity: i32,

    pub po_date: NaiveDate,

    pub unit_cost: Decimal,

    pub planned_date: NaiveDate,

    #[validate(length(max = 200))]
    pub customer_name: Option<String>,

    pub notes: Option<String>,

    #[validate(range(min = 0))]
    pub stock: Option<i32>,

    #[validate(range(min = 0))]
    pub wastage: Option<i32>,
}

impl From<CreateJobRequest> for NewJob {
    fn from(req: CreateJobRequest) -> Self {
        Self {
            sku: req.sku.trim().to_string(),
            po_number: req.po_number,
            po_quantity: req.po_quantity,
            po_date: req.po_date,
            unit_cost: req.unit_cost,
            planned_date: req.planned_date,
            customer_name: req.customer_name,
            notes: req.notes,
            stock: req.stock,
            wastage: req.wastage,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: JobStatus,
}

/// Job response
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku_code: Option<String>,
    pub status: JobStatus,
    pub po_number: String,
    pub po_quantity: i32,
    pub po_date: NaiveDate,
    pub unit_cost: Decimal,
    pub stock: i32,
    pub wastage: i32,
    pub planned_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub specification: JobSpecification,
    pub created_at: String,
}

/// Recipe specification as it was when the job was created
#[derive(Debug, Serialize)]
pub struct JobSpecification {
    pub material_type: Option<String>,
    pub application_type: Option<String>,
    pub one_up_width: Option<Decimal>,
    pub one_up_height: Option<Decimal>,
    pub print_sheet_width: Option<Decimal>,
    pub print_sheet_height: Option<Decimal>,
    pub print_sheet_size: Option<String>,
    pub ups: Option<i32>,
    pub purchase_sheet_width: Option<Decimal>,
    pub purchase_sheet_height: Option<Decimal>,
    pub purchase_sheet_size: Option<String>,
    pub purchase_ups: Option<i32>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        let status = job.job_status();
        Self {
            id: job.id,
            job_name: job.job_name,
            sku: job.sku,
            sku_code: job.sku_code,
            status,
            po_number: job.po_number,
            po_quantity: job.po_quantity,
            po_date: job.po_date,
            unit_cost: job.unit_cost,
            stock: job.stock,
            wastage: job.wastage,
            planned_date: job.planned_date,
            customer_name: job.customer_name,
            notes: job.notes,
            specification: JobSpecification {
                material_type: job.material_type,
                application_type: job.application_type,
                one_up_width: job.one_up_width,
                one_up_height: job.one_up_height,
                print_sheet_width: job.print_sheet_width,
                print_sheet_height: job.print_sheet_height,
                print_sheet_size: job.print_sheet_size,
                ups: job.ups,
                purchase_sheet_width: job.purchase_sheet_width,
                purchase_sheet_height: job.purchase_sheet_height,
                purchase_sheet_size: job.purchase_sheet_size,
                purchase_ups: job.purchase_ups,
            },
            created_at: job.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobResponse>,
    pub total: usize,
}

/// Create a job from a purchase order
pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobResponse>)> {
    req.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let job = repo.create_job(req.into()).await?;

    metrics::record_job_created();
    tracing::info!(job_id = job.id, job_name = ?job.job_name, "Job created");

    Ok((StatusCode::CREATED, Json(job.into())))
}

/// List jobs, newest first
pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<JobListResponse>> {
    let repo = Repository::new(state.db.clone());

    let jobs: Vec<JobResponse> = repo
        .list_jobs()
        .await?
        .into_iter()
        .map(JobResponse::from)
        .collect();

    Ok(Json(JobListResponse {
        total: jobs.len(),
        jobs,
    }))
}

/// Get a single job
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<JobResponse>> {
    let repo = Repository::new(state.db.clone());

    let job = repo
        .find_job_by_id(job_id)
        .await?
        .ok_or(AppError::JobNotFound { id: job_id })?;

    Ok(Json(job.into()))
}

/// Move a job to a new status. Completed jobs are final.
pub async fn update_status(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<JobResponse>> {
    let repo = Repository::new(state.db.clone());

    let job = repo
        .find_job_by_id(job_id)
        .await?
        .ok_or(AppError::JobNotFound { id: job_id })?;

    check_transition(&job, req.status)?;

    let job = repo.update_job_status(job_id, req.status).await?;
    tracing::info!(job_id, status = ?req.status, "Job status updated");

    Ok(Json(job.into()))
}

fn check_transition(job: &Job, next: JobStatus) -> Result<()> {
    if job.is_terminal() && next != JobStatus::Completed {
        return Err(AppError::Validation {
            message: format!("Job {} is already completed", job.id),
            field: Some("status".to_string()),
        });
    }
    Ok(())
}
