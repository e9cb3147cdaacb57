//! SKU recipe handlers: bulk upload, create, search, lookup, export and
//! sample templates

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::attachment;
use crate::AppState;
use printtrack_common::{
    config::ReportFormat,
    db::{models::SkuRecipe, Repository},
    errors::{AppError, Result},
    RecipeStore,
};
use printtrack_ingestion::{
    export::{export_recipes_csv, EXPORT_FILE_NAME},
    sample::{sample_file_name, sample_template},
    ImportProcessor, RecipeCreator, RecipeInput,
};

/// Multipart field carrying the uploaded table
const UPLOAD_FIELD: &str = "file";

/// Recipe as returned by the API
#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub sku_code: String,
    pub sku_name: String,
    pub material_type: String,
    pub application_type: String,
    pub one_up_width: Decimal,
    pub one_up_height: Decimal,
    pub print_sheet_width: Option<Decimal>,
    pub print_sheet_height: Option<Decimal>,
    pub print_sheet_size: Option<String>,
    pub ups: i32,
    pub purchase_sheet_width: Option<Decimal>,
    pub purchase_sheet_height: Option<Decimal>,
    pub purchase_sheet_size: Option<String>,
    pub purchase_ups: i32,
    pub created_at: String,
}

impl From<SkuRecipe> for RecipeResponse {
    fn from(recipe: SkuRecipe) -> Self {
        Self {
            id: recipe.id,
            sku_code: recipe.sku_code,
            sku_name: recipe.sku_name,
            material_type: recipe.material_type,
            application_type: recipe.application_type,
            one_up_width: recipe.one_up_width,
            one_up_height: recipe.one_up_height,
            print_sheet_width: recipe.print_sheet_width,
            print_sheet_height: recipe.print_sheet_height,
            print_sheet_size: recipe.print_sheet_size,
            ups: recipe.ups,
            purchase_sheet_width: recipe.purchase_sheet_width,
            purchase_sheet_height: recipe.purchase_sheet_height,
            purchase_sheet_size: recipe.purchase_sheet_size,
            purchase_ups: recipe.purchase_ups,
            created_at: recipe.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct RecipeListResponse {
    pub recipes: Vec<RecipeResponse>,
    pub total: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub sku: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExportRequest {
    #[validate(length(min = 1, max = 10000))]
    pub ids: Vec<i64>,
}

/// Response for a batch with no failed rows
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: String,
    pub batch_id: String,
    pub accepted: usize,
}

/// Search recipes by name or code
pub async fn search_recipes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<RecipeListResponse>> {
    let repo = Repository::new(state.db.clone());

    let recipes: Vec<RecipeResponse> = repo
        .search_recipes(&query.q)
        .await?
        .into_iter()
        .map(RecipeResponse::from)
        .collect();

    Ok(Json(RecipeListResponse {
        total: recipes.len(),
        recipes,
    }))
}

/// Fetch a recipe's specification by exact SKU name
pub async fn lookup_recipe(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<RecipeResponse>> {
    let sku = query
        .sku
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::MissingField { field: "sku".to_string() })?;

    let repo = Repository::new(state.db.clone());

    let recipe = repo
        .find_recipe_by_name(sku)
        .await?
        .ok_or_else(|| AppError::RecipeNotFound { sku: sku.to_string() })?;

    Ok(Json(recipe.into()))
}

/// Create a single recipe
pub async fn create_recipe(
    State(state): State<AppState>,
    Json(input): Json<RecipeInput>,
) -> Result<(StatusCode, Json<RecipeResponse>)> {
    let repo = Repository::new(state.db.clone());
    let creator = RecipeCreator::new(repo, state.config.import.code_retry_limit);

    let recipe = creator.create(&input).await?;

    Ok((StatusCode::CREATED, Json(recipe.into())))
}

/// Download selected recipes as CSV
pub async fn export_recipes(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Response> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("ids".to_string()),
    })?;

    let repo = Repository::new(state.db.clone());
    let recipes = repo.find_recipes_by_ids(&request.ids).await?;

    let bytes = export_recipes_csv(&recipes).map_err(AppError::from)?;

    tracing::info!(requested = request.ids.len(), exported = recipes.len(), "Recipes exported");

    Ok(attachment(EXPORT_FILE_NAME, ReportFormat::Csv.content_type(), bytes))
}

fn sample_response(format: ReportFormat) -> Result<Response> {
    let bytes = sample_template(format).map_err(AppError::from)?;
    Ok(attachment(&sample_file_name(format), format.content_type(), bytes))
}

/// CSV upload template
pub async fn sample_csv() -> Result<Response> {
    sample_response(ReportFormat::Csv)
}

/// Excel upload template
pub async fn sample_xlsx() -> Result<Response> {
    sample_response(ReportFormat::Xlsx)
}

fn multipart_error(err: MultipartError, state: &AppState) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge {
            limit: state.config.server.max_upload_bytes,
        }
    } else {
        AppError::InvalidFormat { message: err.body_text() }
    }
}

/// Bulk import recipes from a CSV or Excel upload.
///
/// A clean batch answers with JSON. When any row failed, the error report is
/// returned as a download instead; rows that passed are already stored. The
/// import runs on its own task and is not subject to the request timeout.
pub async fn bulk_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, &state))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, &state))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| AppError::MissingField {
        field: UPLOAD_FIELD.to_string(),
    })?;

    let repo = Repository::new(state.db.clone());
    let processor = ImportProcessor::new(repo, state.config.import.clone());

    // Detached so the batch finishes even if the client goes away
    let guard = state.imports.start();
    let import = tokio::spawn(async move {
        let _guard = guard;
        processor.process_upload(&file_name, bytes).await
    });

    let result = import
        .await
        .map_err(|e| AppError::Internal { message: format!("Import task failed: {}", e) })??;
    let outcome = result.outcome;

    match result.report {
        Some(report) => {
            let mut response = attachment(&report.file_name, report.content_type, report.bytes);
            let headers = response.headers_mut();
            headers.insert(
                "x-import-status",
                HeaderValue::from_static(outcome.status().as_str()),
            );
            headers.insert("x-import-accepted", HeaderValue::from(outcome.accepted.len()));
            headers.insert("x-import-rejected", HeaderValue::from(outcome.failures.len()));
            Ok(response)
        }
        None => Ok(Json(UploadResponse {
            status: outcome.status().as_str().to_string(),
            batch_id: outcome.batch_id.to_string(),
            accepted: outcome.accepted.len(),
        })
        .into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[tokio::test]
    async fn test_sample_csv_download() {
        let response = sample_csv().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"sample_recipes.csv\""
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("sku_name,material_type,application_type,"));
        assert!(text.contains("Clothing Tag,Art Paper,Lamination,50.00,70.00"));
    }

    #[tokio::test]
    async fn test_sample_xlsx_content_type() {
        let response = sample_xlsx().await.unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }

    #[test]
    fn test_export_requires_ids() {
        let request = ExportRequest { ids: vec![] };
        assert!(request.validate().is_err());

        let request = ExportRequest { ids: vec![1, 2] };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_search_query_defaults_to_empty() {
        let query: SearchQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.q, "");
    }
}
