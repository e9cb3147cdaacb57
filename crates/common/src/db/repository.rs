//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.

use crate::errors::{AppError, Result};
use crate::db::DbPool;
use crate::db::models::*;
use crate::db::store::RecipeStore;
use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, instrument};

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Job Operations
    // ========================================================================

    /// Create a job against an existing recipe.
    ///
    /// The recipe specification is snapshotted onto the row and the JC# code
    /// is derived from the assigned id, all inside one transaction.
    #[instrument(skip(self, job), fields(sku = %job.sku))]
    pub async fn create_job(&self, job: NewJob) -> Result<Job> {
        let txn = self.write_conn().begin().await?;

        let recipe = SkuRecipeEntity::find()
            .filter(SkuRecipeColumn::SkuName.eq(job.sku.as_str()))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::RecipeNotFound { sku: job.sku.clone() })?;

        let now = chrono::Utc::now();
        let inserted = job
            .into_active_model(RecipeSnapshot::from(&recipe), now.into())
            .insert(&txn)
            .await?;

        let code = job_code(&inserted.created_at, inserted.id);
        let mut active: JobActiveModel = inserted.into();
        active.job_name = Set(Some(code));
        let job = active.update(&txn).await?;

        txn.commit().await?;

        debug!(job_id = job.id, job_name = ?job.job_name, "Job created");
        Ok(job)
    }

    /// List jobs, newest first
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        JobEntity::find()
            .order_by_desc(JobColumn::CreatedAt)
            .order_by_desc(JobColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find job by ID
    pub async fn find_job_by_id(&self, id: i64) -> Result<Option<Job>> {
        JobEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Update job status
    pub async fn update_job_status(&self, id: i64, status: JobStatus) -> Result<Job> {
        let mut job: JobActiveModel = JobEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or(AppError::JobNotFound { id })?
            .into();

        job.status = Set(status.into());

        job.update(self.write_conn()).await.map_err(Into::into)
    }
}

/// Map unique violations on `sku_recipes` to the matching domain error
fn map_insert_error(err: DbErr, recipe_code: String, recipe_name: String) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains("sku_code") => {
            AppError::DuplicateSkuCode { code: recipe_code }
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::DuplicateSkuName { name: recipe_name }
        }
        _ => AppError::Database(err),
    }
}

// ============================================================================
// Recipe Operations
// ============================================================================

#[async_trait]
impl RecipeStore for Repository {
    async fn sku_name_exists(&self, sku_name: &str) -> Result<bool> {
        let found = SkuRecipeEntity::find()
            .filter(SkuRecipeColumn::SkuName.eq(sku_name))
            .one(self.read_conn())
            .await?;

        Ok(found.is_some())
    }

    async fn latest_sku_code(&self) -> Result<Option<String>> {
        let latest = SkuRecipeEntity::find()
            .order_by_desc(SkuRecipeColumn::Id)
            .one(self.write_conn())
            .await?;

        Ok(latest.map(|r| r.sku_code))
    }

    async fn insert_recipe(&self, recipe: NewSkuRecipe) -> Result<SkuRecipe> {
        let code = recipe.sku_code.clone();
        let name = recipe.sku_name.clone();
        let now = chrono::Utc::now();

        recipe
            .into_active_model(now.into())
            .insert(self.write_conn())
            .await
            .map_err(|e| map_insert_error(e, code, name))
    }

    async fn search_recipes(&self, query: &str) -> Result<Vec<SkuRecipe>> {
        let needle = query.trim().to_lowercase();
        let mut select = SkuRecipeEntity::find();

        if !needle.is_empty() {
            let pattern = format!("%{}%", needle);
            select = select.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(SkuRecipeColumn::SkuName))).like(pattern.clone()))
                    .add(Expr::expr(Func::lower(Expr::col(SkuRecipeColumn::SkuCode))).like(pattern)),
            );
        }

        select
            .order_by_desc(SkuRecipeColumn::CreatedAt)
            .order_by_desc(SkuRecipeColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn find_recipe_by_name(&self, sku_name: &str) -> Result<Option<SkuRecipe>> {
        SkuRecipeEntity::find()
            .filter(SkuRecipeColumn::SkuName.eq(sku_name))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn find_recipes_by_ids(&self, ids: &[i64]) -> Result<Vec<SkuRecipe>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        SkuRecipeEntity::find()
            .filter(SkuRecipeColumn::Id.is_in(ids.iter().copied()))
            .order_by_asc(SkuRecipeColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_constraint_errors_pass_through() {
        let err = map_insert_error(
            DbErr::Custom("boom".into()),
            "SKU-0001".into(),
            "Tag".into(),
        );
        assert!(matches!(err, AppError::Database(_)));
    }
}
