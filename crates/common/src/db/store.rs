//! Record store seam for SKU recipes
//!
//! The bulk import pipeline and recipe creation only talk to storage through
//! this trait, so they run against PostgreSQL in production and against the
//! in-memory store in tests and dry runs.

use crate::db::models::{NewSkuRecipe, SkuRecipe};
use crate::errors::Result;
use async_trait::async_trait;

/// Storage operations needed by recipe import and lookup
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Exact-match check on `sku_name`
    async fn sku_name_exists(&self, sku_name: &str) -> Result<bool>;

    /// Code of the most recently created recipe
    async fn latest_sku_code(&self) -> Result<Option<String>>;

    /// Insert a recipe.
    ///
    /// Fails with `AppError::DuplicateSkuCode` or `AppError::DuplicateSkuName`
    /// when a uniqueness constraint is violated.
    async fn insert_recipe(&self, recipe: NewSkuRecipe) -> Result<SkuRecipe>;

    /// Case-insensitive contains match on name or code, newest first.
    /// An empty query lists every recipe.
    async fn search_recipes(&self, query: &str) -> Result<Vec<SkuRecipe>>;

    /// Exact lookup by `sku_name`
    async fn find_recipe_by_name(&self, sku_name: &str) -> Result<Option<SkuRecipe>>;

    /// Recipes with the given ids, in ascending id order
    async fn find_recipes_by_ids(&self, ids: &[i64]) -> Result<Vec<SkuRecipe>>;
}
