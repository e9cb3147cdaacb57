//! In-memory recipe store
//!
//! Enforces the same uniqueness rules as the database schema. Used by the
//! test suites and by `import run --dry-run`.

use crate::db::models::{NewSkuRecipe, SkuRecipe};
use crate::db::store::RecipeStore;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    recipes: Vec<SkuRecipe>,
    next_id: i64,
}

/// Recipe store backed by a vector, cheap to clone
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored recipes
    pub async fn len(&self) -> usize {
        self.inner.read().await.recipes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RecipeStore for InMemoryStore {
    async fn sku_name_exists(&self, sku_name: &str) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.recipes.iter().any(|r| r.sku_name == sku_name))
    }

    async fn latest_sku_code(&self) -> Result<Option<String>> {
        let inner = self.inner.read().await;
        Ok(inner.recipes.last().map(|r| r.sku_code.clone()))
    }

    async fn insert_recipe(&self, recipe: NewSkuRecipe) -> Result<SkuRecipe> {
        let mut inner = self.inner.write().await;

        if inner.recipes.iter().any(|r| r.sku_code == recipe.sku_code) {
            return Err(AppError::DuplicateSkuCode { code: recipe.sku_code });
        }
        if inner.recipes.iter().any(|r| r.sku_name == recipe.sku_name) {
            return Err(AppError::DuplicateSkuName { name: recipe.sku_name });
        }

        inner.next_id += 1;
        let model = recipe.into_model(inner.next_id, chrono::Utc::now().into());
        inner.recipes.push(model.clone());
        Ok(model)
    }

    async fn search_recipes(&self, query: &str) -> Result<Vec<SkuRecipe>> {
        let inner = self.inner.read().await;
        let needle = query.trim().to_lowercase();

        Ok(inner
            .recipes
            .iter()
            .rev()
            .filter(|r| {
                needle.is_empty()
                    || r.sku_name.to_lowercase().contains(&needle)
                    || r.sku_code.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn find_recipe_by_name(&self, sku_name: &str) -> Result<Option<SkuRecipe>> {
        let inner = self.inner.read().await;
        Ok(inner.recipes.iter().find(|r| r.sku_name == sku_name).cloned())
    }

    async fn find_recipes_by_ids(&self, ids: &[i64]) -> Result<Vec<SkuRecipe>> {
        let inner = self.inner.read().await;
        Ok(inner
            .recipes
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }
}
