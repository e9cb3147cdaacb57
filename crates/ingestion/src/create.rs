//! Single recipe creation
//!
//! Same field rules as an imported row, except that a sheet size string is
//! kept as entered and only used to fill in missing width or height.

use crate::allocator::SkuCodeAllocator;
use crate::batch::persist_draft;
use crate::dimension::resolve_sheet_with_size;
use crate::errors::{FieldError, RowError};
use crate::validator::{validate_with, RecipeInput};
use printtrack_common::db::models::SkuRecipe;
use printtrack_common::errors::{AppError, Result};
use printtrack_common::metrics;
use printtrack_common::RecipeStore;
use tracing::{info, instrument};

/// Creates recipes one at a time
pub struct RecipeCreator<S> {
    store: S,
    code_retry_limit: u32,
}

fn validation_error(errors: &[FieldError]) -> AppError {
    let message: Vec<String> = errors.iter().map(ToString::to_string).collect();
    AppError::Validation {
        message: message.join(", "),
        field: errors.first().map(|e| e.field().to_string()),
    }
}

impl<S: RecipeStore> RecipeCreator<S> {
    pub fn new(store: S, code_retry_limit: u32) -> Self {
        Self { store, code_retry_limit }
    }

    #[instrument(skip(self, input), fields(sku_name = input.name().unwrap_or_default()))]
    pub async fn create(&self, input: &RecipeInput) -> Result<SkuRecipe> {
        if let Some(name) = input.name() {
            if self.store.sku_name_exists(name).await? {
                return Err(AppError::DuplicateSkuName { name: name.to_string() });
            }
        }

        let draft = validate_with(input, resolve_sheet_with_size)
            .map_err(|errors| validation_error(&errors))?;

        let latest = self.store.latest_sku_code().await?;
        let mut allocator = SkuCodeAllocator::from_latest(latest.as_deref());
        allocator.next_number().map_err(AppError::from)?;

        let recipe = persist_draft(&self.store, &mut allocator, &draft, self.code_retry_limit)
            .await
            .map_err(|e| match e {
                RowError::DuplicateName => AppError::DuplicateSkuName {
                    name: draft.sku_name.clone(),
                },
                RowError::Field(field) => validation_error(&[field]),
                RowError::Persistence(message) => AppError::Internal { message },
            })?;

        metrics::record_recipe_created();
        info!(sku_code = %recipe.sku_code, "Recipe created");

        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printtrack_common::InMemoryStore;
    use rust_decimal::Decimal;

    fn input(name: &str) -> RecipeInput {
        RecipeInput {
            sku_name: Some(name.into()),
            material_type: Some("Art Paper".into()),
            application_type: Some("Lamination".into()),
            one_up_width: Some("50".into()),
            one_up_height: Some("70".into()),
            print_sheet_size: Some("12x18".into()),
            ups: Some("49".into()),
            purchase_ups: Some("6".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_caches_size_onto_dimensions() {
        let store = InMemoryStore::new();
        let creator = RecipeCreator::new(store.clone(), 5);

        let recipe = creator.create(&input("Clothing Tag")).await.unwrap();

        assert_eq!(recipe.sku_code, "SKU-0001");
        assert_eq!(recipe.print_sheet_width, Some(Decimal::new(12, 0)));
        assert_eq!(recipe.print_sheet_height, Some(Decimal::new(18, 0)));
        assert_eq!(recipe.print_sheet_size.as_deref(), Some("12x18"));
    }

    #[tokio::test]
    async fn test_create_continues_sequence() {
        let store = InMemoryStore::new();
        let creator = RecipeCreator::new(store.clone(), 5);

        creator.create(&input("A")).await.unwrap();
        let second = creator.create(&input("B")).await.unwrap();
        assert_eq!(second.sku_code, "SKU-0002");
    }

    #[tokio::test]
    async fn test_duplicate_name_is_conflict() {
        let store = InMemoryStore::new();
        let creator = RecipeCreator::new(store.clone(), 5);
        creator.create(&input("Tag")).await.unwrap();

        let err = creator.create(&input("Tag")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateSkuName { .. }));
        assert_eq!(err.status_code().as_u16(), 409);
    }

    #[tokio::test]
    async fn test_invalid_fields_are_reported_together() {
        let store = InMemoryStore::new();
        let creator = RecipeCreator::new(store.clone(), 5);
        let bad = RecipeInput {
            one_up_width: Some("5x5".into()),
            ups: Some("lots".into()),
            ..input("Tag")
        };

        match creator.create(&bad).await.unwrap_err() {
            AppError::Validation { message, field } => {
                assert_eq!(
                    message,
                    "Invalid one_up_width: '5x5' looks like WxH, expected a number only, \
                     Invalid ups: 'lots' must be a non-negative whole number"
                );
                assert_eq!(field.as_deref(), Some("one_up_width"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.is_empty().await);
    }
}
