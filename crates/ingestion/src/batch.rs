//! Batch orchestration
//!
//! Rows are processed in input order. Each accepted row is stored before the
//! next row is checked, so names accepted earlier in the same batch count as
//! duplicates. Failed rows never roll back accepted ones.

use crate::allocator::{format_sku_code, SkuCodeAllocator};
use crate::errors::{IngestionError, RowError};
use crate::table::Table;
use crate::validator::{
    check_required_columns, unrecognized_columns, validate_row, RecipeDraft, RecipeInput,
};
use printtrack_common::config::ImportConfig;
use printtrack_common::db::models::SkuRecipe;
use printtrack_common::errors::AppError;
use printtrack_common::metrics;
use printtrack_common::RecipeStore;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Offset from 0-based data row index to the spreadsheet line number
pub const ROW_NUMBER_OFFSET: usize = 2;

/// Overall result of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Completed,
    CompletedWithErrors,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Completed => "completed",
            BatchStatus::CompletedWithErrors => "completed_with_errors",
        }
    }
}

/// A rejected row and every reason it was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub row_index: usize,
    pub errors: Vec<RowError>,
}

impl RowFailure {
    /// `Row <n>: <reasons>` where `n` is the line number in the sheet
    pub fn message(&self) -> String {
        let reasons: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        format!("Row {}: {}", self.row_index + ROW_NUMBER_OFFSET, reasons.join(", "))
    }
}

/// Accepted records plus the per-row error ledger
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub batch_id: Uuid,
    pub total_rows: usize,
    pub accepted: Vec<SkuRecipe>,
    pub failures: Vec<RowFailure>,
}

impl BatchOutcome {
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn status(&self) -> BatchStatus {
        if self.has_errors() {
            BatchStatus::CompletedWithErrors
        } else {
            BatchStatus::Completed
        }
    }

    /// One entry per input row, empty for accepted rows
    pub fn error_column(&self) -> Vec<String> {
        let mut column = vec![String::new(); self.total_rows];
        for failure in &self.failures {
            if let Some(slot) = column.get_mut(failure.row_index) {
                *slot = failure.message();
            }
        }
        column
    }
}

/// Store a validated draft under the next free code.
///
/// The code is only consumed when the insert succeeds. When another writer
/// already holds the code, the allocator is re-seeded from the store and the
/// insert retried up to `retry_limit` times.
pub(crate) async fn persist_draft<S>(
    store: &S,
    allocator: &mut SkuCodeAllocator,
    draft: &RecipeDraft,
    retry_limit: u32,
) -> Result<SkuRecipe, RowError>
where
    S: RecipeStore + ?Sized,
{
    let mut collisions = 0;

    loop {
        let number = allocator
            .next_number()
            .map_err(|e| RowError::Persistence(e.to_string()))?;
        let code = format_sku_code(number);

        match store.insert_recipe(draft.to_new_recipe(code.clone())).await {
            Ok(recipe) => {
                allocator.mark_issued(number);
                return Ok(recipe);
            }
            Err(AppError::DuplicateSkuCode { .. }) if collisions < retry_limit => {
                collisions += 1;
                metrics::record_code_collision();
                warn!(sku_code = %code, attempt = collisions, "SKU code already issued, re-seeding");

                let latest = store
                    .latest_sku_code()
                    .await
                    .map_err(|e| RowError::Persistence(e.to_string()))?;
                allocator.reseed(latest.as_deref());
            }
            Err(AppError::DuplicateSkuName { .. }) => return Err(RowError::DuplicateName),
            Err(e) => return Err(RowError::Persistence(e.to_string())),
        }
    }
}

/// Imports tables of SKU recipes into a store
pub struct BatchImporter<S> {
    store: S,
    config: ImportConfig,
}

impl<S: RecipeStore> BatchImporter<S> {
    pub fn new(store: S, config: ImportConfig) -> Self {
        Self { store, config }
    }

    /// Validate and store every row of `table`.
    ///
    /// Only batch-level problems are returned as errors: missing columns, too
    /// many rows, or a store that cannot seed the code sequence.
    #[instrument(skip(self, table), fields(rows = table.len()))]
    pub async fn import_batch(&self, table: &Table) -> Result<BatchOutcome, IngestionError> {
        check_required_columns(table)?;

        if table.len() > self.config.max_rows {
            return Err(IngestionError::TooManyRows {
                rows: table.len(),
                limit: self.config.max_rows,
            });
        }

        let started = Instant::now();
        let batch_id = Uuid::new_v4();

        let latest = self.store.latest_sku_code().await?;
        let mut allocator = SkuCodeAllocator::from_latest(latest.as_deref());
        allocator.next_number()?;

        info!(
            batch_id = %batch_id,
            seed = allocator.last_issued(),
            "Starting batch import"
        );

        let ignored = unrecognized_columns(table);
        if !ignored.is_empty() {
            debug!(batch_id = %batch_id, columns = ?ignored, "Ignoring unrecognized columns");
        }

        let mut accepted = Vec::new();
        let mut failures = Vec::new();

        for row in table.rows() {
            let input = RecipeInput::from_row(&row);

            let result = match validate_row(&self.store, &input).await {
                Ok(draft) => {
                    persist_draft(&self.store, &mut allocator, &draft, self.config.code_retry_limit)
                        .await
                        .map_err(|e| vec![e])
                }
                Err(errors) => Err(errors),
            };

            match result {
                Ok(recipe) => {
                    debug!(
                        batch_id = %batch_id,
                        row = row.index(),
                        sku_code = %recipe.sku_code,
                        sku_name = %recipe.sku_name,
                        "Row accepted"
                    );
                    accepted.push(recipe);
                }
                Err(errors) => {
                    for error in &errors {
                        metrics::record_row_error(error.reason());
                        if let RowError::Persistence(detail) = error {
                            warn!(batch_id = %batch_id, row = row.index(), error = %detail, "Row failed to persist");
                        }
                    }

                    let failure = RowFailure { row_index: row.index(), errors };
                    debug!(
                        batch_id = %batch_id,
                        row = row.index(),
                        sku_name = input.name().unwrap_or_default(),
                        error = %failure.message(),
                        "Row rejected"
                    );
                    failures.push(failure);
                }
            }
        }

        let outcome = BatchOutcome {
            batch_id,
            total_rows: table.len(),
            accepted,
            failures,
        };

        metrics::record_import(
            started.elapsed().as_secs_f64(),
            outcome.accepted.len(),
            outcome.failures.len(),
        );

        info!(
            batch_id = %batch_id,
            status = outcome.status().as_str(),
            accepted = outcome.accepted.len(),
            rejected = outcome.failures.len(),
            "Batch import finished"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printtrack_common::db::models::NewSkuRecipe;
    use printtrack_common::InMemoryStore;

    const HEADERS: [&str; 7] = [
        "sku_name",
        "material_type",
        "application_type",
        "one_up_width",
        "one_up_height",
        "ups",
        "purchase_ups",
    ];

    fn row(name: &str, width: &str) -> Vec<String> {
        [name, "Art Paper", "Lamination", width, "70", "49", "6"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn table(rows: Vec<Vec<String>>) -> Table {
        Table::new(HEADERS.iter().map(|h| h.to_string()).collect(), rows)
    }

    fn importer(store: &InMemoryStore) -> BatchImporter<InMemoryStore> {
        BatchImporter::new(store.clone(), ImportConfig::default())
    }

    async fn seed(store: &InMemoryStore, code: &str, name: &str) {
        let recipe = NewSkuRecipe {
            sku_code: code.into(),
            sku_name: name.into(),
            material_type: "Art Paper".into(),
            application_type: "Lamination".into(),
            one_up_width: 50.into(),
            one_up_height: 70.into(),
            print_sheet: Default::default(),
            ups: 1,
            purchase_sheet: Default::default(),
            purchase_ups: 1,
        };
        store.insert_recipe(recipe).await.unwrap();
    }

    #[tokio::test]
    async fn test_codes_follow_row_order() {
        let store = InMemoryStore::new();
        let outcome = importer(&store)
            .import_batch(&table(vec![row("A", "1"), row("B", "2"), row("C", "3")]))
            .await
            .unwrap();

        let codes: Vec<_> = outcome.accepted.iter().map(|r| r.sku_code.as_str()).collect();
        assert_eq!(codes, vec!["SKU-0001", "SKU-0002", "SKU-0003"]);
        assert_eq!(outcome.status(), BatchStatus::Completed);
        assert_eq!(outcome.error_column(), vec!["", "", ""]);
    }

    #[tokio::test]
    async fn test_duplicate_row_does_not_consume_code() {
        let store = InMemoryStore::new();
        for n in 1..=4 {
            seed(&store, &format!("SKU-{:04}", n), &format!("Existing {}", n)).await;
        }

        let outcome = importer(&store)
            .import_batch(&table(vec![row("New A", "1"), row("Existing 2", "2"), row("New B", "3")]))
            .await
            .unwrap();

        let codes: Vec<_> = outcome.accepted.iter().map(|r| r.sku_code.as_str()).collect();
        assert_eq!(codes, vec!["SKU-0005", "SKU-0006"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].message(), "Row 3: SKU name already exists");
        assert_eq!(outcome.status(), BatchStatus::CompletedWithErrors);
    }

    #[tokio::test]
    async fn test_intra_batch_duplicates_are_caught() {
        let store = InMemoryStore::new();
        let outcome = importer(&store)
            .import_batch(&table(vec![row("Tag", "1"), row("Tag", "2")]))
            .await
            .unwrap();

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.error_column(), vec!["".to_string(), "Row 3: SKU name already exists".to_string()]);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_field_errors_are_joined() {
        let store = InMemoryStore::new();
        let mut bad = row("Tag", "10x8");
        bad[4] = "abc".into();

        let outcome = importer(&store).import_batch(&table(vec![bad])).await.unwrap();

        assert!(outcome.accepted.is_empty());
        assert_eq!(
            outcome.failures[0].message(),
            "Row 2: Invalid one_up_width: '10x8' looks like WxH, expected a number only, \
             Invalid one_up_height: 'abc' must be a decimal number"
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_columns_abort_batch() {
        let store = InMemoryStore::new();
        let table = Table::new(vec!["sku_name".into()], vec![vec!["Tag".into()]]);

        let err = importer(&store).import_batch(&table).await.unwrap_err();
        assert!(matches!(err, IngestionError::MissingColumns { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_row_limit() {
        let store = InMemoryStore::new();
        let config = ImportConfig { max_rows: 1, ..ImportConfig::default() };
        let importer = BatchImporter::new(store.clone(), config);

        let err = importer
            .import_batch(&table(vec![row("A", "1"), row("B", "2")]))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::TooManyRows { rows: 2, limit: 1 }));
    }
}
