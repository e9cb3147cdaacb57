//! Row validation
//!
//! Turns one loosely typed row into either a [`RecipeDraft`] ready for code
//! allocation or the complete list of reasons it was rejected.

use crate::dimension::{parse_scalar, parse_sheet_fields};
use crate::errors::{FieldError, IngestionError, RowError};
use crate::table::{Row, Table};
use printtrack_common::db::models::{NewSkuRecipe, SheetSpec};
use printtrack_common::RecipeStore;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Columns every upload must carry
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "sku_name",
    "material_type",
    "application_type",
    "one_up_width",
    "one_up_height",
    "ups",
    "purchase_ups",
];

/// Sheet columns that may be omitted from an upload
pub const OPTIONAL_COLUMNS: [&str; 6] = [
    "print_sheet_width",
    "print_sheet_height",
    "print_sheet_size",
    "purchase_sheet_width",
    "purchase_sheet_height",
    "purchase_sheet_size",
];

/// Fail the whole batch when a required column is missing
pub fn check_required_columns(table: &Table) -> Result<(), IngestionError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !table.has_column(col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(IngestionError::MissingColumns { columns: missing })
    }
}

/// Header names the importer does not read; they pass through to the report
pub fn unrecognized_columns(table: &Table) -> Vec<&str> {
    table
        .headers
        .iter()
        .map(String::as_str)
        .filter(|h| !REQUIRED_COLUMNS.contains(h) && !OPTIONAL_COLUMNS.contains(h))
        .collect()
}

/// Raw recipe fields as entered, before any parsing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecipeInput {
    #[serde(deserialize_with = "text_or_number")]
    pub sku_name: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub material_type: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub application_type: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub one_up_width: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub one_up_height: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub print_sheet_width: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub print_sheet_height: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub print_sheet_size: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub ups: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub purchase_sheet_width: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub purchase_sheet_height: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub purchase_sheet_size: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub purchase_ups: Option<String>,
}

/// Accept JSON strings and numbers alike, keeping the text form
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl RecipeInput {
    pub fn from_row(row: &Row<'_>) -> Self {
        let cell = |column: &str| row.get(column).map(str::to_string);

        Self {
            sku_name: cell("sku_name"),
            material_type: cell("material_type"),
            application_type: cell("application_type"),
            one_up_width: cell("one_up_width"),
            one_up_height: cell("one_up_height"),
            print_sheet_width: cell("print_sheet_width"),
            print_sheet_height: cell("print_sheet_height"),
            print_sheet_size: cell("print_sheet_size"),
            ups: cell("ups"),
            purchase_sheet_width: cell("purchase_sheet_width"),
            purchase_sheet_height: cell("purchase_sheet_height"),
            purchase_sheet_size: cell("purchase_sheet_size"),
            purchase_ups: cell("purchase_ups"),
        }
    }

    /// Trimmed name, if one was given
    pub fn name(&self) -> Option<&str> {
        present(self.sku_name.as_deref())
    }
}

/// A fully parsed recipe still waiting for its SKU code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDraft {
    pub sku_name: String,
    pub material_type: String,
    pub application_type: String,
    pub one_up_width: Decimal,
    pub one_up_height: Decimal,
    pub print_sheet: SheetSpec,
    pub ups: i32,
    pub purchase_sheet: SheetSpec,
    pub purchase_ups: i32,
}

impl RecipeDraft {
    pub fn to_new_recipe(&self, sku_code: String) -> NewSkuRecipe {
        NewSkuRecipe {
            sku_code,
            sku_name: self.sku_name.clone(),
            material_type: self.material_type.clone(),
            application_type: self.application_type.clone(),
            one_up_width: self.one_up_width,
            one_up_height: self.one_up_height,
            print_sheet: self.print_sheet.clone(),
            ups: self.ups,
            purchase_sheet: self.purchase_sheet.clone(),
            purchase_ups: self.purchase_ups,
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required_text(value: Option<&str>, field: &str) -> Result<String, FieldError> {
    present(value)
        .map(str::to_string)
        .ok_or_else(|| FieldError::Missing { field: field.to_string() })
}

fn positive_dimension(value: Option<&str>, field: &str) -> Result<Decimal, FieldError> {
    let raw = present(value).ok_or_else(|| FieldError::Missing { field: field.to_string() })?;
    let parsed = parse_scalar(raw, field)?;

    if parsed <= Decimal::ZERO {
        return Err(FieldError::NotPositive {
            field: field.to_string(),
            value: raw.to_string(),
        });
    }
    Ok(parsed)
}

/// Absent counts are 0; present ones must be whole and non-negative
pub fn parse_count(value: Option<&str>, field: &str) -> Result<i32, FieldError> {
    let Some(raw) = present(value) else {
        return Ok(0);
    };

    Decimal::from_str(&raw.replace(',', "."))
        .ok()
        .filter(|d| d.fract().is_zero() && !d.is_sign_negative())
        .and_then(|d| d.to_i32())
        .ok_or_else(|| FieldError::InvalidCount {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// Check every field of a row, collecting all failures
pub fn validate_fields(input: &RecipeInput) -> Result<RecipeDraft, Vec<FieldError>> {
    validate_with(input, parse_sheet_fields)
}

fn keep<T>(result: Result<T, FieldError>, errors: &mut Vec<FieldError>) -> Option<T> {
    result.map_err(|e| errors.push(e)).ok()
}

/// Field checks with a caller-chosen sheet resolution rule
pub(crate) fn validate_with<F>(
    input: &RecipeInput,
    resolve_sheet: F,
) -> Result<RecipeDraft, Vec<FieldError>>
where
    F: Fn(Option<&str>, Option<&str>, Option<&str>, &str) -> Result<SheetSpec, Vec<FieldError>>,
{
    let mut errors = Vec::new();

    let sku_name = keep(required_text(input.sku_name.as_deref(), "sku_name"), &mut errors);
    let material_type = keep(
        required_text(input.material_type.as_deref(), "material_type"),
        &mut errors,
    );
    let application_type = keep(
        required_text(input.application_type.as_deref(), "application_type"),
        &mut errors,
    );
    let one_up_width = keep(
        positive_dimension(input.one_up_width.as_deref(), "one_up_width"),
        &mut errors,
    );
    let one_up_height = keep(
        positive_dimension(input.one_up_height.as_deref(), "one_up_height"),
        &mut errors,
    );

    let print_sheet = resolve_sheet(
        input.print_sheet_width.as_deref(),
        input.print_sheet_height.as_deref(),
        input.print_sheet_size.as_deref(),
        "print_sheet",
    )
    .map_err(|errs| errors.extend(errs))
    .ok();

    let purchase_sheet = resolve_sheet(
        input.purchase_sheet_width.as_deref(),
        input.purchase_sheet_height.as_deref(),
        input.purchase_sheet_size.as_deref(),
        "purchase_sheet",
    )
    .map_err(|errs| errors.extend(errs))
    .ok();

    let ups = keep(parse_count(input.ups.as_deref(), "ups"), &mut errors);
    let purchase_ups = keep(parse_count(input.purchase_ups.as_deref(), "purchase_ups"), &mut errors);

    match (
        sku_name,
        material_type,
        application_type,
        one_up_width,
        one_up_height,
        print_sheet,
        purchase_sheet,
        ups,
        purchase_ups,
    ) {
        (
            Some(sku_name),
            Some(material_type),
            Some(application_type),
            Some(one_up_width),
            Some(one_up_height),
            Some(print_sheet),
            Some(purchase_sheet),
            Some(ups),
            Some(purchase_ups),
        ) if errors.is_empty() => Ok(RecipeDraft {
            sku_name,
            material_type,
            application_type,
            one_up_width,
            one_up_height,
            print_sheet,
            ups,
            purchase_sheet,
            purchase_ups,
        }),
        _ => Err(errors),
    }
}

/// Validate one row against the store.
///
/// A name that already exists short-circuits the remaining checks. Otherwise
/// every field error is reported together.
pub async fn validate_row<S>(store: &S, input: &RecipeInput) -> Result<RecipeDraft, Vec<RowError>>
where
    S: RecipeStore + ?Sized,
{
    if let Some(name) = input.name() {
        match store.sku_name_exists(name).await {
            Ok(true) => return Err(vec![RowError::DuplicateName]),
            Ok(false) => {}
            Err(e) => return Err(vec![RowError::Persistence(e.to_string())]),
        }
    }

    validate_fields(input).map_err(|errs| errs.into_iter().map(RowError::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use printtrack_common::InMemoryStore;

    fn sample_input() -> RecipeInput {
        RecipeInput {
            sku_name: Some("Clothing Tag".into()),
            material_type: Some("Art Paper".into()),
            application_type: Some("Lamination".into()),
            one_up_width: Some("50.00".into()),
            one_up_height: Some("70,5".into()),
            print_sheet_width: Some("500".into()),
            print_sheet_height: Some("700".into()),
            ups: Some("49".into()),
            purchase_sheet_size: Some("23x35".into()),
            purchase_ups: Some("6".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_columns_listed_in_order() {
        let table = Table::new(
            vec!["sku_name".into(), "material_type".into(), "one_up_width".into()],
            vec![],
        );
        let err = check_required_columns(&table).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required columns: application_type, one_up_height, ups, purchase_ups"
        );
    }

    #[test]
    fn test_unrecognized_columns() {
        let table = Table::new(
            vec!["sku_name".into(), "Remarks".into(), "purchase_sheet_size".into(), "id".into()],
            vec![],
        );
        assert_eq!(unrecognized_columns(&table), vec!["Remarks", "id"]);
    }

    #[test]
    fn test_valid_input_produces_draft() {
        let draft = validate_fields(&sample_input()).unwrap();
        assert_eq!(draft.sku_name, "Clothing Tag");
        assert_eq!(draft.one_up_height, Decimal::new(705, 1));
        assert_eq!(draft.print_sheet.width, Some(Decimal::new(500, 0)));
        assert_eq!(draft.purchase_sheet.height, Some(Decimal::new(35, 0)));
        assert_eq!(draft.ups, 49);
        assert_eq!(draft.purchase_ups, 6);
    }

    #[test]
    fn test_all_field_errors_are_collected() {
        let input = RecipeInput {
            material_type: Some("  ".into()),
            one_up_width: Some("10x8".into()),
            one_up_height: Some("abc".into()),
            ..sample_input()
        };
        let errors = validate_fields(&input).unwrap_err();
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();

        assert_eq!(
            messages,
            vec![
                "material_type is required",
                "Invalid one_up_width: '10x8' looks like WxH, expected a number only",
                "Invalid one_up_height: 'abc' must be a decimal number",
            ]
        );
    }

    #[test]
    fn test_one_up_must_be_positive() {
        let input = RecipeInput { one_up_width: Some("0".into()), ..sample_input() };
        let errors = validate_fields(&input).unwrap_err();
        assert!(matches!(errors[0], FieldError::NotPositive { .. }));
    }

    #[test]
    fn test_counts() {
        assert_eq!(parse_count(None, "ups"), Ok(0));
        assert_eq!(parse_count(Some(" "), "ups"), Ok(0));
        assert_eq!(parse_count(Some("49"), "ups"), Ok(49));
        assert_eq!(parse_count(Some("49.0"), "ups"), Ok(49));
        for bad in ["4.5", "-1", "many"] {
            assert!(matches!(
                parse_count(Some(bad), "purchase_ups"),
                Err(FieldError::InvalidCount { .. })
            ));
        }
    }

    #[test]
    fn test_json_numbers_are_accepted() {
        let input: RecipeInput = serde_json::from_value(serde_json::json!({
            "sku_name": "Tag",
            "one_up_width": 50.5,
            "ups": 12,
            "notes": "ignored"
        }))
        .unwrap();

        assert_eq!(input.one_up_width.as_deref(), Some("50.5"));
        assert_eq!(input.ups.as_deref(), Some("12"));
        assert_eq!(input.print_sheet_size, None);
    }

    #[tokio::test]
    async fn test_duplicate_name_short_circuits() {
        let store = InMemoryStore::new();
        let draft = validate_fields(&sample_input()).unwrap();
        store.insert_recipe(draft.to_new_recipe("SKU-0001".into())).await.unwrap();

        let input = RecipeInput { one_up_width: Some("bad".into()), ..sample_input() };
        let errors = validate_row(&store, &input).await.unwrap_err();
        assert_eq!(errors, vec![RowError::DuplicateName]);
    }
}
