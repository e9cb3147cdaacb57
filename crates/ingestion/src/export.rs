//! CSV export of selected recipes

use crate::errors::IngestionError;
use crate::report::csv_bytes;
use printtrack_common::db::models::SkuRecipe;
use rust_decimal::Decimal;

pub const EXPORT_FILE_NAME: &str = "selected_skus.csv";

pub const EXPORT_HEADERS: [&str; 13] = [
    "SKU Code",
    "SKU Name",
    "Material",
    "Application",
    "1-Up Width",
    "1-Up Height",
    "Print Sheet Width",
    "Print Sheet Height",
    "UPS",
    "Purchase Sheet Width",
    "Purchase Sheet Height",
    "Purchase UPS",
    "Created At",
];

const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

fn optional(value: Option<Decimal>) -> String {
    value.map(|d| d.to_string()).unwrap_or_default()
}

fn export_row(recipe: &SkuRecipe) -> Vec<String> {
    vec![
        recipe.sku_code.clone(),
        recipe.sku_name.clone(),
        recipe.material_type.clone(),
        recipe.application_type.clone(),
        recipe.one_up_width.to_string(),
        recipe.one_up_height.to_string(),
        optional(recipe.print_sheet_width),
        optional(recipe.print_sheet_height),
        recipe.ups.to_string(),
        optional(recipe.purchase_sheet_width),
        optional(recipe.purchase_sheet_height),
        recipe.purchase_ups.to_string(),
        recipe.created_at.format(CREATED_AT_FORMAT).to_string(),
    ]
}

/// Render recipes as `selected_skus.csv`
pub fn export_recipes_csv(recipes: &[SkuRecipe]) -> Result<Vec<u8>, IngestionError> {
    let headers: Vec<String> = EXPORT_HEADERS.iter().map(|h| h.to_string()).collect();
    csv_bytes(&headers, recipes.iter().map(export_row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn test_export_layout() {
        let recipe = SkuRecipe {
            id: 1,
            sku_code: "SKU-0001".into(),
            sku_name: "Clothing Tag".into(),
            material_type: "Art Paper".into(),
            application_type: "Lamination".into(),
            one_up_width: Decimal::new(5000, 2),
            one_up_height: Decimal::new(7050, 2),
            print_sheet_width: Some(Decimal::new(500, 0)),
            print_sheet_height: None,
            print_sheet_size: None,
            ups: 49,
            purchase_sheet_width: None,
            purchase_sheet_height: None,
            purchase_sheet_size: None,
            purchase_ups: 6,
            created_at: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2025, 3, 14, 9, 5, 0)
                .unwrap(),
        };

        let csv = String::from_utf8(export_recipes_csv(&[recipe]).unwrap()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "SKU Code,SKU Name,Material,Application,1-Up Width,1-Up Height,\
             Print Sheet Width,Print Sheet Height,UPS,Purchase Sheet Width,\
             Purchase Sheet Height,Purchase UPS,Created At"
        );
        assert_eq!(
            lines.next().unwrap(),
            "SKU-0001,Clothing Tag,Art Paper,Lamination,50.00,70.50,500,,49,,,6,2025-03-14 09:05"
        );
    }
}
