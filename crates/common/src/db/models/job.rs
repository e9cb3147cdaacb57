//! Production job entity
//!
//! A job is a purchase order against a SKU. The recipe's specification is
//! copied onto the job when it is created and is not re-synced afterwards.

use chrono::Datelike;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use super::sku_recipe;

/// Job status enum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => JobStatus::Pending,
            "in_progress" => JobStatus::InProgress,
            "completed" => JobStatus::Completed,
            _ => JobStatus::Pending,
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Pending => "pending".to_string(),
            JobStatus::InProgress => "in_progress".to_string(),
            JobStatus::Completed => "completed".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Recipe `sku_name` the job was created from
    pub sku: String,

    #[sea_orm(nullable)]
    pub sku_code: Option<String>,

    /// JC# job code
    #[sea_orm(nullable)]
    pub job_name: Option<String>,

    pub po_number: String,

    pub po_quantity: i32,

    pub po_date: Date,

    #[sea_orm(column_type = "Decimal(Some((10, 1)))")]
    pub unit_cost: Decimal,

    pub stock: i32,

    pub wastage: i32,

    pub planned_date: Date,

    #[sea_orm(nullable)]
    pub customer_name: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    pub status: String,

    pub created_at: DateTimeWithTimeZone,

    // Recipe snapshot
    #[sea_orm(nullable)]
    pub material_type: Option<String>,

    #[sea_orm(nullable)]
    pub application_type: Option<String>,

    #[sea_orm(column_type = "Decimal(Some((6, 2)))", nullable)]
    pub one_up_width: Option<Decimal>,

    #[sea_orm(column_type = "Decimal(Some((6, 2)))", nullable)]
    pub one_up_height: Option<Decimal>,

    #[sea_orm(column_type = "Decimal(Some((6, 2)))", nullable)]
    pub print_sheet_width: Option<Decimal>,

    #[sea_orm(column_type = "Decimal(Some((6, 2)))", nullable)]
    pub print_sheet_height: Option<Decimal>,

    #[sea_orm(nullable)]
    pub print_sheet_size: Option<String>,

    #[sea_orm(nullable)]
    pub ups: Option<i32>,

    #[sea_orm(column_type = "Decimal(Some((6, 2)))", nullable)]
    pub purchase_sheet_width: Option<Decimal>,

    #[sea_orm(column_type = "Decimal(Some((6, 2)))", nullable)]
    pub purchase_sheet_height: Option<Decimal>,

    #[sea_orm(nullable)]
    pub purchase_sheet_size: Option<String>,

    #[sea_orm(nullable)]
    pub purchase_ups: Option<i32>,
}

impl Model {
    /// Get the job status as an enum
    pub fn job_status(&self) -> JobStatus {
        JobStatus::from(self.status.clone())
    }

    /// Check if the job is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self.job_status(), JobStatus::Completed)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Purchase-order fields supplied when a job is created
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJob {
    /// Recipe `sku_name`
    pub sku: String,
    pub po_number: String,
    pub po_quantity: i32,
    pub po_date: Date,
    pub unit_cost: Decimal,
    pub planned_date: Date,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    pub stock: Option<i32>,
    pub wastage: Option<i32>,
}

/// Specification fields copied from a recipe onto a job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSnapshot {
    pub sku_code: String,
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
}

impl From<&sku_recipe::Model> for RecipeSnapshot {
    fn from(recipe: &sku_recipe::Model) -> Self {
        Self {
            sku_code: recipe.sku_code.clone(),
            material_type: recipe.material_type.clone(),
            application_type: recipe.application_type.clone(),
            one_up_width: recipe.one_up_width,
            one_up_height: recipe.one_up_height,
            print_sheet_width: recipe.print_sheet_width,
            print_sheet_height: recipe.print_sheet_height,
            print_sheet_size: recipe.print_sheet_size.clone(),
            ups: recipe.ups,
            purchase_sheet_width: recipe.purchase_sheet_width,
            purchase_sheet_height: recipe.purchase_sheet_height,
            purchase_sheet_size: recipe.purchase_sheet_size.clone(),
            purchase_ups: recipe.purchase_ups,
        }
    }
}

impl NewJob {
    /// Build the insert model with the recipe snapshot applied.
    /// Missing stock and wastage are stored as 0.
    pub fn into_active_model(
        self,
        snapshot: RecipeSnapshot,
        created_at: DateTimeWithTimeZone,
    ) -> ActiveModel {
        ActiveModel {
            sku: Set(self.sku),
            sku_code: Set(Some(snapshot.sku_code)),
            job_name: Set(None),
            po_number: Set(self.po_number),
            po_quantity: Set(self.po_quantity),
            po_date: Set(self.po_date),
            unit_cost: Set(self.unit_cost),
            stock: Set(self.stock.unwrap_or(0)),
            wastage: Set(self.wastage.unwrap_or(0)),
            planned_date: Set(self.planned_date),
            customer_name: Set(self.customer_name),
            notes: Set(self.notes),
            status: Set(JobStatus::Pending.into()),
            created_at: Set(created_at),
            material_type: Set(Some(snapshot.material_type)),
            application_type: Set(Some(snapshot.application_type)),
            one_up_width: Set(Some(snapshot.one_up_width)),
            one_up_height: Set(Some(snapshot.one_up_height)),
            print_sheet_width: Set(snapshot.print_sheet_width),
            print_sheet_height: Set(snapshot.print_sheet_height),
            print_sheet_size: Set(snapshot.print_sheet_size),
            ups: Set(Some(snapshot.ups)),
            purchase_sheet_width: Set(snapshot.purchase_sheet_width),
            purchase_sheet_height: Set(snapshot.purchase_sheet_height),
            purchase_sheet_size: Set(snapshot.purchase_sheet_size),
            purchase_ups: Set(Some(snapshot.purchase_ups)),
            ..Default::default()
        }
    }
}

/// JC# code for a job: `JC-<month>-<year>-<id>` with the id padded to 4 digits
pub fn job_code(created_at: &DateTimeWithTimeZone, id: i64) -> String {
    format!("JC-{}-{}-{:04}", created_at.month(), created_at.year(), id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn recipe() -> sku_recipe::Model {
        sku_recipe::Model {
            id: 7,
            sku_code: "SKU-0007".into(),
            sku_name: "Clothing Tag".into(),
            material_type: "Art Paper".into(),
            application_type: "Lamination".into(),
            one_up_width: Decimal::new(5000, 2),
            one_up_height: Decimal::new(7000, 2),
            print_sheet_width: Some(Decimal::new(500, 0)),
            print_sheet_height: Some(Decimal::new(700, 0)),
            print_sheet_size: None,
            ups: 49,
            purchase_sheet_width: Some(Decimal::new(23, 0)),
            purchase_sheet_height: Some(Decimal::new(35, 0)),
            purchase_sheet_size: None,
            purchase_ups: 6,
            created_at: FixedOffset::east_opt(0).unwrap()
                .with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_snapshot_copies_specification() {
        let snapshot = RecipeSnapshot::from(&recipe());
        assert_eq!(snapshot.sku_code, "SKU-0007");
        assert_eq!(snapshot.ups, 49);
        assert_eq!(snapshot.purchase_ups, 6);
        assert_eq!(snapshot.print_sheet_width, Some(Decimal::new(500, 0)));
    }

    #[test]
    fn test_job_code_format() {
        let created = FixedOffset::east_opt(0).unwrap()
            .with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();
        assert_eq!(job_code(&created, 12), "JC-3-2025-0012");
        assert_eq!(job_code(&created, 12345), "JC-3-2025-12345");
    }

    #[test]
    fn test_status_round_trip_strings() {
        assert_eq!(String::from(JobStatus::InProgress), "in_progress");
        assert_eq!(JobStatus::from("completed".to_string()), JobStatus::Completed);
        assert_eq!(JobStatus::from("unknown".to_string()), JobStatus::Pending);
    }
}
