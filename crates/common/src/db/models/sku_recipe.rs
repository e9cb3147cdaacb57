//! SKU recipe entity

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sku_recipes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Generated `SKU-0001` style code, immutable once issued
    #[sea_orm(unique)]
    pub sku_code: String,

    #[sea_orm(unique)]
    pub sku_name: String,

    pub material_type: String,

    pub application_type: String,

    /// Width in mm
    #[sea_orm(column_type = "Decimal(Some((6, 2)))")]
    pub one_up_width: Decimal,

    /// Height in mm
    #[sea_orm(column_type = "Decimal(Some((6, 2)))")]
    pub one_up_height: Decimal,

    #[sea_orm(column_type = "Decimal(Some((6, 2)))", nullable)]
    pub print_sheet_width: Option<Decimal>,

    #[sea_orm(column_type = "Decimal(Some((6, 2)))", nullable)]
    pub print_sheet_height: Option<Decimal>,

    /// Size string kept verbatim when it could not be split into WxH
    #[sea_orm(nullable)]
    pub print_sheet_size: Option<String>,

    /// How many 1-ups fit on a print sheet
    pub ups: i32,

    /// Width in inches
    #[sea_orm(column_type = "Decimal(Some((6, 2)))", nullable)]
    pub purchase_sheet_width: Option<Decimal>,

    /// Height in inches
    #[sea_orm(column_type = "Decimal(Some((6, 2)))", nullable)]
    pub purchase_sheet_height: Option<Decimal>,

    #[sea_orm(nullable)]
    pub purchase_sheet_size: Option<String>,

    /// How many ups fit on a purchase sheet
    pub purchase_ups: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn print_sheet(&self) -> SheetSpec {
        SheetSpec {
            width: self.print_sheet_width,
            height: self.print_sheet_height,
            size: self.print_sheet_size.clone(),
        }
    }

    pub fn purchase_sheet(&self) -> SheetSpec {
        SheetSpec {
            width: self.purchase_sheet_width,
            height: self.purchase_sheet_height,
            size: self.purchase_sheet_size.clone(),
        }
    }
}

/// Dimensions of one sheet type (print or purchase)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSpec {
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub size: Option<String>,
}

/// A fully normalized recipe ready to be inserted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSkuRecipe {
    pub sku_code: String,
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

impl NewSkuRecipe {
    /// Build the insert model; `id` is left to the database
    pub fn into_active_model(self, created_at: DateTimeWithTimeZone) -> ActiveModel {
        ActiveModel {
            sku_code: Set(self.sku_code),
            sku_name: Set(self.sku_name),
            material_type: Set(self.material_type),
            application_type: Set(self.application_type),
            one_up_width: Set(self.one_up_width),
            one_up_height: Set(self.one_up_height),
            print_sheet_width: Set(self.print_sheet.width),
            print_sheet_height: Set(self.print_sheet.height),
            print_sheet_size: Set(self.print_sheet.size),
            ups: Set(self.ups),
            purchase_sheet_width: Set(self.purchase_sheet.width),
            purchase_sheet_height: Set(self.purchase_sheet.height),
            purchase_sheet_size: Set(self.purchase_sheet.size),
            purchase_ups: Set(self.purchase_ups),
            created_at: Set(created_at),
            ..Default::default()
        }
    }

    /// Materialize the stored row for stores that assign ids themselves
    pub fn into_model(self, id: i64, created_at: DateTimeWithTimeZone) -> Model {
        Model {
            id,
            sku_code: self.sku_code,
            sku_name: self.sku_name,
            material_type: self.material_type,
            application_type: self.application_type,
            one_up_width: self.one_up_width,
            one_up_height: self.one_up_height,
            print_sheet_width: self.print_sheet.width,
            print_sheet_height: self.print_sheet.height,
            print_sheet_size: self.print_sheet.size,
            ups: self.ups,
            purchase_sheet_width: self.purchase_sheet.width,
            purchase_sheet_height: self.purchase_sheet.height,
            purchase_sheet_size: self.purchase_sheet.size,
            purchase_ups: self.purchase_ups,
            created_at,
        }
    }
}
