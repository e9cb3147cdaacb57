//! SeaORM entity models
//!
//! Database entities for PrintTrack

mod job;
mod sku_recipe;

pub use sku_recipe::{
    Entity as SkuRecipeEntity,
    Model as SkuRecipe,
    ActiveModel as SkuRecipeActiveModel,
    Column as SkuRecipeColumn,
    NewSkuRecipe,
    SheetSpec,
};

pub use job::{
    Entity as JobEntity,
    Model as Job,
    ActiveModel as JobActiveModel,
    Column as JobColumn,
    job_code,
    JobStatus,
    NewJob,
    RecipeSnapshot,
};
