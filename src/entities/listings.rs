use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    /// Externally assigned identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub category: String,
    pub price: f64,
    pub state: String,
    pub city: String,
    pub area_sq_ft: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    /// Pipe-delimited, at least one entry.
    pub amenities: String,
    pub furnished: String,
    pub available_from: String,
    pub listed_by: String,
    /// Pipe-delimited, at least one entry.
    pub tags: String,
    pub color_theme: String,
    pub rating: f32,
    pub is_verified: bool,
    pub listing_type: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
