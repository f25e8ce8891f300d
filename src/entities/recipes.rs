use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owner reference as published by the recipe source, not a users FK
    pub user_id: String,

    pub title: String,

    pub description: String,

    /// Minutes
    pub prep_time: i32,

    /// Minutes
    pub cook_time: i32,

    pub servings: i32,

    pub image_url: String,

    /// JSON array of ingredients
    pub ingredients: String,

    /// JSON array of steps
    pub steps: String,

    /// JSON array of tag names
    pub tags: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
