use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// External catalog id (TMDB).
    #[sea_orm(unique)]
    pub tmdb_id: String,
    pub title: String,
    pub description: String,
    pub poster_path: String,
    pub backdrop_path: String,
    pub video_url: String,

    /// JSON array of genre tags.
    pub genres: String,

    /// JSON array of type tags ("movie", "series", "trailer", ...).
    pub types: String,

    /// JSON array of free-form tags.
    pub tags: String,
    pub rating: f64,
    pub release_date: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
