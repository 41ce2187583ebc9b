use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash. Absent for Google-only accounts.
    pub password_hash: Option<String>,

    #[sea_orm(unique)]
    pub google_id: Option<String>,

    pub role: String,

    /// JSON array of favorite TMDB ids.
    pub favorites: String,

    /// JSON array of `{videoId, watchedAt}` entries, most recent first.
    pub watch_history: String,

    pub stripe_customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub subscription_plan_id: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_period_end: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
