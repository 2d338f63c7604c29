//! Collection entity - A recorded cash inflow with a date and amount.
//!
//! `month` and `year` are a denormalised copy of `date`, written once at creation.
//! Records are never edited, only deleted and re-created, so the copy cannot drift.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Collection record model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collections")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Store-assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Principal namespace this record belongs to
    pub owner_uid: String,
    /// Calendar day of the collection
    pub date: Date,
    /// Amount collected, always positive
    pub amount: f64,
    /// Month of `date` (1-12)
    pub month: i32,
    /// Year of `date`
    pub year: i32,
    /// Server timestamp of creation
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Collection and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each collection belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerUid",
        to = "super::user::Column::Uid"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
