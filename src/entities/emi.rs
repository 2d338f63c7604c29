//! EMI entity - A fixed recurring installment tracked per billing cycle.
//!
//! Only the `is_paid_this_month` / `paid_date` pair is ever updated after creation.
//! `paid_months` is stored but no operation increments it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// EMI record model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "emis")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Store-assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Principal namespace this record belongs to
    pub owner_uid: String,
    /// Lender or purpose of the installment
    pub name: String,
    /// Fixed installment amount, always positive
    pub amount: f64,
    /// Day of month the installment falls due (1-31)
    #[serde(rename = "dueDate")]
    pub due_day: i32,
    /// First installment date
    pub start_date: Date,
    /// Total installment count
    pub total_months: i32,
    /// Installments paid so far
    pub paid_months: i32,
    /// Whether the current cycle has been paid
    pub is_paid_this_month: bool,
    /// Day the current cycle was marked paid
    pub paid_date: Option<Date>,
    /// Server timestamp of creation
    pub created_at: DateTimeUtc,
    /// Server timestamp of the last write
    pub last_updated: DateTimeUtc,
}

/// Defines relationships between EMI and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each EMI belongs to one user
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
