//! User entity - Accounts known to the local identity provider.
//!
//! The `uid` is the principal identifier that namespaces every collection and EMI row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User account model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Principal identifier (UUID v4)
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: String,
    /// Display name given at sign-up
    pub name: String,
    /// Sign-in email, unique across accounts
    #[sea_orm(unique)]
    pub email: String,
    /// bcrypt hash (cost and salt embedded)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Disabled accounts cannot sign in
    pub disabled: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// Last successful sign-in (or sign-up)
    pub last_login: DateTimeUtc,
}

/// Defines relationships between User and the record entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many collections
    #[sea_orm(has_many = "super::collection::Entity")]
    Collections,
    /// One user owns many EMIs
    #[sea_orm(has_many = "super::emi::Entity")]
    Emis,
}

impl Related<super::collection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collections.def()
    }
}

impl Related<super::emi::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Emis.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
