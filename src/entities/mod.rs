//! Entity module - Contains all SeaORM entity definitions for the record store.
//! Every record row carries the `owner_uid` of the principal whose namespace it lives in.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod collection;
pub mod emi;
pub mod user;

// Re-export specific types to avoid conflicts
pub use collection::{
    Column as CollectionColumn, Entity as Collection, Model as CollectionModel,
};
pub use emi::{Column as EmiColumn, Entity as Emi, Model as EmiModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
