//! Entity module - SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod storage_entry;

pub use storage_entry::{Entity as StorageEntry, Model as StorageEntryModel};
