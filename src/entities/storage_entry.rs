//! Storage entry entity - one row per key of a key-value scope.
//!
//! The `scope` column separates the durable namespace from the session
//! namespace, so both can live in the same table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key-value storage database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storage_entries")]
pub struct Model {
    /// Namespace of the key (`local` or `session`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub scope: String,
    /// Storage key (e.g., `"alloc_users_v2"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Serialized JSON value
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// When this entry was last written
    pub updated_at: DateTimeUtc,
}

/// Storage entries have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
