//! `SeaORM` Entity for notification_templates table.
//! Templates are looked up by their unique `name` and are never deleted while
//! notifications still reference them; they are deactivated instead.

use crate::channel::Channel;
use crate::priority::Priority;
use crate::variant::Variant;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::notification_templates::Model)]
#[sea_orm(schema_name = "notifier", table_name = "notification_templates")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,

    #[sea_orm(unique)]
    pub name: String,

    pub category: String,

    /// Title text, may contain `{{placeholder}}` tokens
    pub title: String,

    /// Optional body text, may contain `{{placeholder}}` tokens
    pub description: Option<String>,

    #[serde(default)]
    pub variant: Variant,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub persistent: bool,

    #[serde(default)]
    pub channel: Channel,

    /// Placeholder names the template expects, in declaration order
    #[serde(default)]
    pub variables: Vec<String>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

fn default_active() -> bool {
    true
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::notifications::Entity")]
    Notifications,
}

impl Related<super::notifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
