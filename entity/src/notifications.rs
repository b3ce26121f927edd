//! `SeaORM` Entity for notifications table.
//! Each row belongs to exactly one recipient; `read_at` moves from null to a
//! timestamp once and never back.

use crate::priority::Priority;
use crate::variant::Variant;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::notifications::Model)]
#[sea_orm(schema_name = "notifier", table_name = "notifications")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    #[schema(value_type = String, format = Uuid)]
    pub recipient_id: Id,
    /// None for ad hoc notifications
    #[schema(value_type = Option<String>, format = Uuid)]
    pub template_id: Option<Id>,
    pub title: String,
    pub body: Option<String>,
    pub variant: Variant,
    pub priority: Priority,
    pub persistent: bool,
    #[serde(skip_deserializing)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub read_at: Option<DateTimeWithTimeZone>,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RecipientId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::notification_templates::Entity",
        from = "Column::TemplateId",
        to = "super::notification_templates::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    NotificationTemplates,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::notification_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NotificationTemplates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
