use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where a rendered notification is meant to surface on the client.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    EnumIter,
    Deserialize,
    Default,
    Serialize,
    DeriveActiveEnum,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "notification_channel")]
pub enum Channel {
    #[sea_orm(string_value = "in_app")]
    #[default]
    InApp,
    #[sea_orm(string_value = "push")]
    Push,
    #[sea_orm(string_value = "both")]
    Both,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::InApp => write!(fmt, "in_app"),
            Channel::Push => write!(fmt, "push"),
            Channel::Both => write!(fmt, "both"),
        }
    }
}
