use super::error::{EntityApiErrorKind, Error};
use entity::notifications::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{
    entity::prelude::*, sea_query::Expr, ActiveValue::Set, ConnectionTrait, DatabaseConnection,
    QueryOrder, QuerySelect, TransactionTrait, TryIntoModel,
};
use serde::Deserialize;
use utoipa::ToSchema;

use log::*;

/// Read-state filter applied when listing a recipient's notifications.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReadState {
    #[default]
    All,
    Read,
    Unread,
}

pub async fn create(db: &impl ConnectionTrait, notification_model: Model) -> Result<Model, Error> {
    debug!("New Notification Model to be inserted: {notification_model:?}");

    let notification_active_model: ActiveModel = ActiveModel {
        recipient_id: Set(notification_model.recipient_id),
        template_id: Set(notification_model.template_id),
        title: Set(notification_model.title),
        body: Set(notification_model.body),
        variant: Set(notification_model.variant),
        priority: Set(notification_model.priority),
        persistent: Set(notification_model.persistent),
        read_at: Set(None),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    };

    Ok(notification_active_model
        .save(db)
        .await?
        .try_into_model()?)
}

/// Inserts every row inside one transaction. On error the transaction is
/// rolled back and none of the rows are persisted.
pub async fn create_many(
    db: &DatabaseConnection,
    notification_models: Vec<Model>,
) -> Result<Vec<Model>, Error> {
    let txn = db.begin().await?;

    let mut created = Vec::with_capacity(notification_models.len());
    for notification_model in notification_models {
        created.push(create(&txn, notification_model).await?);
    }

    txn.commit().await?;

    Ok(created)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::of_kind(EntityApiErrorKind::RecordNotFound))
}

/// Newest first. `limit` of `None` returns every matching row.
pub async fn find_by_recipient(
    db: &DatabaseConnection,
    recipient_id: Id,
    read_state: ReadState,
    limit: Option<u64>,
) -> Result<Vec<Model>, Error> {
    let query = Entity::find().filter(Column::RecipientId.eq(recipient_id));

    let query = match read_state {
        ReadState::All => query,
        ReadState::Read => query.filter(Column::ReadAt.is_not_null()),
        ReadState::Unread => query.filter(Column::ReadAt.is_null()),
    };

    Ok(query
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?)
}

pub async fn count_unread(db: &DatabaseConnection, recipient_id: Id) -> Result<u64, Error> {
    Ok(Entity::find()
        .filter(Column::RecipientId.eq(recipient_id))
        .filter(Column::ReadAt.is_null())
        .count(db)
        .await?)
}

/// Sets `read_at` only when it is still null, so concurrent callers can never
/// move an already-read notification's timestamp.
pub async fn mark_read(
    db: &DatabaseConnection,
    id: Id,
    read_at: DateTimeWithTimeZone,
) -> Result<Model, Error> {
    let result = Entity::update_many()
        .col_expr(Column::ReadAt, Expr::value(read_at))
        .filter(Column::Id.eq(id))
        .filter(Column::ReadAt.is_null())
        .exec(db)
        .await?;

    trace!(
        "mark_read on notification {id} affected {} row(s)",
        result.rows_affected
    );

    find_by_id(db, id).await
}

/// Single bulk update; rows inserted after the statement starts are untouched.
pub async fn mark_all_read(
    db: &DatabaseConnection,
    recipient_id: Id,
    read_at: DateTimeWithTimeZone,
) -> Result<u64, Error> {
    let result = Entity::update_many()
        .col_expr(Column::ReadAt, Expr::value(read_at))
        .filter(Column::RecipientId.eq(recipient_id))
        .filter(Column::ReadAt.is_null())
        .exec(db)
        .await?;

    debug!(
        "Marked {} notification(s) read for recipient {recipient_id}",
        result.rows_affected
    );

    Ok(result.rows_affected)
}

pub async fn delete_by_id(db: &DatabaseConnection, id: Id) -> Result<(), Error> {
    let result = Entity::delete_by_id(id).exec(db).await?;

    if result.rows_affected == 0 {
        debug!("Notification with id {id} not found");
        return Err(Error::of_kind(EntityApiErrorKind::RecordNotFound));
    }

    Ok(())
}
