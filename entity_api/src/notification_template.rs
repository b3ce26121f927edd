use super::error::{EntityApiErrorKind, Error};
use entity::notification_templates::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{
    entity::prelude::*,
    ActiveValue::{Set, Unchanged},
    DatabaseConnection, QueryOrder, TryIntoModel,
};

use log::*;

pub async fn create(db: &DatabaseConnection, template_model: Model) -> Result<Model, Error> {
    debug!("New Notification Template Model to be inserted: {template_model:?}");

    let now = chrono::Utc::now();

    let template_active_model: ActiveModel = ActiveModel {
        name: Set(template_model.name),
        category: Set(template_model.category),
        title: Set(template_model.title),
        description: Set(template_model.description),
        variant: Set(template_model.variant),
        priority: Set(template_model.priority),
        persistent: Set(template_model.persistent),
        channel: Set(template_model.channel),
        variables: Set(template_model.variables),
        active: Set(template_model.active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(template_active_model.save(db).await?.try_into_model()?)
}

pub async fn update(db: &DatabaseConnection, id: Id, model: Model) -> Result<Model, Error> {
    let result = Entity::find_by_id(id).one(db).await?;

    match result {
        Some(template) => {
            debug!("Existing Notification Template model to be Updated: {template:?}");

            let active_model: ActiveModel = ActiveModel {
                id: Unchanged(template.id),
                name: Set(model.name),
                category: Set(model.category),
                title: Set(model.title),
                description: Set(model.description),
                variant: Set(model.variant),
                priority: Set(model.priority),
                persistent: Set(model.persistent),
                channel: Set(model.channel),
                variables: Set(model.variables),
                active: Set(model.active),
                created_at: Unchanged(template.created_at),
                updated_at: Set(chrono::Utc::now().into()),
            };

            Ok(active_model.update(db).await?.try_into_model()?)
        }
        None => {
            debug!("Notification Template with id {id} not found");

            Err(Error::of_kind(EntityApiErrorKind::RecordNotFound))
        }
    }
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::of_kind(EntityApiErrorKind::RecordNotFound))
}

pub async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find().filter(Column::Name.eq(name)).one(db).await?)
}

pub async fn find_all(db: &DatabaseConnection, active_only: bool) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find();

    if active_only {
        query = query.filter(Column::Active.eq(true));
    }

    Ok(query.order_by_asc(Column::Name).all(db).await?)
}
