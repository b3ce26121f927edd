use super::error::{EntityApiErrorKind, Error};
use async_trait::async_trait;
use axum_login::{AuthnBackend, UserId};
use chrono::Utc;

use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, DatabaseConnection, Set};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

pub use entity::roles::Role;

pub async fn create(db: &impl ConnectionTrait, user_model: Model) -> Result<Model, Error> {
    debug!("New User Model to be inserted: {}", user_model.email);

    let now = Utc::now();
    let user_active_model: ActiveModel = ActiveModel {
        email: Set(user_model.email),
        display_name: Set(user_model.display_name),
        password: Set(generate_hash(user_model.password)),
        role: Set(user_model.role),
        country: Set(user_model.country),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(user_active_model.insert(db).await?)
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::of_kind(EntityApiErrorKind::RecordNotFound))
}

pub fn generate_hash(password: String) -> String {
    password_auth::generate_hash(password)
}

fn authenticate_user(creds: Credentials, user: Model) -> Result<Option<Model>, Error> {
    match password_auth::verify_password(creds.password, &user.password) {
        Ok(_) => Ok(Some(user)),
        Err(_) => Err(Error::of_kind(EntityApiErrorKind::RecordUnauthenticated)),
    }
}

/// Session authentication backend: resolves a session's user id back into the
/// user's identity, role and country on every request.
#[derive(Debug, Clone)]
pub struct Backend {
    db: Arc<DatabaseConnection>,
}

#[derive(Debug, Clone, ToSchema, IntoParams, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

impl Backend {
    pub fn new(db: &Arc<DatabaseConnection>) -> Self {
        Self { db: Arc::clone(db) }
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = Model;
    type Credentials = Credentials;
    type Error = Error;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        match find_by_email(self.db.as_ref(), &creds.email).await? {
            Some(user) => authenticate_user(creds, user),
            None => Err(Error::of_kind(EntityApiErrorKind::RecordUnauthenticated)),
        }
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        Ok(Entity::find_by_id(*user_id).one(self.db.as_ref()).await?)
    }
}

pub type AuthSession = axum_login::AuthSession<Backend>;

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_password(password: &str) -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            email: "agent@example.com".to_owned(),
            display_name: None,
            password: generate_hash(password.to_owned()),
            role: Role::User,
            country: Some("PT".to_owned()),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn credentials(password: &str) -> Credentials {
        Credentials {
            email: "agent@example.com".to_owned(),
            password: password.to_owned(),
            next: None,
        }
    }

    #[test]
    fn authenticate_user_accepts_the_matching_password() {
        let user = user_with_password("s3cret");

        let result = authenticate_user(credentials("s3cret"), user.clone());

        assert_eq!(result, Ok(Some(user)));
    }

    #[test]
    fn authenticate_user_rejects_a_wrong_password() {
        let user = user_with_password("s3cret");

        let result = authenticate_user(credentials("guess"), user);

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordUnauthenticated
        );
    }
}
