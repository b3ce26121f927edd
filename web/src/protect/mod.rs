//! Authorization rules layered in front of handlers.
//!
//! Ownership of individual notifications is enforced by the domain layer; the
//! rules here gate whole routes, such as template administration, by role.

use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::AppState;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use log::*;

/// A single authorization rule: is the authenticated user allowed to proceed?
#[async_trait]
pub trait Check: Send + Sync {
    async fn eval(&self, app: &AppState, user: &domain::users::Model) -> bool;
}

/// Runs each check in order and aborts with **403 FORBIDDEN** on the first failure.
pub(crate) async fn authorize(
    app_state: &AppState,
    authenticated_user: domain::users::Model,
    request: Request,
    next: Next,
    checks: Vec<Box<dyn Check>>,
) -> impl IntoResponse {
    for check in checks {
        if !check.eval(app_state, &authenticated_user).await {
            warn!(
                "User {} denied access to {} {}",
                authenticated_user.id,
                request.method(),
                request.uri().path()
            );
            return (StatusCode::FORBIDDEN, "FORBIDDEN").into_response();
        }
    }
    next.run(request).await
}

/// Route layer for template administration and for raising notifications on
/// behalf of other users.
pub(crate) async fn require_admin(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    authorize(&app_state, user, request, next, vec![Box::new(UserIsAdmin)]).await
}

pub struct UserIsAdmin;

#[async_trait]
impl Check for UserIsAdmin {
    async fn eval(&self, _app_state: &AppState, authenticated_user: &domain::users::Model) -> bool {
        authenticated_user.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use domain::{roles::Role, Id};
    use sea_orm::DatabaseConnection;
    use service::config::Config;
    use std::sync::Arc;

    fn app_state() -> AppState {
        let config = Config::try_parse_from(["notifier"]).unwrap();
        AppState::new(
            config,
            &Arc::new(DatabaseConnection::Disconnected),
            Arc::new(sse::Manager::new()),
        )
    }

    fn user_with_role(role: Role) -> domain::users::Model {
        domain::users::Model {
            id: Id::new_v4(),
            email: "someone@example.com".to_owned(),
            display_name: None,
            password: String::new(),
            role,
            country: Some("DE".to_owned()),
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn only_admin_roles_pass_user_is_admin() {
        let app_state = app_state();

        assert!(UserIsAdmin.eval(&app_state, &user_with_role(Role::Admin)).await);
        assert!(UserIsAdmin.eval(&app_state, &user_with_role(Role::SuperAdmin)).await);
        assert!(!UserIsAdmin.eval(&app_state, &user_with_role(Role::CountryAdmin)).await);
        assert!(!UserIsAdmin.eval(&app_state, &user_with_role(Role::User)).await);
    }
}
