use crate::controller::{
    health_check_controller, notification_controller, notification_stream_controller,
    notification_template_controller, user_session_controller,
};
use crate::{middleware::auth::require_auth, params, protect, AppState};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
    Router,
};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Notifier API"
        ),
        paths(
            health_check_controller::health_check,
            notification_controller::index,
            notification_controller::unread_count,
            notification_controller::update,
            notification_controller::read_all,
            notification_controller::delete,
            notification_controller::create,
            notification_stream_controller::stream,
            notification_template_controller::index,
            notification_template_controller::create,
            notification_template_controller::update,
            notification_template_controller::render,
            user_session_controller::login,
            user_session_controller::logout,
        ),
        components(
            schemas(
                domain::notifications::Model,
                domain::notification_templates::Model,
                domain::users::Model,
                domain::user::Credentials,
                params::notification::CreateParams,
                params::notification::UpdateParams,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "notifier", description = "Real-time notification delivery API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our cookie session based authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "id",
                    "Session id value returned from successful login via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(notification_routes(app_state.clone()))
        .merge(notification_stream_routes(app_state.clone()))
        .merge(notification_template_routes(app_state.clone()))
        .merge(user_session_routes())
        .merge(user_session_protected_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn notification_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/notifications", get(notification_controller::index))
        .route(
            "/notifications/unread_count",
            get(notification_controller::unread_count),
        )
        .route(
            "/notifications/read_all",
            post(notification_controller::read_all),
        )
        .route(
            "/notifications/{id}",
            patch(notification_controller::update).delete(notification_controller::delete),
        )
        .merge(
            // POST /notifications
            Router::new()
                .route("/notifications", post(notification_controller::create))
                .route_layer(from_fn_with_state(app_state.clone(), protect::require_admin)),
        )
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn notification_stream_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/notifications/stream",
            get(notification_stream_controller::stream),
        )
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn notification_template_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/notification_templates",
            get(notification_template_controller::index)
                .post(notification_template_controller::create),
        )
        .route(
            "/notification_templates/{id}",
            put(notification_template_controller::update),
        )
        .route(
            "/notification_templates/{name}/render",
            post(notification_template_controller::render),
        )
        .route_layer(from_fn_with_state(app_state.clone(), protect::require_admin))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn user_session_protected_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/logout", get(user_session_controller::logout))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn user_session_routes() -> Router {
    Router::new().route("/login", post(user_session_controller::login))
}
