use crate::controller::ApiResponse;
use crate::params::notification_template::IndexParams;
use crate::{AppState, Error};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{
    notification_templates, notification_templates::Model, template as TemplateApi,
    template::Bindings, Id,
};
use log::*;

/// GET all notification templates, optionally only the active ones
#[utoipa::path(
    get,
    path = "/notification_templates",
    params(IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved notification templates", body = [notification_templates::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all NotificationTemplates, active only: {}", params.active);

    let templates = TemplateApi::find_all(app_state.store(), params.active).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), templates)))
}

/// POST create a new notification template
#[utoipa::path(
    post,
    path = "/notification_templates",
    request_body = notification_templates::Model,
    responses(
        (status = 201, description = "Successfully created a new notification template", body = notification_templates::Model),
        (status = 400, description = "Malformed body, duplicate name or undeclared placeholder"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    template_model: Result<Json<Model>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(template_model) =
        template_model.map_err(|rejection| Error::bad_request(&rejection.body_text()))?;
    debug!("POST Create a new NotificationTemplate from: {template_model:?}");

    let template = TemplateApi::create(app_state.store(), template_model).await?;

    info!("Created NotificationTemplate \"{}\"", template.name);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), template)),
    ))
}

/// PUT replace a notification template; set `active` to false to retire it
#[utoipa::path(
    put,
    path = "/notification_templates/{id}",
    params(
        ("id" = Uuid, Path, description = "Id of the notification template to update"),
    ),
    request_body = notification_templates::Model,
    responses(
        (status = 200, description = "Successfully updated the notification template", body = notification_templates::Model),
        (status = 400, description = "Malformed body, duplicate name or undeclared placeholder"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Notification template not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn update(
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    template_model: Result<Json<Model>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(template_model) =
        template_model.map_err(|rejection| Error::bad_request(&rejection.body_text()))?;
    debug!("PUT Update NotificationTemplate {id} with: {template_model:?}");

    let template = TemplateApi::update(app_state.store(), id, template_model).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), template)))
}

/// POST preview a template rendered with the JSON object of bindings in the body.
/// Nothing is stored or sent.
#[utoipa::path(
    post,
    path = "/notification_templates/{name}/render",
    params(
        ("name" = String, Path, description = "Name of the template to render"),
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Successfully rendered the template"),
        (status = 400, description = "Malformed bindings or a placeholder has no binding"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No active template with this name")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn render(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
    bindings: Result<Json<Bindings>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(bindings) = bindings.map_err(|rejection| Error::bad_request(&rejection.body_text()))?;
    debug!("POST Render NotificationTemplate \"{name}\"");

    let rendered = TemplateApi::render(app_state.store(), &name, &bindings).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), rendered)))
}
