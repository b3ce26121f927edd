use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::notification::{CreateParams, IndexParams, UpdateParams, MARK_READ};
use crate::{AppState, Error};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{notification as NotificationApi, notifications, Id};
use log::*;
use serde_json::json;

/// GET the current user's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    params(IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved the user's notifications", body = [notifications::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Notifications for user {} with {params:?}", user.id);

    let limit = app_state.config.list_limit(params.limit);
    let notifications =
        NotificationApi::find_by_recipient(app_state.store(), user.id, params.read, Some(limit))
            .await?;

    debug!("Found {} Notifications", notifications.len());

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), notifications)))
}

/// GET how many of the current user's notifications are unread
#[utoipa::path(
    get,
    path = "/notifications/unread_count",
    responses(
        (status = 200, description = "Successfully counted unread notifications"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn unread_count(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let count = NotificationApi::unread_count(app_state.store(), user.id).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        json!({ "count": count }),
    )))
}

/// PATCH apply an action to one of the current user's notifications
#[utoipa::path(
    patch,
    path = "/notifications/{id}",
    params(
        ("id" = Uuid, Path, description = "Id of the notification to update"),
    ),
    request_body = UpdateParams,
    responses(
        (status = 200, description = "Successfully marked the notification read", body = notifications::Model),
        (status = 400, description = "Unknown or malformed action"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Notification belongs to another user"),
        (status = 404, description = "Notification not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn update(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    params: Result<Json<UpdateParams>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(params) = params.map_err(|rejection| Error::bad_request(&rejection.body_text()))?;
    debug!("PATCH Notification {id} with action {:?}", params.action);

    if params.action != MARK_READ {
        return Err(Error::bad_request("unsupported notification action"));
    }

    let notification = NotificationApi::mark_as_read(app_state.store(), id, user.id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), notification)))
}

/// POST mark every unread notification of the current user as read
#[utoipa::path(
    post,
    path = "/notifications/read_all",
    responses(
        (status = 200, description = "Successfully marked all notifications read"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn read_all(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let updated = NotificationApi::mark_all_as_read(app_state.store(), user.id).await?;

    debug!("Marked {updated} Notifications read for user {}", user.id);

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        json!({ "updated": updated }),
    )))
}

/// DELETE one of the current user's notifications
#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    params(
        ("id" = Uuid, Path, description = "Id of the notification to delete"),
    ),
    responses(
        (status = 200, description = "Successfully deleted the notification"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Notification belongs to another user"),
        (status = 404, description = "Notification not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn delete(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE Notification {id} for user {}", user.id);

    NotificationApi::delete(app_state.store(), id, user.id).await?;

    Ok(Json(ApiResponse::<()>::no_content(
        StatusCode::NO_CONTENT.into(),
    )))
}

/// POST create notifications for one or more recipients (administrators only)
#[utoipa::path(
    post,
    path = "/notifications",
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully created one notification per recipient", body = [notifications::Model]),
        (status = 400, description = "Missing recipients, content or template bindings"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Template not found")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    params: Result<Json<CreateParams>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(params) = params.map_err(|rejection| Error::bad_request(&rejection.body_text()))?;
    let (recipient_ids, new_notification) = params.into_new_notification()?;

    debug!(
        "POST Create {new_notification:?} for {} recipients",
        recipient_ids.len()
    );

    let notifications = NotificationApi::create_for_recipients(
        app_state.store(),
        &app_state.event_publisher,
        &recipient_ids,
        new_notification,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), notifications)),
    ))
}
