use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::AppState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use log::*;

/// GET open the current user's live notification stream.
///
/// The first frame is always `{"type":"connected"}`. Opening a second stream
/// for the same user ends the first one.
#[utoipa::path(
    get,
    path = "/notifications/stream",
    responses(
        (status = 200, description = "Server-sent event stream of the user's new notifications"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn stream(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    debug!("Establishing notification stream for user {}", user.id);

    let frames = sse::stream::subscribe(app_state.sse_manager.clone(), user.id.to_string())
        .map(|message| message.to_frame());

    Sse::new(frames).keep_alive(KeepAlive::new().interval(app_state.config.sse_keep_alive()))
}
