use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::user::AuthSession;

/// Returns 401 Unauthorized for requests without a logged in user instead of
/// redirecting to a login page.
pub async fn require_auth(auth_session: AuthSession, request: Request, next: Next) -> Response {
    match auth_session.user {
        Some(_user) => next.run(request).await,
        None => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
    }
}
