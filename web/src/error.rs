use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
    TemplateErrorKind,
};
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

static INCLUDE_DIAGNOSTICS: AtomicBool = AtomicBool::new(false);

/// Outside production, error bodies carry the debug rendering of the domain error.
pub(crate) fn include_diagnostics(enabled: bool) {
    INCLUDE_DIAGNOSTICS.store(enabled, Ordering::Relaxed);
}

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl Error {
    /// A malformed request body or query that never reached the domain layer.
    pub(crate) fn bad_request(reason: &str) -> Self {
        debug!("Rejecting malformed request: {reason}");
        Self(DomainError {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::Invalid,
            )),
        })
    }

    pub(crate) fn status_code(&self) -> StatusCode {
        match &self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Entity(entity_error_kind) => match entity_error_kind {
                    EntityErrorKind::NotFound => StatusCode::NOT_FOUND,
                    EntityErrorKind::Invalid => StatusCode::BAD_REQUEST,
                    EntityErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
                    EntityErrorKind::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
                },
                InternalErrorKind::Template(template_error_kind) => match template_error_kind {
                    TemplateErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
                    TemplateErrorKind::MissingVariable(_)
                    | TemplateErrorKind::UndeclaredPlaceholder(_) => StatusCode::BAD_REQUEST,
                },
                InternalErrorKind::Forbidden => StatusCode::FORBIDDEN,
                InternalErrorKind::Config | InternalErrorKind::Other(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                ExternalErrorKind::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

fn response_body(status: StatusCode, diagnostic: Option<String>) -> String {
    let reason = status
        .canonical_reason()
        .unwrap_or("ERROR")
        .to_uppercase();
    match diagnostic {
        Some(diagnostic) => format!("{reason}: {diagnostic}"),
        None => reason,
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {:?}", self.0);
        } else {
            debug!("Request rejected with {status}: {:?}", self.0.error_kind);
        }

        let diagnostic = INCLUDE_DIAGNOSTICS
            .load(Ordering::Relaxed)
            .then(|| format!("{:?}", self.0.error_kind));
        (status, response_body(status, diagnostic)).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error_kind: DomainErrorKind) -> StatusCode {
        Error(DomainError {
            source: None,
            error_kind,
        })
        .status_code()
    }

    #[test]
    fn template_errors_map_to_client_errors() {
        assert_eq!(
            status_of(DomainErrorKind::Internal(InternalErrorKind::Template(
                TemplateErrorKind::NotFound("welcome".to_owned())
            ))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainErrorKind::Internal(InternalErrorKind::Template(
                TemplateErrorKind::MissingVariable("name".to_owned())
            ))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn ownership_and_identity_failures_are_distinguished() {
        assert_eq!(
            status_of(DomainErrorKind::Internal(InternalErrorKind::Forbidden)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::Unauthenticated
            ))),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn store_outages_are_service_unavailable() {
        assert_eq!(
            status_of(DomainErrorKind::External(ExternalErrorKind::StoreUnavailable)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            Error::bad_request("missing action").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn diagnostics_are_appended_only_when_requested() {
        assert_eq!(response_body(StatusCode::NOT_FOUND, None), "NOT FOUND");
        assert_eq!(
            response_body(StatusCode::FORBIDDEN, Some("Forbidden".to_owned())),
            "FORBIDDEN: Forbidden"
        );
    }
}
