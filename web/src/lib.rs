//! HTTP surface of the notifier: REST endpoints for notifications and templates,
//! session login, and the per-user live event stream.

use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum_login::{
    tower_sessions::{Expiry, SessionManagerLayer},
    AuthManagerLayerBuilder,
};
use domain::{user::Backend, NotificationStore};
use events::EventPublisher;
use log::*;
use sea_orm::DatabaseConnection;
use service::config::Config;
use sse::{domain_event_handler::SseDomainEventHandler, Manager};
use std::sync::Arc;
use time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_sessions::session_store::ExpiredDeletion;
use tower_sessions_sqlx_store::PostgresStore;

mod controller;
mod error;
mod extractors;
mod middleware;
mod params;
mod protect;
pub mod router;

pub use error::{Error, Result};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub database_connection: Arc<DatabaseConnection>,
    pub config: Config,
    pub notification_store: Arc<dyn NotificationStore>,
    pub event_publisher: EventPublisher,
    pub sse_manager: Arc<Manager>,
}

impl AppState {
    /// Wires the store to the database and routes created notifications to
    /// live streams held by `sse_manager`.
    pub fn new(config: Config, db: &Arc<DatabaseConnection>, sse_manager: Arc<Manager>) -> Self {
        let notification_store: Arc<dyn NotificationStore> = db.clone();
        let event_publisher = EventPublisher::new()
            .with_handler(Arc::new(SseDomainEventHandler::new(sse_manager.clone())));

        Self {
            database_connection: Arc::clone(db),
            config,
            notification_store,
            event_publisher,
            sse_manager,
        }
    }

    pub fn with_notification_store(mut self, store: Arc<dyn NotificationStore>) -> Self {
        self.notification_store = store;
        self
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.database_connection.as_ref()
    }

    pub fn store(&self) -> &dyn NotificationStore {
        self.notification_store.as_ref()
    }
}

pub async fn init_server(
    app_state: AppState,
) -> core::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    error::include_diagnostics(!app_state.config.is_production());

    // Sessions live next to the rest of the notifier tables
    let pool = app_state
        .db_conn_ref()
        .get_postgres_connection_pool()
        .to_owned();
    let session_store = PostgresStore::new(pool)
        .with_schema_name(service::DATABASE_SCHEMA)?
        .with_table_name("authorized_sessions")?;
    session_store.migrate().await?;

    let deletion_task = tokio::task::spawn(
        session_store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
    );

    let session_expiry =
        Duration::seconds(app_state.config.backend_session_expiry_seconds as i64);
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(app_state.config.is_production())
        .with_expiry(Expiry::OnInactivity(session_expiry));

    let backend = Backend::new(&app_state.database_connection);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let server_url = format!(
        "{}:{}",
        app_state.config.interface.as_deref().unwrap_or("127.0.0.1"),
        app_state.config.port
    );
    let listener = TcpListener::bind(&server_url).await?;
    info!("Server starting... listening for connections on http://{server_url}");

    let allowed_origins = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect::<Vec<_>>();

    let cors_layer = CorsLayer::new()
        .allow_methods([
            Method::DELETE,
            Method::GET,
            Method::OPTIONS,
            Method::PATCH,
            Method::POST,
            Method::PUT,
        ])
        .allow_credentials(true)
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_origin(allowed_origins);

    axum::serve(
        listener,
        router::define_routes(app_state)
            .layer(cors_layer)
            .layer(auth_layer)
            .into_make_service(),
    )
    .await?;

    deletion_task.await??;

    Ok(())
}
