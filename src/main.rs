use log::{error, info};
use service::{config::Config, logging::Logger};
use std::sync::Arc;
use web::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start logger: {e}");
        std::process::exit(1);
    }

    info!(
        "Starting notifier in {} mode on {}:{}",
        config.runtime_env(),
        config.interface.as_deref().unwrap_or("127.0.0.1"),
        config.port
    );

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    // One broker per process; every stream and every publisher shares it
    let sse_manager = Arc::new(sse::Manager::new());
    let app_state = AppState::new(config, &db, sse_manager);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with error: {e}");
        std::process::exit(1);
    }
}
