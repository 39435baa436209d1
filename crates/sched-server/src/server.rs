use std::any::Any;
use std::path::Path;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use sched_engine::TaskService;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::handlers;

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: TaskService,
}

/// Build the Axum router: JSON API under `/api`, static files everywhere else.
pub fn build_router(state: AppState, web_dir: &Path) -> Router {
    let router = Router::new()
        .route(
            "/api/task",
            get(handlers::get_task)
                .post(handlers::create_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/api/tasks", get(handlers::list_tasks))
        .route("/api/task/done", post(handlers::complete_task))
        .route("/api/nextdate", get(handlers::next_date))
        .route("/health", get(handlers::health))
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback_service(ServeDir::new(web_dir))
        .with_state(state);
    with_middleware(router)
}

/// Panic recovery, request tracing and CORS, outermost last.
fn with_middleware(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Turn a handler panic into a JSON 500 instead of dropping the connection.
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    tracing::error!(detail, "handler panicked");
    ApiError::internal("internal server error").into_response()
}

/// Bind the listener and serve in a background task.
pub async fn start(config: &ServerConfig, service: TaskService) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(AppState { service }, &config.web_dir);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        port = local_addr.port(),
        web_dir = %config.web_dir.display(),
        "scheduler server started"
    );

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "server stopped");
        }
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        server,
    })
}

/// Handle returned by `start()`; aborting it stops the server.
pub struct ServerHandle {
    pub port: u16,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn abort(&self) {
        self.server.abort();
    }
}
