//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{get, post},
};
use bizdesk_core::{BizDeskConfig, DepartmentRegistry};
use bizdesk_memory::{ChatService, MessageStore};
use bizdesk_scheduler::TaskStore;
use bizdesk_tools::ToolDispatcher;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
pub struct AppState {
    pub config: BizDeskConfig,
    pub start_time: std::time::Instant,
    /// Department catalog, read-only after startup.
    pub registry: Arc<DepartmentRegistry>,
    pub tasks: Arc<TaskStore>,
    pub messages: Arc<MessageStore>,
    pub chat: ChatService,
    pub dispatcher: ToolDispatcher,
}

impl AppState {
    /// Construct fresh stores and seed the registry from `config`.
    pub fn new(config: BizDeskConfig) -> Self {
        let registry = Arc::new(build_registry(&config));
        let tasks = Arc::new(TaskStore::with_min_interval(config.scheduler.min_interval_minutes));
        let messages = Arc::new(MessageStore::with_max_chars(config.chat.max_message_chars));
        let chat = ChatService::with_keyword_responder(registry.clone(), messages.clone());
        let dispatcher = ToolDispatcher::new(registry.clone(), tasks.clone())
            .with_default_interval(config.scheduler.default_interval_minutes);

        Self {
            config,
            start_time: std::time::Instant::now(),
            registry,
            tasks,
            messages,
            chat,
            dispatcher,
        }
    }
}

/// Built-in departments followed by those declared in the config file.
pub fn build_registry(config: &BizDeskConfig) -> DepartmentRegistry {
    let mut registry = DepartmentRegistry::with_defaults();
    for department in &config.departments {
        if !registry.register(department.clone()) {
            tracing::warn!("⚠️ Config department '{}' duplicates an existing id, ignored", department.id);
        }
    }
    registry
}

/// Build the Axum router with all routes.
pub fn build_router(shared: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/departments", get(super::routes::list_departments))
        .route(
            "/api/chat",
            get(super::routes::list_messages).post(super::routes::post_chat),
        )
        .route(
            "/api/tasks",
            get(super::routes::list_tasks)
                .post(super::routes::create_task)
                .patch(super::routes::update_task)
                .delete(super::routes::delete_task),
        )
        // Scheduler sweep
        .route("/api/tasks/run", post(super::routes::run_sweep))
        .route("/api/tasks/{id}/run", post(super::routes::run_task_now));

    let public = Router::new().route("/health", get(super::routes::health_check));

    api.merge(public)
        .layer({
            let cors = CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PATCH,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(Any)
                .max_age(std::time::Duration::from_secs(3600));

            // Example: BIZDESK_CORS_ORIGINS=https://desk.example.com,https://ops.example.com
            if let Ok(origins_str) = std::env::var("BIZDESK_CORS_ORIGINS") {
                let origins: Vec<_> = origins_str
                    .split(',')
                    .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
                    .collect();
                cors.allow_origin(origins)
            } else {
                cors.allow_origin(Any)
            }
        })
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server.
pub async fn start(config: BizDeskConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config));
    tracing::info!(
        "🏢 Department registry seeded: {} department(s)",
        state.registry.count()
    );

    if let Some(every_secs) = state.config.scheduler.auto_sweep_secs {
        tokio::spawn(bizdesk_scheduler::spawn_sweeper(state.tasks.clone(), every_secs));
    }

    let addr = format!("{}:{}", state.config.gateway.host, state.config.gateway.port);
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Gateway server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("👋 Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("⚠️ Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
