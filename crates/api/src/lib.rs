//! `api` crate — the HTTP surface described in spec §6.1: the route table,
//! the `AUTHORIZED_IPS` → bearer-token → access-log middleware pipeline,
//! and nothing else. The core (`engine`) does not know this crate exists;
//! every handler is a thin translation from an `Orchestrator`/`ErrorCode`
//! call to an HTTP status.

pub mod auth;
pub mod handlers;
pub mod validation;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::{middleware, Router};
use db::DbPool;
use engine::Orchestrator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orchestrator: Arc<Orchestrator>,
    pub nodes_path: Arc<PathBuf>,
    pub workflows_path: Arc<PathBuf>,
    pub jwt_secret: Arc<String>,
    pub authorized_ips: Arc<Vec<IpAddr>>,
}

#[allow(clippy::too_many_arguments)]
pub async fn serve(
    bind: &str,
    pool: DbPool,
    orchestrator: Arc<Orchestrator>,
    nodes_path: PathBuf,
    workflows_path: PathBuf,
    jwt_secret: String,
    authorized_ips: Vec<IpAddr>,
) -> Result<(), std::io::Error> {
    let state = AppState {
        pool,
        orchestrator,
        nodes_path: Arc::new(nodes_path),
        workflows_path: Arc::new(workflows_path),
        jwt_secret: Arc::new(jwt_secret),
        authorized_ips: Arc::new(authorized_ips),
    };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let protected = Router::new()
        .route("/orchestrator/start", post(handlers::orchestrator::start))
        .route("/orchestrator/stop", delete(handlers::orchestrator::stop))
        .route("/orchestrator/status", get(handlers::orchestrator::status))
        .route("/task/", post(handlers::task::submit))
        .route("/task/running", get(handlers::task::running))
        .route("/task/pause/:id", patch(handlers::task::pause))
        .route("/task/continue/:id", patch(handlers::task::continue_))
        .route("/task/:id", get(handlers::task::get))
        .route("/node/restart/:id", patch(handlers::node::restart))
        .route("/node/status/:id", get(handlers::node::status))
        .route("/workflow/", get(handlers::workflow::list))
        .route("/config/reload", patch(handlers::config::reload))
        .route("/logs/", get(handlers::logs::list))
        .route("/logs/execution", get(handlers::logs::execution))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::bearer_auth));

    let app = Router::new()
        .merge(protected)
        .route("/token/:id", get(auth::issue))
        .layer(middleware::from_fn_with_state(state.clone(), auth::access_log))
        .layer(middleware::from_fn_with_state(state.clone(), auth::ip_allowlist))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("api listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await
}
