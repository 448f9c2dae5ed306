//! HTTP API for daily usage summaries.
//!
//! ```text
//! GET /                                    health check
//! GET /{light,temperature}/daily/all       total active time today
//! GET /{light,temperature}/daily/graph     active time per 3-hour bucket
//! GET /{light,temperature}/daily/hours     hours with >30 min active time
//! ```
//!
//! Every summary endpoint takes a required `classroom` query parameter that is
//! matched as a substring of the stored classroom.

use std::net::SocketAddr;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use cw_core::{DayWindow, HourlyGrid, Metric};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::config::HttpSettings;
use crate::error::ApiError;
use crate::query::{Graph, QueryService, TotalResponse};

#[derive(Debug, Deserialize)]
pub struct ClassroomQuery {
    classroom: Option<String>,
}

impl ClassroomQuery {
    fn required(&self) -> Result<&str, ApiError> {
        self.classroom
            .as_deref()
            .filter(|classroom| !classroom.is_empty())
            .ok_or(ApiError::MissingParameter("classroom"))
    }
}

/// Builds the application router.
pub fn router(queries: QueryService) -> Router {
    Router::new()
        .route("/", get(health))
        .nest("/light/daily", metric_routes(Metric::Light))
        .nest("/temperature/daily", metric_routes(Metric::Temperature))
        .layer(cors())
        .with_state(queries)
}

fn metric_routes(metric: Metric) -> Router<QueryService> {
    Router::new()
        .route(
            "/all",
            get(move |state: State<QueryService>, query: Query<ClassroomQuery>| {
                daily_total(state, query, metric)
            }),
        )
        .route(
            "/graph",
            get(move |state: State<QueryService>, query: Query<ClassroomQuery>| {
                daily_graph(state, query, metric)
            }),
        )
        .route(
            "/hours",
            get(move |state: State<QueryService>, query: Query<ClassroomQuery>| {
                daily_hours(state, query, metric)
            }),
        )
}

/// Any origin and any request header, with credentials.
///
/// A wildcard cannot be combined with credentials, so the request's own
/// origin and headers are echoed back instead.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// GET /
async fn health() -> &'static str {
    "ok"
}

async fn daily_total(
    State(queries): State<QueryService>,
    Query(params): Query<ClassroomQuery>,
    metric: Metric,
) -> Result<Json<TotalResponse>, ApiError> {
    let classroom = params.required()?;
    let total = queries.total(metric, classroom, DayWindow::today()).await?;
    Ok(Json(total))
}

async fn daily_graph(
    State(queries): State<QueryService>,
    Query(params): Query<ClassroomQuery>,
    metric: Metric,
) -> Result<Json<Graph>, ApiError> {
    let classroom = params.required()?;
    let graph = queries.graph(metric, classroom, DayWindow::today()).await?;
    Ok(Json(graph))
}

async fn daily_hours(
    State(queries): State<QueryService>,
    Query(params): Query<ClassroomQuery>,
    metric: Metric,
) -> Result<Json<HourlyGrid>, ApiError> {
    let classroom = params.required()?;
    let grid = queries.hours(metric, classroom, DayWindow::today()).await?;
    Ok(Json(grid))
}

/// A running HTTP server.
pub struct ServerHandle {
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Stops accepting connections and waits for in-flight requests to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "HTTP server task failed");
        }
    }
}

/// Binds the listener and serves the API on a background task.
///
/// Port 0 binds a random free port; the bound address is in the handle.
pub async fn run(settings: &HttpSettings, queries: QueryService) -> anyhow::Result<ServerHandle> {
    let listener = TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", settings.host, settings.port))?;
    let addr = listener.local_addr()?;

    tracing::info!("HTTP API listening on http://{addr}");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let app = router(queries);

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("HTTP server shutting down");
            })
            .await
        {
            tracing::error!(error = %e, "HTTP server error");
        }
    });

    Ok(ServerHandle {
        addr,
        shutdown: shutdown_tx,
        task,
    })
}
