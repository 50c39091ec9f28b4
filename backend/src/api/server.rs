//! HTTP server for the transitclean report.
//!
//! Every request recomputes the pipeline from scratch, the way a page
//! refresh reruns an interactive session. Nothing is cached between
//! requests.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | GET    | `/api/report`     | Report over the configured input     |
//! | POST   | `/api/upload`     | Report over an uploaded CSV          |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, ReportResponse};
use crate::config::AppConfig;
use crate::error::{PipelineResult, ServerError, ServerResult};
use crate::transform::pipeline::{run_bytes, run_file, PipelineOutput};

type ApiError = (StatusCode, Json<Value>);

#[derive(Debug, Clone)]
struct AppState {
    input_path: PathBuf,
}

/// Build the router.
pub fn router(config: &AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let state = Arc::new(AppState {
        input_path: config.input_path.clone(),
    });

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/report", get(report))
        .route("/api/upload", post(upload_csv))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: AppConfig) -> ServerResult<()> {
    let app = router(&config);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    eprintln!("🚀 Transitclean server running on http://localhost:{}", config.port);
    eprintln!("   Input: {}", config.input_path.display());
    eprintln!("   GET  /api/report - Report over the configured input");
    eprintln!("   POST /api/upload - Report over an uploaded CSV");
    eprintln!("   GET  /api/logs   - SSE log stream");
    eprintln!("   GET  /health     - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "transitclean",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "report": "GET /api/report",
            "upload": "POST /api/upload",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Map a failure to a status code and error body.
fn failure(err: ServerError) -> ApiError {
    log_error(err.to_string());
    let status = match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(error_response(&err.to_string())))
}

/// Run the synchronous pipeline off the async runtime.
async fn run_blocking<F>(job: F) -> Result<Json<ReportResponse>, ApiError>
where
    F: FnOnce() -> PipelineResult<PipelineOutput> + Send + 'static,
{
    let output = tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| failure(e.into()))?
        .map_err(|e| failure(e.into()))?;

    Ok(Json(ReportResponse::from(output)))
}

/// Report over the configured input file
async fn report(State(state): State<Arc<AppState>>) -> Result<Json<ReportResponse>, ApiError> {
    log_info(format!("📄 REPORT: {}", state.input_path.display()));
    let path = state.input_path.clone();
    run_blocking(move || run_file(path)).await
}

/// Report over an uploaded CSV (multipart field `file`)
async fn upload_csv(mut multipart: Multipart) -> Result<Json<ReportResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| failure(ServerError::BadRequest(format!("Multipart error: {}", e))))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| failure(ServerError::BadRequest(format!("Read error: {}", e))))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes =
        file_data.ok_or_else(|| failure(ServerError::BadRequest("No file provided".to_string())))?;

    log_info(format!(
        "📄 UPLOAD: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    run_blocking(move || run_bytes(&bytes)).await
}
