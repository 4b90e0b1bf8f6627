//! Serve command - HTTP API for invoice extraction.
//!
//! `POST /api/extract` takes a multipart upload with a `file` part holding a
//! PDF and answers with the seven extracted fields as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use clap::Args;
use console::style;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

use invex_core::DocumentProcessor;

use super::{build_pipeline, load_config};

const NO_FILE_PART: &str = "No file part in the request";
const NO_FILE_SELECTED: &str = "No file selected";
const FILE_TOO_LARGE: &str = "Uploaded file is too large";
const PROCESSING_FAILED: &str = "Failed to process the invoice on the server.";

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (default from config, 127.0.0.1:5000)
    #[arg(short, long)]
    bind: Option<String>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

#[derive(Clone)]
struct AppState {
    processor: Arc<dyn DocumentProcessor>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path, args.model_dir.as_deref())?;
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    let pipeline = build_pipeline(&config)?;
    let app = router(Arc::new(pipeline), config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Listening on {}", bind);
    println!(
        "{} Serving POST http://{}/api/extract",
        style("✓").green(),
        bind
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router around a document processor.
pub fn router(processor: Arc<dyn DocumentProcessor>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/extract", post(extract_invoice))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(AppState { processor })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn multipart_failure(e: MultipartError) -> Response {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Upload exceeds the body limit: {}", e);
        return error_response(StatusCode::PAYLOAD_TOO_LARGE, FILE_TOO_LARGE);
    }
    debug!("Malformed multipart body: {}", e);
    error_response(StatusCode::BAD_REQUEST, NO_FILE_PART)
}

async fn extract_invoice(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(e) => {
            debug!("Rejected upload: {}", e);
            return error_response(StatusCode::BAD_REQUEST, NO_FILE_PART);
        }
    };

    let upload = loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break None,
            Err(e) => return multipart_failure(e),
        };
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return error_response(StatusCode::BAD_REQUEST, NO_FILE_SELECTED);
        }

        match field.bytes().await {
            Ok(bytes) => break Some((filename, bytes.to_vec())),
            Err(e) => return multipart_failure(e),
        }
    };

    let Some((filename, data)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, NO_FILE_PART);
    };

    info!("Extracting {} ({} bytes)", filename, data.len());

    let processor = Arc::clone(&state.processor);
    let outcome = tokio::task::spawn_blocking(move || processor.process_document(&data)).await;

    match outcome {
        Ok(Ok(result)) => (StatusCode::OK, Json(result)).into_response(),
        Ok(Err(e)) if e.is_input() => {
            warn!("Rejected {}: {}", filename, e);
            error_response(StatusCode::BAD_REQUEST, NO_FILE_SELECTED)
        }
        Ok(Err(e)) => {
            error!("Failed to process {}: {}", filename, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, PROCESSING_FAILED)
        }
        Err(e) => {
            error!("Extraction task for {} failed: {}", filename, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, PROCESSING_FAILED)
        }
    }
}
