//! Web server for the hide/reveal API
//!
//! ## Endpoints
//!
//! - `POST /hide` (multipart: `image`, `message`, optional `password`)
//!   → `{"success": true, "image_url": "/download/<file>.png"}`
//! - `POST /reveal` (multipart: `image`, optional `password`)
//!   → `{"message": ...}`, or 401 `PASSWORD_REQUIRED` / `WRONG_PASSWORD`,
//!   or 403 `LOCKED_OUT` with `remaining` seconds
//! - `GET /download/<file>` serves generated carriers
//! - `GET /api/health`
//!
//! Wrong-password throttling is keyed by the client IP address.
//!
//! ```bash
//! cargo run --bin web_server -- --config config/ink.toml
//! ```

use axum::{
    extract::{multipart::Multipart, ConnectInfo, DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use log::{error, info, LevelFilter};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use invisible_ink::common::config::{InkConfig, ServerSection};
use invisible_ink::common::logging::init_logger;
use invisible_ink::{hide_bytes, InkError, InkService, RevealOutcome};

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Command-line arguments for the web server binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (TOML format); defaults apply if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct HideResponse {
    success: bool,
    image_url: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn ink_error(e: InkError) -> ApiError {
    let status = match e {
        InkError::CapacityExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        InkError::Encoding { .. } | InkError::ReservedContent(_) => StatusCode::UNPROCESSABLE_ENTITY,
        InkError::Io(_) => StatusCode::BAD_REQUEST,
        InkError::AuthenticationFailure | InkError::LockedOut { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e.to_string())
}

struct AppState {
    service: InkService,
    server: ServerSection,
}

/// Fields collected from a multipart upload.
#[derive(Default)]
struct UploadForm {
    image: Option<Vec<u8>>,
    message: Option<String>,
    password: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "image" => {
                let data = field.bytes().await.map_err(|e| {
                    api_error(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read image data: {}", e),
                    )
                })?;
                form.image = Some(data.to_vec());
            }
            "message" | "password" => {
                let text = field.text().await.map_err(|e| {
                    api_error(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read field {}: {}", name, e),
                    )
                })?;
                if name == "message" {
                    form.message = Some(text);
                } else {
                    form.password = Some(text).filter(|p| !p.is_empty());
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger(LevelFilter::Info);

    let args = Args::parse();
    let config = InkConfig::load_or_default(args.config.as_deref())?;

    tokio::fs::create_dir_all(&config.server.output_dir).await?;

    let state = Arc::new(AppState {
        service: InkService::new(config.throttle.clone()),
        server: config.server.clone(),
    });

    let app = Router::new()
        .route("/hide", post(hide_handler))
        .route("/reveal", post(reveal_handler))
        .route("/api/health", get(health_check))
        .nest_service("/download", ServeDir::new(&config.server.output_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = &config.server.address;
    info!("🌐 Web server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "invisible-ink",
    }))
}

async fn hide_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_form(multipart).await?;

    let image = form
        .image
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "No image uploaded"))?;
    let message = form
        .message
        .filter(|m| !m.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Message is required"))?;
    let password = form.password;

    info!("📤 Hiding {} chars in a {} byte upload", message.chars().count(), image.len());

    // PBKDF2 and the pixel loop are CPU-bound.
    let png = tokio::task::spawn_blocking(move || {
        hide_bytes(&image, &message, password.as_deref())
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(ink_error)?;

    let filename = format!("hidden_{}.png", uuid::Uuid::new_v4());
    let output_path = state.server.output_dir.join(&filename);
    tokio::fs::write(&output_path, png).await.map_err(|e| {
        error!("❌ Failed to write {}: {}", output_path.display(), e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store output image")
    })?;

    info!("✅ Carrier written to {}", output_path.display());

    Ok(Json(HideResponse {
        success: true,
        image_url: format!("/download/{}", filename),
    }))
}

async fn reveal_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let identity = peer.ip().to_string();
    let form = read_form(multipart).await?;

    let image = form
        .image
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "No image uploaded"))?;
    let password = form.password;

    let task_state = Arc::clone(&state);
    let outcome = tokio::task::spawn_blocking(move || {
        task_state
            .service
            .reveal_bytes(&identity, &image, password.as_deref())
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(ink_error)?;

    let response = match outcome {
        RevealOutcome::Message(message) => {
            (StatusCode::OK, Json(serde_json::json!({ "message": message })))
        }
        RevealOutcome::NoMessageFound => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "No hidden message found." })),
        ),
        RevealOutcome::PasswordRequired => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "PASSWORD_REQUIRED" })),
        ),
        RevealOutcome::WrongPassword => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "WRONG_PASSWORD" })),
        ),
        RevealOutcome::LockedOut { remaining_secs } => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": "LOCKED_OUT", "remaining": remaining_secs })),
        ),
    };

    Ok(response)
}
