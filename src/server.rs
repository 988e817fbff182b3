use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::handlers::{AnalysisHandler, AnalyzeError};
use crate::models::{
    AnalysisResponse, ErrorResponse, HealthResponse, ImageUpload, DEFAULT_LANGUAGE,
};
use crate::services::AIService;

pub struct AppState {
    pub analysis: AnalysisHandler,
}

pub fn create_router(config: &Config, ai: Arc<dyn AIService>) -> Router {
    let state = Arc::new(AppState {
        analysis: AnalysisHandler::new(ai),
    });

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.allowed_origins.clone()))
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/analyze_food", post(analyze_food))
        .route("/health", get(health_check))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .with_state(state)
}

/// Pull the first `image` file part and the `language` field out of the form.
async fn read_form(
    multipart: &mut Multipart,
) -> Result<(Option<ImageUpload>, String), MultipartError> {
    let mut upload = None;
    let mut language = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") if upload.is_none() => {
                let file_name = field.file_name().map(str::to_string);
                if file_name.is_none() {
                    log::debug!("🔍 'image' field has no filename, treating as text");
                    continue;
                }
                let data = field.bytes().await?;
                upload = Some(ImageUpload {
                    file_name,
                    data: data.to_vec(),
                });
            }
            Some("language") if language.is_none() => {
                language = Some(field.text().await?);
            }
            _ => {}
        }
    }

    Ok((upload, language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())))
}

async fn analyze_food(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>, AnalyzeError> {
    let mut multipart = multipart?;
    let (upload, language) = read_form(&mut multipart).await?;

    log::info!(
        "📨 Analysis request: image={:?}, language={}",
        upload.as_ref().and_then(|u| u.file_name.as_deref()),
        language
    );

    let text = state.analysis.analyze(upload, &language).await?;

    Ok(Json(AnalysisResponse::success(text)))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found")))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    log::error!("💥 Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
        .into_response()
}
