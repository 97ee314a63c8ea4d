use crate::{
    error::StorageError,
    logger,
    models::{ErrorBody, GenerationAck, ImageGenerationRequest},
    server::AppState,
};
use actix_web::{
    http::{header, StatusCode},
    web, HttpResponse,
};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use uuid::Uuid;

/// Runs a handler body, turning a panic into a generic 500.
async fn guarded<F>(route: &'static str, handler: F) -> HttpResponse
where
    F: Future<Output = HttpResponse>,
{
    match AssertUnwindSafe(handler).catch_unwind().await {
        Ok(response) => response,
        Err(_) => {
            log::error!("Unexpected fault while handling {}", route);
            HttpResponse::InternalServerError().json(ErrorBody::new("Internal server error"))
        }
    }
}

pub async fn generate(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    guarded("POST /generate", handle_generate(state, body)).await
}

async fn handle_generate(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let request_id = Uuid::new_v4();
    let _timer = logger::timer(&format!("generate request {}", request_id));

    let request = match ImageGenerationRequest::from_json_body(&body) {
        Ok(request) => request,
        Err(e) => {
            log::warn!("Rejected generate request {}: {}", request_id, e);
            return HttpResponse::BadRequest().json(ErrorBody::new(e.to_string()));
        }
    };

    log::info!(
        "Processing generate request {} (quality: {}, prompt: {} chars)",
        request_id,
        request.quality.as_str(),
        request.prompt.chars().count()
    );

    let bytes = match state
        .inference
        .generate(&request.prompt, request.quality.profile())
        .await
    {
        Ok(bytes) => bytes,
        Err(e) => {
            let status = e
                .status_code()
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            log::error!("Generate request {} failed ({}): {}", request_id, status, e);
            return HttpResponse::build(status)
                .json(ErrorBody::with_retry(e.to_string(), e.is_retryable()));
        }
    };

    match state.store.save_latest(&bytes).await {
        Ok(()) => {
            log::info!("Generate request {} saved {} bytes", request_id, bytes.len());
            HttpResponse::Ok().json(GenerationAck::generated())
        }
        Err(e) => {
            log::error!("Generate request {} could not save image: {}", request_id, e);
            HttpResponse::InternalServerError().json(ErrorBody::new("Failed to save image"))
        }
    }
}

pub async fn generate_preflight() -> HttpResponse {
    HttpResponse::NoContent()
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
        .insert_header((header::ACCESS_CONTROL_MAX_AGE, "3600"))
        .finish()
}

pub async fn generated_image(state: web::Data<AppState>) -> HttpResponse {
    guarded("GET /generated_image.png", async move {
        match state.store.load_latest().await {
            Ok(bytes) => HttpResponse::Ok()
                .content_type("image/png")
                .insert_header((header::CACHE_CONTROL, "no-store"))
                .body(bytes),
            Err(StorageError::NotFound(_)) => image_not_found(),
            Err(e) => {
                log::error!("Error serving image: {}", e);
                HttpResponse::InternalServerError().json(ErrorBody::new("Failed to read image"))
            }
        }
    })
    .await
}

pub async fn generated_image_head(state: web::Data<AppState>) -> HttpResponse {
    guarded("HEAD /generated_image.png", async move {
        match state.store.exists_latest().await {
            Ok(true) => HttpResponse::Ok()
                .content_type("image/png")
                .insert_header((header::CACHE_CONTROL, "no-store"))
                .finish(),
            Ok(false) => image_not_found(),
            Err(e) => {
                log::error!("Error checking image: {}", e);
                HttpResponse::InternalServerError().json(ErrorBody::new("Failed to read image"))
            }
        }
    })
    .await
}

fn image_not_found() -> HttpResponse {
    log::warn!("Image file not found");
    HttpResponse::NotFound().json(ErrorBody::new("Image not found"))
}

pub fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorBody::new("Not found"))
}
