pub mod handlers;

use crate::{
    config::{Config, ServerConfig},
    error::Result,
    inference::InferenceClient,
    models::ErrorBody,
    storage::ArtifactStore,
};
use actix_files::Files;
use actix_web::{
    dev::{fn_service, ServiceRequest, ServiceResponse},
    http::{header, Method, StatusCode},
    middleware::{self, ErrorHandlerResponse, ErrorHandlers},
    web, App, HttpResponse, HttpServer,
};

pub use crate::error::RequestError;

/// Shared per-worker state behind `web::Data`.
pub struct AppState {
    pub inference: InferenceClient,
    pub store: ArtifactStore,
}

impl AppState {
    pub fn new(inference: InferenceClient, store: ArtifactStore) -> Self {
        Self { inference, store }
    }
}

/// Routes of the relay. The front-end build directory is mounted last and
/// catches every path the API does not claim.
pub fn configure(cfg: &mut web::ServiceConfig, server: &ServerConfig) {
    cfg.app_data(web::PayloadConfig::new(server.max_body_bytes))
        .service(
            web::resource("/generate")
                .route(web::post().to(handlers::generate))
                .route(web::method(Method::OPTIONS).to(handlers::generate_preflight)),
        )
        .service(
            web::resource("/generated_image.png")
                .route(web::get().to(handlers::generated_image))
                .route(web::head().to(handlers::generated_image_head)),
        )
        .service(
            Files::new("/", &server.static_dir)
                .index_file("index.html")
                .default_handler(fn_service(|req: ServiceRequest| async {
                    let (req, _) = req.into_parts();
                    Ok::<_, actix_web::Error>(ServiceResponse::new(
                        req,
                        handlers::not_found(),
                    ))
                })),
        );
}

pub fn cors_headers(origin: &str) -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.to_string()))
}

/// Rewrites extractor rejections that actix answers in plain text.
pub fn json_errors<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().handler(StatusCode::PAYLOAD_TOO_LARGE, payload_too_large)
}

fn payload_too_large<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    log::warn!(
        "Rejected {} {}: body too large",
        res.request().method(),
        res.request().path()
    );
    let (req, _) = res.into_parts();
    let res = HttpResponse::PayloadTooLarge().json(ErrorBody::new("Request body too large"));
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, res).map_into_right_body(),
    ))
}

pub async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let store = ArtifactStore::new(&config.storage).await?;
    let inference = InferenceClient::new(&config.inference)?;
    let state = web::Data::new(AppState::new(inference, store));
    let server = config.server.clone();

    log::info!(
        "Listening on http://{}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(json_errors())
            .wrap(cors_headers(&server.cors_allow_origin))
            .wrap(middleware::Logger::default())
            .configure(|cfg| configure(cfg, &server))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    log::info!("Server stopped");
    Ok(())
}
