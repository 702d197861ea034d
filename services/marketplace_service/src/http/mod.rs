//! Routes of the marketplace API. Handlers only translate between HTTP and the operations.

mod accounts;
pub mod caller;
mod courses;
pub mod form;
mod instructor;
mod media;
mod payments;
pub mod request_id;

use std::convert::Infallible;
use std::fmt::Display;
use std::path::Path;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::http::header::HeaderName;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use service_core::endpoint_error::EndpointError;

use crate::media::STAGING_DIR;
use request_id::REQUEST_ID_HEADER;

/// Registers the health check, the `/api` routes and the files of the local upload directory.
pub fn configure(cfg: &mut web::ServiceConfig, upload_dir: &Path) {
    cfg.route("/", web::get().to(health))
        .service(
            web::scope("/api")
                .app_data(web::JsonConfig::default().error_handler(bad_request::<JsonPayloadError>))
                .app_data(web::QueryConfig::default().error_handler(bad_request::<QueryPayloadError>))
                .app_data(web::PathConfig::default().error_handler(bad_request::<PathError>))
                .service(web::scope("/auth").configure(accounts::configure))
                .service(web::scope("/courses").configure(courses::configure))
                .service(web::scope("/instructor").configure(instructor::configure))
                .service(web::scope("/payment").configure(payments::configure))
                .service(web::scope("/video").configure(media::configure))
                .default_service(web::to(not_found)),
        )
        .service(
            Files::new("/uploads", upload_dir).path_filter(|path, _| !path.starts_with(STAGING_DIR)),
        );
}

/// Any origin may call the API; the request id is readable by browsers.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(3600)
}

fn bad_request<E: Display>(err: E, _: &HttpRequest) -> actix_web::Error {
    EndpointError::<Infallible>::validation(format!("Invalid request: {err}")).into()
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": "Route not found" }))
}

async fn health() -> impl Responder {
    web::Json(json!({
        "message": "Course marketplace API is running",
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
