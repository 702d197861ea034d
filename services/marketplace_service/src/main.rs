use std::error::Error;

use actix_web::middleware::from_fn;
use actix_web::{web, App, HttpServer};
use marketplace_service::http::request_id::echo_request_id;
use marketplace_service::media::STAGING_DIR;
use marketplace_service::{http, Context, Settings};
use service_core::telemetry::logging::{init_subscriber, make_subscriber};
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_subscriber(make_subscriber("marketplace_service", "info"))?;

    let settings = Settings::from_env().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration.");
        e
    })?;
    tokio::fs::create_dir_all(settings.upload_dir.join(STAGING_DIR)).await?;
    tracing::info!(
        payments_enabled = settings.payments_enabled,
        object_storage = settings.object_storage.is_some(),
        "Configuration loaded."
    );

    let bind_address = settings.bind_address.clone();
    let upload_dir = settings.upload_dir.clone();
    let ctx = web::Data::new(Context::from_settings(settings).await);

    tracing::info!(address = %bind_address, "Starting server.");
    HttpServer::new(move || {
        let upload_dir = upload_dir.clone();
        App::new()
            .wrap(http::cors())
            .wrap(from_fn(echo_request_id))
            .wrap(TracingLogger::default())
            .app_data(ctx.clone())
            .configure(move |cfg| http::configure(cfg, &upload_dir))
    })
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}
