mod auth;
mod config;
mod inference;
mod routes;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use auth::basic::BasicCredentials;
use config::ServiceConfig;
use inference::classifier::load_classifier;
use inference::decoder::ImageDecoder;
use inference::normalizer::ImageNormalizer;
use inference::pipeline::PredictionPipeline;
use routes::configure_routes;
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = ServiceConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let classifier = match load_classifier(&config.model) {
        Ok(classifier) => classifier,
        Err(e) => {
            log::error!("Failed to load model at startup: {}", e);
            return Err(std::io::Error::other(format!("Model loading failed: {}", e)));
        }
    };
    log::info!(
        "Loaded classifier from {} ({} features)",
        config.model.path.display(),
        config.model.feature_scale
    );

    let pipeline = web::Data::new(PredictionPipeline::new(
        ImageDecoder::new(config.limits.max_image_dimension),
        ImageNormalizer::new(config.model.feature_scale),
        classifier,
    ));
    let credentials = web::Data::new(BasicCredentials::from_config(&config.auth));
    let max_body_bytes = config.limits.max_body_bytes;

    let bind_address = config.bind_address();
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::PayloadConfig::new(max_body_bytes))
            .app_data(pipeline.clone())
            .app_data(credentials.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
