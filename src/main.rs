use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use chirp_backend::{config::Config, db, error::AppError, logging, routes, state::AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    logging::init_tracing();
    let config = Arc::new(Config::from_env()?);

    let pool = db::init_pool(&config.database_url)
        .await
        .map_err(|e| AppError::Config(format!("db: {e}")))?;

    let state = AppState {
        db: pool,
        config: config.clone(),
    };

    let bind_addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%bind_addr, "starting chirp-backend");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            // Malformed ids are a cast failure, not an internal error.
            .app_data(web::PathConfig::default().error_handler(|_, _| {
                AppError::NotFound("resource not found".into()).into()
            }))
            .app_data(web::JsonConfig::default().error_handler(|err, _| {
                AppError::Validation(err.to_string()).into()
            }))
            .wrap(Cors::permissive())
            .configure(routes::configure)
    })
    .bind(&bind_addr)
    .map_err(|e| AppError::Config(format!("bind {bind_addr}: {e}")))?
    .run()
    .await
    .map_err(|e| AppError::Config(format!("server: {e}")))
}
