use std::io;
use std::time::Duration;

use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;

use staybook::{config::Config, db, handlers, state::AppState};

const FLOW_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logger and environment
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("invalid configuration: {e}");
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    log::info!("Connecting to database...");
    let pool = db::get_db_pool(&config).await.map_err(io::Error::other)?;

    log::info!("Running migrations...");
    db::run_migrations(&pool).await.map_err(io::Error::other)?;

    let bind = (config.host.clone(), config.port);
    let state = web::Data::new(AppState::new(pool, config));

    let purge_state = state.clone();
    actix_web::rt::spawn(async move {
        let mut tick = tokio::time::interval(FLOW_PURGE_INTERVAL);
        loop {
            tick.tick().await;
            purge_state.flows.purge_expired().await;
        }
    });

    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind(bind)?
    .run()
    .await
}
