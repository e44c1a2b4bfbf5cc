use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;

use todo_gate::{
    auth::{AuthGate, PasswordHasher, SessionStore, TokenIssuer},
    config::Config,
    database, routes,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("Configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;
    log::debug!("Loaded {:?}", config);

    let pool = database::connect(&config.database_path)
        .await
        .map_err(|e| {
            log::error!("Failed to open database {}: {}", config.database_path, e);
            io::Error::new(io::ErrorKind::Other, e.to_string())
        })?;

    let gate = web::Data::new(AuthGate::new(
        TokenIssuer::new(config.jwt_secret.as_bytes()),
        SessionStore::new(pool.clone()),
    ));
    let hasher = web::Data::new(PasswordHasher::new(config.bcrypt_cost));
    let pool = web::Data::new(pool);
    let allowed_origin = config.allowed_origin.clone();

    log::info!("Starting todo-gate server at {}", config.server_url());

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(3600);

        App::new()
            .app_data(pool.clone())
            .app_data(gate.clone())
            .app_data(hasher.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
