//! Libris Server - Library Management Backend
//!
//! REST JSON API for managing a library catalog: borrowing, returning and
//! reviewing books, with role-based catalog and user administration.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libris_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("libris_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Libris Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.auth.clone());

    // Create the initial administrator if no admin account exists yet
    services
        .users
        .ensure_admin()
        .await
        .expect("Failed to create initial admin account");

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication and account lifecycle
        .route("/user/register", post(api::auth::register))
        .route("/user/login", post(api::auth::login))
        .route("/user/logout", delete(api::auth::logout))
        .route("/user/password_change", put(api::auth::password_change))
        .route("/user/activation/:id", put(api::auth::set_activation))
        // Users
        .route("/user", get(api::users::list_users))
        .route("/user/:id", get(api::users::get_user))
        .route("/user/:id", put(api::users::update_user))
        .route("/user/:id", delete(api::users::delete_user))
        // Categories
        .route("/category", get(api::categories::list_categories))
        .route("/category", post(api::categories::create_category))
        .route("/category/:id", get(api::categories::get_category))
        .route("/category/:id", put(api::categories::update_category))
        .route("/category/:id", delete(api::categories::delete_category))
        // Books
        .route("/book", get(api::books::list_books))
        .route("/book", post(api::books::create_book))
        .route("/book/:id", get(api::books::get_book))
        .route("/book/:id", put(api::books::update_book))
        .route("/book/:id", delete(api::books::delete_book))
        // Circulation
        .route("/book/borrow/:id", get(api::books::borrow_book))
        .route("/book/return/:id", get(api::books::return_book))
        .route("/book/review/:id", post(api::books::create_review))
        .route("/book/review/:id", put(api::books::update_review))
        .route("/my_books", get(api::books::my_books))
        // History
        .route("/history", get(api::history::search_history))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api", api)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
