//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, categories, health, history, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "0.9.0",
        description = "Library Management System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API root")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::logout,
        auth::password_change,
        auth::set_activation,
        // Users
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        // Categories
        categories::list_categories,
        categories::create_category,
        categories::get_category,
        categories::update_category,
        categories::delete_category,
        // Books
        books::list_books,
        books::create_book,
        books::get_book,
        books::update_book,
        books::delete_book,
        // Circulation
        books::borrow_book,
        books::return_book,
        books::create_review,
        books::update_review,
        books::my_books,
        // History
        history::search_history,
    ),
    components(
        schemas(
            // Users
            crate::models::user::User,
            crate::models::user::UserSummary,
            crate::models::user::Role,
            crate::models::user::RegisterUser,
            crate::models::user::UpdateUser,
            crate::models::user::LoginRequest,
            crate::models::user::LoginResponse,
            crate::models::user::PasswordChange,
            crate::models::user::ActivationRequest,
            // Categories
            crate::models::category::Category,
            crate::models::category::CategoryDetail,
            crate::models::category::CategorySummary,
            crate::models::category::CategoryRequest,
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookDetail,
            crate::models::book::BorrowedBook,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Reviews
            crate::models::review::Review,
            crate::models::review::ReviewWithUser,
            crate::models::review::ReviewRequest,
            // History
            crate::models::history::HistoryEntry,
            crate::models::history::HistoryEvent,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication and account lifecycle"),
        (name = "users", description = "User management"),
        (name = "categories", description = "Category management"),
        (name = "books", description = "Catalog management"),
        (name = "circulation", description = "Borrow, return and review"),
        (name = "history", description = "Borrow/return audit trail")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
