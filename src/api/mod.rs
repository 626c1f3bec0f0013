//! HTTP API
//!
//! Public routes serve the tree, person details and CMS content. Admin routes
//! require a bearer token issued by `POST /api/admin/login`.

pub mod admin;
pub mod auth;
pub mod cms;
pub mod state;
pub mod tree;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_mw,
    routing::{delete, get, post, put},
    Extension, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub use state::AppState;

use self::auth::jwt_auth;

/// Build the full router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let jwt_config = state.jwt.clone();

    // Routes that require JWT authentication
    let protected = Router::new()
        .route(
            "/api/admin/persons",
            get(admin::list_persons).post(admin::create_person),
        )
        .route("/api/admin/persons/form", get(admin::new_person_form))
        .route(
            "/api/admin/persons/:id",
            get(admin::edit_person_form)
                .put(admin::update_person)
                .delete(admin::delete_person),
        )
        .route("/api/admin/pages", get(admin::list_pages))
        .route("/api/admin/pages/:slug", put(admin::save_page))
        .route(
            "/api/admin/honor",
            get(admin::list_honor).post(admin::create_honor),
        )
        .route(
            "/api/admin/honor/:id",
            get(admin::get_honor)
                .put(admin::update_honor)
                .delete(admin::delete_honor),
        )
        .route(
            "/api/admin/support-messages",
            get(admin::list_support_messages),
        )
        .route(
            "/api/admin/support-messages/export.csv",
            get(admin::export_support_messages),
        )
        .route(
            "/api/admin/support-messages/:id",
            delete(admin::delete_support_message),
        )
        .route(
            "/api/admin/upload",
            post(admin::upload_photo).layer(DefaultBodyLimit::max(admin::UPLOAD_LIMIT_BYTES)),
        )
        .layer(axum_mw::from_fn(jwt_auth))
        .layer(Extension(jwt_config));

    // Public routes (no auth)
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/tree", get(tree::get_tree))
        .route("/api/tree/layout", get(tree::get_layout))
        .route("/api/tree.svg", get(tree::get_svg))
        .route("/api/person/:id", get(tree::get_person))
        .route("/api/pages/:slug", get(cms::get_page))
        .route("/api/honor", get(cms::list_honor))
        .route("/api/support", post(cms::submit_support))
        .route("/api/admin/login", post(admin::login));

    // CORS for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .nest_service("/uploads", ServeDir::new(&state.uploads_dir))
        .fallback_service(ServeDir::new(&state.static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health() -> &'static str {
    "ok"
}
