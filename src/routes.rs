//! Router assembly.
//!
//! Routes fall into three groups, all under `/api`:
//! - **public**: auth flow and catalog reads
//! - **staff** (Admin, SuperAdmin): catalog writes and the users listing
//! - **super admin**: user deletion
//!
//! Each protected group carries its [`RoleGate`]; both sit behind a single
//! [`require_auth`] layer, so the token is checked before the role.

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, categories, health, products, users},
    middleware::auth::{RoleGate, require_auth, require_role},
    state::AppState,
};

/// CORS policy admitting the storefront origin.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/verify-otp", post(auth::verify_otp))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/categories", get(categories::list_categories))
        .route("/categories/{id}", get(categories::get_category))
        .route(
            "/categories/{id}/products",
            get(categories::list_category_products),
        )
        .route("/products", get(products::list_products))
        .route("/products/{id}", get(products::get_product));

    let staff = Router::new()
        .route("/auth/users", get(users::list_users))
        .route("/categories", post(categories::create_category))
        .route(
            "/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/products", post(products::create_product))
        .route(
            "/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route_layer(from_fn_with_state(RoleGate::STAFF, require_role));

    let super_admin = Router::new()
        .route("/auth/users/{id}", delete(users::delete_user))
        .route_layer(from_fn_with_state(RoleGate::SUPER_ADMIN, require_role));

    let protected = staff
        .merge(super_admin)
        .route_layer(from_fn_with_state(state.tokens.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", public.merge(protected))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
