//! HTTP request handlers (route handlers).
//!
//! Each handler extracts and validates its input, calls a service and
//! returns JSON. Errors convert into the shared JSON error body.

/// Registration, login and password reset
pub mod auth;
/// Category CRUD and per-category product listing
pub mod categories;
/// Service health
pub mod health;
/// Product CRUD and listing
pub mod products;
/// User administration
pub mod users;
