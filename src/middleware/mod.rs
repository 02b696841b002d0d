//! HTTP middleware components.
//!
//! Middleware run before route handlers and can short-circuit a request
//! (reject an unauthenticated caller) or enrich it (attach the caller).

/// Bearer-token authentication and role allow-lists
pub mod auth;
