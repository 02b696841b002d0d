//! Business logic services.
//!
//! Handlers stay thin: they extract and validate input, call into a service
//! and wrap the result. The catalog services are plain functions over the
//! pool; the account flow lives in [`auth_service::AuthService`] so its
//! stores and mailer can be swapped in tests.

pub mod auth_service;
pub mod category_service;
pub mod mailer;
pub mod password;
pub mod product_service;
pub mod token_service;
