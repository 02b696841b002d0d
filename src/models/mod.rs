//! Data models: database rows, request bodies and response bodies.

pub mod category;
pub mod input;
pub mod pagination;
pub mod product;
pub mod role;
pub mod user;
