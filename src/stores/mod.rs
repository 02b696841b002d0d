//! Storage seams used by the auth service.

pub mod otp_store;
pub mod user_store;
