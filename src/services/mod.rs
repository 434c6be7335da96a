//! Service layer for business logic
//!
//! Shared by the HTTP handlers and the integration tests.

mod loyalty_service;

pub use loyalty_service::*;
