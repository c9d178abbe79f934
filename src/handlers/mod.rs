//! HTTP layer: request parsing, content negotiation, and response shaping.
//! Handlers stay protocol-only; business rules live in the service layer.

pub mod file_handlers;
pub mod health_handlers;
