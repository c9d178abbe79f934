//! Core data models for the asset upload and bundling service.
//!
//! These types describe what the service stores (flat-namespace objects) and
//! what it reports back to callers (per-file statuses). They serialize
//! naturally as JSON via `serde`.

pub mod asset_kind;
pub mod file_status;
pub mod object;
