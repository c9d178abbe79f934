//! Service layer: the storage façade, the asset compactor, and the upload
//! orchestration built on top of both. Handlers stay thin and delegate the
//! actual work here.

pub mod compactor;
pub mod storage_service;
pub mod upload_service;
