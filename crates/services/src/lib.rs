#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod material_service;

pub use studypace_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, MaterialServiceError};
pub use material_service::{MaterialListing, MaterialService, MaterialView, ProgressOutcome};
