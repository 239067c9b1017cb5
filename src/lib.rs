pub mod api;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod portal;
pub mod service;

pub use config::AppConfig;
pub use error::{PortalError, ReconError, ValidationError};
pub use service::{reconcile, ReconOptions, ReconciliationService};
