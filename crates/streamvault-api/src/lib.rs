//! StreamVault API
//!
//! HTTP surface and ingestion pipeline: multipart staging, chunk reassembly,
//! content-safety inspection, storage upload, and metadata commit.

mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::ErrorResponse;
