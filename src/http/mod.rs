//! Dashboard HTTP client and its error type.

mod client;
mod error;

pub use client::DashboardClient;
pub use error::ApiError;
