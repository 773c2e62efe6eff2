pub mod auth;
pub mod client;

pub use auth::ServiceAccountKey;
pub use client::{SheetsClient, SheetsError};
