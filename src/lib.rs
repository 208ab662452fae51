pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod workflow;

pub use error::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;
