pub mod azure;
pub mod config;
pub mod context;
pub mod error;
pub mod foundation;

pub use error::{AppError, Result};
