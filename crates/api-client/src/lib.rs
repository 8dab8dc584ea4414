pub mod client;
pub mod error;
pub mod retry;

pub use client::ApiClient;
pub use error::{ApiError, Result};
pub use retry::{RetryConfig, RetryOn};
