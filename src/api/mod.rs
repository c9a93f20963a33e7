pub mod client;
pub mod error;
pub mod properties;
#[cfg(test)]
mod stub;
pub mod traits;
pub mod users;

pub use client::ApiClient;
pub use error::ApiError;
pub use traits::{PropertyBackend, UserBackend};
