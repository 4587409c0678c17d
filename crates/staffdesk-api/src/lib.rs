// staffdesk-api: Async Rust client for the staffdesk administrative REST API.

pub mod client;
pub mod error;
pub mod list;
pub mod transport;

pub use client::ApiClient;
pub use error::Error;
pub use list::RawListResponse;
pub use transport::TransportConfig;
