/// In-memory development backend.
pub mod memory;

/// gRPC service implementation.
pub mod service;

/// Server configuration and rate limiting.
pub mod config;

pub use config::{RateLimiter, ServerConfig};
pub use memory::MemoryAuth;
pub use service::AuthGrpc;
