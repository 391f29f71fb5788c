//! # Tether Internal Library
//!
//! Re-exports the core Tether crates for convenience.

/// Layer 1: Typed endpoint descriptions.
pub use tether_endpoint;

/// Layer 2: Sessions, tasks and repositories.
pub use tether_repository;

/// Layer 3: Reactive resources.
pub use tether_resource;

/// Layer 3: `reqwest`-backed HTTP transport.
#[cfg(feature = "http")]
pub use tether_http;

/// Subscriber setup.
pub use tether_telemetry;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use tether_endpoint::prelude::*;
    #[cfg(feature = "http")]
    pub use tether_http::prelude::*;
    pub use tether_repository::prelude::*;
    pub use tether_resource::prelude::*;
    pub use tether_telemetry::{TracingConfig, TracingFormat};
}
