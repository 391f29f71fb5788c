//! Declarative endpoints, repositories and reactive resources for remote APIs.
//!

pub use tether_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use tether_internal::prelude::*;
}
