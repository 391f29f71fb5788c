//! Resource error types.

/// Failure raised by a resource itself rather than by its endpoints.
///
/// Surfaces to callers wrapped in [`RunError::SetFailed`](tether_endpoint::RunError::SetFailed).
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The resource has no live repository to run its endpoints through.
    #[error("resource `{resource}` is not bound to a live repository")]
    Detached {
        /// Name of the resource.
        resource: String,
    },

    /// A write was refused because one of its set dependencies is unmet.
    #[error("resource `{resource}` cannot be written: dependency `{dependency}` is unmet")]
    SetBlocked {
        /// Name of the resource.
        resource: String,
        /// Label of the first unmet dependency.
        dependency: String,
    },
}

impl ResourceError {
    /// Creates a [`Detached`](Self::Detached) error.
    pub fn detached(resource: impl Into<String>) -> Self {
        Self::Detached {
            resource: resource.into(),
        }
    }

    /// Creates a [`SetBlocked`](Self::SetBlocked) error.
    pub fn set_blocked(resource: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::SetBlocked {
            resource: resource.into(),
            dependency: dependency.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_message_names_resource() {
        let err = ResourceError::detached("settings");
        assert_eq!(
            err.to_string(),
            "resource `settings` is not bound to a live repository"
        );
    }

    #[test]
    fn set_blocked_message_names_dependency() {
        let err = ResourceError::set_blocked("settings", "signed in");
        assert_eq!(
            err.to_string(),
            "resource `settings` cannot be written: dependency `signed in` is unmet"
        );
    }
}
