//! Authentication ports.

/// Verifies shared-secret API keys.
pub trait KeyVerifier: Send + Sync {
    /// Check a provided key against the configured key set.
    ///
    /// Implementations must compare in constant time and must fail closed
    /// with `AuthError::NotConfigured` when no keys are configured.
    fn verify(&self, provided: Option<&str>) -> Result<(), AuthError>;
}

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing API key")]
    MissingKey,

    #[error("Invalid API key")]
    InvalidKey,

    #[error("No admin API keys configured")]
    NotConfigured,
}
