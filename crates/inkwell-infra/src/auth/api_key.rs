//! Shared-secret API key verification.

use constant_time_eq::constant_time_eq;

use inkwell_core::ports::{AuthError, KeyVerifier};

/// Verifies admin API keys against a fixed key set.
#[derive(Clone, Default)]
pub struct ApiKeyVerifier {
    keys: Vec<String>,
}

impl ApiKeyVerifier {
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .map(|k| k.trim().to_owned())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated key list. Entries are trimmed and empty entries dropped.
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(',').map(str::to_owned))
    }

    pub fn is_configured(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

impl KeyVerifier for ApiKeyVerifier {
    fn verify(&self, provided: Option<&str>) -> Result<(), AuthError> {
        if self.keys.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        let provided = match provided {
            Some(key) if !key.is_empty() => key,
            _ => return Err(AuthError::MissingKey),
        };

        // Every configured key is compared so timing does not reveal which one matched.
        let matched = self
            .keys
            .iter()
            .fold(false, |found, key| {
                found | constant_time_eq(key.as_bytes(), provided.as_bytes())
            });

        if matched {
            Ok(())
        } else {
            Err(AuthError::InvalidKey)
        }
    }
}

impl std::fmt::Debug for ApiKeyVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyVerifier")
            .field("keys", &self.keys.len())
            .finish()
    }
}
