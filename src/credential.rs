//! Custody of the API secret
//!
//! The credential is loaded once, held in zeroized memory, and exposed only
//! through a scoped closure at the transport boundary. It has no `Display`
//! impl, its `Debug` output is redacted, and it is never serializable.

use crate::error::CredentialError;
use crate::secret::SecretString;
use std::fmt;

/// An API key held in guarded memory.
///
/// The secret can only be read through [`Credential::expose`], which bounds
/// its visibility to the closure's scope. The backing memory is overwritten
/// when the credential is dropped.
#[derive(Clone)]
pub struct Credential {
    secret: SecretString,
}

impl Credential {
    /// Create a credential from raw secret material.
    ///
    /// Rejects empty secrets and secrets containing bytes that cannot appear
    /// in an HTTP header (control characters would corrupt the Authorization
    /// header they are destined for).
    pub fn new(secret: impl Into<String>) -> Result<Self, CredentialError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(CredentialError::Empty);
        }
        if secret.bytes().any(|b| b.is_ascii_control()) {
            return Err(CredentialError::NotHeaderSafe);
        }
        Ok(Self {
            secret: SecretString::new(secret),
        })
    }

    /// Load a credential from an environment variable.
    pub fn from_env(var: &str) -> Result<Self, CredentialError> {
        let value =
            std::env::var(var).map_err(|_| CredentialError::Missing(var.to_string()))?;
        Self::new(value)
    }

    /// Scoped access to the secret.
    ///
    /// The secret is visible only for the duration of the closure; callers
    /// must not copy it into longer-lived storage.
    pub fn expose<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(self.secret.as_str())
    }

    pub fn len(&self) -> usize {
        self.secret.as_str().len()
    }

    pub fn is_empty(&self) -> bool {
        self.secret.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(****)")
    }
}
