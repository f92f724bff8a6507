//! # Per-connection admission
//!
//! Each connection presents a shared secret once, before it is registered with the
//! broadcaster. Admission is a pure check: the gateway turns a failure into one
//! `ERROR Unauthorized` event followed by a close.
//!
//! ## Variants
//! - **Protected**: a non-empty secret is configured; the presented value must match exactly.
//! - **Open**: the configured secret is empty; every connection is admitted.

use std::sync::Arc;

use crate::error::AdmissionError;

/// Shared-secret admission policy.
///
/// # Example
/// ```
/// use procvisor::gateway::Admission;
///
/// let admission = Admission::new("s3cret");
/// assert!(admission.check(Some("s3cret")).is_ok());
/// assert!(admission.check(Some("nope")).is_err());
/// assert!(admission.check(None).is_err());
///
/// assert!(Admission::new("").check(None).is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct Admission {
    secret: Option<Arc<str>>,
}

impl Admission {
    /// Creates a policy for `secret`; an empty secret disables authentication.
    pub fn new(secret: impl AsRef<str>) -> Self {
        let secret = secret.as_ref();
        Self {
            secret: (!secret.is_empty()).then(|| Arc::from(secret)),
        }
    }

    /// True if no secret is required.
    pub fn is_open(&self) -> bool {
        self.secret.is_none()
    }

    /// Checks the secret presented by a connection.
    pub fn check(&self, presented: Option<&str>) -> Result<(), AdmissionError> {
        let Some(expected) = self.secret.as_deref() else {
            return Ok(());
        };
        match presented {
            None => Err(AdmissionError::MissingSecret),
            Some(value) if value == expected => Ok(()),
            Some(_) => Err(AdmissionError::SecretMismatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_policy() {
        let a = Admission::new("HomeAssistant");
        assert!(!a.is_open());
        assert_eq!(a.check(Some("HomeAssistant")), Ok(()));
        assert_eq!(a.check(Some("homeassistant")), Err(AdmissionError::SecretMismatch));
        assert_eq!(a.check(Some("")), Err(AdmissionError::SecretMismatch));
        assert_eq!(a.check(None), Err(AdmissionError::MissingSecret));
    }

    #[test]
    fn empty_secret_is_open() {
        let a = Admission::new("");
        assert!(a.is_open());
        assert_eq!(a.check(None), Ok(()));
        assert_eq!(a.check(Some("anything")), Ok(()));
    }
}
