//! Access credential handling
//!
//! The ingester never tracks token expiry itself. A 403 from the content
//! service is the only signal, and the orchestrator reacts to it by calling
//! [`CredentialManager::refresh`].

use crate::error::{IngestError, Result};
use async_trait::async_trait;
use std::fmt;
use tracing::{info, warn};

/// Opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Exchanges the long-lived client identity for a fresh credential.
#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn request_token(&self) -> Result<Credential>;
}

/// Holds the one live credential.
#[derive(Debug)]
pub struct CredentialManager {
    current: Credential,
}

impl CredentialManager {
    pub fn new(initial: Credential) -> Self {
        Self { current: initial }
    }

    /// Start from a freshly issued credential.
    pub async fn bootstrap(auth: &dyn AuthClient) -> Result<Self> {
        info!("No access token configured, requesting one");
        let credential = auth
            .request_token()
            .await
            .map_err(into_auth_failure)?;
        Ok(Self::new(credential))
    }

    pub fn current(&self) -> &Credential {
        &self.current
    }

    /// Replace the live credential. Any failure is [`IngestError::AuthFailure`].
    pub async fn refresh(&mut self, auth: &dyn AuthClient) -> Result<()> {
        match auth.request_token().await {
            Ok(credential) => {
                self.current = credential;
                info!("Access token refreshed");
                Ok(())
            },
            Err(e) => {
                warn!(error = %e, "Access token refresh failed");
                Err(into_auth_failure(e))
            },
        }
    }
}

fn into_auth_failure(err: IngestError) -> IngestError {
    match err {
        IngestError::AuthFailure(msg) => IngestError::AuthFailure(msg),
        other => IngestError::AuthFailure(other.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingAuth {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl AuthClient for CountingAuth {
        async fn request_token(&self) -> Result<Credential> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(IngestError::config("no client secret"));
            }
            Ok(Credential::new(format!("token-{n}")))
        }
    }

    #[tokio::test]
    async fn test_refresh_replaces_credential() {
        let auth = CountingAuth { calls: AtomicU32::new(0), fail: false };
        let mut manager = CredentialManager::new(Credential::new("stale"));

        manager.refresh(&auth).await.unwrap();
        assert_eq!(manager.current().as_str(), "token-1");
        assert_eq!(auth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_auth_failure_and_keeps_old_token() {
        let auth = CountingAuth { calls: AtomicU32::new(0), fail: true };
        let mut manager = CredentialManager::new(Credential::new("stale"));

        let err = manager.refresh(&auth).await.unwrap_err();
        assert!(matches!(err, IngestError::AuthFailure(_)));
        assert_eq!(manager.current().as_str(), "stale");
    }

    #[tokio::test]
    async fn test_bootstrap() {
        let auth = CountingAuth { calls: AtomicU32::new(0), fail: false };
        let manager = CredentialManager::bootstrap(&auth).await.unwrap();
        assert_eq!(manager.current().as_str(), "token-1");
        assert_eq!(auth.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let rendered = format!("{:?}", Credential::new("secret-token"));
        assert!(!rendered.contains("secret"));
    }
}
