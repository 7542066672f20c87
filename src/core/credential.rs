//! API-key credentials and the authentication gate
//!
//! Callers present `Authorization: <credential-id> <secret>`. The stored
//! secret is a SHA-256 hex digest; the presented secret is hashed and compared
//! in constant time.

use crate::core::auth::Principal;
use crate::core::error::ApiError;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// A stored API credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub principal: Principal,
    /// Lowercase hex SHA-256 of the secret
    pub secret_digest: String,
    pub revoked_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Build a credential from a plaintext secret
    pub fn new(id: impl Into<String>, principal: Principal, secret: &str) -> Self {
        Self {
            id: id.into(),
            principal,
            secret_digest: digest_secret(secret),
            revoked_at: None,
            last_used_at: None,
        }
    }

    pub fn revoked(mut self, at: DateTime<Utc>) -> Self {
        self.revoked_at = Some(at);
        self
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Compare a presented secret against the stored digest
    pub fn verify_secret(&self, presented: &str) -> bool {
        let presented = digest_secret(presented);
        presented.as_bytes().ct_eq(self.secret_digest.as_bytes()).into()
    }
}

/// Hex-encoded SHA-256 digest of a secret
pub fn digest_secret(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}


/// Split an Authorization header into (identifier, secret)
///
/// Tokens beyond the second are ignored.
pub fn parse_authorization(header: &str) -> Option<(&str, &str)> {
    let mut tokens = header.split_whitespace();
    let id = tokens.next()?;
    let secret = tokens.next()?;
    Some((id, secret))
}

/// Lookup and last-used stamping of credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find(&self, id: &str) -> Result<Option<Credential>>;

    async fn touch(&self, id: &str, at: DateTime<Utc>) -> Result<()>;
}

/// Verifies the Authorization header against a [`CredentialStore`]
#[derive(Clone)]
pub struct ApiKeyAuthenticator {
    store: Arc<dyn CredentialStore>,
}

impl ApiKeyAuthenticator {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Authenticate a raw header value
    ///
    /// On success the credential's last-used time is stamped by a detached
    /// task; a failed stamp is logged and never fails the request.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<Credential, ApiError> {
        let (id, secret) = header
            .and_then(parse_authorization)
            .ok_or(ApiError::Unauthorized)?;

        let credential = self
            .store
            .find(id)
            .await
            .map_err(ApiError::from)?
            .ok_or(ApiError::Unauthorized)?;

        if credential.is_revoked() {
            tracing::debug!(credential_id = %credential.id, "rejected revoked credential");
            return Err(ApiError::Unauthorized);
        }

        if !credential.verify_secret(secret) {
            tracing::debug!(credential_id = %credential.id, "rejected credential secret");
            return Err(ApiError::Unauthorized);
        }

        let store = self.store.clone();
        let credential_id = credential.id.clone();
        tokio::spawn(async move {
            if let Err(e) = store.touch(&credential_id, Utc::now()).await {
                tracing::warn!(credential_id = %credential_id, error = %e, "failed to stamp credential last use");
            }
        });

        Ok(credential)
    }
}
