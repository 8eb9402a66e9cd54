//! Bearer token resolution.
//!
//! Tokens are never kept in memory as plaintext: the store maps the SHA-256
//! digest of each configured token to the caller it identifies.

use std::collections::HashMap;

use async_trait::async_trait;
use d2y_core::identity::{Caller, IdentityResolver};
use ring::digest::{SHA256, digest};
use tokio::sync::RwLock;

type TokenDigest = [u8; 32];

fn token_digest(token: &str) -> TokenDigest {
    let mut out = [0u8; 32];
    out.copy_from_slice(digest(&SHA256, token.as_bytes()).as_ref());
    out
}

/// Token digests and their callers, built from configuration.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    by_digest: HashMap<TokenDigest, Caller>,
}

impl Credentials {
    pub fn insert(&mut self, token: &str, caller: Caller) -> Option<Caller> {
        self.by_digest.insert(token_digest(token), caller)
    }

    pub fn count(&self) -> usize {
        self.by_digest.len()
    }

    fn get(&self, token: &str) -> Option<&Caller> {
        self.by_digest.get(&token_digest(token))
    }
}

/// Reloadable [`IdentityResolver`] shared by all handlers.
#[derive(Debug, Default)]
pub struct CredentialStore {
    inner: RwLock<Credentials>,
}

impl CredentialStore {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(credentials),
        }
    }

    /// Swap in a freshly loaded credential set (SIGHUP).
    pub async fn replace(&self, credentials: Credentials) {
        *self.inner.write().await = credentials;
    }
}

#[async_trait]
impl IdentityResolver for CredentialStore {
    async fn resolve(&self, credential: &str) -> Option<Caller> {
        self.inner.read().await.get(credential).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use d2y_core::identity::StaffRole;

    #[tokio::test]
    async fn test_resolve_and_replace() {
        let mut creds = Credentials::default();
        creds.insert("alice-token", Caller::consumer("alice"));
        let store = CredentialStore::new(creds);

        assert_eq!(
            store.resolve("alice-token").await,
            Some(Caller::consumer("alice"))
        );
        assert_eq!(store.resolve("alice-token ").await, None);

        let mut next = Credentials::default();
        next.insert("root", Caller::staff("admin-1", StaffRole::Admin));
        store.replace(next).await;

        assert_eq!(store.resolve("alice-token").await, None);
        assert!(store.resolve("root").await.unwrap().is_admin_like());
    }

    #[test]
    fn test_plaintext_is_not_kept() {
        let mut creds = Credentials::default();
        creds.insert("secret-token", Caller::consumer("bob"));
        let dump = format!("{creds:?}");
        assert!(!dump.contains("secret-token"));
    }
}
