//! Verified-token cache shared by all requests

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::identity::{IdentityError, IdentityProvider};
use super::models::{Role, VerifiedToken};
use crate::common::helpers::safe_token_log;

/// Memoizes verified ID tokens keyed by the raw token string.
///
/// Entries live until the token's own `exp`. The lookup, verification and
/// insert all happen under one lock, so at most one verification is in
/// flight at any time.
#[derive(Debug)]
pub struct TokenCache {
    entries: Mutex<HashMap<String, VerifiedToken>>,
    max_entries: usize,
}

impl TokenCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Return cached claims for `token`, verifying with `identity` on a miss
    pub async fn get_or_verify(
        &self,
        token: &str,
        identity: &dyn IdentityProvider,
    ) -> Result<VerifiedToken, IdentityError> {
        self.get_or_verify_at(token, identity, Utc::now()).await
    }

    /// Same as [`get_or_verify`](Self::get_or_verify), judging expiry at `now`
    pub(crate) async fn get_or_verify_at(
        &self,
        token: &str,
        identity: &dyn IdentityProvider,
        now: DateTime<Utc>,
    ) -> Result<VerifiedToken, IdentityError> {
        let mut entries = self.entries.lock().await;

        match entries.get(token) {
            Some(cached) if !cached.is_expired(now) => {
                debug!(token = %safe_token_log(token), "Token cache hit");
                return Ok(cached.clone());
            }
            Some(_) => {
                debug!(token = %safe_token_log(token), "Evicting expired token");
                entries.remove(token);
            }
            None => {}
        }

        let verified = identity.verify_id_token(token).await?;

        if entries.len() >= self.max_entries {
            make_room(&mut entries, now);
        }
        entries.insert(token.to_string(), verified.clone());

        Ok(verified)
    }

    /// Record a role assigned on the identity provider against the cached
    /// claims, so later requests carrying the same token see it
    pub async fn record_role(&self, token: &str, role: Role) {
        let mut entries = self.entries.lock().await;
        if let Some(cached) = entries.get_mut(token) {
            cached
                .claims
                .insert("role".to_string(), Value::String(role.as_str().to_string()));
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Drop expired entries; if none expired, drop the one expiring soonest.
fn make_room(entries: &mut HashMap<String, VerifiedToken>, now: DateTime<Utc>) {
    let before = entries.len();
    entries.retain(|_, token| !token.is_expired(now));

    if entries.len() == before {
        let soonest = entries
            .iter()
            .min_by_key(|(_, token)| token.expires_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = soonest {
            entries.remove(&key);
        }
    }

    debug!(
        evicted = before - entries.len(),
        remaining = entries.len(),
        "Token cache pruned"
    );
}
