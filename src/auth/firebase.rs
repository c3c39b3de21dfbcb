// src/auth/firebase.rs
//! Firebase Authentication backed identity provider
//!
//! ID tokens are RS256 JWTs signed by Google's secure-token service. Role
//! claims are written through the Identity Toolkit REST API using an OAuth2
//! access token minted from the service-account key.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::identity::{IdentityError, IdentityProvider};
use super::models::{IdentityUser, Role, VerifiedToken};
use crate::common::safe_email_log;

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const OAUTH_SCOPES: &str = "https://www.googleapis.com/auth/cloud-platform https://www.googleapis.com/auth/identitytoolkit";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Signing keys are refetched after this long
const KEY_CACHE_TTL_MINUTES: i64 = 60;
/// Access tokens are renewed this long before they expire
const ACCESS_TOKEN_LEEWAY_SECONDS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Service-account key file as downloaded from the Firebase console
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self, IdentityError> {
        serde_json::from_str(raw)
            .map_err(|e| IdentityError::InvalidConfig(format!("service account key: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self, IdentityError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            IdentityError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    n: Option<String>,
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

struct SigningKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: DateTime<Utc>,
}

struct CachedAccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct FirebaseIdClaims {
    sub: String,
    exp: i64,
    #[serde(flatten)]
    rest: HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

pub struct FirebaseIdentityProvider {
    project_id: String,
    service_account: ServiceAccountKey,
    signing_key: EncodingKey,
    http: Client,
    jwks_url: String,
    api_base: String,
    keys: RwLock<Option<SigningKeys>>,
    access_token: RwLock<Option<CachedAccessToken>>,
}

impl FirebaseIdentityProvider {
    pub fn new(
        service_account: ServiceAccountKey,
        project_id: Option<String>,
    ) -> Result<Self, IdentityError> {
        let signing_key = EncodingKey::from_rsa_pem(service_account.private_key.as_bytes())
            .map_err(|e| IdentityError::InvalidConfig(format!("service account private key: {}", e)))?;

        let http = Client::builder()
            .build()
            .map_err(|e| IdentityError::InvalidConfig(format!("http client: {}", e)))?;

        Ok(Self {
            project_id: project_id.unwrap_or_else(|| service_account.project_id.clone()),
            service_account,
            signing_key,
            http,
            jwks_url: JWKS_URL.to_string(),
            api_base: IDENTITY_TOOLKIT_URL.to_string(),
            keys: RwLock::new(None),
            access_token: RwLock::new(None),
        })
    }

    #[cfg(test)]
    fn with_endpoints(mut self, jwks_url: String, api_base: String) -> Self {
        self.jwks_url = jwks_url;
        self.api_base = api_base;
        self
    }

    fn issuer(&self) -> String {
        format!("{}{}", ISSUER_PREFIX, self.project_id)
    }

    fn accounts_url(&self, action: &str) -> String {
        format!(
            "{}/projects/{}/accounts:{}",
            self.api_base, self.project_id, action
        )
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, IdentityError> {
        {
            let cached = self.keys.read().await;
            if let Some(keys) = cached.as_ref() {
                let fresh = Utc::now() - keys.fetched_at < Duration::minutes(KEY_CACHE_TTL_MINUTES);
                if let (true, Some(key)) = (fresh, keys.keys.get(kid)) {
                    return Ok(key.clone());
                }
            }
        }

        let fetched = self.fetch_keys().await?;
        let key = fetched.keys.get(kid).cloned();
        *self.keys.write().await = Some(fetched);

        key.ok_or_else(|| IdentityError::InvalidToken(format!("unknown signing key {}", kid)))
    }

    async fn fetch_keys(&self) -> Result<SigningKeys, IdentityError> {
        debug!(url = %self.jwks_url, "Fetching token signing keys");

        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::RequestFailed(format!(
                "HTTP {} from signing key endpoint",
                response.status()
            )));
        }

        let document: JwksDocument = response
            .json()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        let mut keys = HashMap::new();
        for jwk in document.keys {
            let (Some(kid), Some(n), Some(e)) = (jwk.kid, jwk.n, jwk.e) else {
                continue;
            };
            if jwk.kty != "RSA" {
                continue;
            }
            match DecodingKey::from_rsa_components(&n, &e) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(err) => debug!(kid = %kid, error = %err, "Skipping unusable signing key"),
            }
        }

        Ok(SigningKeys {
            keys,
            fetched_at: Utc::now(),
        })
    }

    async fn access_token(&self) -> Result<String, IdentityError> {
        {
            let cached = self.access_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at - Duration::seconds(ACCESS_TOKEN_LEEWAY_SECONDS) > Utc::now() {
                    return Ok(token.token.clone());
                }
            }
        }

        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.service_account.client_email,
            scope: OAUTH_SCOPES,
            aud: &self.service_account.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| IdentityError::InvalidConfig(format!("signing assertion: {}", e)))?;

        let response = self
            .http
            .post(&self.service_account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Access token exchange failed");
            return Err(IdentityError::RequestFailed(format!(
                "token exchange returned HTTP {}",
                status
            )));
        }

        let token: AccessTokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        let access = token.access_token.clone();
        *self.access_token.write().await = Some(CachedAccessToken {
            token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        });

        Ok(access)
    }

    async fn call_accounts_api(&self, action: &str, body: Value) -> Result<Value, IdentityError> {
        let access_token = self.access_token().await?;

        let response = self
            .http
            .post(self.accounts_url(action))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(action = %action, status = %status, body = %body, "Identity Toolkit call failed");
            return Err(IdentityError::RequestFailed(format!(
                "accounts:{} returned HTTP {}",
                action, status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn verify_id_token(&self, token: &str) -> Result<VerifiedToken, IdentityError> {
        let header =
            decode_header(token).map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidToken("missing kid header".to_string()))?;

        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);

        let data = decode::<FirebaseIdClaims>(token, &key, &validation)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        if data.claims.sub.is_empty() {
            return Err(IdentityError::InvalidToken("empty subject".to_string()));
        }

        let expires_at = Utc
            .timestamp_opt(data.claims.exp, 0)
            .single()
            .ok_or_else(|| IdentityError::InvalidToken("invalid exp claim".to_string()))?;

        Ok(VerifiedToken {
            uid: data.claims.sub,
            expires_at,
            claims: data.claims.rest,
        })
    }

    async fn set_role(&self, uid: &str, role: Role) -> Result<(), IdentityError> {
        let custom_attributes = json!({ "role": role.as_str() }).to_string();

        self.call_accounts_api(
            "update",
            json!({ "localId": uid, "customAttributes": custom_attributes }),
        )
        .await?;

        info!(user_id = %uid, role = %role, "Custom role claim updated");
        Ok(())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<IdentityUser, IdentityError> {
        let response = self
            .call_accounts_api("lookup", json!({ "email": [email] }))
            .await?;

        let lookup: LookupResponse = serde_json::from_value(response)
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        lookup
            .users
            .into_iter()
            .next()
            .map(|u| IdentityUser { uid: u.local_id })
            .ok_or_else(|| IdentityError::UserNotFound(safe_email_log(email)))
    }
}
