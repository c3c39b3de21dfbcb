//! Tests for auth module
//!
//! These tests verify session resolution end to end against a fake
//! identity provider:
//! - Bearer header parsing
//! - Token cache hits, misses and expiry
//! - Role repair (admin promotion, default user role)
//! - Role gate and ownership rule

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::test_support::{session_resolver, FakeIdentityProvider, ADMIN_EMAIL};
    use crate::common::ApiError;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }

    // ============================================================================
    // Header parsing
    // ============================================================================

    #[tokio::test]
    async fn test_malformed_header_rejected_before_verification() {
        let identity = FakeIdentityProvider::new();
        identity.issue("tok", "uid-1", Some("jane@example.com"), Some("user"));
        let sessions = session_resolver(identity.clone());

        for header in [None, Some(""), Some("tok"), Some("Bearer "), Some("Basic tok"), Some("bearer tok"), Some("Bearer  tok")] {
            let result = sessions.resolve(header).await;
            assert!(
                matches!(result, Err(ApiError::Unauthorized(_))),
                "header {:?} should be rejected",
                header
            );
        }

        assert_eq!(identity.verify_calls(), 0);
        assert!(identity.assignments().is_empty());
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(session::bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert!(session::bearer_token(Some("Bearer a b")).is_err());
        assert!(session::bearer_token(Some("Bearer  abc")).is_err());
        assert!(session::bearer_token(Some("Bearer abc ")).is_err());
        assert!(session::bearer_token(Some("Token abc")).is_err());
    }

    // ============================================================================
    // Token cache
    // ============================================================================

    #[tokio::test]
    async fn test_second_resolution_hits_cache() {
        let identity = FakeIdentityProvider::new();
        identity.issue("tok", "uid-1", Some("jane@example.com"), Some("user"));
        let sessions = session_resolver(identity.clone());

        let first = sessions.resolve(Some(&bearer("tok"))).await.unwrap();
        let second = sessions.resolve(Some(&bearer("tok"))).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.id, "uid-1");
        assert_eq!(first.role, Role::User);
        assert_eq!(identity.verify_calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized_and_not_cached() {
        let identity = FakeIdentityProvider::new();
        let cache = Arc::new(TokenCache::new(10));
        let sessions = SessionResolver::new(identity.clone(), cache.clone(), ADMIN_EMAIL);

        for _ in 0..2 {
            let result = sessions.resolve(Some(&bearer("forged"))).await;
            assert!(matches!(result, Err(ApiError::Unauthorized(_))));
        }

        assert_eq!(identity.verify_calls(), 2);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_cached_entry_lives_until_its_own_expiry() {
        let identity = FakeIdentityProvider::new();
        let cache = TokenCache::new(10);
        identity.issue("tok", "uid-1", Some("jane@example.com"), Some("user"));

        cache.get_or_verify("tok", identity.as_ref()).await.unwrap();
        assert_eq!(identity.verify_calls(), 1);

        // Token lapses; the provider now refuses it as well
        identity.issue_until(
            "tok",
            "uid-1",
            Some("jane@example.com"),
            Some("user"),
            Utc::now() - Duration::seconds(1),
        );

        let fresh = cache.get_or_verify("tok", identity.as_ref()).await;
        assert!(fresh.is_ok(), "cached entry is still valid");
        assert_eq!(identity.verify_calls(), 1);

        let expired_cache = TokenCache::new(10);
        assert!(expired_cache
            .get_or_verify("tok", identity.as_ref())
            .await
            .is_err());
        assert_eq!(expired_cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_cache_evicts_expired_entry_on_lookup() {
        let identity = FakeIdentityProvider::new();
        let cache = TokenCache::new(10);
        identity.issue("tok", "uid-1", Some("jane@example.com"), Some("user"));

        cache.get_or_verify("tok", identity.as_ref()).await.unwrap();
        assert_eq!(identity.verify_calls(), 1);

        // Two hours on, the cached entry has lapsed and is verified again
        let later = Utc::now() + Duration::hours(2);
        cache
            .get_or_verify_at("tok", identity.as_ref(), later)
            .await
            .unwrap();
        assert_eq!(identity.verify_calls(), 2);
        assert_eq!(cache.len().await, 1);

        // Once the provider refuses the token, the lapsed entry is gone for good
        identity.issue_until(
            "tok",
            "uid-1",
            Some("jane@example.com"),
            Some("user"),
            Utc::now() - Duration::seconds(1),
        );
        let result = cache.get_or_verify_at("tok", identity.as_ref(), later).await;
        assert!(result.is_err());
        assert_eq!(identity.verify_calls(), 3);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolutions_verify_once() {
        let identity = FakeIdentityProvider::new();
        identity.issue("tok", "uid-1", Some("jane@example.com"), None);
        let sessions = Arc::new(session_resolver(identity.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let sessions = sessions.clone();
                tokio::spawn(async move { sessions.resolve(Some("Bearer tok")).await })
            })
            .collect();

        for handle in handles {
            let user = handle.await.unwrap().unwrap();
            assert_eq!(user.id, "uid-1");
            assert_eq!(user.role, Role::User);
        }

        assert_eq!(identity.verify_calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_capacity_is_bounded() {
        let identity = FakeIdentityProvider::new();
        let cache = TokenCache::new(2);

        for (i, token) in ["a", "b", "c"].iter().enumerate() {
            identity.issue_until(
                token,
                &format!("uid-{}", token),
                Some("x@example.com"),
                Some("user"),
                Utc::now() + Duration::minutes(10 + i as i64),
            );
            cache.get_or_verify(token, identity.as_ref()).await.unwrap();
        }

        assert_eq!(cache.len().await, 2);

        // "a" expired soonest and was evicted; "c" is still served from cache
        cache.get_or_verify("c", identity.as_ref()).await.unwrap();
        assert_eq!(identity.verify_calls(), 3);
        cache.get_or_verify("a", identity.as_ref()).await.unwrap();
        assert_eq!(identity.verify_calls(), 4);
    }

    // ============================================================================
    // Role repair
    // ============================================================================

    #[tokio::test]
    async fn test_admin_email_without_role_is_promoted() {
        let identity = FakeIdentityProvider::new();
        identity.issue("tok", "admin-uid", Some(ADMIN_EMAIL), None);
        let sessions = session_resolver(identity.clone());

        let user = sessions.resolve(Some(&bearer("tok"))).await.unwrap();

        assert_eq!(user.role, Role::Admin);
        assert_eq!(
            identity.assignments(),
            vec![("admin-uid".to_string(), Role::Admin)]
        );
    }

    #[tokio::test]
    async fn test_admin_email_with_user_role_is_promoted_once() {
        let identity = FakeIdentityProvider::new();
        identity.issue("tok", "admin-uid", Some("Admin@Example.com"), Some("user"));
        let sessions = session_resolver(identity.clone());

        let first = sessions.resolve(Some(&bearer("tok"))).await.unwrap();
        let second = sessions.resolve(Some(&bearer("tok"))).await.unwrap();

        assert_eq!(first.role, Role::Admin);
        assert_eq!(second.role, Role::Admin);
        assert_eq!(identity.assignments().len(), 1);
        assert_eq!(identity.verify_calls(), 1);
    }

    #[tokio::test]
    async fn test_admin_email_already_admin_is_untouched() {
        let identity = FakeIdentityProvider::new();
        identity.issue("tok", "admin-uid", Some(ADMIN_EMAIL), Some("admin"));
        let sessions = session_resolver(identity.clone());

        let user = sessions.resolve(Some(&bearer("tok"))).await.unwrap();

        assert_eq!(user.role, Role::Admin);
        assert!(identity.assignments().is_empty());
    }

    #[tokio::test]
    async fn test_account_without_role_defaults_to_user() {
        let identity = FakeIdentityProvider::new();
        identity.issue("tok", "uid-1", Some("jane@example.com"), None);
        let sessions = session_resolver(identity.clone());

        let user = sessions.resolve(Some(&bearer("tok"))).await.unwrap();

        assert_eq!(user.role, Role::User);
        assert_eq!(identity.assignments(), vec![("uid-1".to_string(), Role::User)]);
    }

    #[tokio::test]
    async fn test_promoted_admin_keeps_role_for_other_emails() {
        let identity = FakeIdentityProvider::new();
        identity.issue("tok", "uid-2", Some("mod@example.com"), Some("admin"));
        let sessions = session_resolver(identity.clone());

        let user = sessions.resolve(Some(&bearer("tok"))).await.unwrap();

        assert_eq!(user.role, Role::Admin);
        assert!(identity.assignments().is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_role_is_left_alone() {
        let identity = FakeIdentityProvider::new();
        identity.issue("admin-tok", "admin-uid", Some(ADMIN_EMAIL), Some("moderator"));
        identity.issue("tok", "uid-1", Some("jane@example.com"), Some("moderator"));
        let sessions = session_resolver(identity.clone());

        let admin = sessions.resolve(Some(&bearer("admin-tok"))).await.unwrap();
        let other = sessions.resolve(Some(&bearer("tok"))).await.unwrap();

        assert_eq!(admin.role, Role::User);
        assert_eq!(other.role, Role::User);
        assert!(identity.assignments().is_empty());
    }

    #[tokio::test]
    async fn test_missing_email_claim_is_unauthorized() {
        let identity = FakeIdentityProvider::new();
        identity.issue("tok", "uid-1", None, Some("user"));
        let sessions = session_resolver(identity.clone());

        let result = sessions.resolve(Some(&bearer("tok"))).await;

        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
        assert!(identity.assignments().is_empty());
    }

    #[tokio::test]
    async fn test_failed_role_assignment_is_internal_error() {
        let identity = FakeIdentityProvider::new();
        identity.issue("tok", "uid-1", Some("jane@example.com"), None);
        identity.fail_assignments();
        let sessions = session_resolver(identity.clone());

        let result = sessions.resolve(Some(&bearer("tok"))).await;

        assert!(matches!(result, Err(ApiError::InternalServer(_))));
    }

    #[tokio::test]
    async fn test_empty_admin_email_promotes_nobody() {
        let identity = FakeIdentityProvider::new();
        identity.issue("tok", "uid-1", Some("jane@example.com"), Some("user"));
        let sessions = SessionResolver::new(identity.clone(), Arc::new(TokenCache::new(10)), "");

        let user = sessions.resolve(Some(&bearer("tok"))).await.unwrap();

        assert_eq!(user.role, Role::User);
        assert!(identity.assignments().is_empty());
    }

    // ============================================================================
    // Role gate
    // ============================================================================

    fn user(id: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            role,
        }
    }

    #[test]
    fn test_role_gate() {
        assert!(authorize(&user("a", Role::Admin), Role::Admin).is_ok());
        assert!(authorize(&user("u", Role::User), Role::User).is_ok());
        assert!(matches!(
            authorize(&user("u", Role::User), Role::Admin),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_owner_or_admin() {
        assert!(ensure_owner_or_admin(&user("u1", Role::User), "u1").is_ok());
        assert!(ensure_owner_or_admin(&user("a", Role::Admin), "u1").is_ok());
        assert!(matches!(
            ensure_owner_or_admin(&user("u2", Role::User), "u1"),
            Err(ApiError::Forbidden(_))
        ));
    }

    // ============================================================================
    // HTTP
    // ============================================================================

    #[tokio::test]
    async fn test_session_user_endpoint() {
        use crate::common::test_support::{send, test_app};
        use axum::http::{Method, StatusCode};

        let (app, identity, _db) = test_app().await;
        identity.issue("new-token", "new-uid", Some("new@example.com"), None);

        let (status, body) = send(&app, Method::GET, "/profile", Some("new-token"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["user_id"], "new-uid");
        assert_eq!(body["user"]["email"], "new@example.com");
        assert_eq!(body["user"]["role"], "user");

        let (status, body) = send(&app, Method::GET, "/profile", Some("forged"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized, Invalid Token");
    }

    #[test]
    fn test_role_claim_parsing() {
        assert_eq!(Role::from_claim("admin"), Some(Role::Admin));
        assert_eq!(Role::from_claim("user"), Some(Role::User));
        assert_eq!(Role::from_claim("Admin"), None);
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
