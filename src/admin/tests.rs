//! Tests for admin module

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::auth::Role;
    use crate::common::test_support::{send, test_app};
    use crate::common::Validator;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[test]
    fn test_email_request_validator() {
        let valid = models::EmailRequest {
            email: "jane@example.com".to_string(),
        };
        assert!(validators::EmailRequestValidator.validate(&valid).is_valid);

        for email in ["", "jane", "jane@localhost", "@example.com"] {
            let request = models::EmailRequest {
                email: email.to_string(),
            };
            assert!(
                !validators::EmailRequestValidator.validate(&request).is_valid,
                "{:?} should be rejected",
                email
            );
        }
    }

    #[tokio::test]
    async fn test_welcome_requires_admin() {
        let (app, _identity, _db) = test_app().await;

        let (status, body) = send(&app, Method::POST, "/admin", Some("admin-token"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "welcome admin");

        let (status, body) = send(&app, Method::POST, "/admin", Some("alice-token"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Unauthorized");

        let (status, _) = send(&app, Method::POST, "/admin", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_make_and_remove_admin() {
        let (app, identity, _db) = test_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/admin/make",
            Some("admin-token"),
            Some(json!({ "email": "alice@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User alice@example.com is now an admin");

        let (status, body) = send(
            &app,
            Method::DELETE,
            "/admin/remove",
            Some("admin-token"),
            Some(json!({ "email": "alice@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["message"],
            "User alice@example.com admin rights have been revoked"
        );

        assert_eq!(
            identity.assignments(),
            vec![
                ("alice-uid".to_string(), Role::Admin),
                ("alice-uid".to_string(), Role::User),
            ]
        );
    }

    #[tokio::test]
    async fn test_make_admin_rejects_non_admin_caller() {
        let (app, identity, _db) = test_app().await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/admin/make",
            Some("alice-token"),
            Some(json!({ "email": "alice@example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(identity.assignments().is_empty());
    }

    #[tokio::test]
    async fn test_make_admin_input_errors() {
        let (app, identity, _db) = test_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/admin/make",
            Some("admin-token"),
            Some(json!({ "email": "not-an-email" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = send(&app, Method::POST, "/admin/make", Some("admin-token"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request body");

        let (status, _) = send(
            &app,
            Method::POST,
            "/admin/make",
            Some("admin-token"),
            Some(json!({ "email": "ghost@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        assert!(identity.assignments().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_internal_error() {
        let (app, identity, _db) = test_app().await;
        identity.fail_assignments();

        let (status, body) = send(
            &app,
            Method::POST,
            "/admin/make",
            Some("admin-token"),
            Some(json!({ "email": "bob@example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to update user role");
    }
}
