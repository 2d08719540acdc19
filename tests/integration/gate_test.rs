//! Integration tests for the edge authentication gate.

mod helpers;

use http::StatusCode;

use brokle_auth::Gate;
use brokle_core::config::AppConfig;

use helpers::TestApp;

#[tokio::test]
async fn test_public_paths_need_no_token() {
    let app = TestApp::new();

    let response = app.get("/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["title"], "Brokle");

    let response = app.get("/api/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["verifier_loaded"], true);
}

#[tokio::test]
async fn test_protected_without_token_redirects_to_sign_in() {
    let app = TestApp::new();

    let response = app.get("/dashboard", None).await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.location.as_deref(),
        Some("/auth/signin?redirect=%2Fdashboard")
    );
}

#[tokio::test]
async fn test_redirect_encodes_nested_path() {
    let app = TestApp::new();

    let response = app.get("/organizations/acme/projects/chatbot", None).await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.location.as_deref(),
        Some("/auth/signin?redirect=%2Forganizations%2Facme%2Fprojects%2Fchatbot")
    );
}

#[tokio::test]
async fn test_valid_bearer_reaches_page_with_identity() {
    let app = TestApp::new();
    let token = app.token();

    let response = app
        .get("/organizations/acme/projects/chatbot", Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["page"], "project");
    assert_eq!(data["user"]["id"], "u1");
    assert_eq!(data["user"]["email"], "ada@brokle.dev");
    assert_eq!(data["user"]["role"], "developer");
    assert_eq!(data["organization_id"], "org-1");
    assert_eq!(data["organization_slug"], "acme");
    assert_eq!(data["project_slug"], "chatbot");
}

#[tokio::test]
async fn test_non_ascii_email_reaches_page() {
    let app = TestApp::new();
    let token = app.token_for("jürgen@brokle.dev");

    let response = app.get("/dashboard", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["user"]["email"], "jürgen@brokle.dev");
}

#[tokio::test]
async fn test_bearer_scheme_is_case_insensitive() {
    let app = TestApp::new();
    let token = app.token();

    let response = app
        .get_with_headers("/dashboard", &[("authorization", format!("bearer {token}"))])
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_cookie_token_is_accepted() {
    let app = TestApp::new();
    let token = app.token();

    let response = app
        .get_with_headers(
            "/settings/api-keys",
            &[("cookie", format!("theme=dark; access_token={token}"))],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["section"], "api-keys");
}

#[tokio::test]
async fn test_custom_header_token_is_accepted() {
    let app = TestApp::new();
    let token = app.token();

    let response = app
        .get_with_headers("/settings", &[("x-auth-token", token)])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["page"], "settings");
}

#[tokio::test]
async fn test_expired_token_redirects() {
    let app = TestApp::new();
    let token = app.expired_token();

    let response = app.get("/dashboard", Some(&token)).await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.location.as_deref(),
        Some("/auth/signin?redirect=%2Fdashboard")
    );
}

#[tokio::test]
async fn test_untrusted_signature_redirects() {
    let app = TestApp::new();
    let token = app.foreign_token();

    let response = app.get("/dashboard", Some(&token)).await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_garbage_token_redirects() {
    let app = TestApp::new();

    let response = app.get("/dashboard", Some("not.a.jwt")).await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_auth_only_with_valid_token_redirects_to_landing() {
    let app = TestApp::new();
    let token = app.token();

    for path in ["/auth/signin", "/auth/signup", "/auth/forgot-password"] {
        let response = app.get(path, Some(&token)).await;
        assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(response.location.as_deref(), Some("/dashboard"));
    }
}

#[tokio::test]
async fn test_auth_only_with_expired_token_shows_form() {
    let app = TestApp::new();
    let token = app.expired_token();

    let response = app.get("/auth/signin", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["form"], "signin");
}

#[tokio::test]
async fn test_sign_in_form_echoes_reason_and_redirect() {
    let app = TestApp::new();

    let response = app
        .get(
            "/auth/signin?redirect=%2Fsettings&reason=session_expired",
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["redirect"], "/settings");
    assert_eq!(data["reason"], "session_expired");
    assert_eq!(
        data["notice"],
        "Your session has expired. Please sign in again."
    );
}

#[tokio::test]
async fn test_sign_in_form_drops_offsite_redirect() {
    let app = TestApp::new();

    let response = app
        .get("/auth/signin?redirect=https%3A%2F%2Fevil.example", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"].get("redirect").is_none());
}

#[tokio::test]
async fn test_spoofed_identity_headers_are_replaced() {
    let app = TestApp::new();
    let token = app.token();

    let response = app
        .get_with_headers(
            "/dashboard",
            &[
                ("authorization", format!("Bearer {token}")),
                ("x-user-id", "intruder".to_string()),
                ("x-user-role", "owner".to_string()),
                ("x-organization-id", "org-other".to_string()),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["user"]["id"], "u1");
    assert_eq!(data["user"]["role"], "developer");
    assert_eq!(data["organization_id"], "org-1");
}

#[tokio::test]
async fn test_spoofed_identity_headers_without_token_redirect() {
    let app = TestApp::new();

    let response = app
        .get_with_headers(
            "/dashboard",
            &[
                ("x-user-id", "intruder".to_string()),
                ("x-user-email", "intruder@evil.example".to_string()),
                ("x-organization-id", "org-1".to_string()),
                ("x-user-role", "owner".to_string()),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_identity_headers_stripped_on_public_paths() {
    let mut config = AppConfig::default();
    config.routes.public_paths.push("/settings".to_string());
    let app = TestApp::with_config(config);

    let response = app
        .get_with_headers(
            "/settings",
            &[
                ("x-user-id", "intruder".to_string()),
                ("x-user-email", "intruder@evil.example".to_string()),
                ("x-organization-id", "org-1".to_string()),
                ("x-user-role", "owner".to_string()),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_path_is_protected() {
    let app = TestApp::new();

    let response = app.get("/nowhere", None).await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);

    let token = app.token();
    let response = app.get("/nowhere", Some(&token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gate_without_verifier_fails_closed() {
    let config = AppConfig::default();
    let gate = Gate::new(&config.routes, None);
    let app = TestApp::with_gate(config, gate);
    let token = app.token();

    let response = app.get("/dashboard", Some(&token)).await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);

    let response = app.get("/api/health", None).await;
    assert_eq!(response.body["data"]["verifier_loaded"], false);

    let response = app.get("/auth/signin", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_repeated_requests_get_same_decision() {
    let app = TestApp::new();
    let token = app.token();

    let first = app.get("/settings", Some(&token)).await;
    let second = app.get("/settings", Some(&token)).await;
    assert_eq!(first.status, second.status);
    assert_eq!(first.body, second.body);

    let first = app.get("/settings", None).await;
    let second = app.get("/settings", None).await;
    assert_eq!(first.location, second.location);
}
