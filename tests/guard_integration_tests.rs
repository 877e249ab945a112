mod common;

use axum::http::StatusCode;
use common::{TestApp, body_json, get, location, request, user};
use edu_portal::{config::AppConfig, models::Role};
use tower::ServiceExt;

#[tokio::test]
async fn test_health_is_outside_the_guards() {
    let app = TestApp::new();
    let incomplete = user(Role::Student, false);
    let (_, cookie) = app.sign_in(&incomplete).await;

    let response = app.router.clone().oneshot(get("/health", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_admin_goes_to_login_with_from() {
    let app = TestApp::new();
    let response = app.router.clone().oneshot(get("/admin", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login?from=%2Fadmin"));
    // A redirect renders nothing.
    assert_eq!(body_json(response).await, serde_json::Value::Null);
}

#[tokio::test]
async fn test_anonymous_redirect_keeps_the_query() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(get("/tickets?page=2", None))
        .await
        .unwrap();

    assert_eq!(location(&response), Some("/login?from=%2Ftickets%3Fpage%3D2"));
}

#[tokio::test]
async fn test_anonymous_public_pages_render() {
    let app = TestApp::new();
    for path in ["/", "/blog", "/faqs", "/materials", "/login", "/contact"] {
        let response = app.router.clone().oneshot(get(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn test_incomplete_student_is_sent_to_onboarding() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in(&user(Role::Student, false)).await;

    for path in ["/dashboard", "/", "/faqs", "/tickets"] {
        let response = app.router.clone().oneshot(get(path, Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/onboarding"), "{path}");
    }
}

#[tokio::test]
async fn test_incomplete_student_reaches_allow_listed_pages() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in(&user(Role::Student, false)).await;

    let response = app
        .router
        .clone()
        .oneshot(get("/onboarding", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["page"], "onboarding");
    assert_eq!(
        body["data"]["required_fields"],
        serde_json::json!(["name", "phone", "batch"])
    );

    for path in ["/contact", "/login", "/reset-password"] {
        let response = app.router.clone().oneshot(get(path, Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn test_complete_user_is_sent_away_from_onboarding() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in(&user(Role::Tutor, true)).await;

    let response = app
        .router
        .clone()
        .oneshot(get("/onboarding", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));

    let response = app
        .router
        .clone()
        .oneshot(get("/dashboard", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["page"], "dashboard");
}

#[tokio::test]
async fn test_incomplete_super_admin_follows_onboarding_policy() {
    let strict = TestApp::new();
    let (_, cookie) = strict.sign_in(&user(Role::SuperAdmin, false)).await;
    let response = strict.router.clone().oneshot(get("/", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/onboarding"));

    let config = AppConfig {
        onboarding_guard_exempts_super_admin: true,
        ..AppConfig::default()
    };
    let lenient = TestApp::with_config(config);
    let (_, cookie) = lenient.sign_in(&user(Role::SuperAdmin, false)).await;
    for path in ["/", "/admin"] {
        let response = lenient.router.clone().oneshot(get(path, Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn test_non_admin_is_forbidden_on_admin_pages() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in(&user(Role::Student, true)).await;

    let response = app.router.clone().oneshot(get("/admin/users", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_impersonation_banner_lifecycle() {
    let app = TestApp::new();
    let admin = user(Role::SuperAdmin, true);
    let target = user(Role::Student, true);
    let (_, cookie) = app.sign_in(&admin).await;
    app.api.register(target.clone(), common::PASSWORD).await;

    // No banner before impersonating.
    let response = app.router.clone().oneshot(get("/admin", Some(&cookie))).await.unwrap();
    assert!(body_json(response).await.get("banner").is_none());

    let uri = format!("/admin/users/{}/impersonate", target.id);
    let response = app
        .router
        .clone()
        .oneshot(request("POST", &uri, Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["redirect_to"], "/dashboard");

    let response = app.router.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["user"]["id"], target.id.to_string());
    assert_eq!(body["banner"]["user_id"], target.id.to_string());
    assert_eq!(body["banner"]["admin_name"], admin.name.as_str());
    assert_eq!(body["banner"]["exit_action"], "/impersonation/exit");

    // Never on the login screen.
    let response = app.router.clone().oneshot(get("/login", Some(&cookie))).await.unwrap();
    assert!(body_json(response).await.get("banner").is_none());

    // The impersonated student cannot reach the admin screens.
    let response = app.router.clone().oneshot(get("/admin", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router
        .clone()
        .oneshot(request("POST", "/impersonation/exit", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], admin.id.to_string());
    assert_eq!(body["redirect_to"], "/admin");

    let response = app.router.clone().oneshot(get("/admin", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await.get("banner").is_none());
}

#[tokio::test]
async fn test_exit_reachable_while_impersonating_incomplete_user() {
    let app = TestApp::new();
    let admin = user(Role::SuperAdmin, true);
    let target = user(Role::Affiliate, false);
    let (_, cookie) = app.sign_in(&admin).await;
    app.api.register(target.clone(), common::PASSWORD).await;

    let uri = format!("/admin/users/{}/impersonate", target.id);
    app.router
        .clone()
        .oneshot(request("POST", &uri, Some(&cookie), None))
        .await
        .unwrap();

    // The target's profile is incomplete, so page content is locked...
    let response = app.router.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(location(&response), Some("/onboarding"));

    // ...but the way back still works.
    let response = app
        .router
        .clone()
        .oneshot(request("POST", "/impersonation/exit", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_exit_without_impersonation_conflicts() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in(&user(Role::SuperAdmin, true)).await;

    let response = app
        .router
        .clone()
        .oneshot(request("POST", "/impersonation/exit", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_cannot_impersonate_self() {
    let app = TestApp::new();
    let admin = user(Role::SuperAdmin, true);
    let (_, cookie) = app.sign_in(&admin).await;

    let uri = format!("/admin/users/{}/impersonate", admin.id);
    let response = app
        .router
        .clone()
        .oneshot(request("POST", &uri, Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
