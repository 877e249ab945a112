mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{PASSWORD, TestApp, body_json, get, location, request, session_cookie, user};
use edu_portal::{
    LocalPlatformApi, MockStorageService,
    config::AppConfig,
    models::{BlogPost, Notification, Role},
    session::SessionStore,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

// --- Sign-in flows ---

#[tokio::test]
async fn test_password_login_sets_cookie_and_returns_to_from() {
    let app = TestApp::new();
    let student = user(Role::Student, true);
    app.api.register(student.clone(), PASSWORD).await;

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/login",
            None,
            Some(json!({ "email": student.email, "password": PASSWORD, "from": "/tickets" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).expect("session cookie");
    let body = body_json(response).await;
    assert_eq!(body["redirect_to"], "/tickets");
    assert_eq!(body["user"]["id"], student.id.to_string());

    let response = app.router.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_with_incomplete_profile_lands_on_onboarding() {
    let app = TestApp::new();
    let tutor = user(Role::Tutor, false);
    app.api.register(tutor.clone(), PASSWORD).await;

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/login",
            None,
            Some(json!({ "email": tutor.email, "password": PASSWORD, "from": "/dashboard" })),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["redirect_to"], "/onboarding");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials_and_open_redirects() {
    let app = TestApp::new();
    let student = user(Role::Student, true);
    app.api.register(student.clone(), PASSWORD).await;

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/login",
            None,
            Some(json!({ "email": student.email, "password": "wrong" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());
    assert!(body_json(response).await["error"].is_string());

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/login",
            None,
            Some(json!({ "email": student.email, "password": PASSWORD, "from": "//evil.example" })),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["redirect_to"], "/");

    // A tab between the slashes collapses to `//` in the browser.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/login",
            None,
            Some(json!({ "email": student.email, "password": PASSWORD, "from": "/\t/evil.example" })),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["redirect_to"], "/");
}

#[tokio::test]
async fn test_logout_clears_the_session() {
    let app = TestApp::new();
    let (sid, cookie) = app.sign_in(&user(Role::Student, true)).await;

    let response = app
        .router
        .clone()
        .oneshot(request("POST", "/logout", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(session_cookie(&response).as_deref(), Some("edu_session="));
    assert!(app.sessions.get_session(sid).await.unwrap().is_none());

    let response = app.router.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_google_callback() {
    let app = TestApp::new();
    let affiliate = user(Role::Affiliate, true);
    app.api.register(affiliate.clone(), PASSWORD).await;
    app.api.register_google_code("code-123", affiliate.id).await;

    let response = app
        .router
        .clone()
        .oneshot(get("/google-callback?code=code-123&state=%2Ffaqs", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/faqs"));
    assert!(session_cookie(&response).is_some());

    // Codes are single use.
    let response = app
        .router
        .clone()
        .oneshot(get("/google-callback?code=code-123", None))
        .await
        .unwrap();
    assert_eq!(location(&response), Some("/login?error=google_sign_in_failed"));

    app.api.register_google_code("code-456", affiliate.id).await;
    let response = app
        .router
        .clone()
        .oneshot(get("/google-callback?code=code-456&state=%2F%09%2Fevil.example", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn test_reset_password() {
    let app = TestApp::new();
    let student = user(Role::Student, true);
    app.api.register(student.clone(), PASSWORD).await;
    app.api.register_reset_token("reset-1", student.id).await;

    let short = request(
        "POST",
        "/reset-password",
        None,
        Some(json!({ "token": "reset-1", "new_password": "short" })),
    );
    let response = app.router.clone().oneshot(short).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let ok = request(
        "POST",
        "/reset-password",
        None,
        Some(json!({ "token": "reset-1", "new_password": "a-much-longer-one" })),
    );
    let response = app.router.clone().oneshot(ok).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let login = request(
        "POST",
        "/login",
        None,
        Some(json!({ "email": student.email, "password": "a-much-longer-one" })),
    );
    let response = app.router.clone().oneshot(login).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// --- Onboarding ---

#[tokio::test]
async fn test_complete_onboarding_unlocks_the_portal() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in(&user(Role::Student, false)).await;

    let missing = request("POST", "/onboarding", Some(&cookie), Some(json!({ "name": "Ada" })));
    let response = app.router.clone().oneshot(missing).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("phone") && error.contains("batch"));

    let complete = request(
        "POST",
        "/onboarding",
        Some(&cookie),
        Some(json!({ "name": "Ada", "phone": "+44 1234", "batch": "2026-A" })),
    );
    let response = app.router.clone().oneshot(complete).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["redirect_to"], "/");
    assert_eq!(body["user"]["is_profile_complete"], true);

    let response = app.router.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// --- Tickets ---

#[tokio::test]
async fn test_ticket_lifecycle() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in(&user(Role::Student, true)).await;

    let create = request(
        "POST",
        "/tickets",
        Some(&cookie),
        Some(json!({ "subject": "Cannot open notes", "description": "PDF fails", "category": "materials" })),
    );
    let response = app.router.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let ticket = body_json(response).await;
    let id = ticket["id"].as_str().unwrap().to_string();
    assert_eq!(ticket["status"], "open");

    let reply = request(
        "POST",
        &format!("/tickets/{id}/replies"),
        Some(&cookie),
        Some(json!({ "message": "Still broken" })),
    );
    let response = app.router.clone().oneshot(reply).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["replies"].as_array().unwrap().len(), 1);

    let update = request(
        "PUT",
        &format!("/tickets/{id}"),
        Some(&cookie),
        Some(json!({ "status": "resolved" })),
    );
    let response = app.router.clone().oneshot(update).await.unwrap();
    assert_eq!(body_json(response).await["status"], "resolved");

    let response = app.router.clone().oneshot(get("/tickets", Some(&cookie))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["page"], "tickets");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .router
        .clone()
        .oneshot(request("DELETE", &format!("/tickets/{id}"), Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/tickets/{id}"), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tickets_are_private_to_their_owner() {
    let app = TestApp::new();
    let (_, alice) = app.sign_in(&user(Role::Student, true)).await;
    let (_, bob) = app.sign_in(&user(Role::Student, true)).await;

    let create = request(
        "POST",
        "/tickets",
        Some(&alice),
        Some(json!({ "subject": "Mine", "description": "", "category": "general" })),
    );
    let ticket = body_json(app.router.clone().oneshot(create).await.unwrap()).await;
    let id = ticket["id"].as_str().unwrap();

    let response = app
        .router
        .clone()
        .oneshot(request("DELETE", &format!("/tickets/{id}"), Some(&bob), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// --- Notifications & chat ---

#[tokio::test]
async fn test_notifications_and_unread_count() {
    let app = TestApp::new();
    let student = user(Role::Student, true);
    let (_, cookie) = app.sign_in(&student).await;

    let notification_id = Uuid::new_v4();
    for (id, read) in [(notification_id, false), (Uuid::new_v4(), true)] {
        app.api
            .notify(Notification {
                id,
                user_id: student.id,
                title: "Reply".to_string(),
                message: "Your ticket has a reply".to_string(),
                kind: "ticket_reply".to_string(),
                is_read: read,
                created_at: Utc::now(),
                ..Default::default()
            })
            .await;
    }

    let response = app
        .router
        .clone()
        .oneshot(get("/notifications/unread-count", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["unread"], 1);

    let mark = request(
        "PATCH",
        &format!("/notifications/{notification_id}/read"),
        Some(&cookie),
        None,
    );
    let response = app.router.clone().oneshot(mark).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let unknown = request(
        "PATCH",
        &format!("/notifications/{}/read", Uuid::new_v4()),
        Some(&cookie),
        None,
    );
    let response = app.router.clone().oneshot(unknown).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .router
        .clone()
        .oneshot(get("/notifications/unread-count", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["unread"], 0);

    let response = app.router.clone().oneshot(get("/notifications", Some(&cookie))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["type"], "ticket_reply");
}

#[tokio::test]
async fn test_chat_send_and_list() {
    let app = TestApp::new();
    let student = user(Role::Student, true);
    let tutor = user(Role::Tutor, true);
    let (_, student_cookie) = app.sign_in(&student).await;
    let (_, tutor_cookie) = app.sign_in(&tutor).await;

    let send = request(
        "POST",
        "/chat",
        Some(&student_cookie),
        Some(json!({ "recipient_id": tutor.id, "body": "Hello!" })),
    );
    let response = app.router.clone().oneshot(send).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/chat?with={}", student.id), Some(&tutor_cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["body"], "Hello!");

    let to_nobody = request(
        "POST",
        "/chat",
        Some(&student_cookie),
        Some(json!({ "recipient_id": Uuid::new_v4(), "body": "?" })),
    );
    let response = app.router.clone().oneshot(to_nobody).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// --- Public content ---

#[tokio::test]
async fn test_home_shows_three_latest_posts() {
    let app = TestApp::new();
    for days_ago in 0..5 {
        app.api
            .publish_post(BlogPost {
                id: Uuid::new_v4(),
                slug: format!("post-{days_ago}"),
                title: format!("Post {days_ago}"),
                published_at: Utc::now() - Duration::days(days_ago),
                ..Default::default()
            })
            .await;
    }

    let response = app.router.clone().oneshot(get("/", None)).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["page"], "home");
    let latest = body["data"]["latest_posts"].as_array().unwrap();
    assert_eq!(latest.len(), 3);
    assert_eq!(latest[0]["slug"], "post-0");
    assert_eq!(body["data"]["settings"]["site_name"], "Edu Portal");

    let response = app.router.clone().oneshot(get("/blog/post-4", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.router.clone().oneshot(get("/blog/missing", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contact_form_files_an_inquiry() {
    let app = TestApp::new();
    let (_, admin_cookie) = app.sign_in(&user(Role::SuperAdmin, true)).await;

    let submit = request(
        "POST",
        "/contact",
        None,
        Some(json!({ "name": "Parent", "email": "parent@example.com", "subject": "Fees", "message": "How much?" })),
    );
    let response = app.router.clone().oneshot(submit).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app.router.clone().oneshot(get("/admin", Some(&admin_cookie))).await.unwrap();
    assert_eq!(body_json(response).await["data"]["new_inquiries"], 1);

    let update = request(
        "PUT",
        &format!("/admin/inquiries/{id}"),
        Some(&admin_cookie),
        Some(json!({ "status": "resolved" })),
    );
    let response = app.router.clone().oneshot(update).await.unwrap();
    assert_eq!(body_json(response).await["status"], "resolved");

    let empty = request("POST", "/contact", None, Some(json!({ "name": "", "email": "", "subject": "", "message": "" })));
    let response = app.router.clone().oneshot(empty).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- Admin ---

#[tokio::test]
async fn test_admin_faq_management_and_publication() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in(&user(Role::SuperAdmin, true)).await;

    for (question, published) in [("Published?", true), ("Draft?", false)] {
        let create = request(
            "POST",
            "/admin/faqs",
            Some(&cookie),
            Some(json!({ "question": question, "answer": "Yes", "category": "general", "position": 1, "is_published": published })),
        );
        let response = app.router.clone().oneshot(create).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.router.clone().oneshot(get("/faqs", None)).await.unwrap();
    let public = body_json(response).await;
    assert_eq!(public["data"].as_array().unwrap().len(), 1);

    let response = app.router.clone().oneshot(get("/admin/faqs", Some(&cookie))).await.unwrap();
    let all = body_json(response).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_settings_round_trip() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in(&user(Role::SuperAdmin, true)).await;

    let update = request(
        "PUT",
        "/admin/settings",
        Some(&cookie),
        Some(json!({ "site_name": "Campus", "support_email": "help@campus.test", "maintenance_mode": false, "allow_registrations": false })),
    );
    let response = app.router.clone().oneshot(update).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.router.clone().oneshot(get("/contact", None)).await.unwrap();
    assert_eq!(body_json(response).await["data"]["support_email"], "help@campus.test");
}

#[tokio::test]
async fn test_material_upload_register_and_download() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in(&user(Role::SuperAdmin, true)).await;

    let presign = request(
        "POST",
        "/admin/materials/upload",
        Some(&cookie),
        Some(json!({ "filename": "Week 3.PDF", "file_type": "application/pdf" })),
    );
    let response = app.router.clone().oneshot(presign).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let key = body["resource_key"].as_str().unwrap().to_string();
    assert!(key.starts_with("materials/") && key.ends_with(".pdf"));
    assert!(body["upload_url"].as_str().unwrap().contains("method=put"));

    let register = request(
        "POST",
        "/admin/materials",
        Some(&cookie),
        Some(json!({ "title": "Week 3", "description": "Notes", "subject": "Maths", "file_key": key, "content_type": "application/pdf" })),
    );
    let response = app.router.clone().oneshot(register).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app.router.clone().oneshot(get("/materials?subject=maths", None)).await.unwrap();
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/materials/{id}/download"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response).unwrap();
    assert!(target.contains(&key) && target.contains("method=get"));
}

#[tokio::test]
async fn test_material_rejects_unsupported_type() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in(&user(Role::SuperAdmin, true)).await;

    let presign = request(
        "POST",
        "/admin/materials/upload",
        Some(&cookie),
        Some(json!({ "filename": "run.exe", "file_type": "application/x-msdownload" })),
    );
    let response = app.router.clone().oneshot(presign).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_storage_failure_is_a_server_error() {
    let app = TestApp::build(
        AppConfig::default(),
        Arc::new(LocalPlatformApi::new()),
        MockStorageService::new_failing(),
    );
    let (_, cookie) = app.sign_in(&user(Role::SuperAdmin, true)).await;

    let presign = request(
        "POST",
        "/admin/materials/upload",
        Some(&cookie),
        Some(json!({ "filename": "notes.pdf", "file_type": "application/pdf" })),
    );
    let response = app.router.clone().oneshot(presign).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
