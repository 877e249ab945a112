use crate::{AppState, handlers::admin};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Back-office pages, nested under `/admin`. Every handler takes the
/// `SuperAdmin` extractor, which answers 403 for any other role.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // Counters: open tickets, new inquiries, users, incomplete profiles.
        .route("/", get(admin::dashboard))
        // GET /admin/tickets
        // The whole ticket queue, not just the admin's own.
        .route("/tickets", get(admin::tickets))
        // GET /admin/inquiries
        .route("/inquiries", get(admin::inquiries))
        // PUT|DELETE /admin/inquiries/{id}
        .route(
            "/inquiries/{id}",
            put(admin::update_inquiry).delete(admin::delete_inquiry),
        )
        // GET|POST /admin/faqs
        // Drafts included.
        .route("/faqs", get(admin::faqs).post(admin::create_faq))
        // PUT|DELETE /admin/faqs/{id}
        .route("/faqs/{id}", put(admin::update_faq).delete(admin::delete_faq))
        // GET|PUT /admin/settings
        .route("/settings", get(admin::settings).put(admin::update_settings))
        // GET /admin/users
        .route("/users", get(admin::users))
        // POST /admin/users/{id}/impersonate
        // Starts acting as the user. The banner offers the way back.
        .route("/users/{id}/impersonate", post(admin::impersonate))
        // POST /admin/materials
        // Registers a file already uploaded through the presigned URL below.
        .route("/materials", post(admin::create_material))
        // POST /admin/materials/upload
        // Issues a ten-minute presigned PUT URL for a new material file.
        .route("/materials/upload", post(admin::material_upload_url))
}
