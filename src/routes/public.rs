use crate::{AppState, handlers::pages};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only pages any visitor may see. Content comes from the platform API;
/// a failed read renders an empty page rather than an error.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Landing page: site settings and the three latest posts.
        .route("/", get(pages::home))
        // GET /blog
        .route("/blog", get(pages::blog_index))
        // GET /blog/{slug}
        .route("/blog/{slug}", get(pages::blog_post))
        // GET /materials?subject=...
        // The materials library, optionally filtered by subject.
        .route("/materials", get(pages::materials_index))
        // GET /materials/{id}
        .route("/materials/{id}", get(pages::material_detail))
        // GET /materials/{id}/download
        // 303 to a one-hour presigned GET URL; the file never passes through the portal.
        .route("/materials/{id}/download", get(pages::material_download))
        // GET /faqs
        // Published FAQs only.
        .route("/faqs", get(pages::faqs))
}
