use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use super::page;
use crate::{
    AppState,
    auth::AuthContext,
    error::AppError,
    models::{BlogPost, Faq, HomePage, Material, PageView},
    routing,
    services::{account, content, support},
};

/// home
///
/// [Public Route] Landing page: site settings and the latest blog posts.
#[utoipa::path(get, path = "/", responses((status = 200, description = "Home page", body = HomePage)))]
pub async fn home(State(state): State<AppState>, ctx: AuthContext) -> Json<PageView<HomePage>> {
    let api = state.api.as_ref();
    let data = HomePage {
        settings: account::settings(api).await,
        latest_posts: content::latest_posts(api).await,
    };
    page("home", &ctx, routing::HOME, data)
}

/// blog_index
///
/// [Public Route] Every published post, newest first.
#[utoipa::path(get, path = "/blog", responses((status = 200, description = "Blog", body = [BlogPost])))]
pub async fn blog_index(State(state): State<AppState>, ctx: AuthContext) -> Json<PageView<Vec<BlogPost>>> {
    let mut posts = content::posts(state.api.as_ref()).await;
    posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    page("blog", &ctx, "/blog", posts)
}

#[utoipa::path(
    get,
    path = "/blog/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post", body = BlogPost),
        (status = 404, description = "Not Found")
    )
)]
pub async fn blog_post(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(slug): Path<String>,
) -> Result<Json<PageView<BlogPost>>, StatusCode> {
    match content::post(state.api.as_ref(), &slug).await {
        Some(post) => Ok(page("blog_post", &ctx, "/blog", post)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct MaterialFilter {
    /// Optional subject filter, case-insensitive.
    pub subject: Option<String>,
}

/// materials_index
///
/// [Public Route] The materials library, optionally narrowed to one subject.
#[utoipa::path(
    get,
    path = "/materials",
    params(MaterialFilter),
    responses((status = 200, description = "Materials", body = [Material]))
)]
pub async fn materials_index(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(filter): Query<MaterialFilter>,
) -> Json<PageView<Vec<Material>>> {
    let materials = content::materials(state.api.as_ref(), filter.subject.as_deref()).await;
    page("materials", &ctx, "/materials", materials)
}

#[utoipa::path(
    get,
    path = "/materials/{id}",
    params(("id" = Uuid, Path, description = "Material ID")),
    responses(
        (status = 200, description = "Material", body = Material),
        (status = 404, description = "Not Found")
    )
)]
pub async fn material_detail(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<PageView<Material>>, StatusCode> {
    match content::material(state.api.as_ref(), id).await {
        Some(material) => Ok(page("material", &ctx, "/materials", material)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// material_download
///
/// [Public Route] Sends the browser to a short-lived presigned URL for the file.
#[utoipa::path(
    get,
    path = "/materials/{id}/download",
    params(("id" = Uuid, Path, description = "Material ID")),
    responses(
        (status = 303, description = "Redirect to the file"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn material_download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let Some(material) = content::material(state.api.as_ref(), id).await else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };
    let url = state
        .storage
        .presign_download(&material.file_key)
        .await
        .map_err(AppError::Storage)?;
    Ok(Redirect::to(&url).into_response())
}

/// faqs
///
/// [Public Route] Published FAQs ordered by category then position.
#[utoipa::path(get, path = "/faqs", responses((status = 200, description = "FAQs", body = [Faq])))]
pub async fn faqs(State(state): State<AppState>, ctx: AuthContext) -> Json<PageView<Vec<Faq>>> {
    let faqs = support::published_faqs(state.api.as_ref()).await;
    page("faqs", &ctx, "/faqs", faqs)
}
