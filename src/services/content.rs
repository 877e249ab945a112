use uuid::Uuid;

use super::{or_default, or_none, surfaced};
use crate::{
    api::PlatformApi,
    error::ApiError,
    models::{BlogPost, CreateMaterialRequest, Material},
};

/// Number of posts featured on the home page.
pub const LATEST_POSTS: usize = 3;

pub async fn posts(api: &dyn PlatformApi) -> Vec<BlogPost> {
    or_default("posts", api.list_posts().await)
}

pub async fn latest_posts(api: &dyn PlatformApi) -> Vec<BlogPost> {
    let mut posts = posts(api).await;
    posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    posts.truncate(LATEST_POSTS);
    posts
}

pub async fn post(api: &dyn PlatformApi, slug: &str) -> Option<BlogPost> {
    or_none("post", api.get_post(slug).await)
}

pub async fn materials(api: &dyn PlatformApi, subject: Option<&str>) -> Vec<Material> {
    or_default("materials", api.list_materials(subject).await)
}

pub async fn material(api: &dyn PlatformApi, id: Uuid) -> Option<Material> {
    or_none("material", api.get_material(id).await)
}

pub async fn create_material(
    api: &dyn PlatformApi,
    token: &str,
    req: &CreateMaterialRequest,
) -> Result<Material, ApiError> {
    surfaced("create_material", api.create_material(token, req).await)
}
