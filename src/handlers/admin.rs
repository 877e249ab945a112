use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::page;
use crate::{
    AppState,
    auth::{AuthContext, SuperAdmin},
    error::AppError,
    models::{
        AdminDashboardStats, CreateMaterialRequest, Faq, FaqRequest, Inquiry, InquiryStatus,
        LoginOutcome, Material, PageView, PresignedUrlRequest, PresignedUrlResponse,
        SystemSettings, Ticket, TicketScope, UpdateInquiryStatusRequest, User,
    },
    routing,
    services::{account, content, support},
    storage,
};

/// dashboard
///
/// [Admin Route] Headline counters for the admin landing page.
#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Admin dashboard", body = AdminDashboardStats),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    ctx: AuthContext,
    SuperAdmin { token, .. }: SuperAdmin,
) -> Json<PageView<AdminDashboardStats>> {
    let api = state.api.as_ref();
    let tickets = support::list_tickets(api, &token, TicketScope::All).await;
    let inquiries = support::list_inquiries(api, &token).await;
    let users = account::list_users(api, &token).await;

    let stats = AdminDashboardStats {
        open_tickets: support::count_open(&tickets),
        new_inquiries: inquiries
            .iter()
            .filter(|i| i.status == InquiryStatus::New)
            .count(),
        total_users: users.len(),
        incomplete_profiles: users.iter().filter(|u| !u.is_profile_complete).count(),
    };
    page("admin_dashboard", &ctx, routing::ADMIN, stats)
}

#[utoipa::path(
    get,
    path = "/admin/tickets",
    responses((status = 200, description = "Every ticket", body = [Ticket]))
)]
pub async fn tickets(
    State(state): State<AppState>,
    ctx: AuthContext,
    SuperAdmin { token, .. }: SuperAdmin,
) -> Json<PageView<Vec<Ticket>>> {
    let tickets = support::list_tickets(state.api.as_ref(), &token, TicketScope::All).await;
    page("admin_tickets", &ctx, "/admin/tickets", tickets)
}

// --- Inquiries ---

#[utoipa::path(
    get,
    path = "/admin/inquiries",
    responses((status = 200, description = "Contact inquiries", body = [Inquiry]))
)]
pub async fn inquiries(
    State(state): State<AppState>,
    ctx: AuthContext,
    SuperAdmin { token, .. }: SuperAdmin,
) -> Json<PageView<Vec<Inquiry>>> {
    let inquiries = support::list_inquiries(state.api.as_ref(), &token).await;
    page("admin_inquiries", &ctx, "/admin/inquiries", inquiries)
}

#[utoipa::path(
    put,
    path = "/admin/inquiries/{id}",
    params(("id" = Uuid, Path, description = "Inquiry ID")),
    request_body = UpdateInquiryStatusRequest,
    responses((status = 200, description = "Updated", body = Inquiry))
)]
pub async fn update_inquiry(
    State(state): State<AppState>,
    SuperAdmin { token, .. }: SuperAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInquiryStatusRequest>,
) -> Result<Json<Inquiry>, AppError> {
    let inquiry = support::set_inquiry_status(state.api.as_ref(), &token, id, payload.status).await?;
    Ok(Json(inquiry))
}

#[utoipa::path(
    delete,
    path = "/admin/inquiries/{id}",
    params(("id" = Uuid, Path, description = "Inquiry ID")),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_inquiry(
    State(state): State<AppState>,
    SuperAdmin { token, .. }: SuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    support::delete_inquiry(state.api.as_ref(), &token, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- FAQs ---

#[utoipa::path(
    get,
    path = "/admin/faqs",
    responses((status = 200, description = "Every FAQ, drafts included", body = [Faq]))
)]
pub async fn faqs(
    State(state): State<AppState>,
    ctx: AuthContext,
    SuperAdmin { token, .. }: SuperAdmin,
) -> Json<PageView<Vec<Faq>>> {
    let faqs = support::all_faqs(state.api.as_ref(), &token).await;
    page("admin_faqs", &ctx, "/admin/faqs", faqs)
}

fn validate_faq(req: &FaqRequest) -> Result<(), AppError> {
    if req.question.trim().is_empty() || req.answer.trim().is_empty() {
        return Err(AppError::Validation("question and answer are required".to_string()));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/admin/faqs",
    request_body = FaqRequest,
    responses((status = 201, description = "Created", body = Faq))
)]
pub async fn create_faq(
    State(state): State<AppState>,
    SuperAdmin { token, .. }: SuperAdmin,
    Json(payload): Json<FaqRequest>,
) -> Result<(StatusCode, Json<Faq>), AppError> {
    validate_faq(&payload)?;
    let faq = support::create_faq(state.api.as_ref(), &token, &payload).await?;
    Ok((StatusCode::CREATED, Json(faq)))
}

#[utoipa::path(
    put,
    path = "/admin/faqs/{id}",
    params(("id" = Uuid, Path, description = "FAQ ID")),
    request_body = FaqRequest,
    responses((status = 200, description = "Updated", body = Faq))
)]
pub async fn update_faq(
    State(state): State<AppState>,
    SuperAdmin { token, .. }: SuperAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<FaqRequest>,
) -> Result<Json<Faq>, AppError> {
    validate_faq(&payload)?;
    let faq = support::update_faq(state.api.as_ref(), &token, id, &payload).await?;
    Ok(Json(faq))
}

#[utoipa::path(
    delete,
    path = "/admin/faqs/{id}",
    params(("id" = Uuid, Path, description = "FAQ ID")),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_faq(
    State(state): State<AppState>,
    SuperAdmin { token, .. }: SuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    support::delete_faq(state.api.as_ref(), &token, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Settings ---

#[utoipa::path(
    get,
    path = "/admin/settings",
    responses((status = 200, description = "System settings", body = SystemSettings))
)]
pub async fn settings(
    State(state): State<AppState>,
    ctx: AuthContext,
    _admin: SuperAdmin,
) -> Json<PageView<SystemSettings>> {
    let settings = account::settings(state.api.as_ref()).await;
    page("admin_settings", &ctx, "/admin/settings", settings)
}

#[utoipa::path(
    put,
    path = "/admin/settings",
    request_body = SystemSettings,
    responses(
        (status = 200, description = "Saved", body = SystemSettings),
        (status = 502, description = "Not saved")
    )
)]
pub async fn update_settings(
    State(state): State<AppState>,
    SuperAdmin { token, .. }: SuperAdmin,
    Json(payload): Json<SystemSettings>,
) -> Result<Json<SystemSettings>, StatusCode> {
    account::update_settings(state.api.as_ref(), &token, &payload)
        .await
        .map(Json)
        .ok_or(StatusCode::BAD_GATEWAY)
}

// --- Users & impersonation ---

#[utoipa::path(get, path = "/admin/users", responses((status = 200, description = "Users", body = [User])))]
pub async fn users(
    State(state): State<AppState>,
    ctx: AuthContext,
    SuperAdmin { token, .. }: SuperAdmin,
) -> Json<PageView<Vec<User>>> {
    let users = account::list_users(state.api.as_ref(), &token).await;
    page("admin_users", &ctx, "/admin/users", users)
}

/// impersonate
///
/// [Admin Route] Signs the current session in as another user. The admin
/// identity is kept aside on the session until the banner's exit action
/// restores it.
#[utoipa::path(
    post,
    path = "/admin/users/{id}/impersonate",
    params(("id" = Uuid, Path, description = "User to impersonate")),
    responses(
        (status = 200, description = "Now acting as the target user", body = LoginOutcome),
        (status = 409, description = "Already impersonating"),
        (status = 422, description = "Cannot impersonate yourself")
    )
)]
pub async fn impersonate(
    State(state): State<AppState>,
    mut ctx: AuthContext,
    SuperAdmin { user: admin, token }: SuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<LoginOutcome>, AppError> {
    if admin.id == id {
        return Err(AppError::Validation("cannot impersonate yourself".to_string()));
    }

    let grant = account::impersonate(state.api.as_ref(), &token, id).await?;
    ctx.start_impersonation(grant.user.clone(), grant.token).await?;

    Ok(Json(LoginOutcome {
        user: grant.user,
        redirect_to: routing::DASHBOARD.to_string(),
    }))
}

// --- Materials ---

/// create_material
///
/// [Admin Route] Registers an uploaded file in the materials library.
#[utoipa::path(
    post,
    path = "/admin/materials",
    request_body = CreateMaterialRequest,
    responses(
        (status = 201, description = "Created", body = Material),
        (status = 422, description = "Unsupported file type")
    )
)]
pub async fn create_material(
    State(state): State<AppState>,
    SuperAdmin { token, .. }: SuperAdmin,
    Json(payload): Json<CreateMaterialRequest>,
) -> Result<(StatusCode, Json<Material>), AppError> {
    if !storage::is_allowed_material_type(&payload.content_type) {
        return Err(AppError::Validation(format!(
            "unsupported file type: {}",
            payload.content_type
        )));
    }
    let material = content::create_material(state.api.as_ref(), &token, &payload).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

/// material_upload_url
///
/// [Admin Route] Issues a presigned PUT URL. The browser uploads straight to
/// the bucket and then registers the returned `resource_key` via
/// `POST /admin/materials`.
#[utoipa::path(
    post,
    path = "/admin/materials/upload",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "Presigned URL generated", body = PresignedUrlResponse),
        (status = 422, description = "Unsupported file type"),
        (status = 500, description = "Storage Service Error")
    )
)]
pub async fn material_upload_url(
    State(state): State<AppState>,
    _admin: SuperAdmin,
    Json(payload): Json<PresignedUrlRequest>,
) -> Result<Json<PresignedUrlResponse>, AppError> {
    if !storage::is_allowed_material_type(&payload.file_type) {
        return Err(AppError::Validation(format!(
            "unsupported file type: {}",
            payload.file_type
        )));
    }

    let extension = payload
        .filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin");
    let key = format!("materials/{}.{}", Uuid::new_v4(), extension.to_ascii_lowercase());

    let upload_url = state
        .storage
        .presign_upload(&key, &payload.file_type)
        .await
        .map_err(AppError::Storage)?;

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key: key,
    }))
}
