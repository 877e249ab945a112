use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access policy: pure route decisions, the guard middleware and the banner.
pub mod access;
pub mod banner;
pub mod guards;
pub mod routing;

// Identity: the signed session cookie, the per-request context and its store.
pub mod auth;
pub mod session;

// Backends: the remote platform API and object storage for materials.
pub mod api;
pub mod services;
pub mod storage;

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

// Module for routing segregation (Gateway, Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, gateway, public};

// --- Public Re-exports ---

pub use api::{HttpPlatformApi, LocalPlatformApi, PlatformApiState};
pub use auth::AuthContext;
pub use config::AppConfig;
pub use session::{MemorySessionStore, PostgresSessionStore, SessionStoreState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for every page and action, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::gateway::login_page, handlers::gateway::login, handlers::gateway::logout,
        handlers::gateway::google_callback, handlers::gateway::reset_password_page,
        handlers::gateway::reset_password, handlers::gateway::contact_page,
        handlers::gateway::submit_contact, handlers::gateway::exit_impersonation,
        handlers::pages::home, handlers::pages::blog_index, handlers::pages::blog_post,
        handlers::pages::materials_index, handlers::pages::material_detail,
        handlers::pages::material_download, handlers::pages::faqs,
        handlers::account::onboarding_page, handlers::account::complete_onboarding,
        handlers::account::dashboard, handlers::account::profile, handlers::account::update_profile,
        handlers::account::tickets, handlers::account::create_ticket, handlers::account::ticket,
        handlers::account::update_ticket, handlers::account::delete_ticket,
        handlers::account::reply_to_ticket, handlers::account::notifications,
        handlers::account::unread_count, handlers::account::mark_notification_read,
        handlers::account::chat, handlers::account::send_chat,
        handlers::admin::dashboard, handlers::admin::tickets, handlers::admin::inquiries,
        handlers::admin::update_inquiry, handlers::admin::delete_inquiry, handlers::admin::faqs,
        handlers::admin::create_faq, handlers::admin::update_faq, handlers::admin::delete_faq,
        handlers::admin::settings, handlers::admin::update_settings, handlers::admin::users,
        handlers::admin::impersonate, handlers::admin::create_material,
        handlers::admin::material_upload_url
    ),
    components(
        schemas(
            models::Role, models::User, models::LoginRequest, models::LoginOutcome,
            models::ResetPasswordRequest, models::ProfileUpdate, models::Ticket,
            models::TicketReply, models::TicketStatus, models::TicketPriority,
            models::CreateTicketRequest, models::UpdateTicketRequest, models::CreateReplyRequest,
            models::Inquiry, models::InquiryStatus, models::CreateInquiryRequest,
            models::UpdateInquiryStatusRequest, models::Notification, models::UnreadCount,
            models::Faq, models::FaqRequest, models::SystemSettings, models::ChatMessage,
            models::SendMessageRequest, models::BlogPost, models::Material,
            models::CreateMaterialRequest, models::PresignedUrlRequest,
            models::PresignedUrlResponse, models::HomePage, models::DashboardPage,
            models::OnboardingPage, models::AdminDashboardStats,
        )
    ),
    tags(
        (name = "edu-portal", description = "Education portal pages and actions")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single container of shared services handed to every handler and guard.
#[derive(Clone)]
pub struct AppState {
    /// Per-browser sessions: who is signed in, and who they really are while impersonating.
    pub sessions: SessionStoreState,
    /// The remote platform API that owns users, tickets, content and settings.
    pub api: PlatformApiState,
    /// Presigned URLs for material files.
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for SessionStoreState {
    fn from_ref(app_state: &AppState) -> SessionStoreState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for PlatformApiState {
    fn from_ref(app_state: &AppState) -> PlatformApiState {
        app_state.api.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure. Each page group gets its route guard as a
/// `route_layer`, and the onboarding guard wraps all page content. Session
/// actions and the health probe sit outside both.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Page Routers
    let public_pages = public::public_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        guards::public_route,
    ));

    let protected_pages = authenticated::authenticated_routes()
        .nest("/admin", admin::admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guards::protected_route,
        ));

    // Everything that renders page content answers to the onboarding guard.
    let pages = Router::new()
        .merge(gateway::gateway_routes())
        .merge(public_pages)
        .merge(protected_pages)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guards::onboarding_guard,
        ));

    // 3. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(gateway::session_routes())
        .merge(pages)
        .with_state(state);

    // 4. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set above so
/// every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
