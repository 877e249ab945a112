//! The remote platform API.
//!
//! The portal owns no business data: tickets, inquiries, FAQs, content and
//! user records all live behind the platform's HTTP API. `PlatformApi` is the
//! contract handlers talk to (through [`crate::services`]); `HttpPlatformApi`
//! is the production client and `LocalPlatformApi` the in-memory stand-in for
//! local development and tests.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{
        AuthGrant, BlogPost, ChatMessage, CreateInquiryRequest, CreateMaterialRequest,
        CreateReplyRequest, CreateTicketRequest, Faq, FaqRequest, Inquiry, InquiryStatus,
        Material, Notification, ProfileUpdate, ResetPasswordRequest, SendMessageRequest,
        SystemSettings, Ticket, TicketScope, UpdateTicketRequest, User,
    },
};

pub mod http;
pub mod local;

pub use http::HttpPlatformApi;
pub use local::LocalPlatformApi;

/// PlatformApi
///
/// Every call is a single request with no retry. Calls that act on behalf of a
/// user take that user's bearer `token`.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    // --- Identity ---
    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant, ApiError>;
    async fn google_login(&self, code: &str) -> Result<AuthGrant, ApiError>;
    async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<(), ApiError>;
    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<User, ApiError>;
    // Saves the onboarding answers and flips `is_profile_complete`.
    async fn complete_onboarding(&self, token: &str, update: &ProfileUpdate) -> Result<User, ApiError>;
    async fn list_users(&self, token: &str) -> Result<Vec<User>, ApiError>;
    // Admin only: a grant for `user_id`, used to act as that user.
    async fn impersonate(&self, token: &str, user_id: Uuid) -> Result<AuthGrant, ApiError>;

    // --- Tickets ---
    async fn list_tickets(&self, token: &str, scope: TicketScope) -> Result<Vec<Ticket>, ApiError>;
    async fn get_ticket(&self, token: &str, id: Uuid) -> Result<Ticket, ApiError>;
    async fn create_ticket(&self, token: &str, req: &CreateTicketRequest) -> Result<Ticket, ApiError>;
    async fn update_ticket(&self, token: &str, id: Uuid, req: &UpdateTicketRequest) -> Result<Ticket, ApiError>;
    async fn delete_ticket(&self, token: &str, id: Uuid) -> Result<(), ApiError>;
    async fn add_ticket_reply(&self, token: &str, id: Uuid, req: &CreateReplyRequest) -> Result<Ticket, ApiError>;

    // --- Inquiries ---
    async fn create_inquiry(&self, req: &CreateInquiryRequest) -> Result<Inquiry, ApiError>;
    async fn list_inquiries(&self, token: &str) -> Result<Vec<Inquiry>, ApiError>;
    async fn update_inquiry_status(&self, token: &str, id: Uuid, status: InquiryStatus) -> Result<Inquiry, ApiError>;
    async fn delete_inquiry(&self, token: &str, id: Uuid) -> Result<(), ApiError>;

    // --- Notifications ---
    async fn list_notifications(&self, token: &str) -> Result<Vec<Notification>, ApiError>;
    async fn mark_notification_read(&self, token: &str, id: Uuid) -> Result<(), ApiError>;

    // --- FAQs ---
    async fn list_faqs(&self, token: Option<&str>, published_only: bool) -> Result<Vec<Faq>, ApiError>;
    async fn create_faq(&self, token: &str, req: &FaqRequest) -> Result<Faq, ApiError>;
    async fn update_faq(&self, token: &str, id: Uuid, req: &FaqRequest) -> Result<Faq, ApiError>;
    async fn delete_faq(&self, token: &str, id: Uuid) -> Result<(), ApiError>;

    // --- System settings ---
    async fn get_settings(&self) -> Result<SystemSettings, ApiError>;
    async fn update_settings(&self, token: &str, settings: &SystemSettings) -> Result<SystemSettings, ApiError>;

    // --- Chat ---
    async fn list_messages(&self, token: &str, with: Option<Uuid>) -> Result<Vec<ChatMessage>, ApiError>;
    async fn send_message(&self, token: &str, req: &SendMessageRequest) -> Result<ChatMessage, ApiError>;

    // --- Content ---
    async fn list_posts(&self) -> Result<Vec<BlogPost>, ApiError>;
    async fn get_post(&self, slug: &str) -> Result<BlogPost, ApiError>;
    async fn list_materials(&self, subject: Option<&str>) -> Result<Vec<Material>, ApiError>;
    async fn get_material(&self, id: Uuid) -> Result<Material, ApiError>;
    async fn create_material(&self, token: &str, req: &CreateMaterialRequest) -> Result<Material, ApiError>;
}

/// PlatformApiState
///
/// The concrete type used to share the platform client across the application state.
pub type PlatformApiState = Arc<dyn PlatformApi>;
