use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::banner::ImpersonationBanner;

// --- Identity ---

/// Role
///
/// The four portal roles. Routing and onboarding policy key off this value;
/// `SuperAdmin` is the only role allowed on the admin screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    #[default]
    Student,
    Tutor,
    Affiliate,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Student, Role::Tutor, Role::Affiliate, Role::SuperAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
            Role::Affiliate => "affiliate",
            Role::SuperAdmin => "super_admin",
        }
    }
}

/// User
///
/// The identity record held by the session. Role-specific fields are optional and
/// only filled for the role that owns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    // Gate for every route outside the onboarding allow-list.
    pub is_profile_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    // Student: enrolment batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    // Tutor: teaching skills and topics.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    // Affiliate: referral coupon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

impl User {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}

/// AuthGrant
///
/// What the platform API hands back on any successful sign-in flow
/// (password, Google, impersonation): the identity plus its bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthGrant {
    pub user: User,
    pub token: String,
}

/// LoginRequest
///
/// Input payload for `POST /login`. `from` is the protected location the
/// visitor was bounced from and is honoured after sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub from: Option<String>,
}

/// LoginOutcome
///
/// Response of every sign-in style action: who is signed in now and where the
/// client should navigate next.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginOutcome {
    pub user: User,
    pub redirect_to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// ProfileUpdate
///
/// Payload for onboarding completion and later profile edits. Only provided
/// fields are forwarded to the platform API.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

// --- Support tickets ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TicketReply {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub message: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Ticket
///
/// A support request raised by any signed-in user and worked by the admins.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub description: String,
    pub category: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    #[serde(default)]
    pub replies: Vec<TicketReply>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub priority: TicketPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateTicketRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TicketPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateReplyRequest {
    pub message: String,
}

/// Which tickets a listing covers: the caller's own, or every ticket (admin queue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketScope {
    Mine,
    All,
}

// --- Contact inquiries ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum InquiryStatus {
    #[default]
    New,
    InProgress,
    Resolved,
}

/// Inquiry
///
/// A message left through the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Inquiry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: InquiryStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateInquiryRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateInquiryStatusRequest {
    pub status: InquiryStatus,
}

// --- Notifications ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    // Free-form category such as "ticket_reply" or "announcement".
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub is_read: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UnreadCount {
    pub unread: usize,
}

// --- FAQs ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Faq {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub category: String,
    // Display order inside its category, ascending.
    pub position: i32,
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FaqRequest {
    pub question: String,
    pub answer: String,
    pub category: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub is_published: bool,
}

// --- System settings ---

/// SystemSettings
///
/// Site-wide switches managed from the admin settings screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SystemSettings {
    pub site_name: String,
    pub support_email: String,
    pub maintenance_mode: bool,
    pub allow_registrations: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            site_name: "Edu Portal".to_string(),
            support_email: "support@example.com".to_string(),
            maintenance_mode: false,
            allow_registrations: true,
        }
    }
}

// --- Chat ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    pub body: String,
}

// --- Content: blog & materials ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct BlogPost {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub body: String,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[ts(type = "string")]
    pub published_at: DateTime<Utc>,
}

/// Material
///
/// An entry of the materials library. `file_key` is the object key in the
/// materials bucket; downloads go through a presigned URL.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Material {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub file_key: String,
    pub content_type: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateMaterialRequest {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub file_key: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    #[schema(example = "week-3-notes.pdf")]
    pub filename: String,
    #[schema(example = "application/pdf")]
    pub file_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    pub upload_url: String,
    pub resource_key: String,
}

// --- Page envelopes ---

/// PageView
///
/// Envelope returned by every page route. `banner` is present only while an
/// admin is impersonating someone and the page is not the login screen.
#[derive(Debug, Clone, Serialize)]
pub struct PageView<T> {
    pub page: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<ImpersonationBanner>,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct HomePage {
    pub settings: SystemSettings,
    pub latest_posts: Vec<BlogPost>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DashboardPage {
    pub user: User,
    pub unread_notifications: usize,
    pub open_tickets: usize,
    pub recent_notifications: Vec<Notification>,
}

/// OnboardingPage
///
/// What the onboarding form needs: the current user and the fields their role
/// must fill in before the rest of the portal unlocks.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct OnboardingPage {
    pub user: User,
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub open_tickets: usize,
    pub new_inquiries: usize,
    pub total_users: usize,
    pub incomplete_profiles: usize,
}
