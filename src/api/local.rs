use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::PlatformApi;
use crate::{
    error::ApiError,
    models::{
        AuthGrant, BlogPost, ChatMessage, CreateInquiryRequest, CreateMaterialRequest,
        CreateReplyRequest, CreateTicketRequest, Faq, FaqRequest, Inquiry, InquiryStatus,
        Material, Notification, ProfileUpdate, ResetPasswordRequest, SendMessageRequest,
        SystemSettings, Ticket, TicketReply, TicketScope, TicketStatus, UpdateTicketRequest,
        User,
    },
};

#[derive(Default)]
struct LocalData {
    users: HashMap<Uuid, (User, String)>,
    tokens: HashMap<String, Uuid>,
    // Google authorization codes accepted by `google_login`.
    google_codes: HashMap<String, Uuid>,
    reset_tokens: HashMap<String, Uuid>,
    tickets: Vec<Ticket>,
    inquiries: Vec<Inquiry>,
    notifications: Vec<Notification>,
    faqs: Vec<Faq>,
    settings: SystemSettings,
    messages: Vec<ChatMessage>,
    posts: Vec<BlogPost>,
    materials: Vec<Material>,
}

impl LocalData {
    fn issue_token(&mut self, user_id: Uuid) -> String {
        let token = format!("local-{}", Uuid::new_v4().simple());
        self.tokens.insert(token.clone(), user_id);
        token
    }

    fn grant(&mut self, user_id: Uuid) -> Result<AuthGrant, ApiError> {
        let user = self.users.get(&user_id).map(|(u, _)| u.clone()).ok_or(ApiError::NotFound)?;
        let token = self.issue_token(user_id);
        Ok(AuthGrant { user, token })
    }

    fn resolve(&self, token: &str) -> Result<User, ApiError> {
        self.tokens
            .get(token)
            .and_then(|id| self.users.get(id))
            .map(|(user, _)| user.clone())
            .ok_or(ApiError::Status {
                status: 401,
                message: "invalid token".to_string(),
            })
    }

    fn resolve_admin(&self, token: &str) -> Result<User, ApiError> {
        let user = self.resolve(token)?;
        if !user.is_super_admin() {
            return Err(ApiError::Status {
                status: 403,
                message: "super_admin role required".to_string(),
            });
        }
        Ok(user)
    }

    fn user_mut(&mut self, id: Uuid) -> Result<&mut User, ApiError> {
        self.users.get_mut(&id).map(|(u, _)| u).ok_or(ApiError::NotFound)
    }

    /// The ticket `id`, if `user` may see it: owners see their own, admins see all.
    fn ticket_mut(&mut self, user: &User, id: Uuid) -> Result<&mut Ticket, ApiError> {
        self.tickets
            .iter_mut()
            .find(|t| t.id == id && (t.user_id == user.id || user.is_super_admin()))
            .ok_or(ApiError::NotFound)
    }
}

fn apply_profile(user: &mut User, update: &ProfileUpdate) {
    if let Some(name) = &update.name {
        user.name = name.clone();
    }
    if let Some(phone) = &update.phone {
        user.phone = Some(phone.clone());
    }
    if let Some(avatar_url) = &update.avatar_url {
        user.avatar_url = Some(avatar_url.clone());
    }
    if let Some(batch) = &update.batch {
        user.batch = Some(batch.clone());
    }
    if let Some(skills) = &update.skills {
        user.skills = skills.clone();
    }
    if let Some(topics) = &update.topics {
        user.topics = topics.clone();
    }
    if let Some(coupon_code) = &update.coupon_code {
        user.coupon_code = Some(coupon_code.clone());
    }
}

/// LocalPlatformApi
///
/// An in-memory platform API: the portal's local mock persistence. It honours
/// tokens and the super_admin checks the real API performs, so guard and
/// handler behaviour is the same against both. Nothing is persisted across restarts.
///
/// `new_failing` builds an instance whose every call fails, for exercising the
/// services' error policy.
#[derive(Default)]
pub struct LocalPlatformApi {
    data: RwLock<LocalData>,
    should_fail: bool,
}

impl LocalPlatformApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    fn check_available(&self) -> Result<(), ApiError> {
        if self.should_fail {
            return Err(ApiError::Unavailable("local API set to fail".to_string()));
        }
        Ok(())
    }

    /// Registers an account and returns a token for it.
    pub async fn register(&self, user: User, password: &str) -> String {
        let mut data = self.data.write().await;
        let id = user.id;
        data.users.insert(id, (user, password.to_string()));
        data.issue_token(id)
    }

    /// Makes `code` a valid Google authorization code for `user_id`.
    pub async fn register_google_code(&self, code: &str, user_id: Uuid) {
        self.data.write().await.google_codes.insert(code.to_string(), user_id);
    }

    /// Makes `token` a valid password-reset token for `user_id`.
    pub async fn register_reset_token(&self, token: &str, user_id: Uuid) {
        self.data.write().await.reset_tokens.insert(token.to_string(), user_id);
    }

    pub async fn publish_post(&self, post: BlogPost) {
        self.data.write().await.posts.push(post);
    }

    pub async fn notify(&self, notification: Notification) {
        self.data.write().await.notifications.push(notification);
    }
}

#[async_trait]
impl PlatformApi for LocalPlatformApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let id = data
            .users
            .values()
            .find(|(u, pw)| u.email.eq_ignore_ascii_case(email) && pw == password)
            .map(|(u, _)| u.id)
            .ok_or(ApiError::Status {
                status: 401,
                message: "invalid email or password".to_string(),
            })?;
        data.grant(id)
    }

    async fn google_login(&self, code: &str) -> Result<AuthGrant, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let id = data.google_codes.remove(code).ok_or(ApiError::Status {
            status: 401,
            message: "unknown authorization code".to_string(),
        })?;
        data.grant(id)
    }

    async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<(), ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let id = data.reset_tokens.remove(&req.token).ok_or(ApiError::Status {
            status: 400,
            message: "reset token expired or unknown".to_string(),
        })?;
        let (_, password) = data.users.get_mut(&id).ok_or(ApiError::NotFound)?;
        *password = req.new_password.clone();
        Ok(())
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<User, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let id = data.resolve(token)?.id;
        let user = data.user_mut(id)?;
        apply_profile(user, update);
        Ok(user.clone())
    }

    async fn complete_onboarding(&self, token: &str, update: &ProfileUpdate) -> Result<User, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let id = data.resolve(token)?.id;
        let user = data.user_mut(id)?;
        apply_profile(user, update);
        user.is_profile_complete = true;
        Ok(user.clone())
    }

    async fn list_users(&self, token: &str) -> Result<Vec<User>, ApiError> {
        self.check_available()?;
        let data = self.data.read().await;
        data.resolve_admin(token)?;
        let mut users: Vec<User> = data.users.values().map(|(u, _)| u.clone()).collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn impersonate(&self, token: &str, user_id: Uuid) -> Result<AuthGrant, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        data.resolve_admin(token)?;
        data.grant(user_id)
    }

    async fn list_tickets(&self, token: &str, scope: TicketScope) -> Result<Vec<Ticket>, ApiError> {
        self.check_available()?;
        let data = self.data.read().await;
        let user = match scope {
            TicketScope::Mine => data.resolve(token)?,
            TicketScope::All => data.resolve_admin(token)?,
        };
        Ok(data
            .tickets
            .iter()
            .filter(|t| scope == TicketScope::All || t.user_id == user.id)
            .cloned()
            .collect())
    }

    async fn get_ticket(&self, token: &str, id: Uuid) -> Result<Ticket, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let user = data.resolve(token)?;
        data.ticket_mut(&user, id).map(|t| t.clone())
    }

    async fn create_ticket(&self, token: &str, req: &CreateTicketRequest) -> Result<Ticket, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let user = data.resolve(token)?;
        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            user_id: user.id,
            subject: req.subject.clone(),
            description: req.description.clone(),
            category: req.category.clone(),
            priority: req.priority,
            status: TicketStatus::Open,
            replies: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        data.tickets.push(ticket.clone());
        Ok(ticket)
    }

    async fn update_ticket(&self, token: &str, id: Uuid, req: &UpdateTicketRequest) -> Result<Ticket, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let user = data.resolve(token)?;
        let ticket = data.ticket_mut(&user, id)?;
        if let Some(subject) = &req.subject {
            ticket.subject = subject.clone();
        }
        if let Some(description) = &req.description {
            ticket.description = description.clone();
        }
        if let Some(priority) = req.priority {
            ticket.priority = priority;
        }
        if let Some(status) = req.status {
            ticket.status = status;
        }
        ticket.updated_at = Utc::now();
        Ok(ticket.clone())
    }

    async fn delete_ticket(&self, token: &str, id: Uuid) -> Result<(), ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let user = data.resolve(token)?;
        data.ticket_mut(&user, id)?;
        data.tickets.retain(|t| t.id != id);
        Ok(())
    }

    async fn add_ticket_reply(&self, token: &str, id: Uuid, req: &CreateReplyRequest) -> Result<Ticket, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let user = data.resolve(token)?;
        let ticket = data.ticket_mut(&user, id)?;
        let now = Utc::now();
        ticket.replies.push(TicketReply {
            id: Uuid::new_v4(),
            author_id: user.id,
            author_name: user.name.clone(),
            message: req.message.clone(),
            created_at: now,
        });
        ticket.updated_at = now;
        Ok(ticket.clone())
    }

    async fn create_inquiry(&self, req: &CreateInquiryRequest) -> Result<Inquiry, ApiError> {
        self.check_available()?;
        let inquiry = Inquiry {
            id: Uuid::new_v4(),
            name: req.name.clone(),
            email: req.email.clone(),
            phone: req.phone.clone(),
            subject: req.subject.clone(),
            message: req.message.clone(),
            status: InquiryStatus::New,
            created_at: Utc::now(),
        };
        self.data.write().await.inquiries.push(inquiry.clone());
        Ok(inquiry)
    }

    async fn list_inquiries(&self, token: &str) -> Result<Vec<Inquiry>, ApiError> {
        self.check_available()?;
        let data = self.data.read().await;
        data.resolve_admin(token)?;
        Ok(data.inquiries.clone())
    }

    async fn update_inquiry_status(&self, token: &str, id: Uuid, status: InquiryStatus) -> Result<Inquiry, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        data.resolve_admin(token)?;
        let inquiry = data
            .inquiries
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(ApiError::NotFound)?;
        inquiry.status = status;
        Ok(inquiry.clone())
    }

    async fn delete_inquiry(&self, token: &str, id: Uuid) -> Result<(), ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        data.resolve_admin(token)?;
        let before = data.inquiries.len();
        data.inquiries.retain(|i| i.id != id);
        if data.inquiries.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn list_notifications(&self, token: &str) -> Result<Vec<Notification>, ApiError> {
        self.check_available()?;
        let data = self.data.read().await;
        let user = data.resolve(token)?;
        let mut mine: Vec<Notification> = data
            .notifications
            .iter()
            .filter(|n| n.user_id == user.id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }

    async fn mark_notification_read(&self, token: &str, id: Uuid) -> Result<(), ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let user = data.resolve(token)?;
        let notification = data
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user.id)
            .ok_or(ApiError::NotFound)?;
        notification.is_read = true;
        Ok(())
    }

    async fn list_faqs(&self, token: Option<&str>, published_only: bool) -> Result<Vec<Faq>, ApiError> {
        self.check_available()?;
        let data = self.data.read().await;
        // Drafts are only visible to admins.
        let include_drafts = !published_only
            && token.is_some_and(|t| data.resolve_admin(t).is_ok());
        let mut faqs: Vec<Faq> = data
            .faqs
            .iter()
            .filter(|f| include_drafts || f.is_published)
            .cloned()
            .collect();
        faqs.sort_by(|a, b| a.category.cmp(&b.category).then(a.position.cmp(&b.position)));
        Ok(faqs)
    }

    async fn create_faq(&self, token: &str, req: &FaqRequest) -> Result<Faq, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        data.resolve_admin(token)?;
        let faq = Faq {
            id: Uuid::new_v4(),
            question: req.question.clone(),
            answer: req.answer.clone(),
            category: req.category.clone(),
            position: req.position,
            is_published: req.is_published,
        };
        data.faqs.push(faq.clone());
        Ok(faq)
    }

    async fn update_faq(&self, token: &str, id: Uuid, req: &FaqRequest) -> Result<Faq, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        data.resolve_admin(token)?;
        let faq = data.faqs.iter_mut().find(|f| f.id == id).ok_or(ApiError::NotFound)?;
        faq.question = req.question.clone();
        faq.answer = req.answer.clone();
        faq.category = req.category.clone();
        faq.position = req.position;
        faq.is_published = req.is_published;
        Ok(faq.clone())
    }

    async fn delete_faq(&self, token: &str, id: Uuid) -> Result<(), ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        data.resolve_admin(token)?;
        let before = data.faqs.len();
        data.faqs.retain(|f| f.id != id);
        if data.faqs.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn get_settings(&self) -> Result<SystemSettings, ApiError> {
        self.check_available()?;
        Ok(self.data.read().await.settings.clone())
    }

    async fn update_settings(&self, token: &str, settings: &SystemSettings) -> Result<SystemSettings, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        data.resolve_admin(token)?;
        data.settings = settings.clone();
        Ok(data.settings.clone())
    }

    async fn list_messages(&self, token: &str, with: Option<Uuid>) -> Result<Vec<ChatMessage>, ApiError> {
        self.check_available()?;
        let data = self.data.read().await;
        let me = data.resolve(token)?.id;
        Ok(data
            .messages
            .iter()
            .filter(|m| m.sender_id == me || m.recipient_id == me)
            .filter(|m| with.is_none_or(|peer| m.sender_id == peer || m.recipient_id == peer))
            .cloned()
            .collect())
    }

    async fn send_message(&self, token: &str, req: &SendMessageRequest) -> Result<ChatMessage, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let me = data.resolve(token)?.id;
        if !data.users.contains_key(&req.recipient_id) {
            return Err(ApiError::NotFound);
        }
        let message = ChatMessage {
            id: Uuid::new_v4(),
            sender_id: me,
            recipient_id: req.recipient_id,
            body: req.body.clone(),
            created_at: Utc::now(),
        };
        data.messages.push(message.clone());
        Ok(message)
    }

    async fn list_posts(&self) -> Result<Vec<BlogPost>, ApiError> {
        self.check_available()?;
        let mut posts = self.data.read().await.posts.clone();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(posts)
    }

    async fn get_post(&self, slug: &str) -> Result<BlogPost, ApiError> {
        self.check_available()?;
        let data = self.data.read().await;
        data.posts
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn list_materials(&self, subject: Option<&str>) -> Result<Vec<Material>, ApiError> {
        self.check_available()?;
        let data = self.data.read().await;
        Ok(data
            .materials
            .iter()
            .filter(|m| subject.is_none_or(|s| m.subject.eq_ignore_ascii_case(s)))
            .cloned()
            .collect())
    }

    async fn get_material(&self, id: Uuid) -> Result<Material, ApiError> {
        self.check_available()?;
        let data = self.data.read().await;
        data.materials
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn create_material(&self, token: &str, req: &CreateMaterialRequest) -> Result<Material, ApiError> {
        self.check_available()?;
        let mut data = self.data.write().await;
        data.resolve_admin(token)?;
        let material = Material {
            id: Uuid::new_v4(),
            title: req.title.clone(),
            description: req.description.clone(),
            subject: req.subject.clone(),
            file_key: req.file_key.clone(),
            content_type: req.content_type.clone(),
            created_at: Utc::now(),
        };
        data.materials.push(material.clone());
        Ok(material)
    }
}
