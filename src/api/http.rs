use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::PlatformApi;
use crate::{
    error::ApiError,
    models::{
        AuthGrant, BlogPost, ChatMessage, CreateInquiryRequest, CreateMaterialRequest,
        CreateReplyRequest, CreateTicketRequest, Faq, FaqRequest, Inquiry, InquiryStatus,
        Material, Notification, ProfileUpdate, ResetPasswordRequest, SendMessageRequest,
        SystemSettings, Ticket, TicketScope, UpdateTicketRequest, User,
        UpdateInquiryStatusRequest,
    },
};

/// HttpPlatformApi
///
/// JSON-over-HTTP client for the platform API. Authenticated calls send the
/// user's token as `Authorization: Bearer`.
#[derive(Clone)]
pub struct HttpPlatformApi {
    client: Client,
    base_url: String,
}

impl HttpPlatformApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Maps non-2xx answers onto `ApiError`, keeping the remote message.
    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::check(builder.send().await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        Self::check(builder.send().await?).await.map(|_| ())
    }
}

#[async_trait]
impl PlatformApi for HttpPlatformApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        self.fetch(self.request(Method::POST, "/auth/login", None).json(&body))
            .await
    }

    async fn google_login(&self, code: &str) -> Result<AuthGrant, ApiError> {
        let body = serde_json::json!({ "code": code });
        self.fetch(self.request(Method::POST, "/auth/google", None).json(&body))
            .await
    }

    async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<(), ApiError> {
        self.execute(self.request(Method::POST, "/auth/reset-password", None).json(req))
            .await
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<User, ApiError> {
        self.fetch(self.request(Method::PUT, "/users/me", Some(token)).json(update))
            .await
    }

    async fn complete_onboarding(&self, token: &str, update: &ProfileUpdate) -> Result<User, ApiError> {
        self.fetch(
            self.request(Method::POST, "/users/me/onboarding", Some(token))
                .json(update),
        )
        .await
    }

    async fn list_users(&self, token: &str) -> Result<Vec<User>, ApiError> {
        self.fetch(self.request(Method::GET, "/users", Some(token)))
            .await
    }

    async fn impersonate(&self, token: &str, user_id: Uuid) -> Result<AuthGrant, ApiError> {
        let path = format!("/users/{user_id}/impersonate");
        self.fetch(self.request(Method::POST, &path, Some(token)))
            .await
    }

    async fn list_tickets(&self, token: &str, scope: TicketScope) -> Result<Vec<Ticket>, ApiError> {
        let scope = match scope {
            TicketScope::Mine => "mine",
            TicketScope::All => "all",
        };
        self.fetch(
            self.request(Method::GET, "/tickets", Some(token))
                .query(&[("scope", scope)]),
        )
        .await
    }

    async fn get_ticket(&self, token: &str, id: Uuid) -> Result<Ticket, ApiError> {
        self.fetch(self.request(Method::GET, &format!("/tickets/{id}"), Some(token)))
            .await
    }

    async fn create_ticket(&self, token: &str, req: &CreateTicketRequest) -> Result<Ticket, ApiError> {
        self.fetch(self.request(Method::POST, "/tickets", Some(token)).json(req))
            .await
    }

    async fn update_ticket(&self, token: &str, id: Uuid, req: &UpdateTicketRequest) -> Result<Ticket, ApiError> {
        self.fetch(
            self.request(Method::PATCH, &format!("/tickets/{id}"), Some(token))
                .json(req),
        )
        .await
    }

    async fn delete_ticket(&self, token: &str, id: Uuid) -> Result<(), ApiError> {
        self.execute(self.request(Method::DELETE, &format!("/tickets/{id}"), Some(token)))
            .await
    }

    async fn add_ticket_reply(&self, token: &str, id: Uuid, req: &CreateReplyRequest) -> Result<Ticket, ApiError> {
        self.fetch(
            self.request(Method::POST, &format!("/tickets/{id}/replies"), Some(token))
                .json(req),
        )
        .await
    }

    async fn create_inquiry(&self, req: &CreateInquiryRequest) -> Result<Inquiry, ApiError> {
        self.fetch(self.request(Method::POST, "/inquiries", None).json(req))
            .await
    }

    async fn list_inquiries(&self, token: &str) -> Result<Vec<Inquiry>, ApiError> {
        self.fetch(self.request(Method::GET, "/inquiries", Some(token)))
            .await
    }

    async fn update_inquiry_status(&self, token: &str, id: Uuid, status: InquiryStatus) -> Result<Inquiry, ApiError> {
        self.fetch(
            self.request(Method::PATCH, &format!("/inquiries/{id}"), Some(token))
                .json(&UpdateInquiryStatusRequest { status }),
        )
        .await
    }

    async fn delete_inquiry(&self, token: &str, id: Uuid) -> Result<(), ApiError> {
        self.execute(self.request(Method::DELETE, &format!("/inquiries/{id}"), Some(token)))
            .await
    }

    async fn list_notifications(&self, token: &str) -> Result<Vec<Notification>, ApiError> {
        self.fetch(self.request(Method::GET, "/notifications", Some(token)))
            .await
    }

    async fn mark_notification_read(&self, token: &str, id: Uuid) -> Result<(), ApiError> {
        let path = format!("/notifications/{id}/read");
        self.execute(self.request(Method::PATCH, &path, Some(token)))
            .await
    }

    async fn list_faqs(&self, token: Option<&str>, published_only: bool) -> Result<Vec<Faq>, ApiError> {
        self.fetch(
            self.request(Method::GET, "/faqs", token)
                .query(&[("published", published_only)]),
        )
        .await
    }

    async fn create_faq(&self, token: &str, req: &FaqRequest) -> Result<Faq, ApiError> {
        self.fetch(self.request(Method::POST, "/faqs", Some(token)).json(req))
            .await
    }

    async fn update_faq(&self, token: &str, id: Uuid, req: &FaqRequest) -> Result<Faq, ApiError> {
        self.fetch(
            self.request(Method::PUT, &format!("/faqs/{id}"), Some(token))
                .json(req),
        )
        .await
    }

    async fn delete_faq(&self, token: &str, id: Uuid) -> Result<(), ApiError> {
        self.execute(self.request(Method::DELETE, &format!("/faqs/{id}"), Some(token)))
            .await
    }

    async fn get_settings(&self) -> Result<SystemSettings, ApiError> {
        self.fetch(self.request(Method::GET, "/settings", None))
            .await
    }

    async fn update_settings(&self, token: &str, settings: &SystemSettings) -> Result<SystemSettings, ApiError> {
        self.fetch(self.request(Method::PUT, "/settings", Some(token)).json(settings))
            .await
    }

    async fn list_messages(&self, token: &str, with: Option<Uuid>) -> Result<Vec<ChatMessage>, ApiError> {
        let mut builder = self.request(Method::GET, "/chat/messages", Some(token));
        if let Some(with) = with {
            builder = builder.query(&[("with", with.to_string())]);
        }
        self.fetch(builder).await
    }

    async fn send_message(&self, token: &str, req: &SendMessageRequest) -> Result<ChatMessage, ApiError> {
        self.fetch(
            self.request(Method::POST, "/chat/messages", Some(token))
                .json(req),
        )
        .await
    }

    async fn list_posts(&self) -> Result<Vec<BlogPost>, ApiError> {
        self.fetch(self.request(Method::GET, "/blog/posts", None))
            .await
    }

    async fn get_post(&self, slug: &str) -> Result<BlogPost, ApiError> {
        let path = format!("/blog/posts/{}", urlencoding::encode(slug));
        self.fetch(self.request(Method::GET, &path, None)).await
    }

    async fn list_materials(&self, subject: Option<&str>) -> Result<Vec<Material>, ApiError> {
        let mut builder = self.request(Method::GET, "/materials", None);
        if let Some(subject) = subject {
            builder = builder.query(&[("subject", subject)]);
        }
        self.fetch(builder).await
    }

    async fn get_material(&self, id: Uuid) -> Result<Material, ApiError> {
        self.fetch(self.request(Method::GET, &format!("/materials/{id}"), None))
            .await
    }

    async fn create_material(&self, token: &str, req: &CreateMaterialRequest) -> Result<Material, ApiError> {
        self.fetch(self.request(Method::POST, "/materials", Some(token)).json(req))
            .await
    }
}
