use uuid::Uuid;

use super::{or_default, or_none, surfaced};
use crate::{
    api::PlatformApi,
    error::ApiError,
    models::{
        CreateInquiryRequest, CreateReplyRequest, CreateTicketRequest, Faq, FaqRequest, Inquiry,
        InquiryStatus, Ticket, TicketScope, TicketStatus, UpdateTicketRequest,
    },
};

// --- Tickets ---

pub async fn list_tickets(api: &dyn PlatformApi, token: &str, scope: TicketScope) -> Vec<Ticket> {
    or_default("list_tickets", api.list_tickets(token, scope).await)
}

pub async fn get_ticket(api: &dyn PlatformApi, token: &str, id: Uuid) -> Option<Ticket> {
    or_none("get_ticket", api.get_ticket(token, id).await)
}

pub async fn create_ticket(
    api: &dyn PlatformApi,
    token: &str,
    req: &CreateTicketRequest,
) -> Result<Ticket, ApiError> {
    surfaced("create_ticket", api.create_ticket(token, req).await)
}

pub async fn update_ticket(
    api: &dyn PlatformApi,
    token: &str,
    id: Uuid,
    req: &UpdateTicketRequest,
) -> Result<Ticket, ApiError> {
    surfaced("update_ticket", api.update_ticket(token, id, req).await)
}

pub async fn delete_ticket(api: &dyn PlatformApi, token: &str, id: Uuid) -> Result<(), ApiError> {
    surfaced("delete_ticket", api.delete_ticket(token, id).await)
}

pub async fn reply_to_ticket(
    api: &dyn PlatformApi,
    token: &str,
    id: Uuid,
    req: &CreateReplyRequest,
) -> Result<Ticket, ApiError> {
    surfaced("reply_to_ticket", api.add_ticket_reply(token, id, req).await)
}

/// Tickets still waiting on someone: open or in progress.
pub fn count_open(tickets: &[Ticket]) -> usize {
    tickets
        .iter()
        .filter(|t| matches!(t.status, TicketStatus::Open | TicketStatus::InProgress))
        .count()
}

// --- Inquiries ---

pub async fn submit_inquiry(api: &dyn PlatformApi, req: &CreateInquiryRequest) -> Result<Inquiry, ApiError> {
    surfaced("submit_inquiry", api.create_inquiry(req).await)
}

pub async fn list_inquiries(api: &dyn PlatformApi, token: &str) -> Vec<Inquiry> {
    or_default("list_inquiries", api.list_inquiries(token).await)
}

pub async fn set_inquiry_status(
    api: &dyn PlatformApi,
    token: &str,
    id: Uuid,
    status: InquiryStatus,
) -> Result<Inquiry, ApiError> {
    surfaced("set_inquiry_status", api.update_inquiry_status(token, id, status).await)
}

pub async fn delete_inquiry(api: &dyn PlatformApi, token: &str, id: Uuid) -> Result<(), ApiError> {
    surfaced("delete_inquiry", api.delete_inquiry(token, id).await)
}

// --- FAQs ---

/// Published FAQs for the public page.
pub async fn published_faqs(api: &dyn PlatformApi) -> Vec<Faq> {
    or_default("published_faqs", api.list_faqs(None, true).await)
}

/// Every FAQ including drafts, for the admin screen.
pub async fn all_faqs(api: &dyn PlatformApi, token: &str) -> Vec<Faq> {
    or_default("all_faqs", api.list_faqs(Some(token), false).await)
}

pub async fn create_faq(api: &dyn PlatformApi, token: &str, req: &FaqRequest) -> Result<Faq, ApiError> {
    surfaced("create_faq", api.create_faq(token, req).await)
}

pub async fn update_faq(
    api: &dyn PlatformApi,
    token: &str,
    id: Uuid,
    req: &FaqRequest,
) -> Result<Faq, ApiError> {
    surfaced("update_faq", api.update_faq(token, id, req).await)
}

pub async fn delete_faq(api: &dyn PlatformApi, token: &str, id: Uuid) -> Result<(), ApiError> {
    surfaced("delete_faq", api.delete_faq(token, id).await)
}
