use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{auth::AuthContext, models::Role, routing};

/// ImpersonationBanner
///
/// The persistent override bar shown while an admin acts as another user.
/// `exit_action` is the endpoint that restores the admin identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ImpersonationBanner {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub user_role: Role,
    pub admin_name: String,
    pub exit_action: String,
}

impl ImpersonationBanner {
    /// render
    ///
    /// Nothing when the session is not impersonating or when the visitor is on
    /// the login screen; the banner otherwise.
    pub fn render(ctx: &AuthContext, path: &str) -> Option<Self> {
        if routing::normalize(path) == routing::LOGIN {
            return None;
        }
        let session = ctx.session()?;
        let admin = session.impersonator.as_ref()?;

        Some(Self {
            user_id: session.user.id,
            user_name: session.user.name.clone(),
            user_email: session.user.email.clone(),
            user_role: session.user.role,
            admin_name: admin.user.name.clone(),
            exit_action: routing::EXIT_IMPERSONATION.to_string(),
        })
    }
}
