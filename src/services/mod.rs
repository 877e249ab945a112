//! Typed wrappers over [`crate::api::PlatformApi`].
//!
//! Each call is independent and is logged when it fails. Reads degrade to a
//! safe empty value so a page still renders when the platform misbehaves.
//! Mutations whose failure the user must see (tickets, inquiries, FAQs,
//! sign-in, password reset, onboarding) hand the `ApiError` back to the
//! caller. Incidental writes (read markers, chat, settings) report success as
//! `bool`/`Option`. Nothing is retried.

use crate::error::ApiError;

pub mod account;
pub mod content;
pub mod support;

/// A read that must not fail the page: log and fall back to `T::default()`.
pub(crate) fn or_default<T: Default>(operation: &'static str, result: Result<T, ApiError>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(operation, error = %e, "platform read failed, using empty value");
        T::default()
    })
}

/// A lookup of a single record: `None` when missing or when the call failed.
pub(crate) fn or_none<T>(operation: &'static str, result: Result<T, ApiError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(ApiError::NotFound) => None,
        Err(e) => {
            tracing::warn!(operation, error = %e, "platform lookup failed");
            None
        }
    }
}

/// A mutation the user must hear about: log and hand the error back.
pub(crate) fn surfaced<T>(operation: &'static str, result: Result<T, ApiError>) -> Result<T, ApiError> {
    result.inspect_err(|e| tracing::error!(operation, error = %e, "platform mutation failed"))
}
