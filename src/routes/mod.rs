/// Router Module Index
///
/// Splits the portal's pages by the guard that fronts them. Guards are applied
/// as axum layers in `create_router`, so a page cannot be mounted without the
/// access policy of its group.

/// Entry points used while signing in or out. Reachable by everyone; only the
/// onboarding guard applies.
pub mod gateway;

/// Pages open to visitors. Fronted by `PublicRoute`.
pub mod public;

/// Pages for signed-in users. Fronted by `ProtectedRoute`.
pub mod authenticated;

/// Back-office pages. Fronted by `ProtectedRoute`; the `super_admin` role is
/// checked by the `SuperAdmin` extractor in each handler.
pub mod admin;
