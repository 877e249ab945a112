//! The portal's route table.
//!
//! Every path the access-control flow reasons about is declared here once:
//! the redirect targets of the guards and the onboarding allow-list. Guards and
//! handlers refer to these constants instead of repeating string literals.

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";
pub const ONBOARDING: &str = "/onboarding";
pub const GOOGLE_CALLBACK: &str = "/google-callback";
pub const RESET_PASSWORD: &str = "/reset-password";
pub const CONTACT: &str = "/contact";
pub const DASHBOARD: &str = "/dashboard";
pub const ADMIN: &str = "/admin";
pub const EXIT_IMPERSONATION: &str = "/impersonation/exit";

/// RoutePattern
///
/// `Exact` matches a single path. `Prefix` matches the path itself and anything
/// nested below it, on segment boundaries: `/login` covers `/login/otp` but not
/// `/loginx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePattern {
    Exact(&'static str),
    Prefix(&'static str),
}

impl RoutePattern {
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        match *self {
            RoutePattern::Exact(exact) => path == exact,
            RoutePattern::Prefix(prefix) => match path.strip_prefix(prefix) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
        }
    }
}

/// Paths an authenticated user with an incomplete profile may still visit.
pub const ONBOARDING_ALLOW_LIST: [RoutePattern; 5] = [
    RoutePattern::Prefix(LOGIN),
    RoutePattern::Prefix(ONBOARDING),
    RoutePattern::Prefix(GOOGLE_CALLBACK),
    RoutePattern::Prefix(RESET_PASSWORD),
    RoutePattern::Prefix(CONTACT),
];

/// RouteTable
///
/// A set of route patterns evaluated as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteTable {
    patterns: &'static [RoutePattern],
}

impl RouteTable {
    pub const fn new(patterns: &'static [RoutePattern]) -> Self {
        Self { patterns }
    }

    /// The allow-list consulted by `OnboardingGuard`.
    pub const fn onboarding_allow_list() -> Self {
        Self::new(&ONBOARDING_ALLOW_LIST)
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(path))
    }
}

/// Strips a trailing slash so `/onboarding/` and `/onboarding` are the same route.
pub fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

/// Returns `from` when it is a same-origin absolute path, `None` otherwise.
/// Protocol-relative (`//evil.example`) and absolute URLs are rejected so the
/// post-login return cannot become an open redirect. Only visible ASCII is
/// accepted: browsers drop tab, CR and LF, turning `/\t/host` into `//host`.
pub fn safe_return_path(from: Option<&str>) -> Option<&str> {
    let from = from?.trim();
    if !from.bytes().all(|b| b.is_ascii_graphic()) {
        return None;
    }
    let same_origin = from.starts_with('/') && !from.starts_with("//") && !from.contains('\\');
    same_origin.then_some(from)
}

/// The path component of a location, without query string or fragment.
pub fn path_of(location: &str) -> &str {
    location
        .split(['?', '#'])
        .next()
        .unwrap_or(location)
}
