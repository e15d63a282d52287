//! Session / identity provider seam.
//!
//! Repositories resolve the acting principal through this trait and fail
//! fast with `AccessDenied` before any gateway call when no principal is
//! available (covers both the "still loading" and "signed out" states).

/// Exposes the currently authenticated principal id, if any.
pub trait SessionProvider: Send + Sync {
    fn principal(&self) -> Option<String>;
}

/// Fixed principal, the common case for a signed-in client.
#[derive(Debug, Clone)]
pub struct StaticSession {
    user_id: String,
}

impl StaticSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

impl SessionProvider for StaticSession {
    fn principal(&self) -> Option<String> {
        Some(self.user_id.clone())
    }
}

/// No principal; every repository call fails with `AccessDenied`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousSession;

impl SessionProvider for AnonymousSession {
    fn principal(&self) -> Option<String> {
        None
    }
}
