#![forbid(unsafe_code)]

//! Read-only session context created at page bootstrap.

/// Who is looking at the page.
///
/// Built once from the bootstrap payload and shared by every component for
/// the lifetime of the page. Cookie validation happens elsewhere; only its
/// boolean outcome lands here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    current_user_id: Option<String>,
    authenticated: bool,
}

impl Session {
    /// Session for a signed-in user.
    #[must_use]
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            current_user_id: Some(user_id.into()),
            authenticated: true,
        }
    }

    /// Session for an anonymous visitor.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session with an explicit user id and authentication result.
    ///
    /// A known user id with `authenticated == false` happens when the cookie
    /// carried an id that failed validation.
    #[must_use]
    pub fn new(current_user_id: Option<String>, authenticated: bool) -> Self {
        Self {
            current_user_id,
            authenticated,
        }
    }

    #[must_use]
    pub fn current_user_id(&self) -> Option<&str> {
        self.current_user_id.as_deref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// True when `user` names the current user.
    ///
    /// Two absent ids never match: an anonymous page must not suppress an
    /// anonymous event.
    #[must_use]
    pub fn is_current_user(&self, user: Option<&str>) -> bool {
        match (self.current_user_id.as_deref(), user) {
            (Some(me), Some(other)) => me == other,
            _ => false,
        }
    }
}
