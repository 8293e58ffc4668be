//! Fixed routes owned by the gate.
//!
//! Requests to these paths are handled by the gate itself and never reach
//! the downstream application.

/// A route handled by the gate rather than the downstream application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthRoute {
    /// Starts the OAuth dance; accepts `return_to`.
    Login,
    /// Provider redirect after the user approved the login.
    Callback,
    /// Destination for any rejected or failed OAuth callback.
    Failure,
    /// Clears the local session.
    Logout,
    /// Hands logout over to the external auth endpoint.
    SsoLogout,
}

impl AuthRoute {
    /// All gate-owned routes.
    pub const ALL: [AuthRoute; 5] = [
        Self::Login,
        Self::Callback,
        Self::Failure,
        Self::Logout,
        Self::SsoLogout,
    ];

    /// Returns the request path for this route.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/auth/login",
            Self::Callback => "/auth/heroku/callback",
            Self::Failure => "/auth/failure",
            Self::Logout => "/auth/logout",
            Self::SsoLogout => "/auth/sso-logout",
        }
    }

    /// Matches a request path against the gate-owned routes.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|route| route.path() == path)
    }
}

impl std::fmt::Display for AuthRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip() {
        for route in AuthRoute::ALL {
            assert_eq!(AuthRoute::from_path(route.path()), Some(route));
        }
    }

    #[test]
    fn fixed_paths() {
        assert_eq!(AuthRoute::Login.path(), "/auth/login");
        assert_eq!(AuthRoute::Logout.path(), "/auth/logout");
        assert_eq!(AuthRoute::SsoLogout.path(), "/auth/sso-logout");
        assert_eq!(AuthRoute::Failure.path(), "/auth/failure");
    }

    #[test]
    fn other_paths_are_not_auth_routes() {
        assert_eq!(AuthRoute::from_path("/"), None);
        assert_eq!(AuthRoute::from_path("/hi"), None);
        assert_eq!(AuthRoute::from_path("/auth/login/extra"), None);
        assert_eq!(AuthRoute::from_path("/auth"), None);
    }

    #[test]
    fn display_is_path() {
        assert_eq!(AuthRoute::Callback.to_string(), "/auth/heroku/callback");
    }
}
