// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication for observer connections.
//!
//! The token is accepted from `Authorization: Bearer <token>` or, for
//! browser WebSocket clients that cannot set headers, a `token` query
//! parameter. With no token configured the hub is open.

use axum::http::HeaderMap;

#[derive(Clone, Default)]
pub struct AuthConfig {
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

impl AuthConfig {
    pub fn is_open(&self) -> bool {
        self.bearer_token.is_none()
    }

    pub fn authorize(&self, headers: &HeaderMap, query_token: Option<&str>) -> bool {
        let Some(expected) = self.bearer_token.as_deref() else {
            return true;
        };
        let header_token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        header_token == Some(expected) || query_token == Some(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn secured() -> AuthConfig {
        AuthConfig {
            bearer_token: Some("secret-token".to_string()),
        }
    }

    #[test]
    fn open_when_no_token() {
        let auth = AuthConfig::default();
        assert!(auth.is_open());
        assert!(auth.authorize(&HeaderMap::new(), None));
    }

    #[test]
    fn header_token_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer secret-token"));
        assert!(secured().authorize(&headers, None));
    }

    #[test]
    fn query_token_accepted() {
        assert!(secured().authorize(&HeaderMap::new(), Some("secret-token")));
    }

    #[test]
    fn wrong_or_missing_token_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer nope"));
        assert!(!secured().authorize(&headers, None));
        assert!(!secured().authorize(&HeaderMap::new(), Some("nope")));
        assert!(!secured().authorize(&HeaderMap::new(), None));
    }

    #[test]
    fn debug_redacts_token() {
        let debug_output = format!("{:?}", secured());
        assert!(!debug_output.contains("secret-token"));
        assert!(debug_output.contains("[redacted]"));
    }
}
