//! Request identity. The app sits behind an auth proxy in production and
//! trusts its forwarded identity headers; in local development a dummy
//! provider supplies a fixed demo user.

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
}

/// Resolves the calling user from request headers.
pub trait UserContextProvider: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Result<CurrentUser, AppError>;
}

/// Fixed demo identity for local development.
pub struct DummyUserContext;

impl UserContextProvider for DummyUserContext {
    fn resolve(&self, _headers: &HeaderMap) -> Result<CurrentUser, AppError> {
        Ok(CurrentUser {
            user_id: "demo-user-id".to_string(),
            display_name: "Demo User".to_string(),
            email: Some("demo@example.com".to_string()),
        })
    }
}

/// Reads identity headers injected by the auth proxy. A missing user id
/// means the request did not come through the proxy.
pub struct ProxyHeaderUserContext;

impl UserContextProvider for ProxyHeaderUserContext {
    fn resolve(&self, headers: &HeaderMap) -> Result<CurrentUser, AppError> {
        let user_id = header_value(headers, USER_ID_HEADER).ok_or(AppError::Unauthorized)?;
        let display_name =
            header_value(headers, USER_NAME_HEADER).unwrap_or_else(|| user_id.clone());
        let email = header_value(headers, USER_EMAIL_HEADER);

        Ok(CurrentUser {
            user_id,
            display_name,
            email,
        })
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn provider_from_config(use_dummy_auth: bool) -> Arc<dyn UserContextProvider> {
    if use_dummy_auth {
        tracing::warn!("Using dummy authentication; all requests run as the demo user");
        Arc::new(DummyUserContext)
    } else {
        Arc::new(ProxyHeaderUserContext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn dummy_provider_always_resolves_demo_user() {
        let user = DummyUserContext.resolve(&HeaderMap::new()).unwrap();
        assert_eq!(user.user_id, "demo-user-id");
        assert_eq!(user.display_name, "Demo User");
    }

    #[test]
    fn proxy_provider_reads_identity_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("user-42"));
        headers.insert(USER_NAME_HEADER, HeaderValue::from_static("Alex"));
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("alex@example.com"));

        let user = ProxyHeaderUserContext.resolve(&headers).unwrap();
        assert_eq!(user.user_id, "user-42");
        assert_eq!(user.display_name, "Alex");
        assert_eq!(user.email.as_deref(), Some("alex@example.com"));
    }

    #[test]
    fn proxy_provider_falls_back_to_user_id_for_display_name() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("user-42"));

        let user = ProxyHeaderUserContext.resolve(&headers).unwrap();
        assert_eq!(user.display_name, "user-42");
        assert!(user.email.is_none());
    }

    #[test]
    fn proxy_provider_rejects_missing_user_id() {
        let result = ProxyHeaderUserContext.resolve(&HeaderMap::new());
        assert!(matches!(result, Err(AppError::Unauthorized)));

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));
        let result = ProxyHeaderUserContext.resolve(&headers);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
