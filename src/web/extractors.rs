use crate::models::{Role, Scope};
use crate::web::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Caller scope forwarded by the authenticating gateway.
pub struct AccessScope(pub Scope);

impl AccessScope {
    pub fn from_parts(parts: &Parts) -> Result<Self, StatusCode> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let role = header(USER_ROLE_HEADER)
            .map(|r| Role::from_str(&r).map_err(|_| StatusCode::FORBIDDEN))
            .transpose()?
            .unwrap_or(Role::Resident);

        Scope::for_role(role, header(USER_ID_HEADER))
            .map(AccessScope)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

impl FromRequestParts<Arc<AppState>> for AccessScope {
    type Rejection = StatusCode;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let result = AccessScope::from_parts(parts);
        Box::pin(async move { result })
    }
}
