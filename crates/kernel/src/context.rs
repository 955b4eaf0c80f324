//! Per-request tenant context.
//!
//! The tenant id is read from a trusted header set by the upstream gateway
//! and passed explicitly to the listing executor. Nothing here is stored in
//! globals or task-locals.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::filter::types::ListingScope;
use crate::state::AppState;

/// Header carrying the acting user, when the gateway knows it.
pub const USER_HEADER: &str = "x-user-id";

/// Identity of the caller for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub tenant_id: i64,
    pub user_id: Option<i64>,
}

impl RequestContext {
    pub fn new(tenant_id: i64) -> Self {
        Self {
            tenant_id,
            user_id: None,
        }
    }

    /// Read the context from request headers.
    ///
    /// A missing or non-numeric tenant header is rejected; a malformed user
    /// header is ignored.
    pub fn from_headers(headers: &HeaderMap, tenant_header: &str) -> Result<Self, AppError> {
        let raw = headers
            .get(tenant_header)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized(format!("missing {tenant_header} header")))?;

        let tenant_id = raw.trim().parse::<i64>().map_err(|_| {
            AppError::Unauthorized(format!("{tenant_header} header must be an integer"))
        })?;

        let user_id = headers
            .get(USER_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok());

        Ok(Self { tenant_id, user_id })
    }

    /// Rows this caller may list.
    pub fn scope(&self) -> ListingScope {
        let scope = ListingScope::tenant(self.tenant_id);
        match self.user_id {
            Some(user_id) => scope.with_user(user_id),
            None => scope,
        }
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let context = Self::from_headers(&parts.headers, state.tenant_header())?;
        tracing::trace!(
            tenant_id = context.tenant_id,
            user_id = ?context.user_id,
            "request context resolved"
        );
        Ok(context)
    }
}
