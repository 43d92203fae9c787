use api_ingress::problem::ProblemResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap, HeaderName};
use uuid::Uuid;

use crate::api::rest::error::map_domain_error;
use crate::domain::error::DomainError;

/// Header carrying the id of the user the session provider authenticated.
pub fn user_id_header() -> HeaderName {
    HeaderName::from_static("x-user-id")
}

/// Caller identity; rejects with 401 when the header is missing or not a UUID.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Uuid);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = viewer_id(&parts.headers)
            .ok_or_else(|| map_domain_error(&DomainError::NotAuthenticated, parts.uri.path()))?;
        tracing::Span::current().record("user_id", tracing::field::display(id));
        Ok(Self(id))
    }
}

/// Caller identity for read routes, where it is optional.
pub fn viewer_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(user_id_header())
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parses_valid_header_only() {
        let mut headers = HeaderMap::new();
        assert_eq!(viewer_id(&headers), None);

        headers.insert(user_id_header(), HeaderValue::from_static("not-a-uuid"));
        assert_eq!(viewer_id(&headers), None);

        let id = Uuid::new_v4();
        headers.insert(user_id_header(), HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(viewer_id(&headers), Some(id));
    }
}
