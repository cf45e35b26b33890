//! Request extractors: caller identity, lenient paging and JSON bodies that
//! fail with the standard `{message}` shape.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use domains::{DomainError, PageRequest, UserId};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{AppState, Paging};

fn bearer(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Verified caller on routes that require one.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)
            .ok_or_else(|| DomainError::Unauthorized("No token provided".into()))?;
        Ok(Self(state.identity.resolve(token)?))
    }
}

/// Caller on public routes. A missing or unverifiable credential is
/// treated as an anonymous reader rather than an error.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<UserId>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(bearer(parts).and_then(|token| state.identity.resolve(token).ok())))
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawListQuery {
    page: Option<String>,
    limit: Option<String>,
    category: Option<String>,
}

/// `?page=&limit=&category=`. Garbage never fails the request: it falls
/// back to the first page and the default size.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub page: PageRequest,
    pub category: Option<String>,
}

impl ListQuery {
    fn from_raw(raw: RawListQuery, paging: Paging) -> Self {
        let positive = |s: Option<String>| {
            s.and_then(|s| s.trim().parse::<i64>().ok())
                .filter(|n| *n > 0)
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        };
        let page = positive(raw.page).unwrap_or(1);
        let limit = positive(raw.limit).unwrap_or(paging.default_limit);
        Self {
            page: PageRequest::new(page, limit, paging.max_limit),
            category: raw.category,
        }
    }
}

impl FromRequestParts<AppState> for ListQuery {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = Query::<RawListQuery>::try_from_uri(&parts.uri)
            .map(|Query(raw)| raw)
            .unwrap_or_default();
        Ok(Self::from_raw(raw, state.paging))
    }
}

/// `Json<T>` whose rejections are rendered as `400 {message}`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(%rejection, "rejected request body");
                Err(DomainError::invalid(rejection.body_text()).into())
            }
        }
    }
}

/// Path ids that do not parse cannot name an existing resource.
pub fn parse_id(raw: &str, resource: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| DomainError::NotFound(resource).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(page: Option<&str>, limit: Option<&str>) -> RawListQuery {
        RawListQuery {
            page: page.map(String::from),
            limit: limit.map(String::from),
            category: None,
        }
    }

    #[test]
    fn list_query_is_lenient() {
        let paging = Paging::default();

        let q = ListQuery::from_raw(raw(None, None), paging);
        assert_eq!(q.page, PageRequest { page: 1, page_size: 20 });

        let q = ListQuery::from_raw(raw(Some("abc"), Some("-4")), paging);
        assert_eq!(q.page, PageRequest { page: 1, page_size: 20 });

        let q = ListQuery::from_raw(raw(Some("3"), Some("5000")), paging);
        assert_eq!(q.page, PageRequest { page: 3, page_size: 100 });
    }

    #[test]
    fn bad_path_ids_are_not_found() {
        let err = parse_id("not-a-uuid", "Post").unwrap_err();
        assert_eq!(err.0, DomainError::NotFound("Post"));
        assert!(parse_id(&Uuid::now_v7().to_string(), "Post").is_ok());
    }
}
