use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::types::PageRequest;

/// `Json<T>` whose rejection renders as an `ApiError` body instead of plain text.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::invalid_json(rejection.body_text())),
        }
    }
}

/// `Query<T>` whose rejection renders as an `ApiError` body.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

/// Query string of every list endpoint. Filters are read by the endpoints that use them.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub tenant_id: Option<String>,
    pub account_id: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref())
    }
}

/// Trimmed value, with blank treated as absent.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ApiError> {
    present(value).ok_or_else(|| ApiError::bad_request(format!("{} is required", field)))
}

pub fn required_uuid(value: Option<&str>, field: &str) -> Result<Uuid, ApiError> {
    parse_uuid(required(value, field)?, field)
}

/// Blank is `None`; anything else must be a UUID.
pub fn optional_uuid(value: Option<&str>, field: &str) -> Result<Option<Uuid>, ApiError> {
    present(value).map(|v| parse_uuid(v, field)).transpose()
}

fn parse_uuid(value: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value)
        .map_err(|_| ApiError::bad_request(format!("{} must be a valid UUID", field)))
}
