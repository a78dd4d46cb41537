use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::error::ApiError;
use crate::types::{Page, PAGE_SIZE};

/// JSON body with a status code. Entities are written as-is, without an envelope.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::with_status(data, StatusCode::OK)
    }

    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self { data, status_code }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status_code, Json(self.data)).into_response()
    }
}

/// Shape shared by every list endpoint.
#[derive(Debug, Serialize)]
pub struct PageResponse<T: Serialize> {
    pub data: Vec<T>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
    pub page_size: i64,
}

impl<T: Serialize> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            total_pages: page.total_pages(),
            total: page.total,
            page: page.request.page,
            page_size: PAGE_SIZE,
            data: page.items,
        }
    }
}

/// `{"message": ...}` acknowledgement of a mutation.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Gives the bodiless 408 of the timeout layer the usual error body.
pub async fn timeout_as_json(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return ApiError::request_timeout("request timed out").into_response();
    }
    response
}
