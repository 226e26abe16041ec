//! Success responses: 200 with body, 201 with `Location`, 204.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

/// 201 Created with the resource body and a `Location` header pointing at it.
pub fn created_at<T: Serialize>(location: &str, data: T) -> Response {
    let mut resp = (StatusCode::CREATED, Json(data)).into_response();
    match HeaderValue::from_str(location) {
        Ok(v) => {
            resp.headers_mut().insert(header::LOCATION, v);
        }
        Err(e) => tracing::warn!(location = %location, error = %e, "location is not a valid header value"),
    }
    resp
}

pub fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}
