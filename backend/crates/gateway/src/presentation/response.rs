//! HTTP response conversion

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::pipeline::PipelineResponse;

impl<T> IntoResponse for PipelineResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, self.headers.to_header_map(), Json(self.envelope)).into_response()
    }
}
