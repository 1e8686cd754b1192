// Adapters layer: concrete implementations for external systems (vendor
// APIs, secret stores, mapping storage).

pub mod notion;
pub mod secrets;
pub mod storage;
pub mod todoist;

use crate::utils::error::{Result, SyncError};
use reqwest::Response;

/// Turns a non-2xx response into `HttpStatusError`, keeping the body for the
/// report.
pub(crate) async fn ensure_success(service: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!("{} API error body: {}", service, body);
    Err(SyncError::HttpStatusError {
        service,
        status: status.as_u16(),
        body,
    })
}
