//! Course file upload

use crate::transport::{NormalizedError, RequestContext, Transport};
use serde_json::Value;

pub const UPLOAD_PATH: &str = "/api/v1/files/upload";

const FILE_FIELD: &str = "file";

/// Upload one file as multipart form data. Returns the server's receipt as-is.
///
/// # Errors
/// Validation error for an empty filename or empty content; otherwise the
/// normalized transport error.
pub async fn upload_file<T: Transport + ?Sized>(
    transport: &T,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<Value, NormalizedError> {
    let filename = filename.trim();
    if filename.is_empty() {
        return Err(NormalizedError::validation("Choose a file to upload"));
    }
    if bytes.is_empty() {
        return Err(NormalizedError::validation(format!("{filename} is empty")));
    }

    let size = bytes.len();
    let request = RequestContext::post(UPLOAD_PATH)
        .with_file(FILE_FIELD, filename, bytes)
        .authenticated();

    let receipt = transport
        .execute(request)
        .await?
        .into_json()
        .ok_or_else(|| NormalizedError::decode("Upload reply was not JSON"))?;

    tracing::info!(filename = %filename, size, "File uploaded");
    Ok(receipt)
}
