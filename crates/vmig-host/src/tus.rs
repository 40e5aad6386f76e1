//! tus 1.0.0 header names and parsing.
//!
//! Only the core protocol subset is used: `HEAD` to discover the offset and
//! `PATCH` to append. Creation goes through the hosting API instead of the
//! tus creation extension.

use reqwest::header::HeaderMap;

use crate::error::{HostError, HostResult};

/// Protocol version sent on every tus request.
pub const TUS_VERSION: &str = "1.0.0";

pub const TUS_RESUMABLE: &str = "Tus-Resumable";
pub const UPLOAD_OFFSET: &str = "Upload-Offset";

/// Content type required for `PATCH` bodies.
pub const OFFSET_OCTET_STREAM: &str = "application/offset+octet-stream";

/// Read `Upload-Offset` from a response, if present.
///
/// A present but malformed value is an error rather than "absent".
pub fn parse_upload_offset(headers: &HeaderMap) -> HostResult<Option<u64>> {
    let Some(value) = headers.get(UPLOAD_OFFSET) else {
        return Ok(None);
    };

    let text = value
        .to_str()
        .map_err(|_| HostError::invalid_response("Upload-Offset is not valid ASCII"))?;

    text.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| HostError::invalid_response(format!("Upload-Offset is not a byte count: {:?}", text)))
}
