use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Remote service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            404 => ApiError::NotFound(truncated),
            409 => ApiError::DuplicateEmail(truncated),
            429 => ApiError::RateLimited,
            _ => ApiError::RemoteUnavailable(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Network and server-side failures the caller may recover from with
    /// cached data.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ApiError::RemoteUnavailable(_) | ApiError::RateLimited)
    }
}
