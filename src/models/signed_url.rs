//! Options for presigned download URLs.

use std::time::Duration;

/// Lifetime of a presigned URL when the caller does not pick one.
pub const DEFAULT_SIGNED_URL_EXPIRY: Duration = Duration::from_secs(20 * 60);

/// Longest lifetime SigV4 presigning allows.
pub const MAX_SIGNED_URL_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Response overrides and expiry applied when presigning a GET.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedUrlOptions {
    /// Overrides the `Content-Type` header served with the object.
    pub content_type: Option<String>,

    /// Overrides the `Content-Disposition` header served with the object.
    pub content_disposition: Option<String>,

    pub expires_in: Duration,
}

impl Default for SignedUrlOptions {
    fn default() -> Self {
        Self {
            content_type: None,
            content_disposition: None,
            expires_in: DEFAULT_SIGNED_URL_EXPIRY,
        }
    }
}

impl SignedUrlOptions {
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_content_disposition(mut self, disposition: impl Into<String>) -> Self {
        self.content_disposition = Some(disposition.into());
        self
    }

    pub fn with_expiry(mut self, expires_in: Duration) -> Self {
        self.expires_in = expires_in;
        self
    }
}
