//! Translation between object keys and the hosted URLs handed to callers.
//!
//! Uploads return `https://{bucket}.{domain}/{key}`; every other gateway
//! operation accepts such a URL back and recovers the key from its path.

use crate::models::object::ObjectKey;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid hosted url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("object key `{0}` cannot be addressed by a hosted url")]
    Unaddressable(String),
}

/// Recover the object key from a hosted URL.
///
/// The key is the percent-decoded URL path with exactly one leading `/`
/// removed. A URL pointing at the bucket root yields an empty key.
pub fn resolve_key(hosted_url: &str) -> Result<ObjectKey, KeyError> {
    let parsed = Url::parse(hosted_url).map_err(|err| KeyError::InvalidUrl {
        url: hosted_url.to_string(),
        reason: err.to_string(),
    })?;

    let path = urlencoding::decode(parsed.path()).map_err(|err| KeyError::InvalidUrl {
        url: hosted_url.to_string(),
        reason: format!("path is not valid UTF-8 once decoded: {}", err),
    })?;

    let key = path.strip_prefix('/').unwrap_or(&path);
    Ok(ObjectKey::new(key))
}

/// Build the public URL of `key`.
///
/// Each path segment is percent-encoded so that [`resolve_key`] returns the
/// same key; keys made only of `[a-z0-9._-/]` come out verbatim.
pub fn hosted_url(bucket: &str, domain: &str, key: &ObjectKey) -> String {
    let encoded = key
        .as_str()
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");
    format!("https://{}.{}/{}", bucket, domain, encoded)
}

/// Whether `key` survives the trip through [`hosted_url`] and [`resolve_key`].
///
/// URL parsers fold `.` and `..` path segments, so keys containing them
/// would come back as a different key.
pub fn is_addressable(key: &ObjectKey) -> bool {
    !key.is_empty() && !key.as_str().split('/').any(|s| s == "." || s == "..")
}

/// Join an upload directory and a sanitized file name into an object key.
///
/// Slashes around `path` are dropped so the key never starts with `/`.
/// An empty name is rejected, as is any key with a `.` or `..` segment
/// anywhere in it. Sanitized extensions are not cleaned, so the name itself
/// may carry `/` and dot segments.
pub fn join_key(path: &str, file_name: &str) -> Result<ObjectKey, KeyError> {
    let path = path.trim_matches('/');
    let key = if path.is_empty() {
        ObjectKey::new(file_name)
    } else {
        ObjectKey::new(format!("{}/{}", path, file_name))
    };

    if file_name.is_empty() || !is_addressable(&key) {
        return Err(KeyError::Unaddressable(key.to_string()));
    }

    Ok(key)
}
