//! Request path decoding and normalization.
//!
//! The echoed path is percent-decoded first, then normalized: repeated
//! slashes collapse, `.` segments drop, and `..` removes the previous
//! segment. A trailing slash survives. Paths that decode to invalid UTF-8
//! or climb above the root are rejected.

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Why a request path could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path '{0}' does not start with '/'")]
    NotAbsolute(String),

    #[error("path '{0}' is not valid UTF-8 once decoded")]
    InvalidEncoding(String),

    #[error("path '{0}' escapes the root")]
    AboveRoot(String),
}

/// Decode and normalize a raw URI path.
pub fn normalize_request_path(raw: &str) -> Result<String, PathError> {
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| PathError::InvalidEncoding(raw.to_string()))?;

    let Some(rest) = decoded.strip_prefix('/') else {
        return Err(PathError::NotAbsolute(raw.to_string()));
    };

    let mut segments: Vec<&str> = Vec::new();
    let mut trailing_slash = false;
    for segment in rest.split('/') {
        match segment {
            "" | "." => trailing_slash = true,
            ".." => {
                if segments.pop().is_none() {
                    return Err(PathError::AboveRoot(raw.to_string()));
                }
                trailing_slash = true;
            }
            name => {
                segments.push(name);
                trailing_slash = false;
            }
        }
    }

    let mut path = String::with_capacity(decoded.len());
    path.push('/');
    path.push_str(&segments.join("/"));
    if trailing_slash && !segments.is_empty() {
        path.push('/');
    }
    Ok(path)
}
