//! Request checks shared by the file handlers.

use std::borrow::Cow;

use axum::http::Method;
use percent_encoding::percent_decode_str;

use crate::file::FileError;

/// Only GET and HEAD are served.
pub fn check_method(method: &Method) -> Result<(), FileError> {
    if *method == Method::GET || *method == Method::HEAD {
        Ok(())
    } else {
        Err(FileError::MethodNotAllowed)
    }
}

/// Whether any `/` or `\` separated segment of `path` is exactly `..`.
///
/// `..` inside a file name (`a..b.txt`) is allowed.
pub fn contains_dot_dot(path: &str) -> bool {
    if !path.contains("..") {
        return false;
    }
    path.split(['/', '\\']).any(|segment| segment == "..")
}

/// Percent-decode the raw URI path once and reject traversal segments.
pub fn request_path(raw: &str) -> Result<Cow<'_, str>, FileError> {
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| FileError::BadRequest("invalid URL path".into()))?;
    if contains_dot_dot(&decoded) {
        return Err(FileError::BadRequest("invalid URL path".into()));
    }
    Ok(decoded)
}
