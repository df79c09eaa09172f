//! Tower layer applying a Cache-Control header.

use std::time::Duration;

use axum::http::{header, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::caching::Options;

/// Layer inserting a fixed Cache-Control value unless the response already has one.
pub type CacheControlLayer = SetResponseHeaderLayer<Option<HeaderValue>>;

/// Build a layer for `options`. Options without directives add no header.
pub fn layer(options: &Options) -> CacheControlLayer {
    let value = options.build_header_value();
    let header_value = if value.is_empty() {
        None
    } else {
        HeaderValue::from_str(&value).ok()
    };
    SetResponseHeaderLayer::if_not_present(header::CACHE_CONTROL, header_value)
}

/// `Cache-Control: public, max-age=<max_age>`
pub fn public(max_age: Duration) -> CacheControlLayer {
    layer(&Options::public(max_age))
}

/// `Cache-Control: private, max-age=<max_age>`
pub fn private(max_age: Duration) -> CacheControlLayer {
    layer(&Options::private(max_age))
}

/// `Cache-Control: no-cache`
pub fn no_cache() -> CacheControlLayer {
    layer(&Options::no_cache())
}

/// `Cache-Control: no-store`
pub fn no_store() -> CacheControlLayer {
    layer(&Options::no_store())
}
