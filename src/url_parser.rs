//! URL normalizer for Baidu Netdisk share links.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{PanError, Result};

/// Canonical prefix of every share link.
pub const SHARED_URL_PREFIX: &str = "https://pan.baidu.com/s/";

/// Standard share link: `pan.baidu.com/s/<token>`.
static STANDARD_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"pan\.baidu\.com/s/(.+?)(?:\?|$)").expect("Invalid standard URL regex")
});

/// Legacy short link: `baidu.com/...?surl=<token>`.
static SURL_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"baidu\.com.+?\?surl=(.+?)(?:\?|$)").expect("Invalid surl URL regex")
});

/// Unify a user supplied share link into `https://pan.baidu.com/s/<token>`.
///
/// Supports the following URL formats:
/// - `https://pan.baidu.com/s/<token>` (anything after `?` is dropped)
/// - `https://pan.baidu.com/share/init?surl=<token>`
///
/// Legacy `surl` tokens are missing the leading `1` of a standard token, so it
/// is added back.
///
/// # Examples
///
/// ```
/// use pan_share::url_parser::unify_shared_url;
///
/// let url = unify_shared_url("https://pan.baidu.com/s/1abcXYZ?pwd=1234").unwrap();
/// assert_eq!(url, "https://pan.baidu.com/s/1abcXYZ");
///
/// let url = unify_shared_url("https://pan.baidu.com/share/init?surl=abcXYZ").unwrap();
/// assert_eq!(url, "https://pan.baidu.com/s/1abcXYZ");
/// ```
pub fn unify_shared_url(url: &str) -> Result<String> {
    if let Some(token) = STANDARD_URL_REGEX.captures(url).and_then(|c| c.get(1)) {
        return Ok(format!("{}{}", SHARED_URL_PREFIX, token.as_str()));
    }

    if let Some(token) = SURL_URL_REGEX.captures(url).and_then(|c| c.get(1)) {
        return Ok(format!("{}1{}", SHARED_URL_PREFIX, token.as_str()));
    }

    Err(PanError::InvalidUrl(url.to_string()))
}

/// Token of a unified share link, i.e. everything after `/s/`.
pub fn share_token(shared_url: &str) -> Result<&str> {
    shared_url
        .rsplit_once("/s/")
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| PanError::InvalidUrl(shared_url.to_string()))
}

/// The `surl` form of a share token, which the verify endpoint expects.
pub fn surl(token: &str) -> &str {
    token.strip_prefix('1').unwrap_or(token)
}
