//! Cookie session for the Baidu Netdisk web API.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{PanError, Result};

/// Login cookie.
pub const BDUSS: &str = "BDUSS";

/// Storage token cookie, required by the share endpoints.
pub const STOKEN: &str = "STOKEN";

/// Cookie holding the key of a verified share password.
pub const BDCLND: &str = "BDCLND";

/// Cookies and cached tokens of a logged-in user.
///
/// Cloning is cheap and clones share state, so a password verified through one
/// clone is visible to all of them.
#[derive(Clone, Debug)]
pub struct Session {
    cookies: Arc<RwLock<BTreeMap<String, String>>>,
    bdstoken: Arc<RwLock<Option<String>>>,
}

impl Session {
    /// Create a session from the `BDUSS` cookie and an optional `STOKEN`.
    pub fn new(bduss: &str, stoken: Option<&str>) -> Result<Self> {
        let bduss = bduss.trim();
        if bduss.is_empty() {
            return Err(PanError::MissingCredentials(BDUSS.to_string()));
        }

        let mut cookies = BTreeMap::new();
        cookies.insert(BDUSS.to_string(), bduss.to_string());
        if let Some(stoken) = stoken.map(str::trim).filter(|s| !s.is_empty()) {
            cookies.insert(STOKEN.to_string(), stoken.to_string());
        }

        Ok(Self::from_cookies(cookies))
    }

    /// Create a session from a browser `Cookie` header such as `BDUSS=..; STOKEN=..`.
    pub fn from_cookie_header(header: &str) -> Result<Self> {
        let cookies: BTreeMap<String, String> = header
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .filter(|(k, _)| !k.is_empty())
            .collect();

        if !cookies.contains_key(BDUSS) {
            return Err(PanError::MissingCredentials(BDUSS.to_string()));
        }

        Ok(Self::from_cookies(cookies))
    }

    fn from_cookies(cookies: BTreeMap<String, String>) -> Self {
        Self {
            cookies: Arc::new(RwLock::new(cookies)),
            bdstoken: Arc::new(RwLock::new(None)),
        }
    }

    /// Value for the `Cookie` request header.
    pub async fn cookie_header(&self) -> String {
        let cookies = self.cookies.read().await;
        cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub async fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.read().await.get(name).cloned()
    }

    pub async fn set_cookie(&self, name: &str, value: &str) {
        let mut cookies = self.cookies.write().await;
        cookies.insert(name.to_string(), value.to_string());
    }

    /// The cached `bdstoken` of this user, if it was fetched already.
    pub async fn cached_bdstoken(&self) -> Option<String> {
        self.bdstoken.read().await.clone()
    }

    pub async fn store_bdstoken(&self, token: &str) {
        let mut cached = self.bdstoken.write().await;
        *cached = Some(token.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cookie_header() {
        let session = Session::new("bduss-value", Some("stoken-value")).unwrap();
        assert_eq!(
            session.cookie_header().await,
            "BDUSS=bduss-value; STOKEN=stoken-value"
        );
    }

    #[tokio::test]
    async fn test_clones_share_cookies() {
        let session = Session::new("bduss-value", None).unwrap();
        let clone = session.clone();
        clone.set_cookie(BDCLND, "randsk").await;

        assert_eq!(session.cookie(BDCLND).await, Some("randsk".to_string()));
    }

    #[tokio::test]
    async fn test_from_cookie_header() {
        let session = Session::from_cookie_header(" BDUSS=abc ; STOKEN=def; junk").unwrap();
        assert_eq!(session.cookie(BDUSS).await, Some("abc".to_string()));
        assert_eq!(session.cookie(STOKEN).await, Some("def".to_string()));
    }

    #[test]
    fn test_missing_bduss() {
        assert!(Session::new("  ", None).is_err());
        assert!(Session::from_cookie_header("STOKEN=def").is_err());
    }

    #[tokio::test]
    async fn test_bdstoken_cache() {
        let session = Session::new("bduss-value", None).unwrap();
        assert_eq!(session.cached_bdstoken().await, None);

        session.store_bdstoken("token").await;
        assert_eq!(session.cached_bdstoken().await, Some("token".to_string()));
    }
}
