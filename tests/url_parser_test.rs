//! Tests for share link normalization.

use pan_share::error::PanError;
use pan_share::url_parser::{share_token, surl, unify_shared_url, SHARED_URL_PREFIX};

mod standard_url {
    use super::*;

    #[test]
    fn plain() {
        let url = "https://pan.baidu.com/s/1AbC-dEf_123";
        assert_eq!(unify_shared_url(url).unwrap(), "https://pan.baidu.com/s/1AbC-dEf_123");
    }

    #[test]
    fn with_password_query() {
        let url = "https://pan.baidu.com/s/1AbCdEf?pwd=x1y2";
        assert_eq!(unify_shared_url(url).unwrap(), "https://pan.baidu.com/s/1AbCdEf");
    }

    #[test]
    fn http_scheme() {
        let url = "http://pan.baidu.com/s/1AbCdEf";
        assert_eq!(unify_shared_url(url).unwrap(), "https://pan.baidu.com/s/1AbCdEf");
    }

    #[test]
    fn without_scheme() {
        let url = "pan.baidu.com/s/1AbCdEf";
        assert_eq!(unify_shared_url(url).unwrap(), "https://pan.baidu.com/s/1AbCdEf");
    }

    #[test]
    fn embedded_in_text() {
        let url = "link: https://pan.baidu.com/s/1AbCdEf?pwd=x1y2 code: x1y2";
        assert_eq!(unify_shared_url(url).unwrap(), "https://pan.baidu.com/s/1AbCdEf");
    }
}

mod surl_url {
    use super::*;

    #[test]
    fn share_init() {
        let url = "https://pan.baidu.com/share/init?surl=AbCdEf";
        assert_eq!(unify_shared_url(url).unwrap(), "https://pan.baidu.com/s/1AbCdEf");
    }

    #[test]
    fn trailing_query() {
        let url = "https://pan.baidu.com/share/init?surl=AbCdEf?from=x";
        assert_eq!(unify_shared_url(url).unwrap(), "https://pan.baidu.com/s/1AbCdEf");
    }

    #[test]
    fn result_has_prefix() {
        let url = unify_shared_url("https://yun.baidu.com/share/init?surl=Zz").unwrap();
        assert!(url.starts_with(SHARED_URL_PREFIX));
        assert!(url.ends_with("/1Zz"));
    }
}

mod tokens {
    use super::*;

    #[test]
    fn token_of_unified_url() {
        let url = unify_shared_url("https://pan.baidu.com/share/init?surl=AbCdEf").unwrap();
        let token = share_token(&url).unwrap();
        assert_eq!(token, "1AbCdEf");
        assert_eq!(surl(token), "AbCdEf");
    }
}

mod invalid_inputs {
    use super::*;

    #[test]
    fn empty_string() {
        assert!(matches!(unify_shared_url(""), Err(PanError::InvalidUrl(_))));
    }

    #[test]
    fn other_host() {
        assert!(unify_shared_url("https://example.com/s/1abc").is_err());
    }

    #[test]
    fn baidu_without_token() {
        assert!(unify_shared_url("https://pan.baidu.com/").is_err());
        assert!(unify_shared_url("https://pan.baidu.com/s/").is_err());
    }

    #[test]
    fn error_carries_input() {
        let err = unify_shared_url("not a link").unwrap_err();
        assert!(err.to_string().contains("not a link"));
    }
}
