//! CSRF token lookup.
//!
//! The server sets a `csrftoken` cookie when the chat page is loaded and
//! expects the same value back in every mutating request.

use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use std::sync::Arc;

pub const CSRF_COOKIE_NAME: &str = "csrftoken";

/// Source of the CSRF token sent with mutating requests.
///
/// Never fails: a missing token is an empty string and the server rejects the
/// request.
pub trait CredentialProvider: Send + Sync {
    fn read_token(&self) -> String;
}

/// Extract the URL-decoded `csrftoken` value from a `Cookie` header string
/// such as `a=1; csrftoken=abc%3D`.
pub fn csrf_token_from_cookie_header(header: &str) -> String {
    let prefix = format!("{}=", CSRF_COOKIE_NAME);
    let Some(entry) = header
        .split(';')
        .map(str::trim)
        .find(|entry| entry.starts_with(&prefix))
    else {
        return String::new();
    };

    // Only the segment up to the next '=' counts as the value.
    let raw = entry[prefix.len()..].split('=').next().unwrap_or_default();
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Reads the token from the cookie jar shared with the HTTP client.
#[derive(Clone)]
pub struct CookieJarCredentials {
    jar: Arc<Jar>,
    origin: Url,
}

impl CookieJarCredentials {
    pub fn new(jar: Arc<Jar>, origin: Url) -> Self {
        CookieJarCredentials { jar, origin }
    }
}

impl CredentialProvider for CookieJarCredentials {
    fn read_token(&self) -> String {
        self.jar
            .cookies(&self.origin)
            .and_then(|header| header.to_str().map(csrf_token_from_cookie_header).ok())
            .unwrap_or_default()
    }
}

/// A fixed token, for servers where the token is obtained out of band.
#[derive(Clone, Debug, Default)]
pub struct StaticToken(pub String);

impl CredentialProvider for StaticToken {
    fn read_token(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_found_among_other_cookies() {
        let header = "sessionid=xyz; csrftoken=abc123; theme=dark";
        assert_eq!(csrf_token_from_cookie_header(header), "abc123");
    }

    #[test]
    fn test_token_is_url_decoded() {
        assert_eq!(csrf_token_from_cookie_header("csrftoken=a%2Fb%20c"), "a/b c");
    }

    #[test]
    fn test_missing_cookie_yields_empty_string() {
        assert_eq!(csrf_token_from_cookie_header("sessionid=xyz"), "");
        assert_eq!(csrf_token_from_cookie_header(""), "");
    }

    #[test]
    fn test_similar_cookie_name_is_ignored() {
        assert_eq!(csrf_token_from_cookie_header("xcsrftoken=nope; other=1"), "");
    }

    #[test]
    fn test_malformed_escape_falls_back_to_raw_value() {
        assert_eq!(csrf_token_from_cookie_header("csrftoken=%FF%FE"), "%FF%FE");
    }

    #[test]
    fn test_jar_credentials_read_cookie_for_origin() {
        let jar = Arc::new(Jar::default());
        let origin: Url = "http://127.0.0.1:8000/".parse().unwrap();
        jar.add_cookie_str("csrftoken=tok%21; Path=/", &origin);

        let credentials = CookieJarCredentials::new(jar, origin);
        assert_eq!(credentials.read_token(), "tok!");
    }

    #[test]
    fn test_empty_jar_reads_empty_token() {
        let origin: Url = "http://127.0.0.1:8000/".parse().unwrap();
        let credentials = CookieJarCredentials::new(Arc::new(Jar::default()), origin);
        assert_eq!(credentials.read_token(), "");
    }
}
