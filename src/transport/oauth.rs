//! OAuth 1.0a request signing (HMAC-SHA1)

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha1::Sha1;
use url::Url;

use crate::config::TwitterConfig;
use crate::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// Consumer and user-token credentials for signing requests
#[derive(Clone)]
pub struct OAuthCredentials {
    consumer_key: String,
    consumer_secret: String,
    token: String,
    token_secret: String,
}

impl OAuthCredentials {
    /// Create credentials from their four parts
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }

    /// Build the `Authorization` header value for a request
    ///
    /// JSON bodies are not part of the signature; only query parameters and
    /// the protocol parameters are.
    pub fn authorization_header(&self, method: &str, url: &str) -> Result<String> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        self.authorization_header_with(method, url, &nonce, &timestamp)
    }

    pub(crate) fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        nonce: &str,
        timestamp: &str,
    ) -> Result<String> {
        let parsed = Url::parse(url)
            .map_err(|e| Error::config("twitter.endpoint", format!("invalid URL: {}", e)))?;

        let mut oauth_params = vec![
            ("oauth_consumer_key", self.consumer_key.clone()),
            ("oauth_nonce", nonce.to_string()),
            ("oauth_signature_method", "HMAC-SHA1".to_string()),
            ("oauth_timestamp", timestamp.to_string()),
            ("oauth_token", self.token.clone()),
            ("oauth_version", "1.0".to_string()),
        ];

        let mut signed: Vec<(String, String)> = oauth_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        signed.extend(
            parsed
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        );

        let signature = sign(
            method,
            &base_url(&parsed),
            &signed,
            &self.consumer_secret,
            &self.token_secret,
        );
        oauth_params.push(("oauth_signature", signature));
        oauth_params.sort_by(|a, b| a.0.cmp(b.0));

        let fields: Vec<String> = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect();
        Ok(format!("OAuth {}", fields.join(", ")))
    }
}

impl From<&TwitterConfig> for OAuthCredentials {
    fn from(config: &TwitterConfig) -> Self {
        Self::new(
            config.consumer_key.clone(),
            config.consumer_secret.clone(),
            config.access_token.clone(),
            config.access_secret.clone(),
        )
    }
}

/// Compute the base64 HMAC-SHA1 signature of a request
pub(crate) fn sign(
    method: &str,
    base_url: &str,
    params: &[(String, String)],
    consumer_secret: &str,
    token_secret: &str,
) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(base_url),
        percent_encode(&parameter_string)
    );
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    // HMAC accepts keys of any length
    let mut mac = match HmacSha1::new_from_slice(key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC can take key of any size"),
    };
    mac.update(base_string.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Scheme, host, non-default port and path; no query or fragment
fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

/// RFC 3986 percent-encoding (unreserved characters pass through)
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    // Reference request from the platform's "creating a signature" guide
    #[test]
    fn signature_matches_published_reference() {
        let params = vec![
            pair("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
            pair("include_entities", "true"),
            pair("oauth_consumer_key", "xvz1evFS4wEEPTGEFPHBog"),
            pair("oauth_nonce", "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg"),
            pair("oauth_signature_method", "HMAC-SHA1"),
            pair("oauth_timestamp", "1318622958"),
            pair(
                "oauth_token",
                "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            ),
            pair("oauth_version", "1.0"),
        ];

        let signature = sign(
            "post",
            "https://api.twitter.com/1.1/statuses/update.json",
            &params,
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        );

        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn header_lists_sorted_protocol_parameters() {
        let credentials = OAuthCredentials::new("ck", "cs", "at", "as");
        let header = credentials
            .authorization_header_with("POST", "https://api.twitter.com/2/tweets", "nonce", "1700000000")
            .unwrap();

        assert!(header.starts_with("OAuth oauth_consumer_key=\"ck\", oauth_nonce=\"nonce\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.contains("oauth_timestamp=\"1700000000\""));
        assert!(header.contains("oauth_token=\"at\""));
        assert!(header.ends_with("oauth_version=\"1.0\""));

        let signature_pos = header.find("oauth_signature=").unwrap();
        let method_pos = header.find("oauth_signature_method=").unwrap();
        assert!(signature_pos < method_pos);
    }

    #[test]
    fn base_url_drops_query_and_default_port() {
        let url = Url::parse("HTTPS://API.Example.com:443/2/tweets?x=1").unwrap();
        assert_eq!(base_url(&url), "https://api.example.com/2/tweets");

        let url = Url::parse("http://localhost:8080/2/tweets").unwrap();
        assert_eq!(base_url(&url), "http://localhost:8080/2/tweets");
    }

    #[test]
    fn percent_encoding_keeps_unreserved() {
        assert_eq!(percent_encode("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(percent_encode("a b+c!"), "a%20b%2Bc%21");
    }
}
