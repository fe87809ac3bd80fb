//! Google OAuth token-endpoint client
//!
//! Executes the refresh grant (RFC 6749 §6) and classifies failures into
//! transient (transport, timeout, 5xx) and permanent (the provider
//! explicitly rejected the refresh token).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use primeline_core::{RefreshedToken, TokenRefresher};
use primeline_domain::{CredentialError, CredentialRecord, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Error codes (RFC 6749 §5.2) that mean the refresh token itself is dead
/// and no retry can succeed without operator intervention.
const PERMANENT_REJECTIONS: [&str; 3] = ["invalid_grant", "invalid_client", "unauthorized_client"];

/// Token refresher backed by the Google OAuth token endpoint.
pub struct GoogleTokenRefresher {
    client: Client,
}

impl GoogleTokenRefresher {
    /// Create a refresher with the given request timeout.
    ///
    /// # Errors
    /// Returns `Config` if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            CredentialError::Config(format!("failed to build HTTP client: {err}"))
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TokenRefresher for GoogleTokenRefresher {
    async fn refresh(&self, record: &CredentialRecord) -> Result<RefreshedToken> {
        debug!(endpoint = %record.token_uri, "exchanging refresh token");

        let response = self
            .client
            .post(&record.token_uri)
            .form(&[
                ("client_id", record.client_id.as_str()),
                ("client_secret", record.client_secret.as_str()),
                ("refresh_token", record.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|err| {
                CredentialError::RefreshTransient(format!("token refresh request failed: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_rejection(status, &body));
        }

        let token: TokenEndpointResponse = response.json().await.map_err(|err| {
            CredentialError::RefreshTransient(format!("failed to parse token response: {err}"))
        })?;

        Ok(RefreshedToken {
            access_token: token.access_token,
            expires_in: token.expires_in,
            refresh_token: token.refresh_token,
        })
    }
}

/// Split a non-success token-endpoint response into transient vs permanent.
fn classify_rejection(status: StatusCode, body: &str) -> CredentialError {
    if status.is_server_error() {
        return CredentialError::RefreshTransient(format!(
            "token endpoint error ({status}): {body}"
        ));
    }

    match serde_json::from_str::<TokenEndpointError>(body) {
        Ok(rejection) if PERMANENT_REJECTIONS.contains(&rejection.error.as_str()) => {
            CredentialError::RefreshPermanent(rejection.to_string())
        }
        Ok(rejection) => {
            CredentialError::RefreshTransient(format!("token refresh failed ({status}): {rejection}"))
        }
        Err(_) => {
            CredentialError::RefreshTransient(format!("token refresh failed ({status}): {body}"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
}

/// OAuth error response body (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
struct TokenEndpointError {
    error: String,
    error_description: Option<String>,
}

impl fmt::Display for TokenEndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn record(token_uri: String) -> CredentialRecord {
        CredentialRecord {
            token: "ya29.expired".to_string(),
            refresh_token: "1//refresh".to_string(),
            token_uri,
            client_id: "id.apps.googleusercontent.com".to_string(),
            client_secret: "GOCSPX-secret".to_string(),
            scopes: vec!["https://www.googleapis.com/auth/gmail.send".to_string()],
            universe_domain: "googleapis.com".to_string(),
            account: String::new(),
            expiry: None,
        }
    }

    fn refresher() -> GoogleTokenRefresher {
        GoogleTokenRefresher::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn successful_grant_returns_new_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=1%2F%2Frefresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.new",
                "expires_in": 3599,
                "token_type": "Bearer",
                "scope": "https://www.googleapis.com/auth/gmail.send"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let refreshed =
            refresher().refresh(&record(format!("{}/token", server.uri()))).await.unwrap();

        assert_eq!(refreshed.access_token, "ya29.new");
        assert_eq!(refreshed.expires_in, 3599);
        // Google omits the refresh token on refresh grants
        assert!(refreshed.refresh_token.is_none());
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.new",
                "expires_in": 3600,
                "refresh_token": "1//rotated"
            })))
            .mount(&server)
            .await;

        let refreshed = refresher().refresh(&record(server.uri())).await.unwrap();
        assert_eq!(refreshed.refresh_token.as_deref(), Some("1//rotated"));
    }

    #[tokio::test]
    async fn invalid_grant_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&server)
            .await;

        let err = refresher().refresh(&record(server.uri())).await.unwrap_err();
        match err {
            CredentialError::RefreshPermanent(msg) => {
                assert!(msg.contains("invalid_grant"));
                assert!(msg.contains("revoked"));
            }
            other => panic!("expected RefreshPermanent, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_rejections_are_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "temporarily_unavailable"
            })))
            .mount(&server)
            .await;

        let err = refresher().refresh(&record(server.uri())).await.unwrap_err();
        assert!(matches!(err, CredentialError::RefreshTransient(_)));
    }

    #[tokio::test]
    async fn server_errors_are_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = refresher().refresh(&record(server.uri())).await.unwrap_err();
        assert!(matches!(err, CredentialError::RefreshTransient(_)));
    }

    #[tokio::test]
    async fn connection_failure_is_transient() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so the request fails with ECONNREFUSED

        let err = refresher().refresh(&record(format!("http://{addr}"))).await.unwrap_err();
        assert!(matches!(err, CredentialError::RefreshTransient(_)));
    }
}
