//! OAuth 2.0 authorization-code flow against Google's endpoints.
//!
//! The flow is split across two user actions: print the consent URL, then
//! paste back the code Google hands out. Offline access is requested so the
//! stored token carries a refresh token.

use std::time::Duration;

use rand::Rng as _;
use rand::distr::Alphanumeric;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{SheetError, SheetResult};

use super::config::OAuthCredentials;
use super::response::{oauth_error, request_error};
use super::tokens::TokenInfo;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const STATE_LENGTH: usize = 24;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

/// Result of a refresh-token grant.
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    pub access_token: String,
    pub expires_in: Option<i64>,
    /// Set when Google rotated the refresh token.
    pub refresh_token: Option<String>,
}

#[derive(Debug)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    http_client: reqwest::Client,
}

impl OAuthClient {
    pub fn new(credentials: OAuthCredentials, timeout: Duration) -> SheetResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                SheetError::internal(format!("failed to create HTTP client: {}", e)).with_source(e)
            })?;
        Ok(Self {
            credentials,
            http_client,
        })
    }

    /// Random anti-forgery value for the `state` parameter.
    pub fn generate_state() -> String {
        rand::rng()
            .sample_iter(Alphanumeric)
            .take(STATE_LENGTH)
            .map(char::from)
            .collect()
    }

    /// Consent page URL requesting offline access to `scopes`.
    pub fn authorization_url(&self, scopes: &[String], state: &str) -> String {
        let scope = scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&\
            access_type=offline&prompt=consent",
            GOOGLE_AUTH_URL,
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(&self.credentials.redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(state),
        )
    }

    /// Trades an authorization code for a token set.
    pub async fn exchange_code(&self, code: &str, scopes: &[String]) -> SheetResult<TokenInfo> {
        let code = code.trim();
        if code.is_empty() {
            return Err(SheetError::bad_request("authorization code is empty"));
        }

        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
        ];
        let response = self.post_token(&params, "code exchange").await?;

        let granted = response
            .scope
            .map(|s| s.split_whitespace().map(String::from).collect::<Vec<_>>())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| scopes.to_vec());

        info!("obtained Google access token");
        Ok(TokenInfo::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            granted,
        ))
    }

    /// Obtains a new access token from a refresh token.
    pub async fn refresh_token(&self, refresh_token: &str) -> SheetResult<RefreshedToken> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let response = self.post_token(&params, "token refresh").await?;

        debug!("refreshed Google access token");
        Ok(RefreshedToken {
            access_token: response.access_token,
            expires_in: response.expires_in,
            refresh_token: response.refresh_token,
        })
    }

    async fn post_token(
        &self,
        params: &[(&str, &str)],
        context: &str,
    ) -> SheetResult<TokenResponse> {
        let response = self
            .http_client
            .post(GOOGLE_TOKEN_URL)
            .form(params)
            .send()
            .await
            .map_err(|e| request_error(e, context))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| request_error(e, context))?;

        if !status.is_success() {
            return Err(oauth_error(status, &body, context));
        }

        serde_json::from_str(&body).map_err(|e| {
            SheetError::invalid_response(format!("{}: invalid token response: {}", context, e))
        })
    }
}
