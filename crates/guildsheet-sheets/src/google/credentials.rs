//! Token lifecycle: stored token, refresh on expiry, consent-code exchange.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{SheetError, SheetResult};
use crate::gateway::{AccessToken, BoxFuture, CredentialStore};

use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::TokenStorage;

/// [`CredentialStore`] backed by a token file and Google's token endpoint.
#[derive(Debug)]
pub struct GoogleCredentialStore {
    scopes: Vec<String>,
    storage: TokenStorage,
    oauth: OAuthClient,
    /// Serializes refreshes so concurrent writers share one refresh.
    refresh_lock: Mutex<()>,
}

impl GoogleCredentialStore {
    /// Builds the store and loads any previously saved token.
    ///
    /// A missing token file is not an error; a corrupt one is logged and
    /// treated as missing so the consent flow can overwrite it.
    pub fn new(config: &GoogleConfig) -> SheetResult<Self> {
        let storage = TokenStorage::new(&config.token_path);
        if let Err(e) = storage.load() {
            warn!(error = %e, "ignoring unreadable token file");
        }
        let oauth = OAuthClient::new(config.credentials.clone(), config.timeout)?;
        Ok(Self {
            scopes: config.scopes.clone(),
            storage,
            oauth,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn shared(config: &GoogleConfig) -> SheetResult<Arc<Self>> {
        Self::new(config).map(Arc::new)
    }

    pub fn storage(&self) -> &TokenStorage {
        &self.storage
    }

    /// True when the stored token is missing a configured scope.
    pub fn needs_reauth(&self) -> bool {
        self.storage.needs_reauth(&self.scopes)
    }

    async fn current_token(&self) -> SheetResult<AccessToken> {
        let tokens = self.storage.get().ok_or_else(|| {
            SheetError::not_authorized("no stored token; run `guildsheet auth login`")
        })?;
        if !tokens.is_expired() {
            return Ok(AccessToken::new(tokens.access_token));
        }

        let _guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we waited.
        if let Some(tokens) = self.storage.get()
            && !tokens.is_expired()
        {
            return Ok(AccessToken::new(tokens.access_token));
        }

        let refresh_token = tokens.refresh_token.as_deref().ok_or_else(|| {
            SheetError::authentication("stored token has no refresh token; run `guildsheet auth login`")
        })?;

        debug!("access token expired, refreshing");
        let refreshed = self.oauth.refresh_token(refresh_token).await?;
        let updated = self.storage.apply_refresh(
            refreshed.access_token,
            refreshed.expires_in,
            refreshed.refresh_token,
        )?;
        Ok(AccessToken::new(updated.access_token))
    }

    async fn store_code(&self, code: &str) -> SheetResult<()> {
        let tokens = self.oauth.exchange_code(code, &self.scopes).await?;
        if tokens.refresh_token.is_none() {
            warn!("Google returned no refresh token; the token will stop working when it expires");
        }
        self.storage.set(tokens)?;
        info!(path = %self.storage.path().display(), "stored Google token");
        Ok(())
    }
}

impl CredentialStore for GoogleCredentialStore {
    fn access_token(&self) -> BoxFuture<'_, SheetResult<AccessToken>> {
        Box::pin(self.current_token())
    }

    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, SheetResult<()>> {
        Box::pin(self.store_code(code))
    }

    fn authorization_url(&self, state: &str) -> String {
        self.oauth.authorization_url(&self.scopes, state)
    }

    fn is_authorized(&self) -> bool {
        self.storage.has_token()
    }
}
