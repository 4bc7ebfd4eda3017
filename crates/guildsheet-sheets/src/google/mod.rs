//! Google Sheets backend.
//!
//! # Authorization
//!
//! Writes need an OAuth token for an account with edit access to the
//! spreadsheet. The consent flow runs once:
//!
//! 1. [`crate::CredentialStore::authorization_url`] prints Google's consent page URL
//!    (offline access, `spreadsheets` scope)
//! 2. the user approves and copies the `code` parameter from the redirect,
//!    whose `state` must match the one sent
//! 3. [`crate::CredentialStore::exchange_code`] trades it for a token, persisted at
//!    [`GoogleConfig::token_path`]
//!
//! Afterwards the access token is refreshed transparently when it expires.
//! Reads can skip OAuth entirely when an API key is configured and the
//! spreadsheet is link-readable.
//!
//! # Example
//!
//! ```ignore
//! use guildsheet_sheets::google::{GoogleConfig, GoogleSheets, OAuthCredentials};
//!
//! let credentials = OAuthCredentials::from_file("client_secret.json")?;
//! let config = GoogleConfig::new(credentials, "1AbC...").with_api_key(api_key);
//! let backend = GoogleSheets::connect(&config)?;
//!
//! let rows = backend.gateway().read_range(&range).await?;
//! ```

mod client;
mod config;
mod credentials;
mod gateway;
mod oauth;
mod response;
mod tokens;

use std::sync::Arc;

pub use client::{ReadAuth, SheetsClient};
pub use config::{DEFAULT_REDIRECT_URI, GoogleConfig, OAuthCredentials};
pub use credentials::GoogleCredentialStore;
pub use gateway::GoogleSheetGateway;
pub use oauth::{OAuthClient, RefreshedToken};
pub use tokens::{TokenInfo, TokenStorage};

use crate::error::{SheetError, SheetResult};

/// The credential store and gateway for one spreadsheet, sharing a token.
pub struct GoogleSheets {
    credentials: Arc<GoogleCredentialStore>,
    gateway: Arc<GoogleSheetGateway>,
}

impl GoogleSheets {
    /// Validates `config` and builds both halves of the backend.
    pub fn connect(config: &GoogleConfig) -> SheetResult<Self> {
        config.validate()?;
        let credentials = GoogleCredentialStore::shared(config)?;
        let gateway = GoogleSheetGateway::new(config, credentials.clone())
            .map(Arc::new)
            .map_err(|e| SheetError::configuration(format!("failed to build gateway: {}", e)))?;
        Ok(Self {
            credentials,
            gateway,
        })
    }

    pub fn credentials(&self) -> Arc<GoogleCredentialStore> {
        self.credentials.clone()
    }

    pub fn gateway(&self) -> Arc<GoogleSheetGateway> {
        self.gateway.clone()
    }
}
