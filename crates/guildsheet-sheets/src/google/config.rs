//! Google Sheets backend configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{SheetError, SheetResult};

/// Redirect URI used when none is configured. Google accepts any loopback
/// address for installed applications.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost";

/// OAuth 2.0 client registration.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    /// Where the consent page sends the authorization code.
    pub redirect_uri: String,
}

/// The JSON downloaded from the Cloud Console, either nested under
/// `installed`/`web` or flat.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientSection>,
    web: Option<ClientSection>,
    client_id: Option<String>,
    client_secret: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSection {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
        }
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    /// Loads a client registration file.
    pub fn from_file(path: impl AsRef<Path>) -> SheetResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SheetError::configuration(format!(
                "failed to read credentials file {}: {}",
                path.display(),
                e
            ))
            .with_source(e)
        })?;
        Self::from_json(&content)
    }

    /// Parses a client registration. The first listed redirect URI wins.
    pub fn from_json(json: &str) -> SheetResult<Self> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            SheetError::configuration(format!("failed to parse credentials JSON: {}", e))
        })?;

        let (client_id, client_secret, redirect_uris) = match file.installed.or(file.web) {
            Some(section) => (section.client_id, section.client_secret, section.redirect_uris),
            None => match (file.client_id, file.client_secret) {
                (Some(id), Some(secret)) => (id, secret, file.redirect_uris),
                _ => {
                    return Err(SheetError::configuration(
                        "credentials file needs an 'installed'/'web' section or top-level 'client_id'/'client_secret'",
                    ));
                }
            },
        };

        let mut credentials = Self::new(client_id, client_secret);
        if let Some(uri) = redirect_uris.into_iter().next() {
            credentials.redirect_uri = uri;
        }
        Ok(credentials)
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        if self.redirect_uri.is_empty() {
            return Err("redirect_uri is required");
        }
        Ok(())
    }
}

/// Everything needed to reach one spreadsheet.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub credentials: OAuthCredentials,
    pub spreadsheet_id: String,
    /// Key for unauthenticated reads. When unset, reads use the OAuth token.
    pub api_key: Option<String>,
    /// Where the OAuth token is persisted.
    pub token_path: PathBuf,
    pub scopes: Vec<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl GoogleConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Read/write access to spreadsheets.
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/spreadsheets";

    pub fn new(credentials: OAuthCredentials, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            credentials,
            spreadsheet_id: spreadsheet_id.into(),
            api_key: None,
            token_path: Self::default_token_path(),
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("guildsheet/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// `~/.local/share/guildsheet/google-token.json` on Linux.
    pub fn default_token_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("guildsheet")
            .join("google-token.json")
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn validate(&self) -> SheetResult<()> {
        self.credentials
            .validate()
            .map_err(|e| SheetError::configuration(format!("invalid credentials: {}", e)))?;
        if self.spreadsheet_id.trim().is_empty() {
            return Err(SheetError::configuration("spreadsheet_id is required"));
        }
        if self.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(SheetError::configuration("api_key must not be blank when set"));
        }
        if self.scopes.is_empty() {
            return Err(SheetError::configuration("at least one OAuth scope is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credentials() -> OAuthCredentials {
        OAuthCredentials::new("test-client.apps.googleusercontent.com", "test-secret")
    }

    #[test]
    fn credentials_validation() {
        assert!(test_credentials().validate().is_ok());
        assert!(OAuthCredentials::new("", "secret").validate().is_err());
        assert!(OAuthCredentials::new("bad-id", "secret").validate().is_err());
        assert!(
            OAuthCredentials::new("x.apps.googleusercontent.com", "")
                .validate()
                .is_err()
        );
        assert!(
            test_credentials()
                .with_redirect_uri("")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn config_defaults() {
        let config = GoogleConfig::new(test_credentials(), "sheet-id");
        assert_eq!(config.spreadsheet_id, "sheet-id");
        assert!(config.api_key.is_none());
        assert_eq!(config.scopes, vec![GoogleConfig::DEFAULT_SCOPE.to_string()]);
        assert_eq!(config.credentials.redirect_uri, DEFAULT_REDIRECT_URI);
        assert!(config.token_path.ends_with("guildsheet/google-token.json"));
        assert!(config.user_agent.starts_with("guildsheet/"));
    }

    #[test]
    fn config_validation() {
        let config = GoogleConfig::new(test_credentials(), "sheet-id");
        assert!(config.validate().is_ok());

        let no_sheet = GoogleConfig::new(test_credentials(), " ");
        assert!(no_sheet.validate().is_err());

        let blank_key = GoogleConfig::new(test_credentials(), "id").with_api_key("");
        assert!(blank_key.validate().is_err());

        let no_scope = GoogleConfig::new(test_credentials(), "id").with_scopes(vec![]);
        assert!(no_scope.validate().is_err());
    }

    #[test]
    fn credentials_from_installed_json() {
        let json = r#"{
            "installed": {
                "client_id": "id.apps.googleusercontent.com",
                "client_secret": "secret",
                "project_id": "guild",
                "redirect_uris": ["http://localhost:8085"]
            }
        }"#;
        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "secret");
        assert_eq!(creds.redirect_uri, "http://localhost:8085");
    }

    #[test]
    fn credentials_from_web_json_without_redirects() {
        let json = r#"{"web": {"client_id": "w.apps.googleusercontent.com", "client_secret": "s"}}"#;
        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.redirect_uri, DEFAULT_REDIRECT_URI);
    }

    #[test]
    fn credentials_from_flat_json() {
        let json = r#"{"client_id": "f.apps.googleusercontent.com", "client_secret": "s", "refresh_token": "r"}"#;
        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "f.apps.googleusercontent.com");
    }

    #[test]
    fn credentials_from_invalid_json() {
        let err = OAuthCredentials::from_json(r#"{"other": {}}"#).unwrap_err();
        assert!(err.message().contains("client_id"));

        let err = OAuthCredentials::from_json("not json").unwrap_err();
        assert!(err.message().contains("parse"));
    }

    #[test]
    fn credentials_from_missing_file() {
        let err = OAuthCredentials::from_file("/nonexistent/guildsheet/creds.json").unwrap_err();
        assert_eq!(err.code(), crate::error::SheetErrorCode::ConfigurationError);
    }
}
