//! Command line configuration.
//!
//! Everything lives in one `config.toml`, `~/.config/guildsheet/config.toml`
//! by default:
//!
//! ```toml
//! [google]
//! client_id = "pass::guild/google-client-id"
//! client_secret = "env::GUILDSHEET_CLIENT_SECRET"
//!
//! [sheets]
//! spreadsheet_id = "1AbC..."
//! api_key = "env::GUILDSHEET_API_KEY"
//!
//! [roster]
//! refresh_interval_secs = 10
//! ```
//!
//! `client_id`, `client_secret` and `api_key` accept secret references
//! (`pass::path`, `env::VAR`), see [`crate::secret`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use guildsheet_server::{RosterConfig, RosterSchema};
use guildsheet_sheets::google::{GoogleConfig, OAuthCredentials};
use serde::{Deserialize, Serialize};

use crate::secret;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildConfig {
    pub google: GoogleSettings,
    pub sheets: SheetsSettings,
    pub roster: RosterSettings,
}

/// OAuth client registration and token location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    /// Cloud Console client JSON, used when `client_id`/`client_secret` are unset.
    pub credentials_file: Option<PathBuf>,
    pub token_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsSettings {
    pub spreadsheet_id: Option<String>,
    /// Key for reads. Writes always use the OAuth token.
    pub api_key: Option<String>,
    pub members_sheet: String,
    pub profiles_sheet: String,
}

impl Default for SheetsSettings {
    fn default() -> Self {
        let schema = RosterSchema::default();
        Self {
            spreadsheet_id: None,
            api_key: None,
            members_sheet: schema.members_sheet,
            profiles_sheet: schema.profiles_sheet,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterSettings {
    pub refresh_interval_secs: u64,
    pub first_data_row: u32,
}

impl Default for RosterSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: RosterConfig::DEFAULT_REFRESH_INTERVAL_SECS,
            first_data_row: RosterSchema::default().first_data_row,
        }
    }
}

impl GuildConfig {
    /// Loads `path`, or the default file. A missing default file yields the
    /// defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("guildsheet")
            .join("config.toml")
    }

    pub fn roster_config(&self) -> RosterConfig {
        let schema = RosterSchema {
            members_sheet: self.sheets.members_sheet.clone(),
            profiles_sheet: self.sheets.profiles_sheet.clone(),
            first_data_row: self.roster.first_data_row,
        };
        RosterConfig::default()
            .with_schema(schema)
            .with_refresh_interval(Duration::from_secs(self.roster.refresh_interval_secs))
    }

    /// Builds the backend configuration, resolving secret references.
    pub fn google_config(&self) -> Result<GoogleConfig, String> {
        let credentials = self.google.resolve_credentials()?;
        let spreadsheet_id = self.sheets.spreadsheet_id.as_deref().ok_or_else(|| {
            format!(
                "spreadsheet_id is missing from [sheets] in {}",
                Self::default_path().display()
            )
        })?;

        let mut config = GoogleConfig::new(credentials, spreadsheet_id);
        if let Some(raw) = self.sheets.api_key.as_deref() {
            let key =
                secret::resolve(raw).map_err(|e| format!("failed to resolve api_key: {}", e))?;
            config = config.with_api_key(key);
        }
        if let Some(path) = &self.google.token_path {
            config = config.with_token_path(path);
        }
        Ok(config)
    }
}

impl GoogleSettings {
    /// Inline `client_id`/`client_secret` win over `credentials_file`.
    pub fn resolve_credentials(&self) -> Result<OAuthCredentials, String> {
        let mut credentials = match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret_ref)) => {
                let id = secret::resolve(id)
                    .map_err(|e| format!("failed to resolve client_id: {}", e))?;
                let secret = secret::resolve(secret_ref)
                    .map_err(|e| format!("failed to resolve client_secret: {}", e))?;
                OAuthCredentials::new(id, secret)
            }
            (Some(_), None) => {
                return Err("client_secret is missing from [google] in config.toml".to_string());
            }
            (None, Some(_)) => {
                return Err("client_id is missing from [google] in config.toml".to_string());
            }
            (None, None) => match &self.credentials_file {
                Some(path) => OAuthCredentials::from_file(path).map_err(|e| e.to_string())?,
                None => {
                    return Err(format!(
                        "Google credentials not found. Add to {}:\n  \
                         [google]\n  \
                         client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                         client_secret = \"YOUR_SECRET\"\n\n  \
                         Or run: guildsheet auth login --credentials-file <path>",
                        GuildConfig::default_path().display()
                    ));
                }
            },
        };

        if let Some(uri) = &self.redirect_uri {
            credentials = credentials.with_redirect_uri(uri);
        }
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_roster_defaults() {
        let config = GuildConfig::default();
        let roster = config.roster_config();
        assert_eq!(roster.schema, RosterSchema::default());
        assert_eq!(roster.refresh_interval, Duration::from_secs(10));
    }

    #[test]
    fn parse_full_file() {
        let config: GuildConfig = toml::from_str(
            r#"
[google]
client_id = "id.apps.googleusercontent.com"
client_secret = "secret"
redirect_uri = "http://localhost:8085"
token_path = "/tmp/guild-token.json"

[sheets]
spreadsheet_id = "sheet-1"
api_key = "key-1"
members_sheet = "roster"

[roster]
refresh_interval_secs = 30
first_data_row = 3
"#,
        )
        .unwrap();

        let roster = config.roster_config();
        assert_eq!(roster.schema.members_sheet, "roster");
        assert_eq!(roster.schema.profiles_sheet, "line_profiles");
        assert_eq!(roster.schema.first_data_row, 3);
        assert_eq!(roster.refresh_interval, Duration::from_secs(30));

        let google = config.google_config().unwrap();
        assert_eq!(google.spreadsheet_id, "sheet-1");
        assert_eq!(google.api_key.as_deref(), Some("key-1"));
        assert_eq!(google.credentials.redirect_uri, "http://localhost:8085");
        assert_eq!(google.token_path, PathBuf::from("/tmp/guild-token.json"));
    }

    #[test]
    fn env_references_are_resolved() {
        unsafe {
            std::env::set_var("_GS_TEST_CLIENT_SECRET", "from-env");
            std::env::set_var("_GS_TEST_API_KEY", "key-from-env");
        }
        let config: GuildConfig = toml::from_str(
            r#"
[google]
client_id = "id.apps.googleusercontent.com"
client_secret = "env::_GS_TEST_CLIENT_SECRET"

[sheets]
spreadsheet_id = "sheet-1"
api_key = "env::_GS_TEST_API_KEY"
"#,
        )
        .unwrap();

        let google = config.google_config().unwrap();
        assert_eq!(google.credentials.client_secret, "from-env");
        assert_eq!(google.api_key.as_deref(), Some("key-from-env"));
        unsafe {
            std::env::remove_var("_GS_TEST_CLIENT_SECRET");
            std::env::remove_var("_GS_TEST_API_KEY");
        }
    }

    #[test]
    fn credentials_file_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(
            &path,
            r#"{"installed": {"client_id": "f.apps.googleusercontent.com", "client_secret": "s"}}"#,
        )
        .unwrap();

        let settings = GoogleSettings {
            credentials_file: Some(path),
            ..Default::default()
        };
        let creds = settings.resolve_credentials().unwrap();
        assert_eq!(creds.client_id, "f.apps.googleusercontent.com");
    }

    #[test]
    fn partial_credentials_error() {
        let only_id = GoogleSettings {
            client_id: Some("id.apps.googleusercontent.com".to_string()),
            ..Default::default()
        };
        assert!(only_id.resolve_credentials().unwrap_err().contains("client_secret"));
        assert!(
            GoogleSettings::default()
                .resolve_credentials()
                .unwrap_err()
                .contains("credentials not found")
        );
    }

    #[test]
    fn missing_spreadsheet_id() {
        let config = GuildConfig {
            google: GoogleSettings {
                client_id: Some("id.apps.googleusercontent.com".to_string()),
                client_secret: Some("s".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.google_config().unwrap_err().contains("spreadsheet_id"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(GuildConfig::load(Some(Path::new("/nonexistent/guildsheet.toml"))).is_err());
    }
}
