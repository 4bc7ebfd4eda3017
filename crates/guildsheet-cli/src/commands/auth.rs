//! Authorization commands.
//!
//! Writes need an OAuth token for the spreadsheet. `auth login` sends the
//! user to Google's consent page, takes the authorization code back (from
//! `--code` or stdin) and stores the resulting token.

use std::path::{Path, PathBuf};

use guildsheet_sheets::CredentialStore;
use guildsheet_sheets::google::{GoogleCredentialStore, OAuthClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::GuildConfig;
use crate::error::{CliError, CliResult};

/// Client credentials given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialOverride {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub credentials_file: Option<PathBuf>,
}

impl CredentialOverride {
    fn is_empty(&self) -> bool {
        self.client_id.is_none() && self.client_secret.is_none() && self.credentials_file.is_none()
    }

    /// The configuration with these credentials taking precedence.
    fn apply(&self, config: &GuildConfig) -> GuildConfig {
        let mut config = config.clone();
        if let (Some(id), Some(secret)) = (&self.client_id, &self.client_secret) {
            config.google.client_id = Some(id.clone());
            config.google.client_secret = Some(secret.clone());
        } else if let Some(path) = &self.credentials_file {
            config.google.client_id = None;
            config.google.client_secret = None;
            config.google.credentials_file = Some(path.clone());
        }
        config
    }
}

fn credential_store(config: &GuildConfig) -> CliResult<GoogleCredentialStore> {
    let google = config.google_config().map_err(CliError::Config)?;
    google.validate()?;
    Ok(GoogleCredentialStore::new(&google)?)
}

pub fn url(config: &GuildConfig) -> CliResult<()> {
    let store = credential_store(config)?;
    println!("{}", store.authorization_url(&OAuthClient::generate_state()));
    Ok(())
}

pub async fn login(
    config: &GuildConfig,
    config_path: &Path,
    overrides: CredentialOverride,
    code: Option<String>,
    no_browser: bool,
    force: bool,
) -> CliResult<()> {
    let effective = overrides.apply(config);
    let store = credential_store(&effective)?;

    if !overrides.is_empty() {
        save_credentials(config_path, &overrides);
    }

    if store.is_authorized() && !store.needs_reauth() && !force {
        println!("Already authorized. Use --force to authorize again.");
        return Ok(());
    }

    // A code passed with --code came from an earlier `auth url`, whose state
    // was not kept.
    let (code, expected_state) = match code {
        Some(code) => (code, None),
        None => {
            let state = OAuthClient::generate_state();
            let url = store.authorization_url(&state);
            println!("Open this page and grant access to the spreadsheet:");
            println!();
            println!("  {}", url);
            println!();
            if !no_browser && let Err(e) = open::that(&url) {
                warn!(error = %e, "could not open a browser");
            }
            println!("Paste the authorization code, or the whole redirected URL:");
            (read_line().await?, Some(state))
        }
    };

    let code = extract_code(&code, expected_state.as_deref())?;
    store.exchange_code(&code).await?;

    info!(path = %store.storage().path().display(), "token stored");
    println!("Authorization successful.");
    Ok(())
}

pub fn status(config: &GuildConfig) -> CliResult<()> {
    let store = credential_store(config)?;
    let path = store.storage().path().display().to_string();

    match store.storage().get() {
        Some(token) if !store.needs_reauth() => {
            println!("Authorized (token at {}).", path);
            println!("  last refresh  {}", token.last_refresh.to_rfc3339());
            match token.expires_at {
                Some(at) if token.is_expired() => {
                    println!("  access token  expired {}, refreshed on next write", at)
                }
                Some(at) => println!("  access token  valid until {}", at),
                None => println!("  access token  does not expire"),
            }
            println!(
                "  refresh token {}",
                if token.refresh_token.is_some() { "present" } else { "missing" }
            );
            Ok(())
        }
        Some(_) => Err(CliError::AuthRequired(format!(
            "stored token at {} lacks the spreadsheet scope; run `guildsheet auth login --force`",
            path
        ))),
        None => Err(CliError::AuthRequired(format!(
            "no token at {}; run `guildsheet auth login`",
            path
        ))),
    }
}

pub fn logout(config: &GuildConfig) -> CliResult<()> {
    let store = credential_store(config)?;
    store.storage().clear()?;
    println!("Removed stored token.");
    Ok(())
}

async fn read_line() -> CliResult<String> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(line)
}

/// Query string of a pasted redirect URL, or `None` for a bare code.
fn redirect_query(input: &str) -> Option<&str> {
    match input.split_once('?') {
        Some((_, query)) => Some(query.split_once('#').map_or(query, |(q, _)| q)),
        None => input.contains('=').then_some(input),
    }
}

/// Accepts a bare code or a redirect URL carrying `code`.
///
/// A redirect must echo `expected_state` when one is given, and an `error`
/// parameter means consent was refused.
fn extract_code(input: &str, expected_state: Option<&str>) -> CliResult<String> {
    let input = input.trim();
    let code = match redirect_query(input) {
        None => input.to_string(),
        Some(query) => {
            let (mut code, mut state, mut error) = (None, None, None);
            for pair in query.split('&') {
                let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
                let value = urlencoding::decode(raw)
                    .map_err(|e| CliError::Config(format!("malformed `{}` in redirect: {}", key, e)))?
                    .into_owned();
                match key {
                    "code" => code = Some(value),
                    "state" => state = Some(value),
                    "error" => error = Some(value),
                    _ => {}
                }
            }
            if let Some(error) = error {
                return Err(CliError::AuthRequired(format!("consent was refused: {}", error)));
            }
            if let Some(expected) = expected_state
                && state.as_deref() != Some(expected)
            {
                return Err(CliError::Config(
                    "redirect state does not match this login; start `guildsheet auth login` again"
                        .to_string(),
                ));
            }
            code.unwrap_or_default()
        }
    };
    if code.is_empty() {
        return Err(CliError::Config("no authorization code given".to_string()));
    }
    Ok(code)
}

/// Stores command line credentials in `[google]` so later commands find
/// them. Other settings and comments in the file are kept.
fn save_credentials(config_path: &Path, overrides: &CredentialOverride) {
    let content = std::fs::read_to_string(config_path).unwrap_or_default();
    let mut doc = match content.parse::<toml_edit::DocumentMut>() {
        Ok(doc) => doc,
        Err(e) => {
            warn!(path = %config_path.display(), error = %e, "config is not valid TOML, credentials not saved");
            return;
        }
    };

    if !doc.contains_key("google") {
        doc["google"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    let Some(google) = doc["google"].as_table_mut() else {
        warn!("[google] is not a table, credentials not saved");
        return;
    };

    if let (Some(id), Some(secret)) = (&overrides.client_id, &overrides.client_secret) {
        google["client_id"] = toml_edit::value(id.as_str());
        google["client_secret"] = toml_edit::value(secret.as_str());
    } else if let Some(path) = &overrides.credentials_file {
        google.remove("client_id");
        google.remove("client_secret");
        google["credentials_file"] = toml_edit::value(path.display().to_string());
    }

    if let Some(parent) = config_path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!(path = %parent.display(), error = %e, "could not create config directory");
        return;
    }

    match std::fs::write(config_path, doc.to_string()) {
        Ok(()) => println!("Credentials saved to {}", config_path.display()),
        Err(e) => warn!(path = %config_path.display(), error = %e, "could not save credentials"),
    }
}
