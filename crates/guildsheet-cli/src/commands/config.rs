//! Configuration commands.

use std::path::Path;

use crate::config::GuildConfig;
use crate::error::{CliError, CliResult};

/// Prints the configuration as loaded, with defaults filled in.
pub fn dump(config: &GuildConfig, path: &Path) -> CliResult<()> {
    let text = toml::to_string_pretty(config)
        .map_err(|e| CliError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# {}", path.display());
    println!("{}", text);
    Ok(())
}

/// Checks every setting a roster command would need, resolving secrets.
pub fn validate(config: &GuildConfig) -> CliResult<()> {
    let google = config.google_config().map_err(CliError::Config)?;
    google.validate()?;
    config.roster_config().validate()?;

    println!("Configuration is valid.");
    println!("  spreadsheet  {}", google.spreadsheet_id);
    println!(
        "  reads        {}",
        if google.api_key.is_some() { "API key" } else { "OAuth token" }
    );
    println!("  token file   {}", google.token_path.display());
    Ok(())
}

pub fn path(path: &Path) -> CliResult<()> {
    println!("{}", path.display());
    Ok(())
}
