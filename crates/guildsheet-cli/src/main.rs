//! guildsheet CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use guildsheet_core::{TracingConfig, init_tracing};

use guildsheet_cli::cli::{AuthAction, Cli, Command, ConfigAction, MemberAction, RosterAction};
use guildsheet_cli::commands::{self, auth::CredentialOverride};
use guildsheet_cli::config::GuildConfig;
use guildsheet_cli::error::{CliError, CliResult};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing = match (&cli.command, cli.debug) {
        (Command::Serve { json_logs: true }, _) => TracingConfig::service().json(),
        (Command::Serve { .. }, false) => TracingConfig::service(),
        (_, true) => TracingConfig::cli_debug(),
        (_, false) => TracingConfig::cli(),
    };
    if let Err(e) = init_tracing(tracing) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(GuildConfig::default_path);
    let config = GuildConfig::load(cli.config.as_deref()).map_err(CliError::Config)?;

    match cli.command {
        Command::Auth { action } => match action {
            AuthAction::Url => commands::auth::url(&config),
            AuthAction::Login {
                code,
                client_id,
                client_secret,
                credentials_file,
                no_browser,
                force,
            } => {
                let overrides = CredentialOverride {
                    client_id,
                    client_secret,
                    credentials_file,
                };
                commands::auth::login(&config, &config_path, overrides, code, no_browser, force)
                    .await
            }
            AuthAction::Status => commands::auth::status(&config),
            AuthAction::Logout => commands::auth::logout(&config),
        },
        Command::Roster { action } => match action {
            RosterAction::List { json } => commands::roster::list(&config, json).await,
            RosterAction::Find { social_id, json } => {
                commands::roster::find(&config, &social_id, json).await
            }
            RosterAction::Identities { json } => commands::roster::identities(&config, json).await,
        },
        Command::Member { action } => match action {
            MemberAction::Add(args) => commands::member::add(&config, args).await,
            MemberAction::UpdateSocial(args) => commands::member::update_social(&config, args).await,
            MemberAction::UpdateStats(args) => commands::member::update_stats(&config, args).await,
            MemberAction::Mood { social_id, text } => {
                commands::member::mood(&config, &social_id, &text).await
            }
        },
        Command::Serve { .. } => commands::serve::run(&config).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
