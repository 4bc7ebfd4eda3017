//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use guildsheet_core::MemberStatus;

/// guildsheet - guild roster backed by a Google Sheet
#[derive(Debug, Parser)]
#[command(name = "guildsheet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "GUILDSHEET_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authorize write access to the spreadsheet
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Query the cached roster
    Roster {
        #[command(subcommand)]
        action: RosterAction,
    },

    /// Add or update members
    Member {
        #[command(subcommand)]
        action: MemberAction,
    },

    /// Keep the roster refreshed until interrupted
    Serve {
        /// Log as JSON lines
        #[arg(long)]
        json_logs: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum AuthAction {
    /// Print the consent page URL
    Url,

    /// Grant access and store the token
    Login {
        /// Authorization code from the consent page; prompted for when omitted
        #[arg(long)]
        code: Option<String>,

        /// Google OAuth client ID (saved to config.toml)
        #[arg(long, requires = "client_secret")]
        client_id: Option<String>,

        /// Google OAuth client secret (saved to config.toml)
        #[arg(long, requires = "client_id")]
        client_secret: Option<String>,

        /// Path to Google Cloud Console credentials JSON
        #[arg(long, conflicts_with_all = ["client_id", "client_secret"])]
        credentials_file: Option<PathBuf>,

        /// Print the URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,

        /// Re-authorize even if a token is stored
        #[arg(long)]
        force: bool,
    },

    /// Show whether a token is stored
    Status,

    /// Remove the stored token
    Logout,
}

#[derive(Debug, Subcommand)]
pub enum RosterAction {
    /// List active members
    List {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the member linked to a social ID
    Find {
        social_id: String,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored social identities
    Identities {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum MemberAction {
    /// Add a member and its social identity
    Add(AddMemberArgs),

    /// Copy a new display name and picture onto the roster
    UpdateSocial(UpdateSocialArgs),

    /// Update character stats
    UpdateStats(UpdateStatsArgs),

    /// Set a member's mood phrase
    Mood { social_id: String, text: String },
}

#[derive(Debug, Args)]
pub struct AddMemberArgs {
    /// In-game character name
    #[arg(long)]
    pub char_name: String,

    #[arg(long)]
    pub social_id: String,

    #[arg(long)]
    pub display_name: String,

    /// 公會長, 副會長, 會員, 離會會員 or leader, vice-leader, member, departed
    #[arg(long, default_value = "member")]
    pub status: MemberStatus,

    #[arg(long, default_value = "")]
    pub manager: String,

    #[arg(long, default_value = "")]
    pub picture_url: String,

    /// Session token from the login provider, already encoded
    #[arg(long, default_value = "")]
    pub encoded_token: String,

    #[command(flatten)]
    pub stats: StatsArgs,
}

#[derive(Debug, Args)]
pub struct UpdateSocialArgs {
    pub social_id: String,

    #[arg(long)]
    pub display_name: String,

    #[arg(long, default_value = "")]
    pub picture_url: String,

    /// Failed login counter to store with the identity
    #[arg(long)]
    pub fail_count: Option<u32>,

    /// Sheet row to write instead of the cached one
    #[arg(long)]
    pub row: Option<u32>,
}

#[derive(Debug, Args)]
pub struct UpdateStatsArgs {
    pub social_id: String,

    #[command(flatten)]
    pub stats: StatsArgs,

    /// Sheet row to write instead of the cached one
    #[arg(long)]
    pub row: Option<u32>,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[arg(long)]
    pub avatar_url: Option<String>,

    #[arg(long)]
    pub job: Option<String>,

    #[arg(long)]
    pub level: Option<u32>,

    #[arg(long)]
    pub union_level: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Dump,
    /// Check that the configuration is usable
    Validate,
    /// Print the default configuration file path
    Path,
}
