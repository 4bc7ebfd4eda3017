//! Member mutations.

use guildsheet_core::{CharacterStats, MemberProfile, SocialIdentity};
use tracing::info;

use crate::cli::{AddMemberArgs, StatsArgs, UpdateSocialArgs, UpdateStatsArgs};
use crate::commands::Backend;
use crate::config::GuildConfig;
use crate::error::{CliError, CliResult};

impl From<StatsArgs> for CharacterStats {
    fn from(args: StatsArgs) -> Self {
        Self {
            avatar_url: args.avatar_url,
            job: args.job,
            level: args.level,
            union_level: args.union_level,
        }
    }
}

/// Splits the add arguments into the two rows that get appended.
fn new_member(args: AddMemberArgs) -> (MemberProfile, SocialIdentity) {
    let profile = MemberProfile::new(
        &args.char_name,
        &args.display_name,
        args.status,
        &args.social_id,
    )
    .with_manager(args.manager)
    .with_picture_url(&args.picture_url)
    .with_stats(args.stats.into());

    let identity = SocialIdentity::new(args.social_id, args.display_name, args.picture_url)
        .with_encoded_token(args.encoded_token);
    (profile, identity)
}

pub async fn add(config: &GuildConfig, args: AddMemberArgs) -> CliResult<()> {
    let backend = Backend::loaded(config).await?;
    let (profile, identity) = new_member(args);

    backend.service.add_member(&profile, &identity).await?;

    let row = backend
        .service
        .find_member(&profile.social_id)
        .map(|m| m.row_num);
    match row {
        Some(row) => println!("Added {} at row {}.", profile.char_name, row),
        None => println!("Added {}.", profile.char_name),
    }
    Ok(())
}

/// Row to write: the explicit override, else the member's cached row.
fn target_row(backend: &Backend, social_id: &str, row: Option<u32>) -> CliResult<u32> {
    if let Some(row) = row {
        return Ok(row);
    }
    backend
        .service
        .find_member(social_id)
        .map(|m| m.row_num)
        .ok_or_else(|| CliError::NotFound(format!("no active member linked to {}", social_id)))
}

pub async fn update_social(config: &GuildConfig, args: UpdateSocialArgs) -> CliResult<()> {
    let backend = Backend::loaded(config).await?;
    let row = target_row(&backend, &args.social_id, args.row)?;

    let mut identity = SocialIdentity::new(&args.social_id, args.display_name, args.picture_url);
    identity.fail_count = args.fail_count;

    backend.service.update_social_profile(row, &identity).await?;
    info!(row, social_id = %args.social_id, "social profile updated");
    println!("Updated social profile at row {}.", row);
    Ok(())
}

pub async fn update_stats(config: &GuildConfig, args: UpdateStatsArgs) -> CliResult<()> {
    let stats = CharacterStats::from(args.stats);
    if stats.is_empty() {
        return Err(CliError::Config(
            "nothing to update; pass at least one of --avatar-url, --job, --level, --union-level"
                .to_string(),
        ));
    }

    let backend = Backend::loaded(config).await?;
    let row = target_row(&backend, &args.social_id, args.row)?;

    backend.service.update_character_stats(row, &stats).await?;
    println!("Updated character stats at row {}.", row);
    Ok(())
}

pub async fn mood(config: &GuildConfig, social_id: &str, text: &str) -> CliResult<()> {
    let backend = Backend::loaded(config).await?;
    match backend.service.update_mood_phrase(social_id, text).await? {
        Some(row) => println!("Mood phrase updated at row {}.", row),
        None => println!("No active member linked to {}; nothing written.", social_id),
    }
    Ok(())
}
