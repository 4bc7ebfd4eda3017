//! Roster queries.

use guildsheet_core::{GroupTag, MemberProfile, SocialIdentity};

use crate::commands::Backend;
use crate::config::GuildConfig;
use crate::error::{CliError, CliResult};

pub async fn list(config: &GuildConfig, json: bool) -> CliResult<()> {
    let backend = Backend::loaded(config).await?;
    let members = backend
        .service
        .roster()
        .map(|snapshot| snapshot.members.clone())
        .unwrap_or_default();

    if json {
        print_json(&members)?;
    } else if members.is_empty() {
        println!("No active members.");
    } else {
        for member in &members {
            println!("{}", member_line(member));
        }
    }
    Ok(())
}

pub async fn find(config: &GuildConfig, social_id: &str, json: bool) -> CliResult<()> {
    let backend = Backend::loaded(config).await?;
    let member = backend
        .service
        .find_member(social_id)
        .ok_or_else(|| CliError::NotFound(format!("no active member linked to {}", social_id)))?;

    if json {
        print_json(&member)
    } else {
        print_member(&member);
        Ok(())
    }
}

pub async fn identities(config: &GuildConfig, json: bool) -> CliResult<()> {
    let backend = Backend::connect(config)?;
    let identities = backend.service.list_social_identities().await;

    if json {
        // The encoded session token stays out of the output.
        let redacted: Vec<SocialIdentity> = identities
            .into_iter()
            .map(|identity| SocialIdentity {
                encoded_token: String::new(),
                ..identity
            })
            .collect();
        return print_json(&redacted);
    }

    for identity in &identities {
        let fails = identity
            .fail_count
            .map(|n| format!("  fails={}", n))
            .unwrap_or_default();
        println!(
            "{:<36} {:<24} {}{}",
            identity.social_id, identity.display_name, identity.last_updated, fails
        );
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Config(format!("failed to serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn member_line(member: &MemberProfile) -> String {
    let level = member.level.map(|l| l.to_string()).unwrap_or_default();
    format!(
        "{:>4}  {:<8} {:<20} {:<12} {:>4}  {}",
        member.row_num,
        member.status.as_sheet_str(),
        member.char_name,
        member.job,
        level,
        member.display_name
    )
}

fn print_member(member: &MemberProfile) {
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    let num = |n: Option<u32>| n.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());

    println!("{} ({})", member.char_name, member.status);
    println!("  display name  {}", or_dash(&member.display_name));
    println!("  social id     {}", member.social_id);
    println!("  manager       {}", or_dash(&member.manager));
    println!("  job           {}", or_dash(&member.job));
    println!("  level         {}", num(member.level));
    println!("  union level   {}", num(member.union_level));
    println!("  groups        {}", or_dash(&GroupTag::format_list(&member.groups)));
    println!("  mood          {}", or_dash(&member.mood_phrase));
    println!("  updated       {}", or_dash(&member.last_updated));
    println!("  row           {}", member.row_num);
}
