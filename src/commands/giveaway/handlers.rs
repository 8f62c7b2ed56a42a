use chrono::TimeDelta;
use poise::serenity_prelude as serenity;
use poise::CreateReply;

use crate::commands::context::Context;
use crate::commands::giveaway::formatters::format_mentions;
use crate::commands::giveaway::models::{
    EntrantId, GiveawayId, GiveawayRequest, JoinResult, LeaveResult, Resolution,
};
use crate::commands::giveaway::util::parse_duration;
use crate::error::{Error, ErrorKind, Result};
use crate::models::Requester;

// Discord refuses messages longer than 2000 characters.
const MAX_REPLY_LENGTH: usize = 1900;

async fn get_requester(ctx: Context<'_>) -> Requester {
    match ctx.author_member().await {
        Some(member) => Requester::from(&*member),
        None => Requester::from(ctx.author()),
    }
}

async fn reply(ctx: Context<'_>, content: impl Into<String>) -> Result<()> {
    let reply = CreateReply::default().content(content).ephemeral(true);
    ctx.send(reply).await?;
    Ok(())
}

// Lists as many mentions as fit into a single reply.
pub fn format_participants(participants: &[EntrantId]) -> String {
    if participants.is_empty() {
        return "Nobody has joined this giveaway yet.".to_string();
    }

    let mut content = format!("**{} participant(s)**: ", participants.len());
    for (index, entrant) in participants.iter().enumerate() {
        let mention = format!("<@{}>", entrant);
        let separator = if index == 0 { "" } else { ", " };
        if content.len() + separator.len() + mention.len() > MAX_REPLY_LENGTH {
            content.push_str(&format!(" and {} more", participants.len() - index));
            return content;
        }

        content.push_str(separator);
        content.push_str(&mention);
    }
    content
}

/// Commands for running giveaways
#[poise::command(
    slash_command,
    guild_only,
    subcommands("start", "join", "leave", "end", "reroll", "participants", "cancel", "list"),
    subcommand_required
)]
pub async fn giveaway(_: Context<'_>) -> Result<()> {
    Ok(())
}

/// Start a new giveaway in this channel
#[poise::command(slash_command, guild_only)]
pub async fn start(
    ctx: Context<'_>,
    #[description = "What is given away"] prize: String,
    #[description = "How long the giveaway runs, e.g. 1h30m"] duration: String,
    #[description = "How many winners to draw"]
    #[min = 1]
    winners: Option<u32>,
    #[description = "Only members with this role can join"] role: Option<serenity::Role>,
) -> Result<()> {
    let duration = parse_duration(&duration)?;
    let manager = ctx.data().manager();
    let requester = get_requester(ctx).await;

    let end_time = TimeDelta::from_std(duration)
        .ok()
        .and_then(|duration| manager.now().checked_add_signed(duration))
        .ok_or_else(|| {
            let message = "The giveaway duration is too long.".to_string();
            Error::from(ErrorKind::InvalidArgument(message))
        })?;

    let request = GiveawayRequest::new(requester.user_id, ctx.channel_id().get(), &prize, end_time)
        .with_winner_count(winners.unwrap_or(1) as usize)
        .with_role_filter(role.map(|role| role.id.get()));
    let giveaway = manager.create(request).await?;

    reply(ctx, format!("The giveaway `{}` has been started!", giveaway.id())).await
}

/// Join a running giveaway
#[poise::command(slash_command, guild_only)]
pub async fn join(ctx: Context<'_>, #[description = "Id of the giveaway"] id: String) -> Result<()> {
    let id = id.trim().parse::<GiveawayId>()?;
    let requester = get_requester(ctx).await;

    let content = match ctx.data().manager().join(id, requester.user_id, &requester.roles)? {
        JoinResult::Joined => "You have joined the giveaway. Good luck!",
        JoinResult::AlreadyJoined => "You are already participating in this giveaway.",
    };
    reply(ctx, content).await
}

/// Leave a running giveaway
#[poise::command(slash_command, guild_only)]
pub async fn leave(ctx: Context<'_>, #[description = "Id of the giveaway"] id: String) -> Result<()> {
    let id = id.trim().parse::<GiveawayId>()?;

    let content = match ctx.data().manager().leave(id, ctx.author().id.get())? {
        LeaveResult::Left => "You have left the giveaway.",
        LeaveResult::NotParticipant => "You are not participating in this giveaway.",
    };
    reply(ctx, content).await
}

/// End a giveaway right now and draw the winners
#[poise::command(slash_command, guild_only)]
pub async fn end(ctx: Context<'_>, #[description = "Id of the giveaway"] id: String) -> Result<()> {
    let id = id.trim().parse::<GiveawayId>()?;
    let requester = get_requester(ctx).await;

    let resolution = ctx
        .data()
        .manager()
        .end_now(id, requester.user_id, requester.is_administrator)
        .await?;

    let content = match resolution {
        Resolution::Winners(winners) => format!(
            "The giveaway has ended. Winners: {}.",
            format_mentions(&winners)
        ),
        Resolution::NoParticipants => "The giveaway has ended without participants.".to_string(),
    };
    reply(ctx, content).await
}

/// Draw new winners of a finished giveaway
#[poise::command(slash_command, guild_only)]
pub async fn reroll(
    ctx: Context<'_>,
    #[description = "Id of the giveaway"] id: String,
    #[description = "How many winners to draw"]
    #[min = 1]
    winners: Option<u32>,
) -> Result<()> {
    let id = id.trim().parse::<GiveawayId>()?;
    let requester = get_requester(ctx).await;

    let winners = ctx
        .data()
        .manager()
        .reroll(
            id,
            requester.user_id,
            requester.is_administrator,
            winners.map(|count| count as usize),
        )
        .await?;

    reply(ctx, format!("New winners: {}.", format_mentions(&winners))).await
}

/// Show who has joined a giveaway
#[poise::command(slash_command, guild_only)]
pub async fn participants(ctx: Context<'_>, #[description = "Id of the giveaway"] id: String) -> Result<()> {
    let id = id.trim().parse::<GiveawayId>()?;
    let requester = get_requester(ctx).await;

    let mut participants = ctx
        .data()
        .manager()
        .list_participants(id, requester.user_id, requester.is_administrator)?
        .into_iter()
        .collect::<Vec<EntrantId>>();
    participants.sort_unstable();

    reply(ctx, format_participants(&participants)).await
}

/// Cancel a running giveaway without drawing winners
#[poise::command(slash_command, guild_only)]
pub async fn cancel(ctx: Context<'_>, #[description = "Id of the giveaway"] id: String) -> Result<()> {
    let id = id.trim().parse::<GiveawayId>()?;
    let requester = get_requester(ctx).await;

    ctx.data()
        .manager()
        .cancel(id, requester.user_id, requester.is_administrator)
        .await?;
    reply(ctx, format!("The giveaway `{}` has been cancelled.", id)).await
}

/// Get a list of running giveaways
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<()> {
    let giveaways = ctx
        .data()
        .manager()
        .active()
        .iter()
        .map(|giveaway| {
            format!(
                "`{}` **{}**, ends <t:{}:R>, {} participant(s)",
                giveaway.id(),
                giveaway.prize(),
                giveaway.end_time().timestamp(),
                giveaway.participants().len()
            )
        })
        .collect::<Vec<String>>();

    let content = match giveaways.len() {
        0 => "There are no running giveaways.".to_string(),
        _ => giveaways.join("\n"),
    };
    reply(ctx, content).await
}
