use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use serenity::{ChannelId, EditMessage, FullEvent, Http, MessageId, Reaction, ReactionType};
use tracing::{debug, info, warn};

use crate::commands::giveaway::formatters::ANNOUNCEMENT_REACTION;
use crate::commands::giveaway::models::{ChannelId as GiveawayChannelId, JoinResult};
use crate::commands::giveaway::notifier::{MessageHandle, Notifier};
use crate::error::{Error, ErrorKind, Result};
use crate::state::BotState;

// Sends the giveaway messages through the Discord REST API.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        DiscordNotifier { http }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn post(&self, channel_id: GiveawayChannelId, content: &str) -> Result<MessageHandle> {
        let message = ChannelId::new(channel_id).say(&*self.http, content).await?;
        Ok(MessageHandle::new(channel_id, message.id.get()))
    }

    async fn edit(&self, message: MessageHandle, content: &str) -> Result<()> {
        let builder = EditMessage::new().content(content);
        ChannelId::new(message.channel_id)
            .edit_message(&*self.http, MessageId::new(message.message_id), builder)
            .await?;
        Ok(())
    }

    async fn delete(&self, message: MessageHandle) -> Result<()> {
        ChannelId::new(message.channel_id)
            .delete_message(&*self.http, MessageId::new(message.message_id))
            .await?;
        Ok(())
    }

    async fn react(&self, message: MessageHandle, emoji: &str) -> Result<()> {
        let reaction = ReactionType::Unicode(emoji.to_string());
        ChannelId::new(message.channel_id)
            .create_reaction(&*self.http, MessageId::new(message.message_id), reaction)
            .await?;
        Ok(())
    }
}

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, BotState, Error>,
    state: &BotState,
) -> Result<()> {
    match event {
        FullEvent::Ready { data_about_bot } => {
            info!("{} is connected!", data_about_bot.user.name);
        }
        FullEvent::ReactionAdd { add_reaction } => {
            on_reaction_add(ctx, state, add_reaction).await;
        }
        FullEvent::ReactionRemove { removed_reaction } => {
            on_reaction_remove(ctx, state, removed_reaction);
        }
        _ => {}
    }

    Ok(())
}

fn is_giveaway_reaction(ctx: &serenity::Context, reaction: &Reaction) -> bool {
    let Some(user_id) = reaction.user_id else {
        return false;
    };

    let is_bot = user_id == ctx.cache.current_user().id;
    !is_bot && reaction.emoji.unicode_eq(ANNOUNCEMENT_REACTION)
}

fn get_message_handle(reaction: &Reaction) -> MessageHandle {
    MessageHandle::new(reaction.channel_id.get(), reaction.message_id.get())
}

// A reaction on the announcement works the same way as `/giveaway join`.
async fn on_reaction_add(ctx: &serenity::Context, state: &BotState, reaction: &Reaction) {
    if !is_giveaway_reaction(ctx, reaction) {
        return;
    }

    let manager = state.manager();
    let Some(id) = manager.find_by_message(get_message_handle(reaction)) else {
        return;
    };

    let (user_id, roles) = match reaction.member.as_ref() {
        Some(member) if member.user.bot => return,
        Some(member) => (
            member.user.id.get(),
            member.roles.iter().map(|role| role.get()).collect::<Vec<u64>>(),
        ),
        None => match reaction.user_id {
            Some(user_id) => (user_id.get(), Vec::new()),
            None => return,
        },
    };

    match manager.join(id, user_id, &roles) {
        Ok(JoinResult::Joined) => debug!(giveaway = %id, entrant = user_id, "Joined the giveaway by reaction"),
        Ok(JoinResult::AlreadyJoined) => {}
        Err(err) => {
            if let ErrorKind::RoleNotEligible(_) = err.kind() {
                // The reaction must not look like a successful join.
                if let Err(err) = reaction.delete(ctx).await {
                    warn!(giveaway = %id, "Can't remove the reaction: {}", err);
                }
            }
            debug!(giveaway = %id, entrant = user_id, "Can't join the giveaway by reaction: {}", err);
        }
    }
}

fn on_reaction_remove(ctx: &serenity::Context, state: &BotState, reaction: &Reaction) {
    if !is_giveaway_reaction(ctx, reaction) {
        return;
    }

    let manager = state.manager();
    let (Some(id), Some(user_id)) = (manager.find_by_message(get_message_handle(reaction)), reaction.user_id) else {
        return;
    };

    if let Err(err) = manager.leave(id, user_id.get()) {
        debug!(giveaway = %id, entrant = user_id.get(), "Can't leave the giveaway by reaction: {}", err);
    }
}
