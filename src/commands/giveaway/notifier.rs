use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::commands::giveaway::models::ChannelId;
use crate::error::Result;

// A reference to a message that was posted by the notifier.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct MessageHandle {
    pub channel_id: ChannelId,
    pub message_id: u64,
}

impl MessageHandle {
    pub fn new(channel_id: ChannelId, message_id: u64) -> Self {
        MessageHandle {
            channel_id,
            message_id,
        }
    }
}

/// Delivers giveaway notifications to the chat platform.
///
/// The engine never relies on the notifier for its own state: every failure
/// returned from here is logged and the giveaway keeps progressing.
#[async_trait]
pub trait Notifier: Send + Sync {
    // Posts a new message into the channel.
    async fn post(&self, channel_id: ChannelId, content: &str) -> Result<MessageHandle>;

    // Replaces the content of a previously posted message.
    async fn edit(&self, message: MessageHandle, content: &str) -> Result<()>;

    // Removes a previously posted message.
    async fn delete(&self, message: MessageHandle) -> Result<()>;

    // Attaches a reaction to the message, so that users can click on it.
    async fn react(&self, _message: MessageHandle, _emoji: &str) -> Result<()> {
        Ok(())
    }
}
