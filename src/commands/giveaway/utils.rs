use std::sync::Arc;

use tracing::error;

use crate::commands::giveaway::models::ChannelId;
use crate::commands::giveaway::notifier::{MessageHandle, Notifier};

pub async fn post_message(
    notifier: Option<&Arc<dyn Notifier>>,
    channel_id: ChannelId,
    content: &str,
) -> Option<MessageHandle> {
    let notifier = notifier?;

    match notifier.post(channel_id, content).await {
        Ok(handle) => Some(handle),
        Err(err) => {
            error!(
                "Can't send the message to the channel {}: {}",
                channel_id,
                err.to_string()
            );
            None
        }
    }
}

pub async fn edit_message(notifier: Option<&Arc<dyn Notifier>>, message: MessageHandle, content: &str) {
    let Some(notifier) = notifier else {
        return;
    };

    if let Err(err) = notifier.edit(message, content).await {
        error!(
            "Can't edit the message {} in the channel {}: {}",
            message.message_id,
            message.channel_id,
            err.to_string()
        );
    }
}

pub async fn delete_message(notifier: Option<&Arc<dyn Notifier>>, message: MessageHandle) {
    let Some(notifier) = notifier else {
        return;
    };

    if let Err(err) = notifier.delete(message).await {
        error!(
            "Can't delete the message {} in the channel {}: {}",
            message.message_id,
            message.channel_id,
            err.to_string()
        );
    }
}

pub async fn add_reaction(notifier: Option<&Arc<dyn Notifier>>, message: MessageHandle, emoji: &str) {
    let Some(notifier) = notifier else {
        return;
    };

    if let Err(err) = notifier.react(message, emoji).await {
        error!(
            "Can't add the {} reaction to the message {}: {}",
            emoji,
            message.message_id,
            err.to_string()
        );
    }
}

// Tries to edit the existing message instead of printing a new one. The
// message is sent into the channel when it's missing by some reason.
pub async fn update_or_post_message(
    notifier: Option<&Arc<dyn Notifier>>,
    channel_id: ChannelId,
    message: Option<MessageHandle>,
    content: &str,
) -> Option<MessageHandle> {
    match message {
        Some(handle) => {
            edit_message(notifier, handle, content).await;
            Some(handle)
        }
        None => post_message(notifier, channel_id, content).await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::commands::giveaway::notifier::Notifier;
    use crate::commands::giveaway::notifier::testing::{Event, FailingNotifier, RecordingNotifier};
    use crate::commands::giveaway::utils::{post_message, update_or_post_message};

    #[tokio::test]
    async fn test_update_or_post_posts_the_missing_message() {
        let recorder = Arc::new(RecordingNotifier::new());
        let notifier: Arc<dyn Notifier> = recorder.clone();

        let handle = update_or_post_message(Some(&notifier), 5, None, "first").await;
        let same_handle = update_or_post_message(Some(&notifier), 5, handle, "second").await;

        assert_eq!(handle.is_some(), true);
        assert_eq!(handle, same_handle);
        assert_eq!(
            recorder.events(),
            vec![
                Event::Post(handle.unwrap(), "first".to_string()),
                Event::Edit(handle.unwrap(), "second".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_post_without_notifier_is_silent() {
        assert_eq!(post_message(None, 5, "hello").await, None);
    }

    #[tokio::test]
    async fn test_post_failure_is_swallowed() {
        let notifier: Arc<dyn Notifier> = Arc::new(FailingNotifier);

        assert_eq!(post_message(Some(&notifier), 5, "hello").await, None);
    }
}
