use std::sync::Arc;

use crate::commands::giveaway::manager::GiveawayManager;

// Data shared by every command invocation and event.
#[non_exhaustive]
pub struct BotState {
    manager: Arc<GiveawayManager>,
}

impl BotState {
    pub fn new(manager: Arc<GiveawayManager>) -> Self {
        BotState { manager }
    }

    pub fn manager(&self) -> &Arc<GiveawayManager> {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::commands::giveaway::manager::GiveawayManager;
    use crate::config::EngineConfig;
    use crate::state::BotState;

    #[tokio::test]
    async fn test_read_an_new_state() {
        let state = BotState::new(Arc::new(GiveawayManager::new(EngineConfig::default())));

        assert_eq!(state.manager().active().len(), 0);
    }
}
