//! The conversational bot boundary.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::state::ConversationState;
use super::turn::{Activity, TurnContext};

/// The bot driven by the adapter on every turn.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Handles one turn after the middleware chain has run.
    async fn on_turn(&self, turn: &mut TurnContext) -> anyhow::Result<()>;
}

/// Built-in default bot: echoes message text with a per-conversation turn
/// counter kept in [`ConversationState`].
pub struct EchoBot {
    conversation_state: Arc<ConversationState>,
}

impl EchoBot {
    /// Creates the bot over the shared conversation state.
    pub fn new(conversation_state: Arc<ConversationState>) -> Self {
        Self { conversation_state }
    }
}

#[async_trait]
impl Bot for EchoBot {
    async fn on_turn(&self, turn: &mut TurnContext) -> anyhow::Result<()> {
        if !turn.activity.is_message() {
            return Ok(());
        }

        let conversation = turn.conversation_id().to_string();
        let mut bag = self.conversation_state.load(&conversation).await?;
        let turns = bag.get("turns").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
        bag["turns"] = json!(turns);
        self.conversation_state.save(&conversation, bag).await?;

        let text = turn.activity.text.clone().unwrap_or_default();
        turn.send(Activity::message(format!("echo {turns}: {text}")).in_conversation(conversation));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStorage;

    #[tokio::test]
    async fn echo_counts_turns_per_conversation() {
        let bot = EchoBot::new(Arc::new(ConversationState::new(Arc::new(
            MemoryStorage::new(),
        ))));

        let mut first = TurnContext::new(Activity::message("hi").in_conversation("c1"));
        bot.on_turn(&mut first).await.unwrap();
        assert_eq!(first.responses()[0].text.as_deref(), Some("echo 1: hi"));

        let mut second = TurnContext::new(Activity::message("again").in_conversation("c1"));
        bot.on_turn(&mut second).await.unwrap();
        assert_eq!(second.responses()[0].text.as_deref(), Some("echo 2: again"));

        let mut other = TurnContext::new(Activity::message("new").in_conversation("c2"));
        bot.on_turn(&mut other).await.unwrap();
        assert_eq!(other.responses()[0].text.as_deref(), Some("echo 1: new"));
    }

    #[tokio::test]
    async fn non_message_activities_are_ignored() {
        let bot = EchoBot::new(Arc::new(ConversationState::new(Arc::new(
            MemoryStorage::new(),
        ))));

        let mut turn = TurnContext::new(Activity::typing());
        bot.on_turn(&mut turn).await.unwrap();
        assert!(turn.responses().is_empty());
    }
}
