//! The assembled activity-processing adapter.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::bot::Bot;
use super::middleware::MiddlewareSet;
use super::turn::{Activity, TurnContext};

/// Drives one incoming activity through the middleware chain and the bot.
///
/// Assembled at resolution time from the composed middleware collection and
/// the custom-adapter map, so every contributor registered before first
/// resolution is included.
pub struct Adapter {
    middleware: MiddlewareSet,
    custom: CustomAdapters,
}

impl Adapter {
    /// Creates an adapter over the composed middleware set.
    pub fn new(middleware: MiddlewareSet, custom: CustomAdapters) -> Self {
        Self { middleware, custom }
    }

    /// The middleware chain, in run order.
    pub fn middleware(&self) -> &MiddlewareSet {
        &self.middleware
    }

    /// Custom adapters contributed by plugins, by name.
    pub fn custom(&self) -> &CustomAdapters {
        &self.custom
    }

    /// Processes one activity: middlewares first, then the bot.  Returns the
    /// outgoing activities in send order.
    pub async fn process_activity(
        &self,
        activity: Activity,
        bot: &dyn Bot,
    ) -> anyhow::Result<Vec<Activity>> {
        debug!(kind = %activity.kind, "Processing activity");
        let mut turn = TurnContext::new(activity);
        self.middleware.run(&mut turn).await?;
        bot.on_turn(&mut turn).await?;
        Ok(turn.into_responses())
    }
}

/// Named alternate adapters contributed by plugins (e.g. custom transports).
///
/// Seeded empty under
/// [`keys::CUSTOM_ADAPTERS`](super::keys::CUSTOM_ADAPTERS); plugins append
/// through composers.
#[derive(Clone, Default)]
pub struct CustomAdapters {
    map: HashMap<String, Arc<Adapter>>,
}

impl CustomAdapters {
    /// Returns the map with `adapter` registered under `name`.
    pub fn with(mut self, name: impl Into<String>, adapter: Arc<Adapter>) -> Self {
        self.map.insert(name.into(), adapter);
        self
    }

    /// Looks up an adapter by name.
    pub fn get(&self, name: &str) -> Option<Arc<Adapter>> {
        self.map.get(name).cloned()
    }

    /// Registered adapter names, unordered.
    pub fn names(&self) -> Vec<&str> {
        self.map.keys().map(String::as_str).collect()
    }

    /// Number of registered adapters.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` when no custom adapter is registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::middleware::ShowTypingMiddleware;
    use crate::services::state::ConversationState;
    use crate::services::storage::MemoryStorage;
    use crate::services::bot::EchoBot;

    #[tokio::test]
    async fn middlewares_run_before_the_bot() {
        let adapter = Adapter::new(
            MiddlewareSet::new().with(ShowTypingMiddleware),
            CustomAdapters::default(),
        );
        let bot = EchoBot::new(Arc::new(ConversationState::new(Arc::new(
            MemoryStorage::new(),
        ))));

        let responses = adapter
            .process_activity(Activity::message("hello"), &bot)
            .await
            .unwrap();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].kind, "typing");
        assert!(responses[1].text.as_deref().unwrap().contains("hello"));
    }
}
