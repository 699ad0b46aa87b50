//! The composable middleware collection and its built-in members.
//!
//! [`MiddlewareSet`] is the canonical composer target: the bootstrap seeds
//! an empty set under [`keys::MIDDLEWARES`](super::keys::MIDDLEWARES), and
//! every contributor — feature toggles, plugins — appends through a composer
//! without knowing about the others.  Append order equals composer
//! registration order equals run order.

use std::sync::Arc;

use async_trait::async_trait;
use crucible_core::ServiceInstance;
use tracing::debug;

use super::telemetry::Telemetry;
use super::transcript::TranscriptStore;
use super::turn::{Activity, TurnContext};

/// Cross-cutting behavior applied to every turn before the bot runs.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Processes the turn.  May rewrite the incoming activity or queue
    /// outgoing activities.
    async fn on_turn(&self, turn: &mut TurnContext) -> anyhow::Result<()>;
}

/// Ordered, append-only middleware collection.
#[derive(Clone, Default)]
pub struct MiddlewareSet {
    items: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the set with `middleware` appended.  Consuming style keeps
    /// composer bodies to a single expression.
    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.items.push(Arc::new(middleware));
        self
    }

    /// Returns the set with an already-shared middleware appended.
    pub fn with_shared(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.items.push(middleware);
        self
    }

    /// Recovers the set from a type-erased registry value.
    pub fn from_instance(instance: ServiceInstance) -> anyhow::Result<Self> {
        instance
            .downcast::<Self>()
            .map(|set| set.as_ref().clone())
            .map_err(|_| anyhow::anyhow!("middleware collection has an unexpected type"))
    }

    /// Names of the members, in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.items.iter().map(|m| m.name()).collect()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the set has no members.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Runs every member sequentially, in append order.
    pub async fn run(&self, turn: &mut TurnContext) -> anyhow::Result<()> {
        for middleware in &self.items {
            debug!(middleware = middleware.name(), "Running middleware");
            middleware.on_turn(turn).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Built-in middlewares
// =============================================================================

/// Queues a typing indicator ahead of the bot's reply to message activities.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowTypingMiddleware;

#[async_trait]
impl Middleware for ShowTypingMiddleware {
    fn name(&self) -> &'static str {
        "show-typing"
    }

    async fn on_turn(&self, turn: &mut TurnContext) -> anyhow::Result<()> {
        if turn.activity.is_message() {
            turn.send(Activity::typing());
        }
        Ok(())
    }
}

/// Records every incoming activity into a [`TranscriptStore`].
pub struct TranscriptLoggerMiddleware {
    store: Arc<dyn TranscriptStore>,
}

impl TranscriptLoggerMiddleware {
    /// Creates the logger over `store`.
    pub fn new(store: Arc<dyn TranscriptStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Middleware for TranscriptLoggerMiddleware {
    fn name(&self) -> &'static str {
        "transcript-logger"
    }

    async fn on_turn(&self, turn: &mut TurnContext) -> anyhow::Result<()> {
        self.store.log_activity(&turn.activity).await
    }
}

/// Reports each turn to telemetry for live inspection tooling.
pub struct InspectionMiddleware {
    telemetry: Arc<dyn Telemetry>,
}

impl InspectionMiddleware {
    /// Creates the inspector reporting to `telemetry`.
    pub fn new(telemetry: Arc<dyn Telemetry>) -> Self {
        Self { telemetry }
    }
}

#[async_trait]
impl Middleware for InspectionMiddleware {
    fn name(&self) -> &'static str {
        "inspection"
    }

    async fn on_turn(&self, turn: &mut TurnContext) -> anyhow::Result<()> {
        self.telemetry.track_event(
            "inspection.turn",
            &[
                ("kind", turn.activity.kind.as_str()),
                ("conversation", turn.conversation_id()),
            ],
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tagger(&'static str);

    #[async_trait]
    impl Middleware for Tagger {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn on_turn(&self, turn: &mut TurnContext) -> anyhow::Result<()> {
            turn.send(Activity::trace(self.0));
            Ok(())
        }
    }

    #[tokio::test]
    async fn members_run_in_append_order() {
        let set = MiddlewareSet::new().with(Tagger("first")).with(Tagger("second"));
        let mut turn = TurnContext::new(Activity::message("hi"));

        set.run(&mut turn).await.unwrap();

        let labels: Vec<_> = turn
            .responses()
            .iter()
            .map(|a| a.text.clone().unwrap())
            .collect();
        assert_eq!(labels, ["first", "second"]);
    }

    #[tokio::test]
    async fn show_typing_only_reacts_to_messages() {
        let typing = ShowTypingMiddleware;

        let mut message_turn = TurnContext::new(Activity::message("hi"));
        typing.on_turn(&mut message_turn).await.unwrap();
        assert_eq!(message_turn.responses().len(), 1);
        assert_eq!(message_turn.responses()[0].kind, "typing");

        let mut trace_turn = TurnContext::new(Activity::trace("diag"));
        typing.on_turn(&mut trace_turn).await.unwrap();
        assert!(trace_turn.responses().is_empty());
    }

    #[test]
    fn from_instance_round_trips_through_the_registry_representation() {
        let set = MiddlewareSet::new().with(ShowTypingMiddleware);
        let instance = crucible_core::into_instance(set);
        let back = MiddlewareSet::from_instance(instance).unwrap();
        assert_eq!(back.names(), ["show-typing"]);

        let wrong = crucible_core::into_instance(42usize);
        assert!(MiddlewareSet::from_instance(wrong).is_err());
    }
}
