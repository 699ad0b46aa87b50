//! Baseline service surfaces registered by the bootstrap composition root.
//!
//! The registry treats every service as an opaque factory; these modules
//! define the interface boundary of the baseline collaborators — storage,
//! state, telemetry, the middleware collection, the adapter, the bot, and
//! skill conversation-id handling — together with default implementations
//! thin enough to compose a working host out of the box.

pub mod adapter;
pub mod bot;
pub mod components;
pub mod middleware;
pub mod skills;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod transcript;
pub mod turn;

pub use adapter::{Adapter, CustomAdapters};
pub use bot::{Bot, EchoBot};
pub use components::{ComponentDefinition, ComponentDefinitions};
pub use middleware::{
    InspectionMiddleware, Middleware, MiddlewareSet, ShowTypingMiddleware,
    TranscriptLoggerMiddleware,
};
pub use skills::SkillConversationIdFactory;
pub use state::{ConversationState, PropertyState, UserState};
pub use storage::{FileStorage, FileStorageSettings, MemoryStorage, Storage};
pub use telemetry::{NoopTelemetry, Telemetry, TracingTelemetry};
pub use transcript::{StorageTranscriptStore, TranscriptStore};
pub use turn::{Activity, TurnContext};

/// Well-known service keys used by the bootstrap composition root.
///
/// Keys are a flat namespace; plugins address the same slots by these names
/// to compose onto baseline services.
pub mod keys {
    /// Backing store for all persisted items.
    pub const STORAGE: &str = "storage";
    /// Per-user property bags over [`STORAGE`].
    pub const USER_STATE: &str = "user-state";
    /// Per-conversation property bags over [`STORAGE`].
    pub const CONVERSATION_STATE: &str = "conversation-state";
    /// Event/trace sink.
    pub const TELEMETRY: &str = "telemetry";
    /// The ordered, composable middleware collection.  Seeded empty.
    pub const MIDDLEWARES: &str = "middlewares";
    /// Named transport adapters contributed by plugins.  Seeded empty.
    pub const CUSTOM_ADAPTERS: &str = "custom-adapters";
    /// Component registration metadata.  Seeded empty.
    pub const COMPONENT_DEFINITIONS: &str = "component-definitions";
    /// The assembled activity-processing adapter.
    pub const ADAPTER: &str = "adapter";
    /// The conversational bot driven by the adapter.
    pub const BOT: &str = "bot";
    /// Conversation-id factory for skill-to-skill calls.
    pub const SKILL_CONVERSATION_IDS: &str = "skill-conversation-ids";
}
