//! Activities and the per-turn context shared by middlewares and the bot.

use serde::{Deserialize, Serialize};

/// One unit of communication between a channel and the bot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    /// Activity kind: `"message"`, `"typing"`, or `"trace"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Message text, when the kind carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Conversation the activity belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    /// Sender id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl Activity {
    /// A message activity with the given text.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            kind: "message".to_string(),
            text: Some(text.into()),
            conversation: None,
            from: None,
        }
    }

    /// A typing indicator.
    pub fn typing() -> Self {
        Self {
            kind: "typing".to_string(),
            text: None,
            conversation: None,
            from: None,
        }
    }

    /// A diagnostic trace activity.
    pub fn trace(label: impl Into<String>) -> Self {
        Self {
            kind: "trace".to_string(),
            text: Some(label.into()),
            conversation: None,
            from: None,
        }
    }

    /// Sets the conversation id.
    pub fn in_conversation(mut self, conversation: impl Into<String>) -> Self {
        self.conversation = Some(conversation.into());
        self
    }

    /// Returns `true` for message activities.
    pub fn is_message(&self) -> bool {
        self.kind == "message"
    }
}

/// Mutable context for one incoming activity's pass through the middleware
/// chain and the bot.
pub struct TurnContext {
    /// The activity being processed.  Middlewares may rewrite it in place.
    pub activity: Activity,
    responses: Vec<Activity>,
}

impl TurnContext {
    /// Starts a turn for `activity`.
    pub fn new(activity: Activity) -> Self {
        Self {
            activity,
            responses: Vec::new(),
        }
    }

    /// Queues an outgoing activity.
    pub fn send(&mut self, activity: Activity) {
        self.responses.push(activity);
    }

    /// The outgoing activities queued so far, in send order.
    pub fn responses(&self) -> &[Activity] {
        &self.responses
    }

    /// Consumes the turn, returning the queued responses.
    pub fn into_responses(self) -> Vec<Activity> {
        self.responses
    }

    /// Conversation id of the current activity, defaulting to `"default"`.
    pub fn conversation_id(&self) -> &str {
        self.activity.conversation.as_deref().unwrap_or("default")
    }
}
