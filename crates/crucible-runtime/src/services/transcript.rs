//! Transcript persistence.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::storage::Storage;
use super::turn::Activity;

/// Records activities for later review.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Appends one activity to its conversation's transcript.
    async fn log_activity(&self, activity: &Activity) -> anyhow::Result<()>;
}

/// Transcript store that appends to a per-conversation item in [`Storage`].
pub struct StorageTranscriptStore {
    storage: Arc<dyn Storage>,
}

impl StorageTranscriptStore {
    /// Creates a transcript store over `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    fn item_key(activity: &Activity) -> String {
        let conversation = activity.conversation.as_deref().unwrap_or("default");
        format!("transcript/{conversation}")
    }
}

#[async_trait]
impl TranscriptStore for StorageTranscriptStore {
    async fn log_activity(&self, activity: &Activity) -> anyhow::Result<()> {
        let key = Self::item_key(activity);
        let mut items = self.storage.read(&[key.as_str()]).await?;
        let mut entries = match items.remove(&key) {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        };
        entries.push(json!(activity));

        self.storage
            .write([(key, Value::Array(entries))].into_iter().collect())
            .await
    }
}
