//! Conversation-id handling for skill-to-skill calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Value, json};

use super::storage::Storage;

/// Allocates opaque conversation ids for outbound skill calls and resolves
/// them back to the originating conversation.
///
/// Ids are persisted through [`Storage`] so a host restart (with a durable
/// backend) can still resolve references created earlier.
pub struct SkillConversationIdFactory {
    storage: Arc<dyn Storage>,
    sequence: AtomicU64,
}

impl SkillConversationIdFactory {
    /// Creates a factory over `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            sequence: AtomicU64::new(0),
        }
    }

    fn item_key(id: &str) -> String {
        format!("skill-conversations/{id}")
    }

    /// Allocates an id for calling `skill` from `conversation` and persists
    /// the reference.
    pub async fn create_skill_conversation_id(
        &self,
        conversation: &str,
        skill: &str,
    ) -> anyhow::Result<String> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let id = format!("skill-{skill}-{sequence}");

        self.storage
            .write(
                [(
                    Self::item_key(&id),
                    json!({"conversation": conversation, "skill": skill}),
                )]
                .into_iter()
                .collect(),
            )
            .await?;
        Ok(id)
    }

    /// Resolves a previously created id back to its reference, if known.
    pub async fn get_conversation_reference(&self, id: &str) -> anyhow::Result<Option<Value>> {
        let key = Self::item_key(id);
        let mut items = self.storage.read(&[key.as_str()]).await?;
        Ok(items.remove(&key))
    }

    /// Forgets a reference once the skill conversation is over.
    pub async fn delete_conversation_reference(&self, id: &str) -> anyhow::Result<()> {
        self.storage.delete(&[Self::item_key(id).as_str()]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStorage;

    #[tokio::test]
    async fn ids_are_unique_and_resolve_back() {
        let factory = SkillConversationIdFactory::new(Arc::new(MemoryStorage::new()));

        let first = factory
            .create_skill_conversation_id("chat-1", "booking")
            .await
            .unwrap();
        let second = factory
            .create_skill_conversation_id("chat-1", "booking")
            .await
            .unwrap();
        assert_ne!(first, second);

        let reference = factory
            .get_conversation_reference(&first)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reference["conversation"], "chat-1");
        assert_eq!(reference["skill"], "booking");

        factory.delete_conversation_reference(&first).await.unwrap();
        assert!(
            factory
                .get_conversation_reference(&first)
                .await
                .unwrap()
                .is_none()
        );
    }
}
