//! Scoped property-bag state over a [`Storage`] backend.

use std::ops::Deref;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::storage::Storage;

/// Persists one JSON property bag per id, namespaced by scope.
pub struct PropertyState {
    storage: Arc<dyn Storage>,
    scope: &'static str,
}

impl PropertyState {
    /// Creates a state store for `scope` over `storage`.
    pub fn new(storage: Arc<dyn Storage>, scope: &'static str) -> Self {
        Self { storage, scope }
    }

    fn item_key(&self, id: &str) -> String {
        format!("{}/{}", self.scope, id)
    }

    /// Loads the property bag for `id`, defaulting to an empty object.
    pub async fn load(&self, id: &str) -> anyhow::Result<Value> {
        let key = self.item_key(id);
        let mut items = self.storage.read(&[key.as_str()]).await?;
        Ok(items
            .remove(&key)
            .unwrap_or_else(|| Value::Object(Map::new())))
    }

    /// Saves the property bag for `id`.
    pub async fn save(&self, id: &str, bag: Value) -> anyhow::Result<()> {
        self.storage
            .write([(self.item_key(id), bag)].into_iter().collect())
            .await
    }

    /// Deletes the property bag for `id`.
    pub async fn clear(&self, id: &str) -> anyhow::Result<()> {
        self.storage.delete(&[self.item_key(id).as_str()]).await
    }
}

/// Per-user state.
pub struct UserState(PropertyState);

impl UserState {
    /// Creates user state over `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self(PropertyState::new(storage, "user"))
    }
}

impl Deref for UserState {
    type Target = PropertyState;

    fn deref(&self) -> &PropertyState {
        &self.0
    }
}

/// Per-conversation state.
pub struct ConversationState(PropertyState);

impl ConversationState {
    /// Creates conversation state over `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self(PropertyState::new(storage, "conversation"))
    }
}

impl Deref for ConversationState {
    type Target = PropertyState;

    fn deref(&self) -> &PropertyState {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStorage;
    use serde_json::json;

    #[tokio::test]
    async fn scopes_do_not_collide_for_the_same_id() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let users = UserState::new(Arc::clone(&storage));
        let conversations = ConversationState::new(storage);

        users.save("42", json!({"name": "ada"})).await.unwrap();
        conversations
            .save("42", json!({"topic": "lovelace"}))
            .await
            .unwrap();

        assert_eq!(users.load("42").await.unwrap(), json!({"name": "ada"}));
        assert_eq!(
            conversations.load("42").await.unwrap(),
            json!({"topic": "lovelace"})
        );
    }

    #[tokio::test]
    async fn load_defaults_to_an_empty_bag_and_clear_resets() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let users = UserState::new(storage);

        assert_eq!(users.load("fresh").await.unwrap(), json!({}));

        users.save("fresh", json!({"visits": 1})).await.unwrap();
        users.clear("fresh").await.unwrap();
        assert_eq!(users.load("fresh").await.unwrap(), json!({}));
    }
}
