//! Conversation store
//!
//! Holds every conversation in memory, most recent first, and mirrors the
//! whole list to a [`KeyValueStore`] after each mutation. Persistence is
//! best-effort: read and write failures are logged and otherwise ignored.

use super::storage::KeyValueStore;
use super::types::{new_conversation_id, Conversation, Message, Role};
use tracing::{debug, info, warn};

/// Storage key holding the serialized conversation list
pub const STORAGE_KEY: &str = "conversations";

pub struct ConversationStore {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    storage: Box<dyn KeyValueStore>,
}

impl ConversationStore {
    /// Create an empty store without reading storage
    pub fn new(storage: Box<dyn KeyValueStore>) -> Self {
        Self {
            conversations: Vec::new(),
            active_id: None,
            storage,
        }
    }

    /// Create a store and load the persisted list
    pub fn open(storage: Box<dyn KeyValueStore>) -> Self {
        let mut store = Self::new(storage);
        store.load();
        store
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// Missing or malformed data yields an empty list.
    pub fn load(&mut self) {
        self.conversations = match self.storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Conversation>>(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!("Discarding unreadable conversation history: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Conversation history unavailable: {}", e);
                Vec::new()
            }
        };

        info!("Loaded {} conversations", self.conversations.len());
    }

    /// Write the full list to storage, swallowing failures
    pub fn persist(&mut self) {
        let raw = match serde_json::to_string(&self.conversations) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize conversations: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.set(STORAGE_KEY, &raw) {
            warn!("Failed to save conversations: {}", e);
        }
    }

    /// Guarantee an active conversation, creating one if the list is empty
    pub fn ensure_active(&mut self) -> String {
        if let Some(id) = &self.active_id {
            return id.clone();
        }

        match self.conversations.first() {
            Some(first) => {
                let id = first.id.clone();
                self.active_id = Some(id.clone());
                id
            }
            None => self.create(),
        }
    }

    /// Insert a new empty conversation at the front and make it active
    pub fn create(&mut self) -> String {
        let mut id = new_conversation_id();
        while self.get(&id).is_some() {
            id = new_conversation_id();
        }

        self.conversations.insert(0, Conversation::new(id.clone()));
        self.active_id = Some(id.clone());
        self.persist();

        debug!("Created conversation {}", id);
        id
    }

    /// Append a message to a conversation.
    ///
    /// Returns `false` and drops the message when the conversation is gone.
    pub fn append(&mut self, conversation_id: &str, role: Role, content: impl Into<String>) -> bool {
        let Some(conversation) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        else {
            debug!("Dropping message for unknown conversation {}", conversation_id);
            return false;
        };

        conversation.push(Message::new(role, content));
        self.persist();
        true
    }

    /// Switch the active conversation. The id is not validated.
    pub fn set_active(&mut self, id: impl Into<String>) {
        self.active_id = Some(id.into());
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// The active conversation, if the active id resolves
    pub fn active(&self) -> Option<&Conversation> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversations::storage::MemoryStore;
    use crate::conversations::types::DEFAULT_TITLE;
    use crate::{ParleyError, Result};

    fn memory_store() -> (ConversationStore, MemoryStore) {
        let backing = MemoryStore::new();
        (ConversationStore::open(Box::new(backing.clone())), backing)
    }

    /// Storage whose reads and writes always fail
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(ParleyError::StorageError("disk on fire".into()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(ParleyError::StorageError("disk on fire".into()))
        }
    }

    #[test]
    fn test_load_missing_is_empty() {
        let (store, _) = memory_store();
        assert!(store.is_empty());
        assert!(store.active_id().is_none());
    }

    #[test]
    fn test_load_malformed_is_empty() {
        let backing = MemoryStore::new();
        backing.insert(STORAGE_KEY, "{\"not\": \"an array\"}");
        let store = ConversationStore::open(Box::new(backing.clone()));
        assert!(store.is_empty());

        backing.insert(STORAGE_KEY, "not json at all");
        let store = ConversationStore::open(Box::new(backing));
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_wrong_shape_is_empty() {
        let backing = MemoryStore::new();
        backing.insert(STORAGE_KEY, "[{\"id\": 7}]");
        let store = ConversationStore::open(Box::new(backing));
        assert!(store.is_empty());
    }

    #[test]
    fn test_broken_storage_degrades() {
        let mut store = ConversationStore::open(Box::new(BrokenStore));
        assert!(store.is_empty());

        let id = store.ensure_active();
        assert!(store.append(&id, Role::User, "still works"));
        assert_eq!(store.active().unwrap().messages.len(), 1);
    }

    #[test]
    fn test_ensure_active_creates_when_empty() {
        let (mut store, backing) = memory_store();
        let id = store.ensure_active();

        assert_eq!(store.len(), 1);
        assert_eq!(store.active_id(), Some(id.as_str()));
        assert_eq!(store.active().unwrap().title, DEFAULT_TITLE);
        assert!(backing.raw(STORAGE_KEY).unwrap().contains(&id));
    }

    #[test]
    fn test_ensure_active_selects_first() {
        let (mut store, backing) = memory_store();
        let older = store.create();
        let newer = store.create();
        assert_ne!(older, newer);

        let mut reopened = ConversationStore::open(Box::new(backing));
        assert_eq!(reopened.ensure_active(), newer);
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_ensure_active_keeps_existing() {
        let (mut store, _) = memory_store();
        let first = store.create();
        let _second = store.create();
        store.set_active(first.clone());
        assert_eq!(store.ensure_active(), first);
    }

    #[test]
    fn test_create_inserts_at_front() {
        let (mut store, _) = memory_store();
        let a = store.create();
        let b = store.create();
        let ids: Vec<_> = store.conversations().iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![b.clone(), a]);
        assert_eq!(store.active_id(), Some(b.as_str()));
    }

    #[test]
    fn test_append_then_reload_preserves_order() {
        let (mut store, backing) = memory_store();
        let id = store.ensure_active();
        store.append(&id, Role::User, "one");
        store.append(&id, Role::Assistant, "two");
        store.append(&id, Role::User, "three");

        let reopened = ConversationStore::open(Box::new(backing));
        let conv = reopened.get(&id).unwrap();
        let contents: Vec<_> = conv.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert_eq!(conv.messages, store.get(&id).unwrap().messages);
    }

    #[test]
    fn test_title_fixed_after_first_user_message() {
        let (mut store, _) = memory_store();
        let id = store.ensure_active();
        store.append(&id, Role::User, "Hello");
        store.append(&id, Role::Assistant, "Hi there");
        store.append(&id, Role::User, "Something else entirely");
        assert_eq!(store.get(&id).unwrap().title, "Hello");
    }

    #[test]
    fn test_append_unknown_conversation_dropped() {
        let (mut store, backing) = memory_store();
        let id = store.ensure_active();
        let before = backing.raw(STORAGE_KEY);

        assert!(!store.append("missing", Role::User, "lost"));
        assert!(store.get(&id).unwrap().messages.is_empty());
        assert_eq!(backing.raw(STORAGE_KEY), before);
    }

    #[test]
    fn test_set_active_does_not_validate() {
        let (mut store, _) = memory_store();
        store.ensure_active();
        store.set_active("nope");
        assert_eq!(store.active_id(), Some("nope"));
        assert!(store.active().is_none());
    }

    #[test]
    fn test_persisted_matches_memory() {
        let (mut store, backing) = memory_store();
        let id = store.ensure_active();
        store.append(&id, Role::User, "sync me");

        let raw = backing.raw(STORAGE_KEY).unwrap();
        assert_eq!(raw, serde_json::to_string(store.conversations()).unwrap());
    }
}
