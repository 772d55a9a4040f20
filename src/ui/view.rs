//! Conversation view model
//!
//! Rebuilt in full from the store after every change. Components draw these
//! rows and never read the store themselves.

use crate::conversations::{ConversationStore, Role};

/// One chat bubble
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub role: Role,
    pub content: String,
}

/// One entry in the history sidebar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationView {
    pub messages: Vec<MessageRow>,
    pub history: Vec<HistoryEntry>,
    /// Set by each message render, cleared by the list once it has scrolled
    pub scroll_to_bottom: bool,
}

impl ConversationView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the message rows of the active conversation
    pub fn render_messages(&mut self, store: &ConversationStore) {
        self.messages.clear();

        if let Some(conversation) = store.active() {
            self.messages.extend(conversation.messages.iter().map(|m| MessageRow {
                role: m.role,
                content: m.content.clone(),
            }));
        }

        self.scroll_to_bottom = true;
    }

    /// Rebuild the history entries matching `filter`, case-insensitively
    /// against the title and every message body
    pub fn render_history(&mut self, store: &ConversationStore, filter: &str) {
        let needle = filter.to_lowercase();
        let active = store.active_id();

        self.history = store
            .conversations()
            .iter()
            .filter(|c| needle.is_empty() || c.haystack().to_lowercase().contains(&needle))
            .map(|c| HistoryEntry {
                id: c.id.clone(),
                title: c.title.clone(),
                is_active: active == Some(c.id.as_str()),
            })
            .collect();
    }

    /// Make `id` active and refresh both panes
    pub fn select(&mut self, store: &mut ConversationStore, id: &str, filter: &str) {
        store.set_active(id);
        self.render_messages(store);
        self.render_history(store, filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversations::MemoryStore;

    fn store_with_two() -> (ConversationStore, String, String) {
        let mut store = ConversationStore::new(Box::new(MemoryStore::new()));
        let first = store.create();
        store.append(&first, Role::User, "Weather in Paris");
        store.append(&first, Role::Assistant, "Sunny and mild");
        let second = store.create();
        store.append(&second, Role::User, "Rust lifetimes");
        (store, first, second)
    }

    #[test]
    fn test_render_messages_in_order() {
        let (mut store, first, _) = store_with_two();
        store.set_active(first.as_str());

        let mut view = ConversationView::new();
        view.render_messages(&store);

        assert_eq!(view.messages.len(), 2);
        assert_eq!(view.messages[0].role, Role::User);
        assert_eq!(view.messages[1].content, "Sunny and mild");
        assert!(view.scroll_to_bottom);
    }

    #[test]
    fn test_render_messages_unknown_active_clears() {
        let (mut store, first, _) = store_with_two();
        store.set_active(first.as_str());

        let mut view = ConversationView::new();
        view.render_messages(&store);
        store.set_active("missing");
        view.render_messages(&store);

        assert!(view.messages.is_empty());
    }

    #[test]
    fn test_history_filter() {
        let (store, first, _) = store_with_two();
        let mut view = ConversationView::new();

        view.render_history(&store, "");
        assert_eq!(view.history.len(), 2);

        view.render_history(&store, "SUNNY");
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.history[0].id, first);

        view.render_history(&store, "xyz");
        assert!(view.history.is_empty());
    }

    #[test]
    fn test_history_matches_title() {
        let (store, _, second) = store_with_two();
        let mut view = ConversationView::new();

        view.render_history(&store, "rust");
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.history[0].id, second);
        assert_eq!(view.history[0].title, "Rust lifetimes");
    }

    #[test]
    fn test_select_marks_active() {
        let (mut store, first, second) = store_with_two();
        let mut view = ConversationView::new();

        view.select(&mut store, &first, "");
        assert_eq!(store.active_id(), Some(first.as_str()));
        assert_eq!(view.messages.len(), 2);

        let active: Vec<_> = view.history.iter().filter(|e| e.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, first);

        // Most recent first
        assert_eq!(view.history[0].id, second);
    }
}
