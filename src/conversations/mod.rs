pub mod storage;
pub mod store;
pub mod types;

pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{ConversationStore, STORAGE_KEY};
pub use types::{derive_title, Conversation, Message, Role, DEFAULT_TITLE};
