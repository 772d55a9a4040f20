//! UI components
//!
//! Each component borrows the session state for one frame and draws part of
//! the window.

mod alert;
mod history_panel;
mod input_bar;
mod message_list;
mod status_badge;

pub use alert::AlertDialog;
pub use history_panel::HistoryPanel;
pub use input_bar::InputBar;
pub use message_list::MessageList;
pub use status_badge::StatusBadge;
