//! Desktop interface built on egui/eframe

mod app;
mod components;
pub mod state;
mod theme;
pub mod view;

pub use app::ParleyApp;
pub use components::{AlertDialog, HistoryPanel, InputBar, MessageList, StatusBadge};
pub use state::{AppState, Status};
pub use theme::Theme;
pub use view::{ConversationView, HistoryEntry, MessageRow};

use crate::config::AppConfig;

/// Open the main window and run until it is closed
pub fn run(config: AppConfig) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 700.0])
            .with_min_inner_size([640.0, 420.0])
            .with_title("Parley"),
        ..Default::default()
    };

    eframe::run_native(
        "Parley",
        options,
        Box::new(move |cc| {
            let app = ParleyApp::new(cc, &config)
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
            Ok(Box::new(app) as Box<dyn eframe::App>)
        }),
    )
}
