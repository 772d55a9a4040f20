//! Conversation history sidebar

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText, Vec2};

pub struct HistoryPanel<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> HistoryPanel<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        ui.label(
            RichText::new("Conversations")
                .size(16.0)
                .strong()
                .color(self.theme.text_primary),
        );
        ui.add_space(self.theme.spacing_sm);

        let new_chat = ui.add_sized(
            Vec2::new(ui.available_width(), 32.0),
            egui::Button::new("+ New chat").rounding(self.theme.button_rounding),
        );
        new_chat.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "New chat")
        });
        if new_chat.clicked() {
            self.state.new_conversation();
        }

        ui.add_space(self.theme.spacing_sm);

        let mut filter = self.state.filter.clone();
        let search = ui.add(
            egui::TextEdit::singleline(&mut filter)
                .hint_text("Search...")
                .id(egui::Id::new("history_search"))
                .desired_width(f32::INFINITY),
        );
        search.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "Search conversations")
        });
        if search.changed() {
            self.state.set_filter(filter);
        }

        ui.add_space(self.theme.spacing_sm);

        let mut selected = None;
        egui::ScrollArea::vertical()
            .id_salt("history")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if self.state.view.history.is_empty() {
                    ui.label(RichText::new("No conversations").color(self.theme.text_muted));
                }

                for entry in &self.state.view.history {
                    let text = if entry.is_active {
                        RichText::new(&entry.title).strong().color(self.theme.text_primary)
                    } else {
                        RichText::new(&entry.title).color(self.theme.text_secondary)
                    };

                    let response = ui.add_sized(
                        Vec2::new(ui.available_width(), 28.0),
                        egui::SelectableLabel::new(entry.is_active, text),
                    );
                    let a11y = format!("Conversation: {}", entry.title);
                    response.widget_info(|| {
                        egui::WidgetInfo::selected(
                            egui::WidgetType::SelectableLabel,
                            true,
                            entry.is_active,
                            &a11y,
                        )
                    });

                    if response.clicked() {
                        selected = Some(entry.id.clone());
                    }
                }
            });

        if let Some(id) = selected {
            self.state.select_conversation(&id);
        }
    }
}
