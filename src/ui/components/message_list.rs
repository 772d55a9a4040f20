//! Message list component
//!
//! Chat bubbles for the active conversation followed by the response area.

use crate::conversations::Role;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use crate::ui::view::MessageRow;
use egui::{self, Align, Color32, RichText};

pub struct MessageList<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        let scroll = std::mem::take(&mut self.state.view.scroll_to_bottom);

        egui::ScrollArea::vertical()
            .id_salt("messages")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add_space(self.theme.spacing);

                if self.state.view.messages.is_empty() {
                    self.show_empty_state(ui);
                } else {
                    for row in &self.state.view.messages {
                        self.show_message(ui, row);
                        ui.add_space(self.theme.spacing_sm);
                    }
                }

                if !self.state.response_text.is_empty() {
                    ui.add_space(self.theme.spacing);
                    self.show_response(ui);
                }

                if scroll {
                    ui.scroll_to_cursor(Some(Align::BOTTOM));
                }
            });
    }

    fn show_empty_state(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.label(
                RichText::new("Start a conversation")
                    .size(22.0)
                    .color(self.theme.text_primary),
            );
            ui.add_space(self.theme.spacing_sm);
            ui.label(
                RichText::new("Type a message below or press the microphone and speak.")
                    .color(self.theme.text_muted),
            );
        });
    }

    fn show_message(&self, ui: &mut egui::Ui, row: &MessageRow) {
        let is_user = row.role == Role::User;

        let (bubble, text_color, align, sender, a11y_prefix) = if is_user {
            (self.theme.user_bubble, Color32::WHITE, Align::RIGHT, "You", "User message")
        } else {
            (
                self.theme.assistant_bubble,
                self.theme.text_primary,
                Align::LEFT,
                "Assistant",
                "Assistant response",
            )
        };

        ui.with_layout(egui::Layout::top_down(align), |ui| {
            ui.label(RichText::new(sender).size(12.0).color(self.theme.text_muted));

            let max_width = ui.available_width() * 0.75;
            egui::Frame::none()
                .fill(bubble)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);
                    let response = ui.label(RichText::new(&row.content).color(text_color));
                    let a11y = format!("{}: {}", a11y_prefix, row.content);
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &a11y)
                    });
                });
        });
    }

    fn show_response(&self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                let response = ui.label(
                    RichText::new(&self.state.response_text).color(self.theme.text_secondary),
                );
                let a11y = format!("Response: {}", self.state.response_text);
                response.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &a11y)
                });
            });
    }
}
