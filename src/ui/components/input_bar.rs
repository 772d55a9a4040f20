//! Input bar component
//!
//! Text input, send button and voice input trigger.

use crate::ui::state::{AppState, Status};
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

pub struct InputBar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    self.show_voice_button(ui);
                    self.show_text_input(ui);
                    self.show_send_button(ui);
                });
            });
    }

    fn show_voice_button(&mut self, ui: &mut egui::Ui) {
        let listening = self.state.status == Status::Listening;
        let busy = self.state.is_busy();

        let (icon, tooltip, color) = if listening {
            ("⏹", "Stop listening", self.theme.error)
        } else {
            ("🎤", "Speak a message", self.theme.text_secondary)
        };

        let button = egui::Button::new(RichText::new(icon).size(18.0).color(color))
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding);

        let response = ui.add_enabled(!busy, button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, !busy, "Voice input")
        });

        if response.clicked() {
            self.state.start_listening();
        }

        response.on_hover_text(tooltip);
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let busy = self.state.is_busy();
        let available_width = ui.available_width() - 100.0;

        let text_edit = egui::TextEdit::singleline(&mut self.state.input_text)
            .hint_text("Type a message...")
            .desired_width(available_width.max(80.0))
            .id(egui::Id::new("message_input"))
            .margin(egui::Margin::symmetric(12.0, 8.0));

        let response = ui.add_enabled(!busy, text_edit);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, !busy, "Message input")
        });

        if self.state.take_input_focus() {
            response.request_focus();
        }

        // Singleline edits give up focus on Enter
        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
            self.state.send_message();
            response.request_focus();
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        let busy = self.state.is_busy();
        let label = if busy { "Sending…" } else { "Send" };

        let button = egui::Button::new(RichText::new(label).color(egui::Color32::WHITE))
            .min_size(Vec2::new(80.0, 40.0))
            .rounding(self.theme.button_rounding)
            .fill(if busy {
                self.theme.text_muted
            } else {
                self.theme.primary
            });

        let response = ui.add_enabled(!busy, button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, !busy, "Send message")
        });

        if response.clicked() {
            self.state.send_message();
        }

        response.on_hover_text("Send message (Enter)");
    }
}
