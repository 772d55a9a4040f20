//! Blocking alert dialog

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct AlertDialog<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> AlertDialog<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    /// Draw the pending alert, if any, over everything else
    pub fn show(mut self, ctx: &egui::Context) {
        let Some(message) = self.state.alert.clone() else {
            return;
        };

        let mut dismissed = false;

        egui::Window::new("Parley")
            .id(egui::Id::new("alert"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.set_min_width(260.0);
                let label = ui.label(RichText::new(&message).color(self.theme.text_primary));
                let a11y = format!("Alert: {}", message);
                label.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &a11y)
                });

                ui.add_space(self.theme.spacing_sm);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let ok = ui.add(egui::Button::new("OK").rounding(self.theme.button_rounding));
                    ok.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Dismiss alert")
                    });
                    if ok.clicked() {
                        dismissed = true;
                    }
                });
            });

        if dismissed || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.state.dismiss_alert();
        }
    }
}
