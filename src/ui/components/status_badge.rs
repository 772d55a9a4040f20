//! Status badge component

use crate::ui::state::Status;
use crate::ui::theme::Theme;
use egui::{self, Color32, RichText};

/// Colored pill showing Ready, Listening or Thinking
pub struct StatusBadge<'a> {
    status: Status,
    theme: &'a Theme,
}

impl<'a> StatusBadge<'a> {
    pub fn new(status: Status, theme: &'a Theme) -> Self {
        Self { status, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let label = self.status.label();

        let inner = egui::Frame::none()
            .fill(self.theme.status_color(self.status))
            .rounding(egui::Rounding::same(10.0))
            .inner_margin(egui::Margin::symmetric(10.0, 4.0))
            .show(ui, |ui| {
                ui.label(RichText::new(label).size(12.0).strong().color(Color32::WHITE))
            });

        let a11y = format!("Status: {}", label);
        inner.inner.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &a11y)
        });

        inner.response
    }
}
