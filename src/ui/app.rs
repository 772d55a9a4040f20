//! Main application struct and eframe integration

use crate::config::AppConfig;
use crate::ui::components::{AlertDialog, HistoryPanel, InputBar, MessageList, StatusBadge};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use crate::Result;
use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};
use std::time::Duration;
use tracing::info;

/// How often to poll for results while work is outstanding
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct ParleyApp {
    state: AppState,
    theme: Theme,
}

impl ParleyApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &AppConfig) -> Result<Self> {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        let state = AppState::from_config(config)?;
        info!("Parley UI initialized");

        Ok(Self { state, theme })
    }

    /// Wrap an existing session, e.g. one built over test doubles
    pub fn from_state(state: AppState) -> Self {
        Self {
            state,
            theme: Theme::dark(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Poll for finished work and draw one frame
    pub fn show(&mut self, ctx: &egui::Context) {
        self.state.poll_events();

        self.show_header(ctx);
        self.show_history(ctx);
        self.show_input_area(ctx);
        self.show_content(ctx);
        AlertDialog::new(&mut self.state, &self.theme).show(ctx);

        if self.state.is_busy() || self.state.is_listening() || self.state.is_speaking() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(12.0),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Parley")
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        StatusBadge::new(self.state.status, &self.theme).show(ui);

                        if self.state.is_speaking() {
                            let stop = ui.button("🔇").on_hover_text("Stop speaking");
                            if stop.clicked() {
                                self.state.stop_speaking();
                            }
                        }
                    });
                });
            });
    }

    fn show_history(&mut self, ctx: &egui::Context) {
        SidePanel::left("history")
            .resizable(true)
            .default_width(240.0)
            .min_width(180.0)
            .max_width(400.0)
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(self.theme.spacing_sm),
            )
            .show(ctx, |ui| {
                HistoryPanel::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_input_area(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input_area")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                InputBar::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(egui::Margin::symmetric(self.theme.spacing, 0.0)),
            )
            .show(ctx, |ui| {
                MessageList::new(&mut self.state, &self.theme).show(ui);
            });
    }
}

impl eframe::App for ParleyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.state.shutdown();
    }
}
