//! Toolbar rendering for `CatalogApp`.
//!
//! Draws the load/cancel buttons, the seed field, the auto-refresh toggle
//! with its period, and the catalog search box.

use std::time::Instant;

use eframe::egui;

use universe_browser::config::{MAX_REFRESH_SECONDS, MIN_REFRESH_SECONDS};

use super::CatalogApp;

impl CatalogApp {
    /// Render the top toolbar strip.
    pub fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add_space(4.0);

            let loading = self.session.is_loading();
            if ui
                .add_enabled(!loading, egui::Button::new("Load Catalog").min_size(egui::vec2(96.0, 24.0)))
                .clicked()
            {
                self.load_catalog();
            }
            if ui.add_enabled(loading, egui::Button::new("Cancel")).clicked() {
                self.cancel_load();
            }

            ui.add_sized(
                [90.0, 24.0],
                egui::TextEdit::singleline(&mut self.seed_input)
                    .hint_text("Seed")
                    .font(egui::TextStyle::Monospace),
            );

            ui.separator();

            let mut auto = self.session.auto_refresh();
            if ui.checkbox(&mut auto, "Auto-refresh").changed() {
                self.session.set_auto_refresh(auto, Instant::now());
            }
            let mut seconds = self.session.config().refresh_seconds;
            let drag = ui.add(
                egui::DragValue::new(&mut seconds)
                    .range(MIN_REFRESH_SECONDS..=MAX_REFRESH_SECONDS)
                    .speed(0.5)
                    .fixed_decimals(1)
                    .suffix("s"),
            );
            if drag.changed() {
                self.session.set_refresh_seconds(seconds, Instant::now());
            }

            ui.separator();

            let response = ui.add_sized(
                [180.0, 24.0],
                egui::TextEdit::singleline(&mut self.session.search_query)
                    .hint_text("Search catalog..."),
            );
            let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let find = ui.button("Find").clicked();
            if submitted || find {
                if self.session.search(Instant::now()).is_some() {
                    self.reveal_selection = true;
                }
            }
            if ui.button("Clear").clicked() {
                self.session.clear_search();
                self.reveal_selection = true;
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.toggle_value(&mut self.show_console, "Console");
            });
        });
    }
}
