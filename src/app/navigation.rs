//! Catalog loading for `CatalogApp`.
//!
//! Covers user-triggered loads and cancellation, and the per-frame session
//! poll that drains finished fetches, fires auto-refresh and advances the
//! orbital scene.

use std::time::Instant;

use eframe::egui;

use universe_browser::render::DetailTab;

use super::CatalogApp;

impl CatalogApp {
    /// Start a foreground load with the current toolbar settings.
    pub fn load_catalog(&mut self) {
        let seed = self.seed_input.trim();
        self.session.config_mut().seed = (!seed.is_empty()).then(|| seed.to_string());
        self.session.load(Instant::now());
    }

    pub fn cancel_load(&mut self) {
        if !self.session.cancel() {
            log::debug!("Cancel requested with no catalog load running");
        }
    }

    /// Advance the session and schedule the next repaint it needs.
    pub fn check_fetch(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        if self.session.poll(now) {
            ctx.request_repaint();
        }
        if self.tab == DetailTab::Visual && self.session.dynamics().is_none() {
            self.tab = DetailTab::Overview;
        }
        if let Some(wait) = self.session.next_wakeup(now) {
            ctx.request_repaint_after(wait);
        }
    }
}
