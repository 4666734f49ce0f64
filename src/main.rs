use std::time::Instant;

use clap::Parser;
use eframe::egui;

use universe_browser::{Config, Session};

mod app;
mod ui;

use app::CatalogApp;

fn main() {
    env_logger::init();
    let config = Config::parse();
    log::info!("Catalog script: {}", config.script_path().display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Universe Browser",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            let ctx = cc.egui_ctx.clone();
            let session = Session::new(config, Instant::now()).with_notifier(move || ctx.request_repaint());
            Ok(Box::new(CatalogApp::new(session)))
        }),
    )
    .expect("Failed to start Universe Browser");
}

impl eframe::App for CatalogApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_fetch(ctx);

        // Top toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            self.draw_status_bar(ui);
        });

        if self.show_console {
            egui::TopBottomPanel::bottom("console")
                .resizable(true)
                .default_height(160.0)
                .show(ctx, |ui| {
                    self.draw_console(ui);
                });
        }

        egui::SidePanel::left("catalog")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                self.draw_tree_panel(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_details(ui);
        });

        self.draw_notice(ctx);
    }
}
