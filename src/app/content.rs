//! Panel rendering for `CatalogApp`.
//!
//! Draws the catalog tree, the tabbed detail pane with the animated orbital
//! scene, the status bar, the console and the notice dialog.

use std::time::Instant;

use eframe::egui;
use egui::collapsing_header::CollapsingState;

use universe_browser::catalog::tree::{CatalogTree, NodeHandle};
use universe_browser::render::scene::{project_scene, ARROW_COLOR, DT_COLOR, SUMMARY_COLOR, TICK_COLOR};
use universe_browser::render::DetailTab;

use super::CatalogApp;
use crate::ui::{color, hidden_branch_label, row_text, scene_pos, text_pane, MAX_TREE_DEPTH};

impl CatalogApp {
    // ─── Catalog tree ─────────────────────────────────────────────────────────

    /// Render the left-hand catalog tree.
    pub fn draw_tree_panel(&mut self, ui: &mut egui::Ui) {
        let tree = self.session.tree();
        let Some(root) = tree.root() else {
            ui.weak("No catalog loaded.");
            return;
        };
        let reveal = self.reveal_selection;
        if reveal {
            open_ancestors(ui.ctx(), tree);
        }

        let query = self.session.search_query.as_str();
        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("catalog_tree")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                draw_tree_node(ui, tree, root, 0, query, reveal, &mut clicked);
            });
        self.reveal_selection = false;

        if let Some(handle) = clicked {
            self.session.select(handle, Instant::now());
        }
    }

    // ─── Detail pane ──────────────────────────────────────────────────────────

    /// Render the tab strip and the active pane for the selected node.
    pub fn draw_details(&mut self, ui: &mut egui::Ui) {
        let has_scene = self.session.dynamics().is_some();
        ui.horizontal(|ui| {
            for tab in DetailTab::ALL {
                if tab == DetailTab::Visual && !has_scene {
                    continue;
                }
                ui.selectable_value(&mut self.tab, tab, tab.label());
            }
        });
        ui.separator();

        let Some(details) = self.session.details() else {
            ui.weak("Load a catalog to browse it.");
            return;
        };
        match self.tab {
            DetailTab::Overview => text_pane(ui, "overview", &details.overview, false),
            DetailTab::Chronicle => text_pane(ui, "chronicle", &details.chronicle, false),
            DetailTab::Metadata => text_pane(ui, "metadata", &details.metadata, true),
            DetailTab::Raw => text_pane(ui, "raw", &details.raw, true),
            DetailTab::Visual => self.draw_scene(ui),
        }
    }

    /// Paint the orbital scene of the selected node.
    fn draw_scene(&self, ui: &mut egui::Ui) {
        let Some(state) = self.session.dynamics() else {
            ui.weak("No telemetry for this node.");
            return;
        };
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::hover());
        let canvas = response.rect;
        let frame = project_scene(state, canvas.width(), canvas.height());

        painter.rect_filled(canvas, 0.0, color(frame.background));
        for body in &frame.bodies {
            if body.trail.len() >= 2 {
                let points = body.trail.iter().map(|p| scene_pos(canvas, *p)).collect();
                painter.add(egui::Shape::line(points, egui::Stroke::new(1.0, color(body.fill))));
            }
            painter.circle(
                scene_pos(canvas, body.center),
                body.radius,
                color(body.fill),
                egui::Stroke::new(body.outline_width, color(body.outline)),
            );
            if let Some((tail, head)) = body.arrow {
                let origin = scene_pos(canvas, tail);
                painter.arrow(
                    origin,
                    scene_pos(canvas, head) - origin,
                    egui::Stroke::new(body.arrow_width, color(ARROW_COLOR)),
                );
            }
            if let Some(label) = &body.label {
                let size = if label.strong { 14.0 } else { 12.0 };
                painter.text(
                    scene_pos(canvas, label.pos),
                    egui::Align2::CENTER_TOP,
                    &label.text,
                    egui::FontId::proportional(size),
                    color(label.color),
                );
            }
        }

        painter.text(
            canvas.min + egui::vec2(12.0, 12.0),
            egui::Align2::LEFT_TOP,
            &frame.tick_caption,
            egui::FontId::proportional(14.0),
            color(TICK_COLOR),
        );
        painter.text(
            canvas.min + egui::vec2(12.0, 32.0),
            egui::Align2::LEFT_TOP,
            &frame.dt_caption,
            egui::FontId::proportional(12.0),
            color(DT_COLOR),
        );
        painter.text(
            egui::pos2(canvas.max.x - 12.0, canvas.min.y + 12.0),
            egui::Align2::RIGHT_TOP,
            frame.speed_summary.join("\n"),
            egui::FontId::proportional(12.0),
            color(SUMMARY_COLOR),
        );
    }

    // ─── Status, console, notices ─────────────────────────────────────────────

    pub fn draw_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let status = self.session.status();
            if self.session.is_loading() {
                ui.spinner();
            }
            ui.colored_label(color(status.tone()), status.label());
            ui.separator();
            ui.weak(format!("{} nodes", self.session.tree().len()));
            if let Some(path) = self.session.tree().selected_path() {
                ui.separator();
                ui.weak(path.join(" / "));
            }
        });
    }

    pub fn draw_console(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.strong("Console");
            if ui.small_button("Clear").clicked() {
                self.session.clear_console();
            }
        });
        text_pane(ui, "console", self.session.console(), true);
    }

    /// Modal-style window for the current notice, if any.
    pub fn draw_notice(&mut self, ctx: &egui::Context) {
        let Some(message) = self.session.notice().map(str::to_owned) else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new("Universe Browser")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(&message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.session.dismiss_notice();
        }
    }
}

fn node_id(handle: NodeHandle) -> egui::Id {
    egui::Id::new(("catalog_node", handle.raw()))
}

/// Expand every ancestor of the selected node.
fn open_ancestors(ctx: &egui::Context, tree: &CatalogTree) {
    let mut cursor = tree.selected().and_then(|h| tree.parent(h));
    while let Some(handle) = cursor {
        let mut state = CollapsingState::load_with_default_open(ctx, node_id(handle), false);
        state.set_open(true);
        state.store(ctx);
        cursor = tree.parent(handle);
    }
}

/// One tree row plus, when expanded, its children. Only open branches are
/// descended into, and never past [`MAX_TREE_DEPTH`] levels.
fn draw_tree_node(
    ui: &mut egui::Ui,
    tree: &CatalogTree,
    handle: NodeHandle,
    depth: usize,
    query: &str,
    reveal: bool,
    clicked: &mut Option<NodeHandle>,
) {
    let Some(node) = tree.node(handle) else {
        return;
    };
    let selected = tree.selected() == Some(handle);
    let mut row = |ui: &mut egui::Ui| {
        let response = ui
            .selectable_label(selected, row_text(&node.name, query, selected))
            .on_hover_text(format!("{}\n{}", node.category, node.summary));
        if response.clicked() {
            *clicked = Some(handle);
        }
        if reveal && selected {
            response.scroll_to_me(Some(egui::Align::Center));
        }
    };

    let children = tree.children(handle);
    if children.is_empty() {
        ui.horizontal(|ui| {
            ui.add_space(ui.spacing().indent);
            row(ui);
        });
        return;
    }

    if depth >= MAX_TREE_DEPTH {
        ui.horizontal(|ui| {
            ui.add_space(ui.spacing().indent);
            row(ui);
        });
        ui.weak(hidden_branch_label(children.len()));
        return;
    }

    let default_open = tree.parent(handle).is_none();
    CollapsingState::load_with_default_open(ui.ctx(), node_id(handle), default_open)
        .show_header(ui, |ui| row(ui))
        .body(|ui| {
            for child in children {
                draw_tree_node(ui, tree, *child, depth + 1, query, reveal, clicked);
            }
        });
}
