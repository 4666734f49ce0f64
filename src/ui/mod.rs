//! Small egui helpers shared by the panels.

use eframe::egui;
use universe_browser::render::scene::Rgb;

// ─── Colours and geometry ─────────────────────────────────────────────────────

pub fn color(rgb: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

/// Scene coordinates are relative to the canvas' top-left corner.
pub fn scene_pos(canvas: egui::Rect, point: [f32; 2]) -> egui::Pos2 {
    canvas.min + egui::vec2(point[0], point[1])
}

// ─── Text panes ───────────────────────────────────────────────────────────────

/// Scrollable, selectable, read-only text.
pub fn text_pane(ui: &mut egui::Ui, id: &str, text: &str, monospace: bool) {
    egui::ScrollArea::both()
        .id_salt(id)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let mut view = text;
            let edit = egui::TextEdit::multiline(&mut view)
                .desired_width(f32::INFINITY)
                .frame(false);
            let edit = if monospace { edit.code_editor() } else { edit };
            ui.add(edit);
        });
}

/// Tree row label with the search term highlighted.
pub fn row_text(name: &str, query: &str, selected: bool) -> egui::RichText {
    let rt = egui::RichText::new(name);
    let rt = if selected { rt.strong() } else { rt };
    if text_matches(name, query) {
        rt.color(egui::Color32::from_rgb(0xfd, 0xd6, 0x63))
    } else {
        rt
    }
}

/// Deepest tree level drawn as nested collapsing headers. Branches below it
/// are summarised in one row; search still selects their nodes.
pub const MAX_TREE_DEPTH: usize = 48;

/// Placeholder row for a branch cut off at [`MAX_TREE_DEPTH`].
pub fn hidden_branch_label(children: usize) -> String {
    match children {
        1 => "1 nested entry not shown".to_string(),
        n => format!("{} nested entries not shown", n),
    }
}

/// Case-insensitive containment; an empty query never matches.
pub fn text_matches(text: &str, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    !needle.is_empty() && text.to_lowercase().contains(&needle)
}
