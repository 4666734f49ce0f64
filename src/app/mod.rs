//! `CatalogApp`: the top-level egui application state.
//!
//! The struct only holds view state; catalog data, timers and the
//! background fetch all live in the wrapped [`Session`]. Methods are split
//! across the sibling sub-modules:
//!
//! - `navigation`: load/cancel requests and per-frame session polling
//! - `toolbar`: load controls, auto-refresh and search
//! - `content`: catalog tree, detail tabs, orbital scene, status and console

pub mod content;
pub mod navigation;
pub mod toolbar;

use universe_browser::render::DetailTab;
use universe_browser::Session;

pub struct CatalogApp {
    pub session: Session,
    pub tab: DetailTab,
    pub show_console: bool,
    /// Seed text box; applied to the config on the next load.
    pub seed_input: String,
    /// Set after a search so the tree opens and scrolls to the selection.
    pub reveal_selection: bool,
}

impl CatalogApp {
    pub fn new(session: Session) -> Self {
        let seed_input = session.config().seed.clone().unwrap_or_default();
        Self {
            session,
            tab: DetailTab::Overview,
            show_console: true,
            seed_input,
            reveal_selection: false,
        }
    }
}
