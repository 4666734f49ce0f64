pub mod animator;
pub mod scene;

pub use animator::{AnimationScheduler, TickToken, FRAME_INTERVAL};
pub use scene::{project_scene, SceneFrame};

/// Which detail pane the browser shows for the selected node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTab {
    Overview,
    Chronicle,
    Metadata,
    Raw,
    /// Animated orbital scene; only offered when the node has telemetry.
    Visual,
}

impl DetailTab {
    pub const ALL: [DetailTab; 5] = [
        DetailTab::Overview,
        DetailTab::Chronicle,
        DetailTab::Metadata,
        DetailTab::Raw,
        DetailTab::Visual,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DetailTab::Overview => "Overview",
            DetailTab::Chronicle => "Chronicle",
            DetailTab::Metadata => "Metadata",
            DetailTab::Raw => "Raw",
            DetailTab::Visual => "Visual",
        }
    }
}

impl Default for DetailTab {
    fn default() -> Self {
        Self::Overview
    }
}
