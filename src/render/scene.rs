//! Screen-space projection of an orbital scene.
//!
//! [`project_scene`] maps the visible bodies of a [`DynamicsState`] onto a
//! `width × height` viewport (y up) and returns plain shapes. Painting them
//! is left to the UI.

use serde_json::Value;

use crate::catalog::details::format_statistic;
use crate::dynamics::{Body, DynamicsState};

pub type Rgb = [u8; 3];

pub const BACKGROUND: Rgb = [0x0b, 0x0f, 0x1a];
pub const ARROW_COLOR: Rgb = [0x60, 0xa5, 0xfa];
pub const TICK_COLOR: Rgb = [0x93, 0xc5, 0xfd];
pub const DT_COLOR: Rgb = [0x9c, 0xa3, 0xaf];
pub const SUMMARY_COLOR: Rgb = [0x94, 0xa3, 0xb8];

const PRIMARY_OUTLINE: Rgb = [0xf8, 0xfa, 0xfc];
const NEIGHBOR_OUTLINE: Rgb = [0x94, 0xa3, 0xb8];
const OUTLINE: Rgb = [0x47, 0x55, 0x69];
const PRIMARY_LABEL: Rgb = [0xf8, 0xfa, 0xfc];
const NEIGHBOR_LABEL: Rgb = [0xcb, 0xd5, 0xf5];

/// Trail points drawn per body.
pub const TRAIL_POINTS: usize = 40;
/// Bodies listed in the speed summary.
pub const SUMMARY_BODIES: usize = 3;

/// Fill colour for a catalog category.
pub fn category_color(category: &str) -> Rgb {
    match category.to_lowercase().as_str() {
        "universe" => [0x2f, 0x80, 0xed],
        "galaxy" => [0xbb, 0x86, 0xfc],
        "system" => [0x03, 0xda, 0xc6],
        "star" => [0xfd, 0xd6, 0x63],
        "planet" => [0x8a, 0xb4, 0xf8],
        "country" => [0xa5, 0xd6, 0xa7],
        "city" => [0xf4, 0x8f, 0xb1],
        "person" => [0xff, 0xab, 0x91],
        "materials" => [0xc5, 0xe1, 0xa5],
        "element" => [0x81, 0xd4, 0xfa],
        "compound" => [0xff, 0xcc, 0x80],
        "transit" => [0xf2, 0x8c, 0xb7],
        _ => [0xe0, 0xe0, 0xe0],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneLabel {
    pub text: String,
    /// Top-centre anchor.
    pub pos: [f32; 2],
    pub color: Rgb,
    pub strong: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneBody {
    pub name: String,
    pub center: [f32; 2],
    pub radius: f32,
    pub fill: Rgb,
    pub outline: Rgb,
    pub outline_width: f32,
    /// Oldest first; empty when fewer than two points exist.
    pub trail: Vec<[f32; 2]>,
    /// Velocity arrow as (tail, head).
    pub arrow: Option<([f32; 2], [f32; 2])>,
    pub arrow_width: f32,
    pub label: Option<SceneLabel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame {
    pub width: f32,
    pub height: f32,
    pub background: Rgb,
    pub bodies: Vec<SceneBody>,
    /// `Tick N`
    pub tick_caption: String,
    /// `Δt X.XXs`
    pub dt_caption: String,
    /// One `name: speed m/s` line per leading visible body.
    pub speed_summary: Vec<String>,
}

struct Projection {
    padding: f64,
    width: f64,
    height: f64,
    min_x: f64,
    max_y: f64,
    span_x: f64,
    span_y: f64,
}

impl Projection {
    fn point(&self, x: f64, y: f64) -> [f64; 2] {
        let inner_w = (self.width - 2.0 * self.padding).max(1.0);
        let inner_h = (self.height - 2.0 * self.padding).max(1.0);
        [
            self.padding + (x - self.min_x) / self.span_x * inner_w,
            self.padding + (self.max_y - y) / self.span_y * inner_h,
        ]
    }
}

/// Project `state` into a `width × height` viewport.
pub fn project_scene(state: &DynamicsState, width: f32, height: f32) -> SceneFrame {
    let w = f64::from(width.max(1.0));
    let h = f64::from(height.max(1.0));
    let short_side = w.min(h);
    let tick_seconds = if state.tick_seconds > 0.0 { state.tick_seconds } else { 1.0 };

    let mut frame = SceneFrame {
        width,
        height,
        background: BACKGROUND,
        bodies: Vec::new(),
        tick_caption: format!("Tick {}", state.tick_count),
        dt_caption: format!("Δt {:.2}s", tick_seconds),
        speed_summary: Vec::new(),
    };

    let mut visible: Vec<&Body> = state.visible().collect();
    if visible.is_empty() {
        visible = state.bodies.iter().collect();
    }
    if visible.is_empty() {
        return frame;
    }

    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for body in &visible {
        min_x = min_x.min(body.position[0]);
        max_x = max_x.max(body.position[0]);
        min_y = min_y.min(body.position[1]);
        max_y = max_y.max(body.position[1]);
    }
    let projection = Projection {
        padding: (short_side * 0.12).max(24.0),
        width: w,
        height: h,
        min_x,
        max_y,
        span_x: (max_x - min_x).max(1.0),
        span_y: (max_y - min_y).max(1.0),
    };

    let neighbor = visible.iter().position(|b| !b.primary);
    let arrow_max = (short_side * 0.28).max(48.0);
    let primary_arrow_floor = (short_side * 0.05).max(8.0);

    for (i, body) in visible.iter().enumerate() {
        let is_neighbor = neighbor == Some(i);
        let center = projection.point(body.position[0], body.position[1]);

        let trail: Vec<[f32; 2]> = if body.trail.len() >= 2 {
            body.trail
                .recent(TRAIL_POINTS)
                .map(|[x, y]| to_f32(projection.point(x, y)))
                .collect()
        } else {
            Vec::new()
        };

        let mut size = 8.0;
        if body.radius > 0.0 {
            size += ((body.radius + 1.0).log10() * 4.0).min(24.0);
        }
        if body.primary {
            size += 4.0;
        } else if is_neighbor {
            size += 2.0;
        }
        let size = size.min(short_side * 0.2).max(6.0);

        let arrow = velocity_arrow(
            &projection,
            body,
            center,
            tick_seconds,
            arrow_max,
            primary_arrow_floor,
        );

        let label = (body.primary || is_neighbor).then(|| SceneLabel {
            text: body.name.clone(),
            pos: to_f32([center[0], center[1] + size + 12.0]),
            color: if body.primary { PRIMARY_LABEL } else { NEIGHBOR_LABEL },
            strong: body.primary,
        });

        frame.bodies.push(SceneBody {
            name: body.name.clone(),
            center: to_f32(center),
            radius: size as f32,
            fill: category_color(&body.category),
            outline: if body.primary {
                PRIMARY_OUTLINE
            } else if is_neighbor {
                NEIGHBOR_OUTLINE
            } else {
                OUTLINE
            },
            outline_width: if body.primary { 2.0 } else { 1.0 },
            trail,
            arrow,
            arrow_width: if body.primary { 2.0 } else { 1.0 },
            label,
        });
    }

    frame.speed_summary = visible
        .iter()
        .take(SUMMARY_BODIES)
        .map(|b| format!("{}: {} m/s", b.name, format_statistic(&Value::from(b.speed))))
        .collect();
    frame
}

/// One tick's displacement, capped at `max_len`. The primary's arrow is
/// stretched to `primary_floor`; other arrows shorter than 2 px are dropped.
fn velocity_arrow(
    projection: &Projection,
    body: &Body,
    center: [f64; 2],
    tick_seconds: f64,
    max_len: f64,
    primary_floor: f64,
) -> Option<([f32; 2], [f32; 2])> {
    let step_x = body.velocity[0] * tick_seconds;
    let step_y = body.velocity[1] * tick_seconds;
    if step_x == 0.0 && step_y == 0.0 {
        return None;
    }
    let end = projection.point(body.position[0] + step_x, body.position[1] + step_y);
    let (dx, dy) = (end[0] - center[0], end[1] - center[1]);
    let length = dx.hypot(dy);
    if length.is_nan() || length <= 1e-6 {
        return None;
    }
    let mut scale = 1.0;
    if length > max_len {
        scale *= max_len / length;
    }
    if body.primary && length < primary_floor {
        scale *= primary_floor / length;
    } else if length < 2.0 {
        return None;
    }
    let head = [center[0] + dx * scale, center[1] + dy * scale];
    Some((to_f32(center), to_f32(head)))
}

fn to_f32(p: [f64; 2]) -> [f32; 2] {
    [p[0] as f32, p[1] as f32]
}
