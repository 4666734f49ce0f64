//! Telemetry normalization.
//!
//! The simulator emits two shapes of `dynamics` block: a flat `objects`
//! list, or a focal body (`position`, `velocity`, ...) with `nearby`
//! siblings. Both become the same ordered body list, with one primary and a
//! capped set of visible bodies.
//!
//! Malformed fields never abort normalization: missing or non-numeric
//! values read as zero and a missing speed is derived from velocity.

use serde_json::{Map, Value};

use super::{distance, norm, Body, DynamicsState, Trail, Vec3};
use crate::catalog::{lenient_f64, CatalogNode};

/// Accepted spellings of the simulation step, in priority order.
const TICK_FIELDS: [&str; 3] = ["tick_seconds", "time_step", "time_step_seconds"];
const STAR_CATEGORIES: [&str; 3] = ["star", "primary-star", "sun"];
const BODY_CATEGORIES: [&str; 5] = ["planet", "moon", "asteroid", "comet", "star"];

/// Build the scene for `node` from its `dynamics` block.
///
/// Returns `None` when no body can be built; the caller then falls back to
/// a static view.
pub fn normalize(node: &CatalogNode, dynamics: &Map<String, Value>) -> Option<DynamicsState> {
    let tick_seconds = tick_seconds(dynamics);
    let focus_name = node.name.as_str();
    let focus_category = node.category.to_lowercase();

    let mut bodies = Vec::new();
    if let Some(objects) = dynamics.get("objects").and_then(Value::as_array) {
        bodies.extend(
            objects
                .iter()
                .filter_map(Value::as_object)
                .map(|entry| coerce_body(entry, focus_name)),
        );
        // An object named like the viewed node is that node itself.
        if !bodies.iter().any(|b| b.primary) && !focus_name.is_empty() {
            if let Some(own) = bodies.iter_mut().find(|b| b.name == focus_name) {
                own.primary = true;
            }
        }
    } else if dynamics.get("position").map_or(false, Value::is_object) {
        let mut focal = coerce_body(dynamics, focus_name);
        if !truthy(dynamics.get("category")) {
            focal.category = node.category.to_lowercase();
        }
        focal.primary = true;
        bodies.push(focal);
        if let Some(nearby) = dynamics.get("nearby").and_then(Value::as_array) {
            bodies.extend(nearby.iter().filter_map(Value::as_object).map(|entry| {
                let mut body = coerce_body(entry, focus_name);
                body.primary = false;
                body
            }));
        }
    }

    if bodies.is_empty() {
        return None;
    }

    let primary = select_primary(&bodies, &focus_category);
    for (i, body) in bodies.iter_mut().enumerate() {
        body.primary = i == primary;
        body.visible = false;
    }

    let origin = bodies[primary].position;
    for body in &mut bodies {
        body.distance = distance(body.position, origin);
    }
    bodies[primary].distance = 0.0;

    let cap = bodies.len().min(visibility_cap(&focus_category));
    bodies[primary].visible = true;
    let mut others: Vec<usize> = (0..bodies.len()).filter(|&i| i != primary).collect();
    others.sort_by(|&a, &b| bodies[a].distance.total_cmp(&bodies[b].distance));
    for &i in others.iter().take(cap.saturating_sub(1)) {
        bodies[i].visible = true;
    }

    bodies.sort_by(|a, b| {
        b.primary
            .cmp(&a.primary)
            .then(a.distance.total_cmp(&b.distance))
            .then_with(|| a.name.cmp(&b.name))
    });

    log::debug!(
        "Normalized dynamics for {}: {} bodies, {} visible, dt {}",
        node.token(),
        bodies.len(),
        cap,
        tick_seconds
    );

    Some(DynamicsState {
        tick_seconds,
        bodies,
        tick_count: 0,
    })
}

/// First truthy tick field, clamped to a positive finite value.
pub fn tick_seconds(dynamics: &Map<String, Value>) -> f64 {
    TICK_FIELDS
        .iter()
        .filter_map(|k| dynamics.get(*k))
        .find(|v| truthy(Some(v)))
        .and_then(lenient_f64)
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(1.0)
}

/// Visible body budget (primary included) for a node category.
pub fn visibility_cap(category: &str) -> usize {
    if category == "system" {
        9
    } else if BODY_CATEGORIES.contains(&category) {
        6
    } else {
        5
    }
}

/// Explicit flag, then the system's star, then the heaviest body.
fn select_primary(bodies: &[Body], focus_category: &str) -> usize {
    if let Some(i) = bodies.iter().position(|b| b.primary) {
        return i;
    }
    if focus_category == "system" {
        if let Some(i) = bodies
            .iter()
            .position(|b| STAR_CATEGORIES.contains(&b.category.as_str()))
        {
            return i;
        }
    }
    let mut heaviest = 0;
    for (i, body) in bodies.iter().enumerate() {
        if body.mass > bodies[heaviest].mass {
            heaviest = i;
        }
    }
    heaviest
}

fn coerce_body(entry: &Map<String, Value>, default_name: &str) -> Body {
    let name = entry
        .get("name")
        .filter(|v| truthy(Some(v)))
        .map(plain)
        .or_else(|| (!default_name.is_empty()).then(|| default_name.to_string()))
        .unwrap_or_else(|| "Unnamed".to_string());
    let category = ["category", "icon"]
        .iter()
        .filter_map(|k| entry.get(*k))
        .find(|v| truthy(Some(v)))
        .map(plain)
        .unwrap_or_else(|| "object".to_string())
        .to_lowercase();

    let position = vector(entry.get("position"));
    let velocity = vector(entry.get("velocity"));
    let speed = entry
        .get("speed")
        .and_then(lenient_f64)
        .unwrap_or_else(|| norm(velocity));

    Body {
        name,
        category,
        position,
        velocity,
        radius: number(entry.get("radius")),
        mass: number(entry.get("mass")),
        speed,
        primary: entry.get("primary").and_then(Value::as_bool).unwrap_or(false),
        distance: number(entry.get("distance")),
        visible: true,
        trail: Trail::default(),
    }
}

fn vector(value: Option<&Value>) -> Vec3 {
    let Some(map) = value.and_then(Value::as_object) else {
        return [0.0; 3];
    };
    let axis = |k: &str| number(map.get(k));
    [axis("x"), axis("y"), axis("z")]
}

fn number(value: Option<&Value>) -> f64 {
    value
        .and_then(lenient_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}
