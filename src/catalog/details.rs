//! Text panes shown for the selected catalog node.
//!
//! - `overview`: heading, summary, description, statistics
//! - `chronicle`: the most recent events
//! - `metadata`: node and image metadata, with map/territory summaries
//! - `raw`: the node as pretty JSON

use serde_json::{Map, Value};

use super::{lenient_f64, ChronicleEntry, CatalogNode};

/// Chronicle entries shown per node.
pub const CHRONICLE_TAIL: usize = 12;
/// Nested values longer than this are truncated in the panes.
pub const VALUE_TRUNCATE: usize = 800;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDetails {
    pub overview: String,
    pub chronicle: String,
    pub metadata: String,
    pub raw: String,
}

impl NodeDetails {
    pub fn from_node(node: &CatalogNode) -> Self {
        Self {
            overview: overview(node),
            chronicle: chronicle(node),
            metadata: metadata(node),
            raw: serde_json::to_string_pretty(node).unwrap_or_default(),
        }
    }
}

fn overview(node: &CatalogNode) -> String {
    let mut lines = vec![format!("{}: {}", title_case(&node.category), node.name)];
    if !node.summary.is_empty() {
        lines.push(node.summary.clone());
    }
    if !node.description.is_empty() {
        lines.push(String::new());
        lines.push(node.description.clone());
    }

    if !node.statistics.is_empty() {
        lines.push(String::new());
        lines.push("Statistics:".into());
        for (key, value) in &node.statistics {
            if let (true, Some(breakdown)) = (key == "life_breakdown", value.as_object()) {
                lines.push("  • Life Breakdown:".into());
                lines.extend(life_breakdown(breakdown));
                continue;
            }
            lines.push(format!(
                "  • {}: {}",
                title_case(&key.replace('_', " ")),
                format_statistic(value)
            ));
        }
    }
    lines.join("\n").trim().to_string()
}

fn chronicle(node: &CatalogNode) -> String {
    if node.chronicle.is_empty() {
        return "No chronicle entries recorded yet.".into();
    }
    let mut lines = vec![format!("Recent moments for {}:", node.name)];
    let skip = node.chronicle.len().saturating_sub(CHRONICLE_TAIL);
    for entry in node.chronicle.iter().skip(skip) {
        match entry {
            ChronicleEntry::Event(ev) => {
                let suffix = ev
                    .timestamp
                    .and_then(format_timestamp)
                    .map(|s| format!(" ({})", s))
                    .unwrap_or_default();
                lines.push(format!("  • [{}] {}{}", ev.kind, ev.text, suffix));
            }
            ChronicleEntry::Note(v) => lines.push(format!("  • {}", plain(v))),
        }
    }
    lines.join("\n")
}

fn metadata(node: &CatalogNode) -> String {
    let mut lines = Vec::new();
    if node.metadata.is_empty() {
        lines.push("No supplemental metadata available.".to_string());
    } else {
        lines.push("Node metadata:".to_string());
        for (key, value) in &node.metadata {
            match (key.as_str(), value.as_object()) {
                ("map", Some(map)) => lines.push(format!("  • Map: {}", summarize_map(map))),
                ("territory", Some(t)) => {
                    lines.push(format!("  • Territory: {}", summarize_territory(t)))
                }
                _ => lines.push(format!(
                    "  • {}: {}",
                    title_case(&key.replace('_', " ")),
                    format_value(value)
                )),
            }
        }
    }

    if let Some(image) = node.image.as_ref().filter(|i| !i.metadata.is_empty()) {
        lines.push(String::new());
        lines.push("Image metadata:".into());
        for (key, value) in &image.metadata {
            lines.push(format!(
                "  • {}: {}",
                title_case(&key.replace('_', " ")),
                format_value(value)
            ));
        }
    }
    lines.join("\n").trim().to_string()
}

fn life_breakdown(breakdown: &Map<String, Value>) -> Vec<String> {
    let mut lines = Vec::new();
    for (label, key) in [("Kingdoms", "kingdoms"), ("Phyla", "phyla")] {
        if let Some(group) = breakdown.get(key).and_then(Value::as_object) {
            if group.is_empty() {
                continue;
            }
            lines.push(format!("    {}:", label));
            for (name, pct) in group.iter().take(5) {
                let pct = lenient_f64(pct).unwrap_or(0.0);
                lines.push(format!("      • {}: {:.2}%", name, pct));
            }
        }
    }
    if let Some(entries) = breakdown.get("entries").and_then(Value::as_array) {
        if lines.len() < 2 {
            for entry in entries.iter().take(5).filter_map(Value::as_object) {
                let kingdom = entry.get("kingdom").map(plain).unwrap_or_else(|| "Unknown".into());
                let phylum = entry
                    .get("phylum")
                    .map(plain)
                    .unwrap_or_else(|| "Unclassified".into());
                let pct = entry.get("share").and_then(lenient_f64).unwrap_or(0.0);
                lines.push(format!("      • {} / {}: {:.2}%", kingdom, phylum, pct));
            }
        }
    }
    if lines.is_empty() {
        lines.push("    (no biosphere data)".into());
    }
    lines
}

pub fn summarize_map(map: &Map<String, Value>) -> String {
    let mut parts = Vec::new();
    for (key, noun) in [
        ("countries", "countries"),
        ("cities", "cities"),
        ("residents", "residents plotted"),
    ] {
        if let Some(list) = map.get(key).and_then(Value::as_array) {
            parts.push(format!("{} {}", list.len(), noun));
        }
    }
    if parts.is_empty() && map.contains_key("coordinates") {
        let coords = map.get("coordinates").and_then(Value::as_object);
        let lat = coords
            .and_then(|c| c.get("latitude"))
            .and_then(lenient_f64)
            .unwrap_or(0.0);
        let lon = coords
            .and_then(|c| c.get("longitude").or_else(|| c.get("lon")))
            .and_then(lenient_f64)
            .unwrap_or(0.0);
        parts.push(format!("center at {:.1}°, {:.1}°", lat, lon));
    }
    if parts.is_empty() {
        "available".into()
    } else {
        parts.join(", ")
    }
}

pub fn summarize_territory(territory: &Map<String, Value>) -> String {
    let axis = |block: &str, long: &str, short: &str| {
        territory
            .get(block)
            .and_then(Value::as_object)
            .and_then(|b| b.get(long).or_else(|| b.get(short)))
            .and_then(lenient_f64)
            .unwrap_or(0.0)
    };
    let mut descriptor = format!(
        "center=({:.1}°, {:.1}°), span≈({:.1}°, {:.1}°)",
        axis("center", "latitude", "lat"),
        axis("center", "longitude", "lon"),
        axis("span", "latitude", "latitude"),
        axis("span", "longitude", "longitude"),
    );
    let extras: Vec<String> = ["biome", "terrain"]
        .iter()
        .filter_map(|k| territory.get(*k))
        .filter(|v| truthy(v))
        .map(plain)
        .collect();
    if !extras.is_empty() {
        descriptor.push_str(" | ");
        descriptor.push_str(&extras.join("; "));
    }
    descriptor
}

/// Statistic values: integral numbers get thousands separators, fractional
/// ones two decimals; anything else renders like a metadata value.
pub fn format_statistic(value: &Value) -> String {
    if let Some(n) = value.as_i64() {
        return group_thousands(&n.to_string());
    }
    if let Some(n) = value.as_u64() {
        return group_thousands(&n.to_string());
    }
    match value.as_f64() {
        Some(v) => {
            if (v - v.trunc()).abs() < 1e-6 {
                // f64 Display never switches to exponent notation.
                group_thousands(&format!("{}", v.trunc() + 0.0))
            } else {
                group_thousands(&format!("{:.2}", v))
            }
        }
        _ => format_value(value),
    }
}

/// Nested values as pretty JSON (truncated), scalars as plain text.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => {
            let text = serde_json::to_string_pretty(value).unwrap_or_default();
            if text.chars().count() > VALUE_TRUNCATE {
                let head: String = text.chars().take(VALUE_TRUNCATE - 3).collect();
                format!("{}...", head)
            } else {
                text
            }
        }
        other => plain(other),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn format_timestamp(secs: f64) -> Option<String> {
    if !secs.is_finite() {
        return None;
    }
    chrono::DateTime::from_timestamp(secs.trunc() as i64, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Insert `,` separators into the integer part of a formatted number.
fn group_thousands(formatted: &str) -> String {
    let (sign, rest) = match formatted.strip_prefix('-') {
        Some(r) => ("-", r),
        None => ("", formatted),
    };
    let (int_part, frac) = match rest.find('.') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    let digits = int_part.as_bytes();
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*d as char);
    }
    format!("{}{}{}", sign, grouped, frac)
}

/// Capitalise the first letter of every alphabetic run.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
