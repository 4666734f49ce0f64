//! Orbital scene state for a selected catalog node.
//!
//! Telemetry is turned into a flat list of [`Body`] values by
//! [`normalize::normalize`]; each animation tick then advances every body
//! with an explicit Euler step of `tick_seconds` simulated seconds.

pub mod normalize;

use std::collections::VecDeque;

pub use normalize::normalize;

/// Number of past positions kept per body.
pub const TRAIL_CAPACITY: usize = 60;

pub type Vec3 = [f64; 3];

pub fn norm(v: Vec3) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub fn distance(a: Vec3, b: Vec3) -> f64 {
    norm([a[0] - b[0], a[1] - b[1], a[2] - b[2]])
}

/// Fixed-capacity FIFO of 2D positions. Pushing into a full trail drops the
/// oldest point.
#[derive(Debug, Clone, PartialEq)]
pub struct Trail {
    points: VecDeque<[f64; 2]>,
    capacity: usize,
}

impl Trail {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, point: [f64; 2]) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest retained point.
    pub fn oldest(&self) -> Option<[f64; 2]> {
        self.points.front().copied()
    }

    pub fn newest(&self) -> Option<[f64; 2]> {
        self.points.back().copied()
    }

    /// The last `n` points, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = [f64; 2]> + '_ {
        let skip = self.points.len().saturating_sub(n);
        self.points.iter().skip(skip).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.points.iter().copied()
    }
}

impl Default for Trail {
    fn default() -> Self {
        Self::with_capacity(TRAIL_CAPACITY)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub name: String,
    pub category: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f64,
    pub mass: f64,
    pub speed: f64,
    pub primary: bool,
    /// Distance from the primary body.
    pub distance: f64,
    pub visible: bool,
    pub trail: Trail,
}

impl Body {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            position: [0.0; 3],
            velocity: [0.0; 3],
            radius: 0.0,
            mass: 0.0,
            speed: 0.0,
            primary: false,
            distance: 0.0,
            visible: true,
            trail: Trail::default(),
        }
    }

    /// Record the current (x, y) and advance one Euler step.
    fn advance(&mut self, dt: f64) {
        self.trail.push([self.position[0], self.position[1]]);
        for axis in 0..3 {
            self.position[axis] += self.velocity[axis] * dt;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicsState {
    pub tick_seconds: f64,
    /// Primary first, then by distance.
    pub bodies: Vec<Body>,
    pub tick_count: u64,
}

impl DynamicsState {
    /// Advance every body by `tick_seconds` of simulated time.
    pub fn step(&mut self) {
        let dt = self.tick_seconds;
        for body in &mut self.bodies {
            body.advance(dt);
        }
        self.tick_count += 1;
    }

    pub fn primary(&self) -> Option<&Body> {
        self.bodies.iter().find(|b| b.primary)
    }

    pub fn visible(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter().filter(|b| b.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }
}
