//! Orbital scene animator.
//!
//! Drives a [`DynamicsState`] forward on a fixed frame interval from the UI
//! thread. The scheduler never sleeps or spawns: the frame loop asks
//! [`AnimationScheduler::poll`] whether a tick is due and how long until the
//! next one.
//!
//! - Start: replaces any running scene and arms the first tick
//! - Tick: one Euler step, then re-armed from the completion instant
//! - Stop: tears the scene down; stale tokens never fire afterwards

use std::time::{Duration, Instant};

use crate::dynamics::DynamicsState;

/// Time between animation ticks.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(600);

/// Permission for one tick, valid only for the generation that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickToken {
    generation: u64,
}

#[derive(Debug)]
pub struct AnimationScheduler {
    interval: Duration,
    generation: u64,
    state: Option<DynamicsState>,
    next_due: Option<Instant>,
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::with_interval(FRAME_INTERVAL)
    }
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            state: None,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&DynamicsState> {
        self.state.as_ref()
    }

    /// Begin animating `state`, replacing whatever was running.
    pub fn start(&mut self, state: DynamicsState, now: Instant) {
        self.stop();
        self.generation += 1;
        log::debug!(
            "Animation started (generation {}, {} bodies)",
            self.generation,
            state.bodies.len()
        );
        self.state = Some(state);
        self.next_due = Some(now + self.interval);
    }

    /// Tear down the running scene. Returns false if nothing was running.
    pub fn stop(&mut self) -> bool {
        if self.state.is_none() && self.next_due.is_none() {
            return false;
        }
        self.generation += 1;
        self.state = None;
        self.next_due = None;
        log::debug!("Animation stopped (generation {})", self.generation);
        true
    }

    /// A token for the pending tick, once it is due.
    pub fn due(&self, now: Instant) -> Option<TickToken> {
        match (self.next_due, &self.state) {
            (Some(at), Some(_)) if now >= at => Some(TickToken {
                generation: self.generation,
            }),
            _ => None,
        }
    }

    /// Advance the scene one step. Tokens from an earlier start/stop are
    /// rejected. The scheduler stays disarmed until [`Self::rearm`].
    pub fn tick(&mut self, token: TickToken) -> bool {
        if token.generation != self.generation {
            return false;
        }
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        state.step();
        self.next_due = None;
        true
    }

    /// Schedule the next tick one interval after `completed_at`.
    pub fn rearm(&mut self, completed_at: Instant) {
        if self.state.is_some() {
            self.next_due = Some(completed_at + self.interval);
        }
    }

    /// Run a due tick, if any. Returns whether the scene changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(token) = self.due(now) else {
            return false;
        };
        let began = Instant::now();
        if !self.tick(token) {
            return false;
        }
        self.rearm(now + began.elapsed());
        true
    }

    /// Time left before the next tick, for scheduling a repaint.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.state.as_ref()?;
        self.next_due.map(|at| at.saturating_duration_since(now))
    }
}
