//! Drag gesture session and throw velocity estimation.
//!
//! While a gesture is active the body is pinned to the pointer and physics
//! is suspended; on release the recent pointer history turns into a throw.
//! The estimate always spans a trailing time window rather than the last two
//! samples, so single-sample jitter can't spike it.

use crate::config::DragTuning;
use crate::physics::PhysicsBody;
use crate::state::{Direction, StateMachine};

#[derive(Debug, Clone, Copy)]
struct Sample {
    x: f64,
    y: f64,
    t: f64,
}

pub struct DragController {
    tuning: DragTuning,
    dragging: bool,
    /// Pointer offset from the body's top-left at gesture start.
    offset_x: f64,
    offset_y: f64,
    /// Recent pointer samples, oldest first.
    history: Vec<Sample>,
    /// Last time the pointer moved horizontally (for the held-pose check).
    last_move_time: f64,
}

impl DragController {
    pub fn new(tuning: DragTuning) -> Self {
        Self {
            tuning,
            dragging: false,
            offset_x: 0.0,
            offset_y: 0.0,
            history: Vec::with_capacity(tuning.history_len),
            last_move_time: 0.0,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Pointer-down on the mascot. Puts the machine into DRAGGED with a
    /// neutral facing until the pointer actually moves.
    pub fn gesture_start(
        &mut self,
        px: f64,
        py: f64,
        now: f64,
        body: &PhysicsBody,
        fsm: &mut StateMachine,
    ) {
        self.dragging = true;
        self.history.clear();
        self.offset_x = px - body.x;
        self.offset_y = py - body.y;
        self.last_move_time = 0.0;

        fsm.start_drag();
        fsm.direction = Direction::Neutral;

        self.record(px, py, now);
    }

    /// Pointer movement during a gesture: pin the body under the pointer and
    /// keep the facing in sync with horizontal motion.
    pub fn gesture_move(
        &mut self,
        px: f64,
        py: f64,
        now: f64,
        body: &mut PhysicsBody,
        fsm: &mut StateMachine,
    ) {
        if !self.dragging {
            return;
        }

        if let Some(prev) = self.history.last() {
            if px > prev.x {
                fsm.direction = Direction::Right;
                self.last_move_time = now;
            } else if px < prev.x {
                fsm.direction = Direction::Left;
                self.last_move_time = now;
            }
        }

        // No physics while held: position comes straight from the pointer.
        body.x = px - self.offset_x;
        body.y = py - self.offset_y;
        body.vx = 0.0;
        body.vy = 0.0;
        body.on_ground = false;
        body.thrown = false;

        self.record(px, py, now);
    }

    /// Pointer-up: throw if the gesture carried enough speed, otherwise drop.
    pub fn gesture_end(&mut self, now: f64, body: &mut PhysicsBody, fsm: &mut StateMachine) {
        if !self.dragging {
            return;
        }
        self.dragging = false;

        let (vx, vy) = self.estimate_velocity(now);
        let has_velocity = vx.abs() + vy.abs() > self.tuning.release_deadband;
        if has_velocity {
            body.apply_throw(vx, vy);
        }
        fsm.end_drag(has_velocity);
    }

    /// Run once per tick while dragging: after `hold_delay_ms` with no
    /// directional movement the facing goes neutral so the renderer shows a
    /// held pose. A rendering hint, not a physics change.
    pub fn check_hold_pose(&mut self, now: f64, fsm: &mut StateMachine) {
        if !self.dragging || fsm.direction == Direction::Neutral {
            return;
        }
        if now - self.last_move_time >= self.tuning.hold_delay_ms {
            fsm.direction = Direction::Neutral;
        }
    }

    // -- internals -----------------------------------------------------------

    fn record(&mut self, x: f64, y: f64, t: f64) {
        self.history.push(Sample { x, y, t });
        if self.history.len() > self.tuning.history_len {
            self.history.remove(0);
        }
    }

    /// Estimate release velocity in px per nominal frame from the samples
    /// inside the trailing window.
    fn estimate_velocity(&self, now: f64) -> (f64, f64) {
        if self.history.len() < 2 {
            return (0.0, 0.0);
        }

        let recent: Vec<&Sample> = self
            .history
            .iter()
            .filter(|s| now - s.t <= self.tuning.history_window_ms)
            .collect();
        if recent.len() < 2 {
            return (0.0, 0.0);
        }

        let first = recent[0];
        let last = recent[recent.len() - 1];
        let dt = last.t - first.t;
        if dt == 0.0 {
            return (0.0, 0.0);
        }

        // px/ms -> px/frame
        let scale = self.tuning.frame_interval_ms / dt;
        let cap = self.tuning.max_throw;
        let vx = ((last.x - first.x) * scale).clamp(-cap, cap);
        let vy = ((last.y - first.y) * scale).clamp(-cap, cap);
        (vx, vy)
    }
}
