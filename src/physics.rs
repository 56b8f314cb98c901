//! Physics for the mascot body.
//!
//! Velocities are pixels per frame at a nominal 60 fps; `step` advances
//! exactly one frame and the orchestrator owns wall-clock pacing. Walking
//! velocity is written by the behavior machine each tick, not integrated
//! here; while dragged the body is positioned externally and `step` is a
//! no-op.

use crate::config::PhysicsTuning;

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Walkable area in pixels. Read from the host at the start of each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub w: f64,
    pub h: f64,
}

impl Viewport {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }
}

// ---------------------------------------------------------------------------
// PhysicsBody
// ---------------------------------------------------------------------------

/// Position, velocity, and contact flags for one mascot instance.
#[derive(Debug, Clone)]
pub struct PhysicsBody {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub w: f64,
    pub h: f64,
    /// True only after a floor contact in the current or a previous step.
    pub on_ground: bool,
    /// True between a throw/launch and the ground contact that absorbs it.
    pub thrown: bool,
    tuning: PhysicsTuning,
}

impl PhysicsBody {
    pub fn new(x: f64, y: f64, w: f64, h: f64, tuning: PhysicsTuning) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            w,
            h,
            on_ground: false,
            thrown: false,
            tuning,
        }
    }

    /// Advance physics by one frame.
    ///
    /// Does not touch velocity for walking -- the state machine does that.
    /// Does not touch anything while dragged.
    pub fn step(&mut self, viewport: Viewport, is_dragging: bool) -> &mut Self {
        if is_dragging {
            return self;
        }

        let t = self.tuning;

        // Gravity
        if !self.on_ground {
            self.vy = (self.vy + t.gravity).min(t.terminal_velocity);
        }

        // Air damping when thrown
        if self.thrown {
            self.vx *= t.air_damping;
            self.vy *= t.air_damping;
        }

        self.x += self.vx;
        self.y += self.vy;

        // Floor
        let floor_y = self.floor_y(viewport);
        if self.y >= floor_y {
            self.y = floor_y;
            if self.thrown {
                let bounced = -self.vy * t.bounce_factor;
                if bounced.abs() < t.bounce_stop {
                    self.vy = 0.0;
                    self.thrown = false;
                } else {
                    self.vy = bounced;
                }
                self.vx *= t.friction;
            } else {
                self.vy = 0.0;
            }
            self.on_ground = true;
        } else {
            self.on_ground = false;
        }

        // Left wall
        if self.x < 0.0 {
            self.x = 0.0;
            if self.thrown {
                self.vx = self.vx.abs() * 0.5;
            }
        }

        // Right wall
        if self.x + self.w > viewport.w {
            self.x = viewport.w - self.w;
            if self.thrown {
                self.vx = -self.vx.abs() * 0.5;
            }
        }

        // Ceiling: partial reflection so an upward arc doesn't stick
        if self.y < 0.0 {
            self.y = 0.0;
            if self.vy < 0.0 {
                self.vy = self.vy.abs() * 0.3;
            }
        }

        self
    }

    /// Set the walking velocity. `direction` is -1 (left) or 1 (right);
    /// overwrites, never accumulates.
    pub fn apply_walk_velocity(&mut self, direction: f64) {
        self.vx = self.tuning.walk_speed * direction;
        self.vy = 0.0;
    }

    /// Launch the body with the given velocity (from a drag release). The
    /// only entry point that starts a ballistic arc.
    pub fn apply_throw(&mut self, vx: f64, vy: f64) {
        let cap = self.tuning.max_throw_speed;
        self.vx = vx.clamp(-cap, cap);
        self.vy = vy.clamp(-cap, cap);
        self.thrown = true;
        self.on_ground = false;
    }

    /// Floor line for the body in the given viewport.
    pub fn floor_y(&self, viewport: Viewport) -> f64 {
        viewport.h - self.h
    }

    /// Center of the body rectangle.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Whether a point lies inside the body rectangle.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.w && py >= self.y && py <= self.y + self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_at(x: f64, y: f64) -> PhysicsBody {
        PhysicsBody::new(x, y, 64.0, 64.0, PhysicsTuning::default())
    }

    #[test]
    fn test_gravity_monotonic_until_terminal() {
        let mut body = body_at(100.0, 0.0);
        // Tall viewport so the body never reaches the floor.
        let vp = Viewport::new(800.0, 100_000.0);
        let mut prev = body.vy;
        for _ in 0..200 {
            body.step(vp, false);
            assert!(body.vy >= prev);
            assert!(body.vy <= 20.0);
            prev = body.vy;
        }
        assert_eq!(prev, 20.0);
    }

    #[test]
    fn test_drag_step_is_noop() {
        let mut body = body_at(100.0, 100.0);
        body.vx = 5.0;
        body.vy = -3.0;
        body.step(Viewport::new(800.0, 600.0), true);
        assert_eq!((body.x, body.y), (100.0, 100.0));
        assert_eq!((body.vx, body.vy), (5.0, -3.0));
    }

    #[test]
    fn test_plain_landing_zeroes_vy() {
        let mut body = body_at(100.0, 530.0);
        body.vy = 10.0;
        body.step(Viewport::new(800.0, 600.0), false);
        assert_eq!(body.y, 536.0);
        assert_eq!(body.vy, 0.0);
        assert!(body.on_ground);
    }

    #[test]
    fn test_thrown_bounce_loses_energy() {
        let mut body = body_at(100.0, 535.0);
        body.thrown = true;
        body.vy = 10.0;
        body.step(Viewport::new(800.0, 600.0), false);
        assert!(body.on_ground);
        assert!(body.thrown, "bounce above the stop threshold keeps the throw alive");
        assert!(body.vy < 0.0, "bounce reverses vy");
        assert!(body.vy.abs() < 10.0, "bounce sheds speed");
    }

    #[test]
    fn test_tiny_bounce_settles_and_clears_thrown() {
        let mut body = body_at(100.0, 535.9);
        body.thrown = true;
        body.vy = 0.5;
        body.step(Viewport::new(800.0, 600.0), false);
        assert!(body.on_ground);
        assert!(!body.thrown);
        assert_eq!(body.vy, 0.0);
    }

    #[test]
    fn test_floor_contact_applies_friction_while_thrown() {
        let mut body = body_at(100.0, 535.0);
        body.thrown = true;
        body.vy = 10.0;
        body.vx = 10.0;
        body.step(Viewport::new(800.0, 600.0), false);
        // One frame of air damping then the floor friction factor.
        assert!((body.vx - 10.0 * 0.97 * 0.80).abs() < 1e-9);
    }

    #[test]
    fn test_throw_clamped_and_resolved_inside_viewport() {
        let vp = Viewport::new(800.0, 600.0);
        for (vx, vy) in [(1e12, -1e12), (-1e12, 1e12), (f64::MAX, f64::MIN)] {
            let mut body = body_at(400.0, 300.0);
            body.apply_throw(vx, vy);
            assert!(body.vx.abs() <= 22.0);
            assert!(body.vy.abs() <= 22.0);
            body.step(vp, false);
            assert!(body.x >= 0.0 && body.x <= vp.w - body.w);
            assert!(body.y >= 0.0 && body.y <= vp.h - body.h);
        }
    }

    #[test]
    fn test_wall_reflects_only_while_thrown() {
        let vp = Viewport::new(800.0, 600.0);

        let mut walking = body_at(0.3, 536.0);
        walking.on_ground = true;
        walking.apply_walk_velocity(-1.0);
        walking.step(vp, false);
        assert_eq!(walking.x, 0.0);
        assert!(walking.vx < 0.0, "walking wall contact leaves velocity alone");

        let mut thrown = body_at(1.0, 300.0);
        thrown.thrown = true;
        thrown.vx = -8.0;
        thrown.step(vp, false);
        assert_eq!(thrown.x, 0.0);
        assert!(thrown.vx > 0.0, "thrown wall contact reflects");
        assert!(thrown.vx < 8.0, "reflection is damped");
    }

    #[test]
    fn test_ceiling_partially_reflects_upward_motion() {
        let mut body = body_at(100.0, 5.0);
        body.vy = -10.0;
        body.step(Viewport::new(800.0, 600.0), false);
        assert_eq!(body.y, 0.0);
        assert!(body.vy > 0.0, "upward velocity is reflected downward");
        assert!(body.vy < 10.0, "reflection is damped");
    }

    #[test]
    fn test_walk_velocity_overwrites() {
        let mut body = body_at(100.0, 536.0);
        body.vx = 17.0;
        body.vy = -4.0;
        body.apply_walk_velocity(1.0);
        assert_eq!(body.vx, 0.5);
        assert_eq!(body.vy, 0.0);
    }

    #[test]
    fn test_contains_and_center() {
        let body = body_at(10.0, 20.0);
        assert_eq!(body.center(), (42.0, 52.0));
        assert!(body.contains(10.0, 20.0));
        assert!(body.contains(74.0, 84.0));
        assert!(!body.contains(75.0, 84.0));
    }
}
