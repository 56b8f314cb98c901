//! Behavior state machine for the mascot.
//!
//! States:
//!   FALLING    -- in air, gravity active (entry state on spawn)
//!   LANDING    -- brief pause when feet first hit floor
//!   WALKING    -- moving left or right along the floor
//!   IDLE       -- standing still (random breaks while walking)
//!   DRAGGED    -- user is holding the mascot
//!   THROWN     -- released mid-air with velocity
//!   MOUSE_GRAB -- prank override, driven entirely by the orchestrator
//!
//! Transitions:
//!   FALLING  (body on ground)        > LANDING
//!   LANDING  (timer expires)         > WALKING (random direction)
//!   WALKING  (hit wall)              > WALKING (direction flipped)
//!   WALKING  (random chance)         > IDLE
//!   IDLE     (timer expires)         > WALKING (random direction)
//!   THROWN   (grounded, throw spent) > WALKING (random direction)
//!   any      (start_drag)            > DRAGGED
//!   DRAGGED  (end_drag, no velocity) > FALLING
//!   DRAGGED  (end_drag, velocity)    > THROWN
//!
//! DRAGGED and MOUSE_GRAB are only ever entered or left through the external
//! triggers below; `update` never moves into or out of them on its own.

use tracing::debug;

use crate::config::BehaviorTuning;
use crate::physics::PhysicsBody;
use crate::rng::{RandomSource, Xorshift64};

// ---------------------------------------------------------------------------
// States and facing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Falling,
    Landing,
    Walking,
    Idle,
    Dragged,
    Thrown,
    MouseGrab,
}

impl State {
    pub fn name(self) -> &'static str {
        match self {
            State::Falling => "falling",
            State::Landing => "landing",
            State::Walking => "walking",
            State::Idle => "idle",
            State::Dragged => "dragged",
            State::Thrown => "thrown",
            State::MouseGrab => "mouse_grab",
        }
    }
}

/// Facing direction. Neutral is the held pose shown when a drag stops moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Neutral,
    Right,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Left => -1.0,
            Direction::Neutral => 0.0,
            Direction::Right => 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Called on every real transition with (old, new, direction).
pub type TransitionListener = Box<dyn FnMut(State, State, Direction)>;

pub struct StateMachine {
    pub state: State,
    pub direction: Direction,
    /// Ms elapsed in the current timed state.
    timer: f64,
    /// Ms to spend before auto-transitioning, drawn on entry to timed states.
    duration: Option<f64>,
    tuning: BehaviorTuning,
    rng: Box<dyn RandomSource>,
    listeners: Vec<TransitionListener>,
}

impl StateMachine {
    pub fn new(tuning: BehaviorTuning) -> Self {
        Self::with_rng(tuning, Box::new(Xorshift64::seeded()))
    }

    pub fn with_rng(tuning: BehaviorTuning, rng: Box<dyn RandomSource>) -> Self {
        Self {
            state: State::Falling,
            direction: Direction::Right,
            timer: 0.0,
            duration: None,
            tuning,
            rng,
            listeners: Vec::new(),
        }
    }

    /// Subscribe to transition events.
    pub fn on_change(&mut self, listener: impl FnMut(State, State, Direction) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Advance the machine by `dt` ms. Reads the body's contact flags and
    /// horizontal extent only; velocity is the orchestrator's business.
    pub fn update(&mut self, dt: f64, body: &PhysicsBody, viewport_w: f64) {
        self.timer += dt;

        match self.state {
            State::Falling => {
                if body.on_ground {
                    self.go(State::Landing);
                }
            }

            State::Landing => {
                if self.timer >= self.duration.unwrap_or(0.0) {
                    self.direction = self.random_direction();
                    self.go(State::Walking);
                }
            }

            State::Walking => {
                // Wall flip
                if self.direction == Direction::Left && body.x <= 0.0 {
                    self.direction = Direction::Right;
                } else if self.direction == Direction::Right && body.x + body.w >= viewport_w {
                    self.direction = Direction::Left;
                }
                // Spontaneous idle
                if self.rng.next() < self.tuning.idle_chance {
                    self.go(State::Idle);
                }
            }

            State::Idle => {
                if self.timer >= self.duration.unwrap_or(0.0) {
                    self.direction = self.random_direction();
                    self.go(State::Walking);
                }
            }

            // Transitions driven externally.
            State::Dragged | State::MouseGrab => {}

            State::Thrown => {
                if body.on_ground && !body.thrown {
                    self.direction = self.random_direction();
                    self.go(State::Walking);
                }
            }
        }
    }

    // -- external triggers ---------------------------------------------------

    /// The user picked the mascot up.
    pub fn start_drag(&mut self) {
        self.go(State::Dragged);
    }

    /// The user let go; with release velocity the mascot is thrown, without
    /// it simply falls.
    pub fn end_drag(&mut self, has_velocity: bool) {
        self.go(if has_velocity { State::Thrown } else { State::Falling });
    }

    /// Enter the mouse-grab prank (orchestrator only).
    pub(crate) fn begin_mouse_grab(&mut self) {
        self.go(State::MouseGrab);
    }

    /// Bail out of whatever is happening into free fall (orchestrator only,
    /// used when pointer capture fails mid-prank).
    pub(crate) fn drop_to_falling(&mut self) {
        self.go(State::Falling);
    }

    /// Pin the machine to IDLE without firing listeners or drawing a new
    /// duration; the stand-still override re-applies this every tick.
    pub(crate) fn force_idle(&mut self) {
        self.state = State::Idle;
        self.timer = 0.0;
    }

    pub(crate) fn reset_timer(&mut self) {
        self.timer = 0.0;
    }

    // -- internals -----------------------------------------------------------

    fn random_direction(&mut self) -> Direction {
        if self.rng.next() > 0.5 {
            Direction::Right
        } else {
            Direction::Left
        }
    }

    fn go(&mut self, new: State) {
        if self.state == new {
            return;
        }
        let old = self.state;
        self.state = new;
        self.timer = 0.0;
        self.duration = match new {
            State::Landing => Some(self.tuning.landing_ms),
            State::Idle => Some(self.tuning.idle_min_ms + self.rng.next() * self.tuning.idle_range_ms),
            _ => None,
        };
        debug!(from = old.name(), to = new.name(), "state change");
        let direction = self.direction;
        for listener in &mut self.listeners {
            listener(old, new, direction);
        }
    }
}
