//! Autonomous desktop mascot simulation.
//!
//! The core is a single-threaded, frame-driven simulation: a physics body
//! under gravity ([`physics`]), a behavior state machine for the walk/idle
//! loop ([`state`]), a drag controller that turns pointer gestures into
//! throws ([`drag`]), and the orchestrator that composes them once per
//! animation frame ([`mascot`]), including the mouse-grab prank that leaps
//! the mascot toward the cursor.
//!
//! Presentation and event delivery are host concerns behind small traits:
//! [`render::Renderer`] receives one frame snapshot per tick,
//! [`capture::PointerCapture`] wraps whatever exclusive-pointer facility the
//! host has, and the host calls [`mascot::Mascot::tick`] from its own frame
//! clock. The optional `desktop` feature ships a tao + softbuffer character
//! window and the `scamper` demo binary.

pub mod capture;
pub mod config;
pub mod drag;
pub mod mascot;
pub mod physics;
pub mod render;
pub mod rng;
pub mod state;

#[cfg(feature = "desktop")]
pub mod character;
#[cfg(feature = "desktop")]
pub mod error;
#[cfg(feature = "desktop")]
pub mod sprite;

pub use capture::{CaptureStatus, NoopCapture, PointerCapture};
pub use config::MascotConfig;
pub use mascot::Mascot;
pub use physics::{PhysicsBody, Viewport};
pub use render::{NullRenderer, RenderFrame, Renderer};
pub use rng::{RandomSource, SequenceRandom, Xorshift64};
pub use state::{Direction, State, StateMachine};
