//! Desktop character host.
//!
//! A transparent borderless always-on-top window that follows the simulated
//! body around the screen. The screen work area is the mascot's viewport;
//! pointer events on the window are translated to screen coordinates and fed
//! into the simulation, and the window's cursor grab backs the mouse-grab
//! prank's capture request.
//!
//! Gated behind the `desktop` feature.

use std::cell::RefCell;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use softbuffer::{Context as SoftContext, Surface};
use tao::dpi::{LogicalPosition, LogicalSize, PhysicalPosition};
use tao::event_loop::EventLoopWindowTarget;
use tao::window::{Window, WindowBuilder, WindowId};
use tracing::warn;

use crate::capture::{CaptureStatus, PointerCapture};
use crate::config::MascotConfig;
use crate::error::HostError;
use crate::mascot::Mascot;
use crate::physics::Viewport;
use crate::render::{RenderFrame, Renderer};
use crate::sprite::{SpriteAnimator, SpriteSet};
use crate::state::{Direction, State};

// ---------------------------------------------------------------------------
// Renderer and capture bridges
// ---------------------------------------------------------------------------

/// What the window needs from a tick, copied out of the borrow-bound
/// [`RenderFrame`].
#[derive(Debug, Clone, Copy)]
struct FrameData {
    x: f64,
    y: f64,
    state: State,
    direction: Direction,
    dt_ms: f64,
}

/// Renderer that parks the latest frame for the window to pick up after the
/// tick returns.
struct SharedFrame(Rc<RefCell<Option<FrameData>>>);

impl Renderer for SharedFrame {
    fn render(&mut self, frame: &RenderFrame<'_>) {
        *self.0.borrow_mut() = Some(FrameData {
            x: frame.x,
            y: frame.y,
            state: frame.state,
            direction: frame.direction,
            dt_ms: frame.dt_ms,
        });
    }
}

/// Pointer capture over the window's cursor grab. The grab call answers
/// synchronously, so a request resolves to granted or denied on the spot.
struct CursorCapture {
    window: Arc<Window>,
    status: CaptureStatus,
}

impl PointerCapture for CursorCapture {
    fn request(&mut self) {
        self.status = match self.window.set_cursor_grab(true) {
            Ok(()) => CaptureStatus::Granted,
            Err(e) => {
                warn!(error = %e, "cursor grab denied");
                CaptureStatus::Denied
            }
        };
    }

    fn release(&mut self) {
        if let Err(e) = self.window.set_cursor_grab(false) {
            warn!(error = %e, "cursor grab release failed");
        }
        self.status = CaptureStatus::Inactive;
    }

    fn poll(&mut self) -> CaptureStatus {
        self.status
    }
}

// ---------------------------------------------------------------------------
// CharacterHost
// ---------------------------------------------------------------------------

pub struct CharacterHost {
    window: Arc<Window>,
    surface: Surface<Arc<Window>, Arc<Window>>,
    sprites: SpriteSet,
    animator: SpriteAnimator,
    mascot: Mascot,
    frame: Rc<RefCell<Option<FrameData>>>,
    viewport: Viewport,
    last_tick: Instant,
    /// Last cursor position relative to the window, for drag starts.
    last_cursor: Option<PhysicalPosition<f64>>,
}

impl CharacterHost {
    /// Create the window and spawn the mascot. Must run on the main thread.
    pub fn new<T: 'static>(
        event_loop: &EventLoopWindowTarget<T>,
        config: MascotConfig,
    ) -> Result<Self, HostError> {
        let sprites = match &config.sprite.sheet {
            Some(path) => SpriteSet::from_sheet(path)?,
            None => SpriteSet::placeholder(config.sprite.size as u32),
        };
        let size = sprites.size as f64;

        let window = Arc::new(
            WindowBuilder::new()
                .with_title("")
                .with_decorations(false)
                .with_transparent(true)
                .with_always_on_top(true)
                .with_resizable(false)
                .with_inner_size(LogicalSize::new(size, size))
                .with_position(LogicalPosition::new(100.0, 100.0))
                .build(event_loop)
                .map_err(|e| HostError::Window(e.to_string()))?,
        );

        let context = SoftContext::new(Arc::clone(&window))
            .map_err(|e| HostError::Surface(e.to_string()))?;
        let surface = Surface::new(&context, Arc::clone(&window))
            .map_err(|e| HostError::Surface(e.to_string()))?;

        // Screen work area is the mascot's world.
        let monitor = window
            .current_monitor()
            .or_else(|| window.available_monitors().next());
        let viewport = match monitor {
            Some(m) => {
                let mon = m.size();
                Viewport::new(mon.width as f64, mon.height as f64)
            }
            None => Viewport::new(1920.0, 1080.0),
        };

        let frame: Rc<RefCell<Option<FrameData>>> = Rc::new(RefCell::new(None));
        let capture = CursorCapture {
            window: Arc::clone(&window),
            status: CaptureStatus::Inactive,
        };
        let mut mascot = Mascot::new(
            config,
            Box::new(SharedFrame(Rc::clone(&frame))),
            Box::new(capture),
        );
        mascot.spawn(viewport);

        Ok(Self {
            window,
            surface,
            sprites,
            animator: SpriteAnimator::new(),
            mascot,
            frame,
            viewport,
            last_tick: Instant::now(),
            last_cursor: None,
        })
    }

    // -- frame loop ----------------------------------------------------------

    /// Advance the simulation by wall-clock time and move the window to the
    /// body position.
    pub fn tick(&mut self) {
        let now = Instant::now();
        let dt_ms = now.duration_since(self.last_tick).as_secs_f64() * 1000.0;
        self.last_tick = now;

        self.mascot.tick(dt_ms, self.viewport);

        if let Some(frame) = *self.frame.borrow() {
            self.window
                .set_outer_position(PhysicalPosition::new(frame.x as i32, frame.y as i32));
        }
    }

    /// Blit the current sprite frame into the window.
    pub fn render(&mut self) {
        if !self.mascot.is_active() {
            return;
        }
        let Some(frame) = *self.frame.borrow() else {
            return;
        };

        let sequence = self.sprites.frames(frame.state);
        let index = self.animator.advance(frame.state, frame.dt_ms, sequence.len());
        let pixmap = &sequence[index.min(sequence.len().saturating_sub(1))];

        let Some(edge) = NonZeroU32::new(self.sprites.size) else {
            return;
        };
        if self.surface.resize(edge, edge).is_err() {
            return;
        }
        let mut buffer = match self.surface.buffer_mut() {
            Ok(b) => b,
            Err(_) => return,
        };

        // Premultiplied RGBA -> 0xAARRGGBB, mirroring for left-facing poses.
        let src = pixmap.data();
        let w = self.sprites.size as usize;
        let mirror = frame.direction == Direction::Left;
        for y in 0..w {
            for x in 0..w {
                let sx = if mirror { w - 1 - x } else { x };
                let i = (y * w + sx) * 4;
                let r = src[i] as u32;
                let g = src[i + 1] as u32;
                let b = src[i + 2] as u32;
                let a = src[i + 3] as u32;
                buffer[y * w + x] = (a << 24) | (r << 16) | (g << 8) | b;
            }
        }

        let _ = buffer.present();
    }

    // -- commands ------------------------------------------------------------

    pub fn spawn(&mut self) {
        self.mascot.spawn(self.viewport);
        self.window.set_visible(true);
    }

    pub fn despawn(&mut self) {
        self.mascot.despawn();
        self.window.set_visible(false);
    }

    pub fn toggle(&mut self) {
        if self.mascot.is_active() {
            self.despawn();
        } else {
            self.spawn();
        }
    }

    pub fn trigger_grab(&mut self) {
        self.mascot.trigger_mouse_grab();
    }

    pub fn stand_still_for(&mut self, ms: f64) {
        self.mascot.stand_still_for(ms);
    }

    pub fn status_json(&self) -> String {
        let (x, y) = self.mascot.position().unwrap_or((0.0, 0.0));
        serde_json::json!({
            "active": self.mascot.is_active(),
            "state": self.mascot.state().map(State::name),
            "x": x,
            "y": y,
        })
        .to_string()
    }

    // -- pointer wiring ------------------------------------------------------

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// Window-relative cursor movement; forwarded in screen coordinates.
    pub fn on_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.last_cursor = Some(position);
        let (sx, sy) = self.to_screen(position);
        self.mascot.pointer_moved(sx, sy);
    }

    pub fn on_mouse_down(&mut self) {
        if let Some(position) = self.last_cursor {
            let (sx, sy) = self.to_screen(position);
            self.mascot.pointer_down(sx, sy);
        }
    }

    pub fn on_mouse_up(&mut self) {
        self.mascot.pointer_up();
    }

    fn to_screen(&self, position: PhysicalPosition<f64>) -> (f64, f64) {
        let outer = self.window.outer_position().unwrap_or_default();
        (outer.x as f64 + position.x, outer.y as f64 + position.y)
    }
}
