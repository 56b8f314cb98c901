//! Mascot orchestrator.
//!
//! Owns one spawned simulation (body + state machine + drag session) and
//! composes it into a single authoritative step per animation frame. The
//! host drives `tick` from its frame clock and routes pointer events in;
//! everything else -- the stand-still freeze and the mouse-grab prank -- is
//! triggered through the public methods below.

use tracing::{info, warn};

use crate::capture::{CaptureStatus, PointerCapture};
use crate::config::{GrabTuning, MascotConfig};
use crate::drag::DragController;
use crate::physics::{PhysicsBody, Viewport};
use crate::render::{RenderFrame, Renderer};
use crate::rng::RandomSource;
use crate::state::{Direction, State, StateMachine};

/// Nominal frame interval the per-frame speeds are defined against, ms.
const NOMINAL_FRAME_MS: f64 = 16.67;

// ---------------------------------------------------------------------------
// Mouse-grab session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrabPhase {
    /// Ballistic leap toward the target point.
    Jump,
    /// Pinned to the floor, patrolling between the viewport edges.
    Run,
}

struct GrabSession {
    phase: GrabPhase,
    target_x: f64,
    target_y: f64,
    /// The capture request resolved (granted). Later signals other than a
    /// loss are ignored -- first signal wins.
    resolved: bool,
    /// Simulation time after which a still-pending request counts as failed.
    deadline: f64,
}

// ---------------------------------------------------------------------------
// Mascot
// ---------------------------------------------------------------------------

struct Sim {
    body: PhysicsBody,
    fsm: StateMachine,
    drag: DragController,
    grab: Option<GrabSession>,
}

pub struct Mascot {
    config: MascotConfig,
    renderer: Box<dyn Renderer>,
    capture: Box<dyn PointerCapture>,
    spawn_point: Option<(f64, f64)>,
    rng: Option<Box<dyn RandomSource>>,
    sim: Option<Sim>,
    /// Simulation clock in ms, advanced by the clamped per-tick delta.
    clock: f64,
    stand_still_until: f64,
    last_pointer: Option<(f64, f64)>,
    last_viewport: Viewport,
}

impl Mascot {
    pub fn new(
        config: MascotConfig,
        renderer: Box<dyn Renderer>,
        capture: Box<dyn PointerCapture>,
    ) -> Self {
        Self {
            config,
            renderer,
            capture,
            spawn_point: None,
            rng: None,
            sim: None,
            clock: 0.0,
            stand_still_until: 0.0,
            last_pointer: None,
            last_viewport: Viewport::new(0.0, 0.0),
        }
    }

    /// Override the default spawn point (horizontally centered, one body
    /// height above the viewport so the mascot falls in).
    pub fn with_spawn_point(mut self, x: f64, y: f64) -> Self {
        self.spawn_point = Some((x, y));
        self
    }

    /// Inject the random source used by the behavior machine at spawn.
    pub fn with_rng(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = Some(rng);
        self
    }

    // -- lifecycle -----------------------------------------------------------

    pub fn spawn(&mut self, viewport: Viewport) {
        if self.sim.is_some() {
            return;
        }
        self.last_viewport = viewport;

        let size = self.config.sprite.size;
        let (x, y) = self
            .spawn_point
            .unwrap_or_else(|| ((viewport.w / 2.0 - size / 2.0).floor(), -size));

        let body = PhysicsBody::new(x, y, size, size, self.config.physics);
        let fsm = match self.rng.take() {
            Some(rng) => StateMachine::with_rng(self.config.behavior, rng),
            None => StateMachine::new(self.config.behavior),
        };
        let drag = DragController::new(self.config.drag);

        self.sim = Some(Sim {
            body,
            fsm,
            drag,
            grab: None,
        });
        info!(x, y, "mascot spawned");
    }

    /// Tear the simulation down, releasing any held pointer capture. All
    /// per-instance state dies with it; nothing keeps running afterwards.
    pub fn despawn(&mut self) {
        if self.sim.take().is_none() {
            return;
        }
        self.capture.release();
        info!("mascot despawned");
    }

    pub fn is_active(&self) -> bool {
        self.sim.is_some()
    }

    /// Current behavior state, if spawned.
    pub fn state(&self) -> Option<State> {
        self.sim.as_ref().map(|sim| sim.fsm.state)
    }

    /// Current facing, if spawned.
    pub fn direction(&self) -> Option<Direction> {
        self.sim.as_ref().map(|sim| sim.fsm.direction)
    }

    /// Current body position, if spawned.
    pub fn position(&self) -> Option<(f64, f64)> {
        self.sim.as_ref().map(|sim| (sim.body.x, sim.body.y))
    }

    // -- external triggers ---------------------------------------------------

    /// Freeze the mascot in place for `ms` of simulation time. Mid-air the
    /// vertical fall still plays out; only locomotion stops.
    pub fn stand_still_for(&mut self, ms: f64) {
        self.stand_still_until = self.clock + ms.max(0.0);
    }

    /// Leap toward the last observed pointer position (viewport center if
    /// the pointer was never seen), then patrol the floor. Requests
    /// exclusive pointer capture; any capture failure drops the mascot back
    /// into free fall.
    pub fn trigger_mouse_grab(&mut self) {
        let viewport = self.last_viewport;
        let (tx, ty) = self
            .last_pointer
            .unwrap_or((viewport.w / 2.0, viewport.h / 2.0));
        let grab = self.config.grab;
        let gravity = self.config.physics.gravity;
        let deadline = self.clock + grab.capture_timeout_ms;

        let Some(sim) = self.sim.as_mut() else { return };
        if sim.fsm.state == State::Dragged || sim.fsm.state == State::MouseGrab {
            return;
        }

        let (cx, cy) = sim.body.center();
        let (dx, dy) = (tx - cx, ty - cy);
        let mut len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            len = 1.0;
        }

        let vx = dx / len * grab.launch_speed;
        let mut vy = dy / len * grab.launch_speed;
        if ty < cy {
            // Make sure the arc can actually reach the target height: clamp
            // vy to the projectile minimum, keeping the more negative value.
            let rise = cy - ty;
            let needed = -(2.0 * gravity * rise).sqrt() * grab.rise_safety;
            if vy > needed {
                vy = needed;
            }
        }

        sim.body.vx = vx;
        sim.body.vy = vy;
        sim.body.on_ground = false;
        sim.body.thrown = false;
        sim.grab = Some(GrabSession {
            phase: GrabPhase::Jump,
            target_x: tx,
            target_y: ty,
            resolved: false,
            deadline,
        });
        sim.fsm.begin_mouse_grab();
        self.capture.request();
        info!(target_x = tx, target_y = ty, "mouse grab started");
    }

    // -- pointer events ------------------------------------------------------

    /// Pointer press in viewport coordinates. Starts a drag when it lands on
    /// the mascot.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.last_pointer = Some((x, y));
        let now = self.clock;
        let Some(sim) = self.sim.as_mut() else { return };
        if sim.drag.is_dragging() || !sim.body.contains(x, y) {
            return;
        }
        sim.drag.gesture_start(x, y, now, &sim.body, &mut sim.fsm);
    }

    /// Pointer movement in viewport coordinates. Feeds an active drag and
    /// keeps the grab target fresh.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        self.last_pointer = Some((x, y));
        let now = self.clock;
        let Some(sim) = self.sim.as_mut() else { return };
        if sim.drag.is_dragging() {
            sim.drag.gesture_move(x, y, now, &mut sim.body, &mut sim.fsm);
        }
    }

    /// Pointer release: ends an active drag (throw or drop).
    pub fn pointer_up(&mut self) {
        let now = self.clock;
        let Some(sim) = self.sim.as_mut() else { return };
        if sim.drag.is_dragging() {
            sim.drag.gesture_end(now, &mut sim.body, &mut sim.fsm);
        }
    }

    // -- per-frame tick ------------------------------------------------------

    /// Advance the simulation by `dt_ms` and hand the result to the
    /// renderer. Call once per animation frame.
    pub fn tick(&mut self, dt_ms: f64, viewport: Viewport) {
        self.last_viewport = viewport;

        // Clamp so a suspended host doesn't come back with a huge step.
        let dt = dt_ms.clamp(0.0, self.config.max_step_ms);
        self.clock += dt;
        let now = self.clock;

        let stand_still = now < self.stand_still_until;
        let grab_cfg = self.config.grab;

        let Some(sim) = self.sim.as_mut() else { return };

        let is_dragging = sim.fsm.state == State::Dragged;
        let is_mouse_grab = sim.fsm.state == State::MouseGrab;

        if stand_still {
            sim.fsm.force_idle();
            sim.body.vx = 0.0;
            if sim.body.on_ground {
                sim.body.vy = 0.0;
            }
        } else {
            // 1. Advance the state machine
            sim.fsm.update(dt, &sim.body, viewport.w);

            // 2. Apply locomotion intent for the (possibly new) state
            match sim.fsm.state {
                State::MouseGrab => {
                    if let Some(grab) = sim.grab.as_mut() {
                        step_grab(grab, &mut sim.body, &mut sim.fsm, &grab_cfg, dt, viewport);
                    }
                }
                State::Walking => {
                    let direction = sim.fsm.direction.sign();
                    sim.body.apply_walk_velocity(direction);
                }
                State::Landing | State::Idle => {
                    sim.body.vx = 0.0;
                    if sim.body.on_ground {
                        sim.body.vy = 0.0;
                    }
                }
                // FALLING / THROWN: integration does the work.
                // DRAGGED: the gesture controller owns position.
                State::Falling | State::Thrown | State::Dragged => {}
            }
        }

        // 3. Step physics (no-op while dragged; the grab driver already
        // stepped or pinned the body).
        if !is_mouse_grab {
            sim.body.step(viewport, is_dragging);
        }

        // 3b. Held-pose check while dragging
        if is_dragging {
            sim.drag.check_hold_pose(now, &mut sim.fsm);
        }

        // 3c. Capture watchdog: a failed or lost capture drops the mascot
        // into free fall so it never sticks mid-prank.
        if sim.fsm.state == State::MouseGrab {
            if let Some(grab) = sim.grab.as_mut() {
                let status = self.capture.poll();
                let failed = match status {
                    CaptureStatus::Granted => {
                        grab.resolved = true;
                        false
                    }
                    CaptureStatus::Lost => true,
                    CaptureStatus::Denied => !grab.resolved,
                    CaptureStatus::Pending | CaptureStatus::Inactive => {
                        !grab.resolved && now >= grab.deadline
                    }
                };
                if failed {
                    warn!(?status, "pointer capture failed, dropping mascot");
                    sim.grab = None;
                    self.capture.release();
                    sim.body.on_ground = false;
                    sim.body.vy = 0.0;
                    sim.body.y -= grab_cfg.fallback_lift;
                    sim.fsm.drop_to_falling();
                }
            }
        } else if sim.grab.is_some() {
            // Left the prank by some other trigger (drag, stand-still).
            sim.grab = None;
            self.capture.release();
        }

        // 4. Render. The jump phase reads as FALLING so the host shows a
        // falling pose while the arc plays out.
        let render_state = match (&sim.grab, sim.fsm.state) {
            (Some(grab), State::MouseGrab) if grab.phase == GrabPhase::Jump => State::Falling,
            (_, state) => state,
        };
        let frame = RenderFrame {
            x: sim.body.x,
            y: sim.body.y,
            state: render_state,
            direction: sim.fsm.direction,
            dt_ms: dt,
            body: &sim.body,
        };
        self.renderer.render(&frame);
    }
}

// ---------------------------------------------------------------------------
// Mouse-grab driver
// ---------------------------------------------------------------------------

fn step_grab(
    grab: &mut GrabSession,
    body: &mut PhysicsBody,
    fsm: &mut StateMachine,
    cfg: &GrabTuning,
    dt: f64,
    viewport: Viewport,
) {
    let floor_y = body.floor_y(viewport);

    match grab.phase {
        GrabPhase::Jump => {
            let (cx, cy) = body.center();
            if cy > grab.target_y {
                // Homing bias toward the target while still below it.
                let (dx, dy) = (grab.target_x - cx, grab.target_y - cy);
                let mut len = (dx * dx + dy * dy).sqrt();
                if len == 0.0 {
                    len = 1.0;
                }
                body.vx += dx / len * cfg.homing_accel;
                body.vy += dy / len * cfg.homing_accel;
            }

            body.step(viewport, false);

            let (_, cy) = body.center();
            let overlap = body.contains(grab.target_x, grab.target_y);
            let reached_height = cy <= grab.target_y;
            if overlap || body.on_ground || reached_height {
                grab.phase = GrabPhase::Run;
                fsm.reset_timer();
                body.y = floor_y;
                body.on_ground = true;
                body.vx = 0.0;
                body.vy = 0.0;
            }
        }

        GrabPhase::Run => {
            let run = cfg.run_speed * (dt / NOMINAL_FRAME_MS);
            body.y = floor_y;
            body.on_ground = true;
            body.vx = 0.0;
            body.vy = 0.0;
            body.thrown = false;
            body.x += run * fsm.direction.sign();
            if body.x <= 0.0 {
                body.x = 0.0;
                fsm.direction = Direction::Right;
            }
            if body.x + body.w >= viewport.w {
                body.x = viewport.w - body.w;
                fsm.direction = Direction::Left;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::NoopCapture;
    use crate::render::NullRenderer;
    use crate::rng::SequenceRandom;
    use std::cell::RefCell;
    use std::rc::Rc;

    const VP: Viewport = Viewport { w: 800.0, h: 600.0 };

    /// Records (state, x, y, direction) per rendered frame.
    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<(State, f64, f64, Direction)>>>);

    impl Renderer for Recorder {
        fn render(&mut self, frame: &RenderFrame<'_>) {
            self.0
                .borrow_mut()
                .push((frame.state, frame.x, frame.y, frame.direction));
        }
    }

    /// Capture whose status tests flip from outside; counts releases.
    #[derive(Clone)]
    struct SharedCapture {
        status: Rc<RefCell<CaptureStatus>>,
        releases: Rc<RefCell<u32>>,
    }

    impl SharedCapture {
        fn granted() -> Self {
            Self {
                status: Rc::new(RefCell::new(CaptureStatus::Granted)),
                releases: Rc::new(RefCell::new(0)),
            }
        }

        fn denied() -> Self {
            Self {
                status: Rc::new(RefCell::new(CaptureStatus::Denied)),
                releases: Rc::new(RefCell::new(0)),
            }
        }
    }

    impl PointerCapture for SharedCapture {
        fn request(&mut self) {}

        fn release(&mut self) {
            *self.releases.borrow_mut() += 1;
        }

        fn poll(&mut self) -> CaptureStatus {
            *self.status.borrow()
        }
    }

    fn mascot_with(
        renderer: Box<dyn Renderer>,
        capture: Box<dyn PointerCapture>,
        draws: Vec<f64>,
    ) -> Mascot {
        Mascot::new(MascotConfig::default(), renderer, capture)
            .with_spawn_point(100.0, -64.0)
            .with_rng(Box::new(SequenceRandom::new(draws)))
    }

    fn tick_until<F: Fn(&Mascot) -> bool>(mascot: &mut Mascot, max_ticks: usize, done: F) -> usize {
        for i in 0..max_ticks {
            if done(mascot) {
                return i;
            }
            mascot.tick(16.0, VP);
        }
        panic!("condition not reached within {max_ticks} ticks");
    }

    #[test]
    fn test_spawn_fall_land_walk_sequence() {
        let recorder = Recorder::default();
        let frames = Rc::clone(&recorder.0);
        let mut mascot = mascot_with(Box::new(recorder), Box::new(NoopCapture::new()), vec![0.9]);
        mascot.spawn(VP);
        assert!(mascot.is_active());
        assert_eq!(mascot.position(), Some((100.0, -64.0)));

        tick_until(&mut mascot, 500, |m| m.state() == Some(State::Landing));

        // Every frame up to the landing one rendered the fall.
        {
            let rendered = frames.borrow();
            let (last, earlier) = rendered.split_last().unwrap();
            assert!(earlier.iter().all(|f| f.0 == State::Falling));
            assert_eq!(last.0, State::Landing);
            assert_eq!(last.2, 536.0, "landed on the floor line");
        }

        // Landing pause runs ~180 ms before walking starts.
        let landing_ticks = tick_until(&mut mascot, 100, |m| m.state() == Some(State::Walking));
        assert!((11..=13).contains(&landing_ticks), "{landing_ticks} ticks of landing");
        assert_eq!(mascot.direction(), Some(Direction::Right));
    }

    #[test]
    fn test_dt_clamped_to_max_step() {
        let mut mascot = mascot_with(
            Box::new(NullRenderer),
            Box::new(NoopCapture::new()),
            vec![0.9],
        );
        mascot.spawn(VP);

        // A 10 s suspension gap still integrates as one clamped 50 ms step,
        // so the body moves one frame, not six hundred.
        mascot.tick(10_000.0, VP);
        let (_, y) = mascot.position().unwrap();
        assert!(y < -62.0, "suspension did not fast-forward the fall, y={y}");
    }

    #[test]
    fn test_stand_still_freezes_locomotion() {
        let mut mascot = mascot_with(
            Box::new(NullRenderer),
            Box::new(NoopCapture::new()),
            vec![0.9],
        );
        mascot.spawn(VP);
        tick_until(&mut mascot, 500, |m| m.state() == Some(State::Walking));

        mascot.stand_still_for(500.0);
        let (x_before, _) = mascot.position().unwrap();
        for _ in 0..10 {
            mascot.tick(16.0, VP);
            assert_eq!(mascot.state(), Some(State::Idle));
        }
        let (x_after, _) = mascot.position().unwrap();
        assert_eq!(x_before, x_after, "no horizontal drift while frozen");

        // After the deadline the walk resumes.
        tick_until(&mut mascot, 100, |m| m.state() == Some(State::Walking));
    }

    #[test]
    fn test_stand_still_mid_air_still_falls() {
        let mut mascot = mascot_with(
            Box::new(NullRenderer),
            Box::new(NoopCapture::new()),
            vec![0.9],
        );
        mascot.spawn(VP);
        mascot.tick(16.0, VP);

        mascot.stand_still_for(1000.0);
        let (_, y_before) = mascot.position().unwrap();
        mascot.tick(16.0, VP);
        let (_, y_after) = mascot.position().unwrap();
        assert!(y_after > y_before, "vertical fall continues during the freeze");
        assert_eq!(mascot.state(), Some(State::Idle));
    }

    #[test]
    fn test_drag_and_throw_through_pointer_events() {
        let mut mascot = mascot_with(
            Box::new(NullRenderer),
            Box::new(NoopCapture::new()),
            vec![0.9],
        );
        mascot.spawn(VP);
        tick_until(&mut mascot, 500, |m| m.state() == Some(State::Walking));

        let (x, y) = mascot.position().unwrap();
        mascot.pointer_down(x + 10.0, y + 10.0);
        assert_eq!(mascot.state(), Some(State::Dragged));
        assert_eq!(mascot.direction(), Some(Direction::Neutral));

        mascot.tick(16.0, VP);
        mascot.pointer_moved(x + 60.0, y + 10.0);
        assert_eq!(mascot.direction(), Some(Direction::Right));

        mascot.pointer_up();
        assert_eq!(mascot.state(), Some(State::Thrown));

        // The throw eventually lands and the walk resumes.
        tick_until(&mut mascot, 2000, |m| m.state() == Some(State::Walking));
    }

    #[test]
    fn test_drag_hold_pose_neutralizes_after_timeout() {
        let mut mascot = mascot_with(
            Box::new(NullRenderer),
            Box::new(NoopCapture::new()),
            vec![0.9],
        );
        mascot.spawn(VP);
        tick_until(&mut mascot, 500, |m| m.state() == Some(State::Walking));

        let (x, y) = mascot.position().unwrap();
        mascot.pointer_down(x + 10.0, y + 10.0);
        mascot.tick(16.0, VP);
        mascot.pointer_moved(x + 20.0, y + 10.0);
        assert_eq!(mascot.direction(), Some(Direction::Right));

        // 301+ ms of ticks with no further movement.
        for _ in 0..20 {
            mascot.tick(16.0, VP);
        }
        assert_eq!(mascot.state(), Some(State::Dragged));
        assert_eq!(mascot.direction(), Some(Direction::Neutral));
    }

    #[test]
    fn test_release_without_motion_falls() {
        let mut mascot = mascot_with(
            Box::new(NullRenderer),
            Box::new(NoopCapture::new()),
            vec![0.9],
        );
        mascot.spawn(VP);
        tick_until(&mut mascot, 500, |m| m.state() == Some(State::Walking));

        let (x, y) = mascot.position().unwrap();
        mascot.pointer_down(x + 10.0, y + 10.0);
        mascot.pointer_up();
        assert_eq!(mascot.state(), Some(State::Falling));
    }

    #[test]
    fn test_mouse_grab_jump_reports_falling_then_runs_on_floor() {
        let recorder = Recorder::default();
        let frames = Rc::clone(&recorder.0);
        let capture = SharedCapture::granted();
        let mut mascot = mascot_with(Box::new(recorder), Box::new(capture), vec![0.9]);
        mascot.spawn(VP);
        tick_until(&mut mascot, 500, |m| m.state() == Some(State::Walking));

        // Target above the mascot.
        mascot.pointer_moved(400.0, 100.0);
        frames.borrow_mut().clear();
        mascot.trigger_mouse_grab();
        assert_eq!(mascot.state(), Some(State::MouseGrab));

        let (_, vy) = {
            let sim = mascot.sim.as_ref().unwrap();
            (sim.body.vx, sim.body.vy)
        };
        assert!(vy < 0.0, "launch goes upward toward the target");

        mascot.tick(16.0, VP);
        assert_eq!(
            frames.borrow().last().unwrap().0,
            State::Falling,
            "jump phase renders as falling"
        );

        // The arc resolves into the floor run.
        tick_until(&mut mascot, 500, |m| {
            let sim = m.sim.as_ref().unwrap();
            matches!(sim.grab, Some(GrabSession { phase: GrabPhase::Run, .. }))
        });
        mascot.tick(16.0, VP);
        assert_eq!(mascot.state(), Some(State::MouseGrab));
        let (_, y) = mascot.position().unwrap();
        assert_eq!(y, 536.0, "run phase pins to the floor");
        assert_eq!(
            frames.borrow().last().unwrap().0,
            State::MouseGrab,
            "run phase renders as itself"
        );
    }

    #[test]
    fn test_mouse_grab_denied_capture_drops_to_falling() {
        let capture = SharedCapture::denied();
        let releases = Rc::clone(&capture.releases);
        let mut mascot = mascot_with(Box::new(NullRenderer), Box::new(capture), vec![0.9]);
        mascot.spawn(VP);
        tick_until(&mut mascot, 500, |m| m.state() == Some(State::Walking));

        mascot.trigger_mouse_grab();
        let (_, y_grab) = mascot.position().unwrap();
        mascot.tick(16.0, VP);

        assert_eq!(mascot.state(), Some(State::Falling));
        assert_eq!(*releases.borrow(), 1, "failed capture is released");
        let (_, y_after) = mascot.position().unwrap();
        assert!(y_after < y_grab, "fallback lifts the body before the drop");
    }

    #[test]
    fn test_mouse_grab_lost_capture_ends_the_run() {
        let capture = SharedCapture::granted();
        let status = Rc::clone(&capture.status);
        let releases = Rc::clone(&capture.releases);
        let mut mascot = mascot_with(Box::new(NullRenderer), Box::new(capture), vec![0.9]);
        mascot.spawn(VP);
        tick_until(&mut mascot, 500, |m| m.state() == Some(State::Walking));

        mascot.pointer_moved(600.0, 200.0);
        mascot.trigger_mouse_grab();
        tick_until(&mut mascot, 500, |m| {
            let sim = m.sim.as_ref().unwrap();
            matches!(sim.grab, Some(GrabSession { phase: GrabPhase::Run, .. }))
        });

        *status.borrow_mut() = CaptureStatus::Lost;
        mascot.tick(16.0, VP);
        assert_eq!(mascot.state(), Some(State::Falling));
        assert!(mascot.sim.as_ref().unwrap().grab.is_none());
        assert_eq!(*releases.borrow(), 1);
    }

    #[test]
    fn test_mouse_grab_pending_capture_times_out() {
        let mut mascot = mascot_with(
            Box::new(NullRenderer),
            Box::new(NoopCapture::new()),
            vec![0.9],
        );
        mascot.spawn(VP);
        tick_until(&mut mascot, 500, |m| m.state() == Some(State::Walking));

        mascot.trigger_mouse_grab();
        // 250 ms watchdog at 16 ms ticks: still in the prank shortly before.
        for _ in 0..15 {
            mascot.tick(16.0, VP);
        }
        assert_eq!(mascot.state(), Some(State::MouseGrab));
        mascot.tick(16.0, VP);
        assert_eq!(mascot.state(), Some(State::Falling));
    }

    #[test]
    fn test_starting_a_drag_preempts_the_prank() {
        let capture = SharedCapture::granted();
        let releases = Rc::clone(&capture.releases);
        let mut mascot = mascot_with(Box::new(NullRenderer), Box::new(capture), vec![0.9]);
        mascot.spawn(VP);
        tick_until(&mut mascot, 500, |m| m.state() == Some(State::Walking));

        mascot.pointer_moved(600.0, 200.0);
        mascot.trigger_mouse_grab();
        tick_until(&mut mascot, 500, |m| {
            let sim = m.sim.as_ref().unwrap();
            matches!(sim.grab, Some(GrabSession { phase: GrabPhase::Run, .. }))
        });

        let (x, y) = mascot.position().unwrap();
        mascot.pointer_down(x + 5.0, y + 5.0);
        assert_eq!(mascot.state(), Some(State::Dragged));
        mascot.tick(16.0, VP);
        assert!(mascot.sim.as_ref().unwrap().grab.is_none());
        assert_eq!(*releases.borrow(), 1, "preempted prank releases capture");
    }

    #[test]
    fn test_grab_target_defaults_to_viewport_center() {
        let mut mascot = mascot_with(
            Box::new(NullRenderer),
            Box::new(SharedCapture::granted()),
            vec![0.9],
        );
        mascot.spawn(VP);
        tick_until(&mut mascot, 500, |m| m.state() == Some(State::Walking));

        mascot.trigger_mouse_grab();
        let sim = mascot.sim.as_ref().unwrap();
        let grab = sim.grab.as_ref().unwrap();
        assert_eq!((grab.target_x, grab.target_y), (400.0, 300.0));
        assert!(sim.body.vy < 0.0, "viewport center is above the floor line");
    }

    #[test]
    fn test_despawn_releases_capture_and_stops() {
        let capture = SharedCapture::granted();
        let releases = Rc::clone(&capture.releases);
        let mut mascot = mascot_with(Box::new(NullRenderer), Box::new(capture), vec![0.9]);
        mascot.spawn(VP);
        mascot.trigger_mouse_grab();
        mascot.despawn();

        assert!(!mascot.is_active());
        assert_eq!(mascot.state(), None);
        assert_eq!(*releases.borrow(), 1);

        // Ticks and pointer events after despawn are inert.
        mascot.tick(16.0, VP);
        mascot.pointer_down(100.0, 100.0);
        mascot.pointer_up();
        assert!(!mascot.is_active());
    }
}
