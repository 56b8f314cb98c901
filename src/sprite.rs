//! Sprite frames for the desktop character.
//!
//! Frames come from one of two places: generated placeholder blobs drawn
//! with tiny-skia, or a user-supplied PNG sheet laid out one row per state
//! in this order (square tiles, right-facing art):
//!
//!   row 0: Falling (2 frames)
//!   row 1: Landing (1 frame)
//!   row 2: Walking (4 frames)
//!   row 3: Idle    (2 frames)
//!   row 4: Dragged (1 frame)
//!   row 5: Thrown  (1 frame)
//!
//! Left-facing poses are mirrored at blit time; the mouse-grab run shows the
//! walk cycle.

use std::collections::HashMap;
use std::path::Path;

use tiny_skia::{
    Color, FillRule, GradientStop, Paint, PathBuilder, Pixmap, Point, RadialGradient, SpreadMode,
    Transform,
};

use crate::error::HostError;
use crate::state::State;

/// Sheet layout: state per row with its frame count.
const SHEET_ROWS: [(State, usize); 6] = [
    (State::Falling, 2),
    (State::Landing, 1),
    (State::Walking, 4),
    (State::Idle, 2),
    (State::Dragged, 1),
    (State::Thrown, 1),
];

/// Frame hold time per state, ms.
fn frame_ms(state: State) -> f64 {
    match state {
        State::Falling => 130.0,
        State::Landing => 180.0,
        State::Walking | State::MouseGrab => 110.0,
        State::Idle => 450.0,
        State::Dragged | State::Thrown => 999.0,
    }
}

/// The visual key a state renders with.
fn frame_key(state: State) -> State {
    match state {
        State::MouseGrab => State::Walking,
        other => other,
    }
}

// ---------------------------------------------------------------------------
// SpriteSet
// ---------------------------------------------------------------------------

pub struct SpriteSet {
    frames: HashMap<State, Vec<Pixmap>>,
    /// Tile edge in pixels.
    pub size: u32,
}

impl SpriteSet {
    /// Generated placeholder frames: a soft amber blob squishing and
    /// tilting per state.
    pub fn placeholder(size: u32) -> Self {
        let mut frames: HashMap<State, Vec<Pixmap>> = HashMap::new();

        frames.insert(State::Falling, falling_frames(size));
        frames.insert(State::Landing, landing_frames(size));
        frames.insert(State::Walking, walking_frames(size));
        frames.insert(State::Idle, idle_frames(size));
        frames.insert(State::Dragged, dragged_frames(size));
        frames.insert(State::Thrown, thrown_frames(size));

        Self { frames, size }
    }

    /// Slice a PNG sheet into per-state frames. The tile edge is the sheet
    /// height divided by the number of rows.
    pub fn from_sheet(path: &Path) -> Result<Self, HostError> {
        let img = image::open(path)
            .map_err(|e| HostError::Sprite(format!("{}: {e}", path.display())))?
            .to_rgba8();

        let rows = SHEET_ROWS.len() as u32;
        let tile = img.height() / rows;
        if tile == 0 {
            return Err(HostError::Sprite(format!(
                "sheet too short for {rows} rows: {}px",
                img.height()
            )));
        }

        let mut frames: HashMap<State, Vec<Pixmap>> = HashMap::new();
        for (row, &(state, count)) in SHEET_ROWS.iter().enumerate() {
            if count as u32 * tile > img.width() {
                return Err(HostError::Sprite(format!(
                    "row {row} needs {count} tiles of {tile}px, sheet is {}px wide",
                    img.width()
                )));
            }
            let mut sequence = Vec::with_capacity(count);
            for i in 0..count {
                sequence.push(slice_tile(&img, i as u32 * tile, row as u32 * tile, tile)?);
            }
            frames.insert(state, sequence);
        }

        Ok(Self { frames, size: tile })
    }

    /// Frame sequence for a state.
    pub fn frames(&self, state: State) -> &[Pixmap] {
        self.frames
            .get(&frame_key(state))
            .expect("missing sprite sequence")
    }
}

/// Cut one tile out of the sheet, premultiplying alpha for tiny-skia.
fn slice_tile(
    img: &image::RgbaImage,
    ox: u32,
    oy: u32,
    tile: u32,
) -> Result<Pixmap, HostError> {
    let mut data = Vec::with_capacity((tile * tile * 4) as usize);
    for y in 0..tile {
        for x in 0..tile {
            let [r, g, b, a] = img.get_pixel(ox + x, oy + y).0;
            let a16 = a as u16;
            data.push(((r as u16 * a16) / 255) as u8);
            data.push(((g as u16 * a16) / 255) as u8);
            data.push(((b as u16 * a16) / 255) as u8);
            data.push(a);
        }
    }
    let size = tiny_skia::IntSize::from_wh(tile, tile)
        .ok_or_else(|| HostError::Sprite("zero-sized tile".into()))?;
    Pixmap::from_vec(data, size).ok_or_else(|| HostError::Sprite("tile buffer mismatch".into()))
}

// ---------------------------------------------------------------------------
// Animator
// ---------------------------------------------------------------------------

/// Tracks which frame of the current state's sequence is visible.
pub struct SpriteAnimator {
    state: State,
    frame: usize,
    elapsed_ms: f64,
}

impl SpriteAnimator {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            frame: 0,
            elapsed_ms: 0.0,
        }
    }

    /// Advance by `dt_ms` in the given state and return the frame index.
    /// Changing state restarts the sequence.
    pub fn advance(&mut self, state: State, dt_ms: f64, frame_count: usize) -> usize {
        if frame_key(state) != frame_key(self.state) {
            self.state = state;
            self.frame = 0;
            self.elapsed_ms = 0.0;
            return 0;
        }
        self.state = state;

        self.elapsed_ms += dt_ms;
        let hold = frame_ms(state);
        while self.elapsed_ms >= hold {
            self.elapsed_ms -= hold;
            self.frame += 1;
        }
        if frame_count > 0 {
            self.frame %= frame_count;
        }
        self.frame
    }
}

impl Default for SpriteAnimator {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Placeholder frame generation
// ===========================================================================
//
// The mascot is a soft amber blob (#e8913a core, #b35c1e rim) drawn as a
// radial gradient, squished and tilted per state.

const BODY_R: f32 = 0.910; // #e8913a
const BODY_G: f32 = 0.569;
const BODY_B: f32 = 0.227;

const RIM_R: f32 = 0.702; // #b35c1e
const RIM_G: f32 = 0.361;
const RIM_B: f32 = 0.118;

/// Draw the blob with the given horizontal/vertical stretch and tilt.
fn draw_blob(pixmap: &mut Pixmap, size: u32, sx: f32, sy: f32, tilt_deg: f32, alpha: f32) {
    let center = size as f32 / 2.0;
    let radius = size as f32 * 0.34;

    let path = {
        let mut pb = PathBuilder::new();
        pb.push_circle(0.0, 0.0, radius);
        pb.finish().unwrap()
    };

    let stops = vec![
        GradientStop::new(0.0, Color::from_rgba(BODY_R, BODY_G, BODY_B, alpha).unwrap()),
        GradientStop::new(0.65, Color::from_rgba(BODY_R, BODY_G, BODY_B, alpha * 0.9).unwrap()),
        GradientStop::new(0.9, Color::from_rgba(RIM_R, RIM_G, RIM_B, alpha * 0.8).unwrap()),
        GradientStop::new(1.0, Color::from_rgba(RIM_R, RIM_G, RIM_B, 0.0).unwrap()),
    ];

    let gradient = RadialGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(radius, 0.0),
        radius,
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    );

    if let Some(shader) = gradient {
        let mut paint = Paint::default();
        paint.shader = shader;
        paint.anti_alias = true;

        let xform = Transform::from_translate(center, center)
            .pre_concat(Transform::from_rotate(tilt_deg))
            .pre_scale(sx, sy);
        pixmap.fill_path(&path, &paint, FillRule::Winding, xform, None);
    }

    // Two dot eyes so the facing reads even on a blob.
    let eye_y = center - radius * 0.25 * sy;
    for ex in [center + radius * 0.25 * sx, center + radius * 0.55 * sx] {
        let eye = {
            let mut pb = PathBuilder::new();
            pb.push_circle(ex, eye_y, size as f32 * 0.035);
            pb.finish()
        };
        if let Some(eye) = eye {
            let mut paint = Paint::default();
            paint.set_color(Color::from_rgba(0.15, 0.10, 0.05, alpha).unwrap());
            paint.anti_alias = true;
            pixmap.fill_path(&eye, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }
}

fn blank(size: u32) -> Pixmap {
    Pixmap::new(size, size).expect("sprite size must be nonzero")
}

/// Falling: stretched tall, alternating slight tilt.
fn falling_frames(size: u32) -> Vec<Pixmap> {
    [-8.0_f32, 8.0]
        .iter()
        .map(|tilt| {
            let mut pixmap = blank(size);
            draw_blob(&mut pixmap, size, 0.86, 1.16, *tilt, 0.95);
            pixmap
        })
        .collect()
}

/// Landing: one squashed frame.
fn landing_frames(size: u32) -> Vec<Pixmap> {
    let mut pixmap = blank(size);
    draw_blob(&mut pixmap, size, 1.28, 0.72, 0.0, 1.0);
    vec![pixmap]
}

/// Walking: four-phase squash cycle with a forward lean.
fn walking_frames(size: u32) -> Vec<Pixmap> {
    (0..4)
        .map(|i| {
            let t = i as f32 / 4.0;
            let squash = 1.0 + 0.12 * (t * std::f32::consts::TAU).sin();
            let mut pixmap = blank(size);
            draw_blob(&mut pixmap, size, squash, 1.0 / squash, 6.0, 1.0);
            pixmap
        })
        .collect()
}

/// Idle: two breathing frames.
fn idle_frames(size: u32) -> Vec<Pixmap> {
    [(0.97_f32, 0.85_f32), (1.03, 1.0)]
        .iter()
        .map(|(scale, alpha)| {
            let mut pixmap = blank(size);
            draw_blob(&mut pixmap, size, *scale, *scale, 0.0, *alpha);
            pixmap
        })
        .collect()
}

/// Dragged: elongated by the pinch.
fn dragged_frames(size: u32) -> Vec<Pixmap> {
    let mut pixmap = blank(size);
    draw_blob(&mut pixmap, size, 0.85, 1.18, 0.0, 1.0);
    vec![pixmap]
}

/// Thrown: tumbling tilt.
fn thrown_frames(size: u32) -> Vec<Pixmap> {
    let mut pixmap = blank(size);
    draw_blob(&mut pixmap, size, 1.0, 1.0, 30.0, 1.0);
    vec![pixmap]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_covers_every_state() {
        let sprites = SpriteSet::placeholder(64);
        for state in [
            State::Falling,
            State::Landing,
            State::Walking,
            State::Idle,
            State::Dragged,
            State::Thrown,
            State::MouseGrab,
        ] {
            assert!(!sprites.frames(state).is_empty(), "{}", state.name());
        }
        // The prank run borrows the walk cycle.
        assert_eq!(sprites.frames(State::MouseGrab).len(), 4);
    }

    #[test]
    fn test_animator_advances_and_wraps() {
        let mut animator = SpriteAnimator::new();
        assert_eq!(animator.advance(State::Walking, 0.0, 4), 0);
        // Walking holds each frame 110 ms.
        assert_eq!(animator.advance(State::Walking, 109.0, 4), 0);
        assert_eq!(animator.advance(State::Walking, 2.0, 4), 1);
        assert_eq!(animator.advance(State::Walking, 110.0 * 3.0, 4), 0);
    }

    #[test]
    fn test_animator_resets_on_state_change() {
        let mut animator = SpriteAnimator::new();
        animator.advance(State::Walking, 300.0, 4);
        assert_eq!(animator.advance(State::Falling, 16.0, 2), 0);
    }

    #[test]
    fn test_animator_keeps_phase_between_walk_and_grab_run() {
        let mut animator = SpriteAnimator::new();
        animator.advance(State::Walking, 115.0, 4);
        // Same visual sequence, no reset.
        assert_eq!(animator.advance(State::MouseGrab, 0.0, 4), 1);
    }
}
