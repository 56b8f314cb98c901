//! Tuning configuration for the mascot simulation.
//!
//! Every numeric behavior knob lives here so hosts can retune the mascot
//! without touching simulation code. Values load from a TOML file; missing
//! files and missing fields fall back to the defaults below.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MascotConfig {
    /// Largest per-tick time step in ms; bigger host deltas (tab suspension,
    /// debugger pauses) are clamped to this before integration.
    pub max_step_ms: f64,
    pub physics: PhysicsTuning,
    pub behavior: BehaviorTuning,
    pub drag: DragTuning,
    pub grab: GrabTuning,
    pub sprite: SpriteConfig,
}

impl Default for MascotConfig {
    fn default() -> Self {
        Self {
            max_step_ms: 50.0,
            physics: PhysicsTuning::default(),
            behavior: BehaviorTuning::default(),
            drag: DragTuning::default(),
            grab: GrabTuning::default(),
            sprite: SpriteConfig::default(),
        }
    }
}

/// Integrator constants, in pixels per nominal 60 fps frame.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Downward acceleration per frame.
    pub gravity: f64,
    /// Fall speed cap.
    pub terminal_velocity: f64,
    /// Horizontal speed while walking.
    pub walk_speed: f64,
    /// Horizontal damping applied on each floor contact while thrown.
    pub friction: f64,
    /// Per-frame velocity multiplier while airborne after a throw.
    pub air_damping: f64,
    /// Cap on each throw velocity axis.
    pub max_throw_speed: f64,
    /// Vertical restitution on floor impact while thrown.
    pub bounce_factor: f64,
    /// Bounce speeds below this settle the body and end the throw.
    pub bounce_stop: f64,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: 0.25,
            terminal_velocity: 20.0,
            walk_speed: 0.5,
            friction: 0.80,
            air_damping: 0.97,
            max_throw_speed: 22.0,
            bounce_factor: 0.28,
            bounce_stop: 1.2,
        }
    }
}

/// Behavior state machine timings.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    /// How long the landing pause lasts, ms.
    pub landing_ms: f64,
    /// Minimum idle break length, ms.
    pub idle_min_ms: f64,
    /// Random extra idle length on top of the minimum, ms.
    pub idle_range_ms: f64,
    /// Per-tick chance of spontaneously going idle while walking.
    pub idle_chance: f64,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            landing_ms: 180.0,
            idle_min_ms: 800.0,
            idle_range_ms: 2500.0,
            idle_chance: 0.0010,
        }
    }
}

/// Drag gesture and throw estimation constants.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DragTuning {
    /// Trailing window of pointer samples used for the velocity estimate, ms.
    pub history_window_ms: f64,
    /// Max pointer samples kept during a gesture.
    pub history_len: usize,
    /// Cap on each estimated velocity axis, px per frame.
    pub max_throw: f64,
    /// Nominal frame interval the estimate is rescaled to, ms.
    pub frame_interval_ms: f64,
    /// Ms of no directional movement before the held pose is shown.
    pub hold_delay_ms: f64,
    /// Release speeds at or below this are treated as a plain drop.
    pub release_deadband: f64,
}

impl Default for DragTuning {
    fn default() -> Self {
        Self {
            history_window_ms: 100.0,
            history_len: 10,
            max_throw: 24.0,
            frame_interval_ms: 16.67,
            hold_delay_ms: 300.0,
            release_deadband: 0.8,
        }
    }
}

/// Mouse-grab prank constants.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GrabTuning {
    /// Launch speed along the body-to-target vector, px per frame.
    pub launch_speed: f64,
    /// Per-tick velocity nudge toward the target during the jump.
    pub homing_accel: f64,
    /// Horizontal patrol speed during the run phase, px per frame.
    pub run_speed: f64,
    /// Multiplier on the minimum rise velocity so the arc clears the target.
    pub rise_safety: f64,
    /// How long a pending capture request may stay unresolved, ms.
    pub capture_timeout_ms: f64,
    /// Upward nudge when a capture failure drops the mascot, px.
    pub fallback_lift: f64,
}

impl Default for GrabTuning {
    fn default() -> Self {
        Self {
            launch_speed: 50.0,
            homing_accel: 2.0,
            run_speed: 3.0,
            rise_safety: 2.5,
            capture_timeout_ms: 250.0,
            fallback_lift: 40.0,
        }
    }
}

/// Sprite presentation knobs the simulation needs (body size) plus the
/// optional sheet used by the desktop host.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    /// Square body size in pixels.
    pub size: f64,
    /// Optional PNG sprite sheet, one row per state.
    pub sheet: Option<PathBuf>,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            size: 64.0,
            sheet: None,
        }
    }
}

/// Load the mascot config file.
/// Search order:
///   1. SCAMPER_CONFIG env var
///   2. ~/.scamper/config.toml
///   3. Default values
pub fn load() -> MascotConfig {
    let candidates = [
        std::env::var("SCAMPER_CONFIG").ok().map(PathBuf::from),
        dirs::home_dir().map(|h| h.join(".scamper/config.toml")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            match fs::read_to_string(&candidate) {
                Ok(content) => match toml::from_str::<MascotConfig>(&content) {
                    Ok(config) => {
                        info!(path = %candidate.display(), "loaded mascot config");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %candidate.display(), error = %e, "failed to parse config");
                    }
                },
                Err(e) => {
                    warn!(path = %candidate.display(), error = %e, "failed to read config");
                }
            }
        }
    }

    info!("no config file found, using defaults");
    MascotConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let cfg = MascotConfig::default();
        assert_eq!(cfg.max_step_ms, 50.0);
        assert_eq!(cfg.physics.gravity, 0.25);
        assert_eq!(cfg.physics.terminal_velocity, 20.0);
        assert_eq!(cfg.behavior.landing_ms, 180.0);
        assert_eq!(cfg.drag.history_len, 10);
        assert_eq!(cfg.grab.capture_timeout_ms, 250.0);
        assert!(cfg.sprite.sheet.is_none());
        // Damping factors must stay below 1 or throws gain energy.
        assert!(cfg.physics.air_damping < 1.0);
        assert!(cfg.physics.bounce_factor < 1.0);
        assert!(cfg.physics.friction < 1.0);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let cfg: MascotConfig = toml::from_str(
            r#"
            [physics]
            gravity = 0.5

            [behavior]
            idle_min_ms = 100
            "#,
        )
        .unwrap();
        assert_eq!(cfg.physics.gravity, 0.5);
        assert_eq!(cfg.physics.terminal_velocity, 20.0);
        assert_eq!(cfg.behavior.idle_min_ms, 100.0);
        assert_eq!(cfg.behavior.landing_ms, 180.0);
        assert_eq!(cfg.drag.max_throw, 24.0);
    }

    #[test]
    fn test_sprite_sheet_path_parses() {
        let cfg: MascotConfig = toml::from_str(
            r#"
            [sprite]
            size = 88
            sheet = "/tmp/mascot.png"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.sprite.size, 88.0);
        assert_eq!(cfg.sprite.sheet.as_deref(), Some(std::path::Path::new("/tmp/mascot.png")));
    }
}
