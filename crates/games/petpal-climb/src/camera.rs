use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;

/// Upward-only follow camera.
///
/// `y` is the height of the bottom edge of the viewport. Both `y` and
/// `target` only ever increase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub y: f32,
    pub target: f32,
    pub viewport_height: f32,
}

impl Camera {
    /// Camera centered on the player's starting height.
    pub fn new(player_y: f32, cfg: &CameraConfig) -> Self {
        let y = player_y - cfg.viewport_height / 2.0;
        Self {
            y,
            target: y,
            viewport_height: cfg.viewport_height,
        }
    }

    /// Raise the target toward the player and ease the view after it.
    pub fn update(&mut self, player_y: f32, player_vy: f32, cfg: &CameraConfig) {
        let desired = player_y - cfg.viewport_height / 2.0 + player_vy * cfg.lookahead;
        if desired.is_finite() && desired > self.target {
            self.target = desired;
        }

        let dist = self.target - self.y;
        if dist <= 0.0 {
            return;
        }
        // Far targets catch up faster; near ones ease in without overshoot.
        let factor = (cfg.min_smoothing + dist * cfg.smoothing_per_px)
            .clamp(cfg.min_smoothing, cfg.max_smoothing)
            .clamp(0.0, 1.0);
        self.y += dist * factor;
        if self.target - self.y < 0.01 {
            self.y = self.target;
        }
    }

    /// Lowest visible height. Falling below it ends the run.
    pub fn floor(&self) -> f32 {
        self.y
    }

    /// Height at the middle of the viewport, used for zone lookup.
    pub fn height(&self) -> f32 {
        self.y + self.viewport_height / 2.0
    }

    pub fn top(&self) -> f32 {
        self.y + self.viewport_height
    }
}
