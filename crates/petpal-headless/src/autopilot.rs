use petpal_climb::ClimbState;
use petpal_climb::entities::Platform;
use petpal_climb::input::{InputMapper, Key};

/// Horizontal slack (px) around the target's center before steering.
const STEER_SLACK: f32 = 8.0;
/// Highest platform (px above the feet) worth aiming for.
const AIM_REACH: f32 = 180.0;
/// Platforms lower than this above the feet are already behind us.
const AIM_MIN: f32 = 10.0;

/// Picks the next platform up and drives an [`InputMapper`] toward it,
/// the same way a player on a keyboard would.
#[derive(Debug, Default)]
pub struct Autopilot {
    mapper: InputMapper,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded input for the next frame.
    pub fn decide(&mut self, state: &ClimbState) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        let player = &state.player;
        let dx = pick_target(&state.platforms, player.x, player.y)
            .map(|p| p.center_x() - player.x)
            .unwrap_or(0.0);
        if dx > STEER_SLACK {
            self.mapper.key_up(Key::Left);
            self.mapper.key_down(Key::Right);
        } else if dx < -STEER_SLACK {
            self.mapper.key_up(Key::Right);
            self.mapper.key_down(Key::Left);
        } else {
            self.mapper.key_up(Key::Left);
            self.mapper.key_up(Key::Right);
        }

        // Release between jumps so each one is a fresh press.
        if player.has_footing() {
            self.mapper.key_down(Key::Jump);
        } else {
            self.mapper.key_up(Key::Jump);
        }

        rmp_serde::to_vec(&self.mapper.sample())
    }
}

fn pick_target(platforms: &[Platform], x: f32, y: f32) -> Option<&Platform> {
    platforms
        .iter()
        .filter(|p| p.solid && p.y - y >= AIM_MIN && p.y - y <= AIM_REACH)
        .min_by(|a, b| cost(a, x, y).total_cmp(&cost(b, x, y)))
}

fn cost(p: &Platform, x: f32, y: f32) -> f32 {
    (p.y - y) + (p.center_x() - x).abs() * 0.5
}
