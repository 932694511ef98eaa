use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Core trait that every PetPal mini-game implements.
///
/// The host app owns the frame loop, input devices, persistent storage and
/// painting; the game only advances its simulation and exposes state for the
/// renderer to read after each frame.
pub trait FrameGame {
    /// Game metadata for the mini-game picker.
    fn metadata(&self) -> GameMetadata;

    /// Called once per rendering frame with the elapsed wall time in seconds.
    fn update(&mut self, dt: f32) -> Vec<GameEvent>;

    /// Serialize the simulation state for the renderer hand-off.
    fn serialize_state(&self) -> Vec<u8>;

    /// Replace the simulation state with a previously serialized snapshot.
    fn apply_state(&mut self, state: &[u8]);

    /// Apply encoded player intent. Sampled at the start of the next tick.
    fn apply_input(&mut self, input: &[u8]);

    /// Fixed simulation rate in Hz.
    fn tick_rate(&self) -> f32 {
        60.0
    }

    /// Explicit pause (pause key or menu).
    fn pause(&mut self);

    /// Leave an explicit pause.
    fn resume(&mut self);

    fn is_paused(&self) -> bool;

    /// Host visibility changed. A hidden game does not advance or age timers.
    fn set_visible(&mut self, visible: bool);

    /// Whether the current run has ended and awaits a restart.
    fn is_round_complete(&self) -> bool;

    /// Start a fresh run, keeping persisted progression.
    fn restart(&mut self);
}

/// Game metadata for the mini-game picker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub name: String,
    pub description: String,
    pub estimated_round_duration: Duration,
}

/// Events surfaced to the host app after a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreUpdate { score: u64 },
    /// A toast for the host to show (achievement unlocked and similar).
    Notification { title: String, reward_credits: u32 },
    RoundComplete { score: u64, new_high_score: bool },
}

/// Generates the `FrameGame` methods that are identical across games:
/// `serialize_state`, `apply_state`, `pause`, `resume`, `is_paused`, `is_round_complete`.
///
/// Requires the implementing struct to have `state: $StateType` and `paused: bool` fields,
/// and `$StateType` to have a `game_over: bool` field.
#[macro_export]
macro_rules! frame_game_boilerplate {
    (state_type: $StateType:ty) => {
        fn serialize_state(&self) -> Vec<u8> {
            rmp_serde::to_vec(&self.state).expect("game state serialization must succeed")
        }

        fn apply_state(&mut self, state: &[u8]) {
            if let Ok(s) = rmp_serde::from_slice::<$StateType>(state) {
                self.state = s;
            }
        }

        fn pause(&mut self) {
            self.paused = true;
        }

        fn resume(&mut self) {
            self.paused = false;
        }

        fn is_paused(&self) -> bool {
            self.paused
        }

        fn is_round_complete(&self) -> bool {
            self.state.game_over
        }
    };
}
