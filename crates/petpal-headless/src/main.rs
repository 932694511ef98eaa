mod autopilot;

use petpal_climb::ClimbGame;
use petpal_climb::config::ClimbConfig;
use petpal_core::game_trait::{FrameGame, GameEvent};
use petpal_core::pet::{PetMood, StaticPet};
use petpal_core::storage::{FileStorage, MemoryStorage, Storage};
use tracing_subscriber::EnvFilter;

use autopilot::Autopilot;

/// One minute of play at 60 Hz.
const DEFAULT_FRAMES: usize = 60 * 60;

fn open_storage() -> Box<dyn Storage> {
    let dir = std::env::var("PETPAL_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    match FileStorage::open(&dir) {
        Ok(storage) => Box::new(storage),
        Err(e) => {
            tracing::warn!("Storage at {dir} unavailable: {e}, progress will not persist");
            Box::new(MemoryStorage::new())
        },
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let frames = std::env::var("PETPAL_HEADLESS_FRAMES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    let mut game = ClimbGame::new(ClimbConfig::load(), open_storage())
        .with_pet(Box::new(StaticPet::new(PetMood::Happy)));
    let mut pilot = Autopilot::new();
    let dt = 1.0 / game.tick_rate();

    tracing::info!(frames, seed = game.state().seed, "PetPal headless climb starting");

    for frame in 0..frames {
        match pilot.decide(game.state()) {
            Ok(input) => game.apply_input(&input),
            Err(e) => tracing::warn!("Failed to encode autopilot input: {e}"),
        }
        for event in game.update(dt) {
            match event {
                GameEvent::Notification {
                    title,
                    reward_credits,
                } => tracing::info!(reward_credits, "{title}"),
                GameEvent::RoundComplete {
                    score,
                    new_high_score,
                } => tracing::info!(frame, score, new_high_score, "Round complete"),
                GameEvent::ScoreUpdate { .. } => {},
            }
        }
        if game.is_round_complete() {
            break;
        }
    }

    // Hiding flushes pending progress.
    game.set_visible(false);

    let state = game.state();
    tracing::info!(
        score = state.score,
        height = state.player.max_height,
        zone = state.zone.current.name(),
        achievements = game.tracker().completed_count(),
        "Headless run finished"
    );
}
