use serde::{Deserialize, Serialize};

use crate::entities::EnemyKind;
use crate::powerups::PowerUpKind;
use crate::tiles::TileKind;
use crate::zones::ZoneId;

/// Discrete things that happened during a simulation step.
///
/// Consumed by the achievement tracker and surfaced to the host as
/// [`petpal_core::game_trait::GameEvent`]s where relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClimbEvent {
    Jumped {
        air: bool,
    },
    Landed {
        platform: u32,
        zone: ZoneId,
        special: Option<TileKind>,
    },
    CoinCollected {
        value: u32,
        /// Pulled in by an active coin magnet.
        magnetized: bool,
    },
    PowerUpCollected {
        kind: PowerUpKind,
        zone: ZoneId,
    },
    PowerUpExpired {
        kind: PowerUpKind,
    },
    PowerUpConsumed {
        kind: PowerUpKind,
    },
    EnemyStomped {
        kind: EnemyKind,
    },
    ShieldBroken,
    Teleported {
        from: u32,
        to: u32,
    },
    ZoneEntered {
        zone: ZoneId,
        first_visit: bool,
    },
    AchievementUnlocked {
        id: String,
        title: String,
        reward: u32,
    },
    GameOver {
        score: u64,
        high_score: u64,
        new_high_score: bool,
    },
}
