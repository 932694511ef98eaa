use serde::{Deserialize, Serialize};

use crate::entities::EnemyKind;
use crate::powerups::PowerUpKind;
use crate::tiles::TileKind;

/// Height-defined environment bands, lowest first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ZoneId {
    #[default]
    Meadow,
    Clouds,
    Stratosphere,
    Orbit,
    Nebula,
}

impl ZoneId {
    pub const ALL: [ZoneId; 5] = [
        ZoneId::Meadow,
        ZoneId::Clouds,
        ZoneId::Stratosphere,
        ZoneId::Orbit,
        ZoneId::Nebula,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            ZoneId::Meadow => "Meadow",
            ZoneId::Clouds => "Clouds",
            ZoneId::Stratosphere => "Stratosphere",
            ZoneId::Orbit => "Orbit",
            ZoneId::Nebula => "Nebula",
        }
    }

    pub fn profile(self) -> &'static ZoneProfile {
        &PROFILES[self as usize]
    }
}

/// Colors handed to the renderer, as 0xRRGGBB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub sky_top: u32,
    pub sky_bottom: u32,
    pub platform: u32,
    pub accent: u32,
}

/// Generation and presentation parameters for one zone.
#[derive(Debug)]
pub struct ZoneProfile {
    pub zone: ZoneId,
    /// Height at which the zone begins.
    pub threshold: f32,
    pub width_range: (f32, f32),
    pub special_chance: f64,
    pub special_weights: &'static [(TileKind, u32)],
    pub moving_chance: f64,
    pub moving_speed: (f32, f32),
    pub enemy_kinds: &'static [EnemyKind],
    pub powerup_weights: &'static [(PowerUpKind, u32)],
    pub palette: Palette,
}

static PROFILES: [ZoneProfile; 5] = [
    ZoneProfile {
        zone: ZoneId::Meadow,
        threshold: 0.0,
        width_range: (70.0, 95.0),
        special_chance: 0.10,
        special_weights: &[(TileKind::Bouncy, 5), (TileKind::Crumbling, 3)],
        moving_chance: 0.0,
        moving_speed: (30.0, 50.0),
        enemy_kinds: &[EnemyKind::Beetle],
        powerup_weights: &[
            (PowerUpKind::SuperJump, 4),
            (PowerUpKind::SpeedBoost, 4),
            (PowerUpKind::CoinMagnet, 3),
            (PowerUpKind::Shield, 1),
        ],
        palette: Palette {
            sky_top: 0x8fd3ff,
            sky_bottom: 0xd8f5c8,
            platform: 0x5fa84a,
            accent: 0xf7d65c,
        },
    },
    ZoneProfile {
        zone: ZoneId::Clouds,
        threshold: 1500.0,
        width_range: (65.0, 120.0),
        special_chance: 0.18,
        special_weights: &[
            (TileKind::Bouncy, 4),
            (TileKind::Crumbling, 3),
            (TileKind::Wind, 3),
            (TileKind::Magnetic, 1),
        ],
        moving_chance: 0.15,
        moving_speed: (35.0, 60.0),
        enemy_kinds: &[EnemyKind::Beetle, EnemyKind::Crow],
        powerup_weights: &[
            (PowerUpKind::SuperJump, 3),
            (PowerUpKind::SpeedBoost, 3),
            (PowerUpKind::CoinMagnet, 3),
            (PowerUpKind::Shield, 2),
            (PowerUpKind::DoubleJump, 2),
        ],
        palette: Palette {
            sky_top: 0x6fb8f0,
            sky_bottom: 0xeaf4ff,
            platform: 0xf4f8ff,
            accent: 0x9ad0ff,
        },
    },
    ZoneProfile {
        zone: ZoneId::Stratosphere,
        threshold: 4000.0,
        width_range: (60.0, 130.0),
        special_chance: 0.25,
        special_weights: &[
            (TileKind::Ice, 4),
            (TileKind::Wind, 3),
            (TileKind::Crumbling, 3),
            (TileKind::Gravity, 2),
            (TileKind::Bouncy, 2),
        ],
        moving_chance: 0.25,
        moving_speed: (45.0, 75.0),
        enemy_kinds: &[EnemyKind::Crow, EnemyKind::StormSprite],
        powerup_weights: &[
            (PowerUpKind::SuperJump, 2),
            (PowerUpKind::CoinMagnet, 2),
            (PowerUpKind::Shield, 3),
            (PowerUpKind::DoubleJump, 3),
            (PowerUpKind::AntiGravity, 2),
            (PowerUpKind::Rocket, 1),
        ],
        palette: Palette {
            sky_top: 0x2b4f9e,
            sky_bottom: 0x6f9be0,
            platform: 0xcfe8ff,
            accent: 0xffffff,
        },
    },
    ZoneProfile {
        zone: ZoneId::Orbit,
        threshold: 8000.0,
        width_range: (55.0, 135.0),
        special_chance: 0.32,
        special_weights: &[
            (TileKind::Phase, 3),
            (TileKind::Teleporter, 3),
            (TileKind::Gravity, 2),
            (TileKind::Magnetic, 2),
            (TileKind::Ice, 2),
            (TileKind::Crumbling, 2),
        ],
        moving_chance: 0.35,
        moving_speed: (55.0, 90.0),
        enemy_kinds: &[EnemyKind::StormSprite, EnemyKind::Drone],
        powerup_weights: &[
            (PowerUpKind::Shield, 2),
            (PowerUpKind::DoubleJump, 3),
            (PowerUpKind::AntiGravity, 3),
            (PowerUpKind::Rocket, 3),
            (PowerUpKind::CoinMagnet, 1),
        ],
        palette: Palette {
            sky_top: 0x0b1030,
            sky_bottom: 0x1e2a5c,
            platform: 0xa0a8c0,
            accent: 0x59f0ff,
        },
    },
    ZoneProfile {
        zone: ZoneId::Nebula,
        threshold: 14000.0,
        width_range: (50.0, 140.0),
        special_chance: 0.40,
        special_weights: &[
            (TileKind::Rainbow, 3),
            (TileKind::Phase, 3),
            (TileKind::Teleporter, 3),
            (TileKind::Bouncy, 2),
            (TileKind::Wind, 2),
            (TileKind::Crumbling, 2),
        ],
        moving_chance: 0.45,
        moving_speed: (60.0, 100.0),
        enemy_kinds: &[EnemyKind::Drone, EnemyKind::VoidJelly],
        powerup_weights: &[
            (PowerUpKind::DoubleJump, 2),
            (PowerUpKind::AntiGravity, 3),
            (PowerUpKind::Rocket, 4),
            (PowerUpKind::Shield, 2),
            (PowerUpKind::SuperJump, 1),
        ],
        palette: Palette {
            sky_top: 0x1a0630,
            sky_bottom: 0x4a1a6e,
            platform: 0xd99cff,
            accent: 0xff7ad9,
        },
    },
];

/// Zone lookup result for a height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneStatus {
    pub current: ZoneId,
    pub next: ZoneId,
    /// Progress toward `next` in [0, 1]. Always 0 in the final zone.
    pub progress: f32,
}

impl Default for ZoneStatus {
    fn default() -> Self {
        Self {
            current: ZoneId::Meadow,
            next: ZoneId::Clouds,
            progress: 0.0,
        }
    }
}

/// Maps heights onto the ordered zone thresholds.
#[derive(Debug, Clone)]
pub struct ZoneManager {
    thresholds: Vec<(ZoneId, f32)>,
}

impl Default for ZoneManager {
    fn default() -> Self {
        Self::standard()
    }
}

impl ZoneManager {
    pub fn standard() -> Self {
        Self {
            thresholds: ZoneId::ALL
                .iter()
                .map(|z| (*z, z.profile().threshold))
                .collect(),
        }
    }

    fn position(&self, height: f32) -> usize {
        self.thresholds
            .iter()
            .rposition(|(_, t)| height >= *t)
            .unwrap_or(0)
    }

    pub fn zone_at(&self, height: f32) -> ZoneId {
        self.thresholds[self.position(height)].0
    }

    pub fn status(&self, height: f32) -> ZoneStatus {
        let idx = self.position(height);
        let (current, start) = self.thresholds[idx];
        match self.thresholds.get(idx + 1) {
            Some(&(next, end)) => {
                let span = (end - start).max(f32::EPSILON);
                ZoneStatus {
                    current,
                    next,
                    progress: ((height - start) / span).clamp(0.0, 1.0),
                }
            },
            None => ZoneStatus {
                current,
                next: current,
                progress: 0.0,
            },
        }
    }

    /// Interpolate a per-zone value toward the next zone by blend progress.
    pub fn blend<F>(&self, height: f32, value: F) -> f32
    where
        F: Fn(&ZoneProfile) -> f32,
    {
        let status = self.status(height);
        let a = value(status.current.profile());
        let b = value(status.next.profile());
        a + (b - a) * status.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_are_ordered() {
        for pair in ZoneId::ALL.windows(2) {
            assert!(pair[0].profile().threshold < pair[1].profile().threshold);
            assert!(pair[0] < pair[1]);
        }
        for zone in ZoneId::ALL {
            assert_eq!(zone.profile().zone, zone);
            let (lo, hi) = zone.profile().width_range;
            assert!(lo > 0.0 && lo <= hi);
            assert!(!zone.profile().enemy_kinds.is_empty());
            assert!(!zone.profile().powerup_weights.is_empty());
        }
    }

    #[test]
    fn ground_zone_is_narrowest() {
        let meadow = ZoneId::Meadow.profile().width_range;
        let clouds = ZoneId::Clouds.profile().width_range;
        assert!(meadow.1 < clouds.1);
    }

    #[test]
    fn start_height_is_meadow() {
        let zones = ZoneManager::standard();
        let status = zones.status(0.0);
        assert_eq!(status.current, ZoneId::Meadow);
        assert_eq!(status.next, ZoneId::Clouds);
        assert_eq!(status.progress, 0.0);
    }

    #[test]
    fn below_zero_clamps_to_first_zone() {
        let zones = ZoneManager::standard();
        assert_eq!(zones.zone_at(-300.0), ZoneId::Meadow);
        assert_eq!(zones.status(-300.0).progress, 0.0);
    }

    #[test]
    fn passing_first_threshold_reports_second_zone() {
        let zones = ZoneManager::standard();
        let status = zones.status(1600.0);
        assert_eq!(status.current, ZoneId::Clouds);
        assert_eq!(status.next, ZoneId::Stratosphere);
        assert!((0.0..=1.0).contains(&status.progress));
        assert!((status.progress - 100.0 / 2500.0).abs() < 1e-5);
    }

    #[test]
    fn final_zone_has_no_next() {
        let zones = ZoneManager::standard();
        let status = zones.status(50_000.0);
        assert_eq!(status.current, ZoneId::Nebula);
        assert_eq!(status.next, ZoneId::Nebula);
        assert_eq!(status.progress, 0.0);
    }

    #[test]
    fn blend_interpolates_between_zones() {
        let zones = ZoneManager::standard();
        // Halfway between Meadow (0.0) and Clouds (0.15).
        let chance = zones.blend(750.0, |p| p.moving_chance as f32);
        assert!((chance - 0.075).abs() < 1e-5, "chance={chance}");
    }

    #[test]
    fn last_zone_has_no_successor() {
        let zones = ZoneManager::standard();
        let last = *ZoneId::ALL.last().unwrap();
        let status = zones.status(last.profile().threshold + 5_000.0);
        assert_eq!(status.current, last);
        assert_eq!(status.next, last);
        assert_eq!(status.progress, 0.0);
    }
}
