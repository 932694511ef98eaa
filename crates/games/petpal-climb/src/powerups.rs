use serde::{Deserialize, Serialize};

use petpal_core::powerup::{self, PowerUpKind as _};

use crate::physics::ClimbPlayer;
use crate::zones::ZoneId;

/// Climb power-up types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    SuperJump,
    SpeedBoost,
    CoinMagnet,
    Shield,
    Rocket,
    AntiGravity,
    DoubleJump,
}

impl powerup::PowerUpKind for PowerUpKind {
    fn base_duration(&self) -> f32 {
        match self {
            PowerUpKind::SuperJump => 8.0,
            PowerUpKind::SpeedBoost => 8.0,
            PowerUpKind::CoinMagnet => 10.0,
            PowerUpKind::Shield => 15.0,
            PowerUpKind::Rocket => 1.5,
            PowerUpKind::AntiGravity => 6.0,
            // Lasts until the air jump it grants is spent.
            PowerUpKind::DoubleJump => f32::INFINITY,
        }
    }
}

impl PowerUpKind {
    /// Kinds a rainbow tile may hand out.
    pub const POSITIVE: [PowerUpKind; 7] = [
        PowerUpKind::SuperJump,
        PowerUpKind::SpeedBoost,
        PowerUpKind::CoinMagnet,
        PowerUpKind::Shield,
        PowerUpKind::Rocket,
        PowerUpKind::AntiGravity,
        PowerUpKind::DoubleJump,
    ];

    /// Unscaled strength: a multiplier, a range in px, or a velocity kick.
    pub fn base_strength(self) -> f32 {
        match self {
            PowerUpKind::SuperJump => 1.35,
            PowerUpKind::SpeedBoost => 1.5,
            PowerUpKind::CoinMagnet => 160.0,
            PowerUpKind::Shield => 1.0,
            PowerUpKind::Rocket => 1300.0,
            PowerUpKind::AntiGravity => 0.55,
            PowerUpKind::DoubleJump => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PowerUpKind::SuperJump => "Super Jump",
            PowerUpKind::SpeedBoost => "Speed Boost",
            PowerUpKind::CoinMagnet => "Coin Magnet",
            PowerUpKind::Shield => "Shield",
            PowerUpKind::Rocket => "Rocket",
            PowerUpKind::AntiGravity => "Anti-Gravity",
            PowerUpKind::DoubleJump => "Double Jump",
        }
    }
}

/// Active power-up effect on the player.
pub type ActivePowerUp = powerup::ActivePowerUp<PowerUpKind>;

fn zone_scale(zone: ZoneId, per_zone: f32) -> f32 {
    1.0 + per_zone * f32::from(zone.index())
}

/// Duration once acquired in `zone`. Later zones last longer.
pub fn scaled_duration(kind: PowerUpKind, zone: ZoneId) -> f32 {
    kind.base_duration() * zone_scale(zone, 0.15)
}

/// Strength once acquired in `zone`. Multipliers scale their deviation from
/// 1.0, so anti-gravity gets lighter and jump/speed boosts get stronger.
pub fn scaled_strength(kind: PowerUpKind, zone: ZoneId) -> f32 {
    let scale = zone_scale(zone, 0.10);
    let base = kind.base_strength();
    match kind {
        PowerUpKind::SuperJump | PowerUpKind::SpeedBoost | PowerUpKind::AntiGravity => {
            (1.0 + (base - 1.0) * scale).max(0.1)
        },
        PowerUpKind::CoinMagnet | PowerUpKind::Rocket => base * scale,
        PowerUpKind::Shield | PowerUpKind::DoubleJump => base,
    }
}

/// Acquire a power-up at simulation time `now`.
///
/// An active record of the same kind is replaced with a fresh timer and
/// returned. One-shot effects fire immediately.
pub fn apply(
    player: &mut ClimbPlayer,
    kind: PowerUpKind,
    zone: ZoneId,
    now: f32,
) -> Option<ActivePowerUp> {
    let record = ActivePowerUp::new(
        kind,
        now,
        scaled_duration(kind, zone),
        scaled_strength(kind, zone),
        zone.index(),
    );
    let strength = record.strength;
    let replaced = player.power_ups.insert(record);

    match kind {
        PowerUpKind::Rocket => {
            player.vy = player.vy.max(strength);
            player.grounded = false;
            player.attached_platform = None;
        },
        _ => {},
    }
    refresh_modifiers(player);
    replaced
}

/// Drop elapsed records and restore the modifiers they were holding.
pub fn update(player: &mut ClimbPlayer, now: f32) -> Vec<PowerUpKind> {
    let expired: Vec<PowerUpKind> = player
        .power_ups
        .expire(now)
        .into_iter()
        .map(|p| p.kind)
        .collect();
    refresh_modifiers(player);
    expired
}

/// Spend a consume-on-use power-up (shield hit, double-jump charge).
pub fn consume(player: &mut ClimbPlayer, kind: PowerUpKind) -> bool {
    let removed = player.power_ups.remove(kind).is_some();
    if removed {
        refresh_modifiers(player);
    }
    removed
}

/// Recompute every modifier from baseline plus the active records.
pub fn refresh_modifiers(player: &mut ClimbPlayer) {
    player.jump_multiplier = 1.0;
    player.speed_multiplier = 1.0;
    player.gravity_multiplier = 1.0;
    player.magnet_range = 0.0;
    player.shield = false;

    for active in player.power_ups.iter() {
        match active.kind {
            PowerUpKind::SuperJump => player.jump_multiplier = active.strength,
            PowerUpKind::SpeedBoost => player.speed_multiplier = active.strength,
            PowerUpKind::CoinMagnet => player.magnet_range = active.strength,
            PowerUpKind::Shield => player.shield = true,
            PowerUpKind::AntiGravity => player.gravity_multiplier = active.strength,
            PowerUpKind::Rocket | PowerUpKind::DoubleJump => {},
        }
    }
}
