use serde::{Deserialize, Serialize};

use crate::effects::EffectTimers;
use crate::powerups::PowerUpKind;
use crate::tiles::{SpecialTile, TileKind};
use crate::zones::ZoneId;

/// Horizontal back-and-forth movement of a platform around an anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub speed: f32,
    /// +1.0 or -1.0.
    pub direction: f32,
    pub range: f32,
    /// Left edge the platform oscillates around.
    pub anchor_x: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    /// Left edge.
    pub x: f32,
    /// Top surface height.
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Zone at creation time. Never reassigned.
    pub zone: ZoneId,
    pub movement: Option<Movement>,
    pub special: Option<SpecialTile>,
    /// False once crumbled or while phased out.
    pub solid: bool,
    /// Horizontal displacement during the last step, inherited by riders.
    pub last_dx: f32,
    pub effects: EffectTimers,
}

impl Platform {
    pub fn new(id: u32, x: f32, y: f32, width: f32, height: f32, zone: ZoneId) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            zone,
            movement: None,
            special: None,
            solid: true,
            last_dx: 0.0,
            effects: EffectTimers::default(),
        }
    }

    pub fn kind(&self) -> Option<TileKind> {
        self.special.as_ref().map(|s| s.kind)
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Move a moving platform one step, bouncing at the ends of its range.
    pub fn advance(&mut self, dt: f32, field_width: f32) {
        let Some(m) = self.movement.as_mut() else {
            self.last_dx = 0.0;
            return;
        };
        let before = self.x;
        let lo = m.anchor_x - m.range;
        let hi = (m.anchor_x + m.range).min(field_width - self.width);
        self.x += m.speed * m.direction * dt;
        if self.x <= lo {
            self.x = lo;
            m.direction = 1.0;
        } else if self.x >= hi {
            self.x = hi;
            m.direction = -1.0;
        }
        self.last_dx = self.x - before;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectibleKind {
    Coin,
    Gem,
    PowerUp(PowerUpKind),
}

impl CollectibleKind {
    /// Currency value; 0 for power-ups.
    pub fn value(self) -> u32 {
        match self {
            CollectibleKind::Coin => 1,
            CollectibleKind::Gem => 5,
            CollectibleKind::PowerUp(_) => 0,
        }
    }

    pub fn is_currency(self) -> bool {
        !matches!(self, CollectibleKind::PowerUp(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub x: f32,
    pub y: f32,
    pub kind: CollectibleKind,
    pub collected: bool,
}

/// Zone-flavoured enemy types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Beetle,
    Crow,
    StormSprite,
    Drone,
    VoidJelly,
}

impl EnemyKind {
    pub fn patrol_speed(self) -> f32 {
        match self {
            EnemyKind::Beetle => 1.2,
            EnemyKind::Crow => 1.8,
            EnemyKind::StormSprite => 2.4,
            EnemyKind::Drone => 2.0,
            EnemyKind::VoidJelly => 1.0,
        }
    }

    /// Half-extent of the enemy's hit box.
    pub fn radius(self) -> f32 {
        match self {
            EnemyKind::Beetle => 12.0,
            EnemyKind::Crow | EnemyKind::StormSprite => 14.0,
            EnemyKind::Drone => 13.0,
            EnemyKind::VoidJelly => 16.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub x: f32,
    pub y: f32,
    pub origin_x: f32,
    pub range: f32,
    /// Angular patrol speed (rad/s).
    pub speed: f32,
    pub phase: f32,
    pub kind: EnemyKind,
    pub dead: bool,
}

impl Enemy {
    pub fn new(kind: EnemyKind, origin_x: f32, y: f32, range: f32, phase: f32) -> Self {
        let mut enemy = Self {
            x: origin_x,
            y,
            origin_x,
            range,
            speed: kind.patrol_speed(),
            phase,
            kind,
            dead: false,
        };
        enemy.x = enemy.patrol_x();
        enemy
    }

    fn patrol_x(&self) -> f32 {
        self.origin_x + self.range * self.phase.sin()
    }

    /// Sinusoidal patrol around `origin_x`.
    pub fn advance(&mut self, dt: f32) {
        if self.dead {
            return;
        }
        self.phase = (self.phase + self.speed * dt) % std::f32::consts::TAU;
        self.x = self.patrol_x();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_platform_has_no_delta() {
        let mut p = Platform::new(1, 50.0, 100.0, 80.0, 14.0, ZoneId::Meadow);
        p.advance(1.0 / 60.0, 400.0);
        assert_eq!(p.x, 50.0);
        assert_eq!(p.last_dx, 0.0);
    }

    #[test]
    fn moving_platform_reverses_at_range() {
        let mut p = Platform::new(1, 100.0, 100.0, 80.0, 14.0, ZoneId::Clouds);
        p.movement = Some(Movement {
            speed: 60.0,
            direction: 1.0,
            range: 30.0,
            anchor_x: 100.0,
        });
        for _ in 0..60 {
            p.advance(1.0 / 60.0, 400.0);
            assert!(p.x >= 70.0 - 1e-3 && p.x <= 130.0 + 1e-3);
        }
        let m = p.movement.as_ref().unwrap();
        assert_eq!(m.direction, -1.0, "Should have bounced off the right end");
        assert!(p.last_dx < 0.0);
    }

    #[test]
    fn moving_platform_stays_in_field() {
        let mut p = Platform::new(1, 300.0, 100.0, 90.0, 14.0, ZoneId::Orbit);
        p.movement = Some(Movement {
            speed: 200.0,
            direction: 1.0,
            range: 80.0,
            anchor_x: 300.0,
        });
        for _ in 0..120 {
            p.advance(1.0 / 60.0, 400.0);
            assert!(p.right() <= 400.0 + 1e-3);
        }
    }

    #[test]
    fn collectible_values() {
        assert_eq!(CollectibleKind::Coin.value(), 1);
        assert_eq!(CollectibleKind::Gem.value(), 5);
        assert!(!CollectibleKind::PowerUp(PowerUpKind::Shield).is_currency());
    }

    #[test]
    fn enemy_patrols_within_range() {
        let mut enemy = Enemy::new(EnemyKind::Crow, 200.0, 500.0, 40.0, 0.0);
        for _ in 0..300 {
            enemy.advance(1.0 / 60.0);
            assert!((enemy.x - 200.0).abs() <= 40.0 + 1e-3);
        }
    }

    #[test]
    fn dead_enemy_stops() {
        let mut enemy = Enemy::new(EnemyKind::Beetle, 200.0, 500.0, 40.0, 0.5);
        enemy.dead = true;
        let x = enemy.x;
        enemy.advance(1.0);
        assert_eq!(enemy.x, x);
    }
}
