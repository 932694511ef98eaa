use std::collections::HashMap;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::config::PhysicsConfig;
use crate::effects::EffectKind;
use crate::entities::Platform;
use crate::powerups::PowerUpKind;

/// Behaviours a platform can carry beyond plain support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Bouncy,
    Crumbling,
    Ice,
    Wind,
    Gravity,
    Magnetic,
    Phase,
    Teleporter,
    Rainbow,
}

impl TileKind {
    pub const ALL: [TileKind; 9] = [
        TileKind::Bouncy,
        TileKind::Crumbling,
        TileKind::Ice,
        TileKind::Wind,
        TileKind::Gravity,
        TileKind::Magnetic,
        TileKind::Phase,
        TileKind::Teleporter,
        TileKind::Rainbow,
    ];
}

/// Seconds of idle contact before a crumbling tile starts to decay.
pub const CRUMBLE_DELAY: f32 = 0.35;
/// Seconds from full health to gone.
pub const CRUMBLE_DURATION: f32 = 0.8;
pub const WIND_PERIOD: f32 = 1.6;
pub const WIND_FORCE: f32 = 220.0;
/// Vertical reach of a wind pulse above and below the tile.
pub const WIND_REACH: f32 = 140.0;
pub const PHASE_ON: f32 = 2.0;
pub const PHASE_OFF: f32 = 1.2;
/// Re-arm delay of a teleporter after it was used as a destination.
pub const TELEPORT_COOLDOWN: f32 = 1.0;

/// Per-platform special state.
///
/// `state` is kind-specific: health for crumbling tiles, position in the
/// on/off cycle for phase tiles, time to the next pulse for wind tiles.
/// `armed` gates one-shot triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialTile {
    pub kind: TileKind,
    pub state: f32,
    pub timer: f32,
    pub partner: Option<u32>,
    pub armed: bool,
    /// Wind direction, +1.0 or -1.0.
    pub direction: f32,
}

impl SpecialTile {
    pub fn new(kind: TileKind) -> Self {
        Self {
            kind,
            state: 0.0,
            timer: 0.0,
            partner: None,
            armed: true,
            direction: 1.0,
        }
    }

    /// Temporarily stop a teleporter from firing.
    pub fn disarm_for(&mut self, secs: f32) {
        self.armed = false;
        self.timer = secs;
    }
}

/// Requests a tile hands back to the world on landing.
#[derive(Debug, Clone, PartialEq)]
pub enum TileEffect {
    /// Replace the standard landing rebound.
    Rebound(f32),
    GrantPowerUp(PowerUpKind),
    Teleport { partner: u32 },
    /// Horizontal velocity added to the player.
    Nudge(f32),
}

/// Requests from per-tick tile updates.
#[derive(Debug, Clone, PartialEq)]
pub enum TickEffect {
    WindPulse { force: f32 },
    Crumbled,
}

/// What a landing handler may read or roll.
pub struct LandingContext<'a> {
    pub physics: &'a PhysicsConfig,
    pub jump_multiplier: f32,
    pub rng: &'a mut StdRng,
}

/// One implementation per [`TileKind`], registered in a [`TileRegistry`].
pub trait SpecialTileBehavior {
    fn kind(&self) -> TileKind;

    /// Initial state for a freshly generated tile.
    fn init(&self, _tile: &mut SpecialTile, _rng: &mut StdRng) {}

    fn on_land(&self, platform: &mut Platform, ctx: &mut LandingContext<'_>) -> Vec<TileEffect>;

    fn on_tick(&self, _platform: &mut Platform, _dt: f32) -> Option<TickEffect> {
        None
    }
}

fn special_mut(platform: &mut Platform) -> Option<&mut SpecialTile> {
    platform.special.as_mut()
}

struct Bouncy;

impl SpecialTileBehavior for Bouncy {
    fn kind(&self) -> TileKind {
        TileKind::Bouncy
    }

    fn on_land(&self, platform: &mut Platform, ctx: &mut LandingContext<'_>) -> Vec<TileEffect> {
        platform.effects.trigger(EffectKind::Bounce, 1.0);
        platform.effects.trigger(EffectKind::Squish, 0.6);
        vec![TileEffect::Rebound(
            ctx.physics.bouncy_velocity * ctx.jump_multiplier,
        )]
    }
}

struct Crumbling;

impl SpecialTileBehavior for Crumbling {
    fn kind(&self) -> TileKind {
        TileKind::Crumbling
    }

    fn init(&self, tile: &mut SpecialTile, _rng: &mut StdRng) {
        tile.state = 1.0;
        tile.armed = false;
    }

    fn on_land(&self, platform: &mut Platform, _ctx: &mut LandingContext<'_>) -> Vec<TileEffect> {
        if let Some(tile) = special_mut(platform) {
            tile.armed = true;
            tile.timer = 0.0;
        }
        platform.effects.trigger(EffectKind::Wiggle, 0.5);
        Vec::new()
    }

    fn on_tick(&self, platform: &mut Platform, dt: f32) -> Option<TickEffect> {
        let tile = special_mut(platform)?;
        if !tile.armed || tile.state <= 0.0 {
            return None;
        }
        tile.timer += dt;
        if tile.timer < CRUMBLE_DELAY {
            return None;
        }
        tile.state = (tile.state - dt / CRUMBLE_DURATION).max(0.0);
        if tile.state > 0.0 {
            platform.effects.trigger(EffectKind::Wiggle, 1.0);
            return None;
        }
        platform.solid = false;
        platform.effects.trigger(EffectKind::Fade, 1.0);
        Some(TickEffect::Crumbled)
    }
}

struct Ice;

impl SpecialTileBehavior for Ice {
    fn kind(&self) -> TileKind {
        TileKind::Ice
    }

    fn on_land(&self, platform: &mut Platform, _ctx: &mut LandingContext<'_>) -> Vec<TileEffect> {
        platform.effects.trigger(EffectKind::Glow, 0.4);
        Vec::new()
    }
}

struct Wind;

impl SpecialTileBehavior for Wind {
    fn kind(&self) -> TileKind {
        TileKind::Wind
    }

    fn init(&self, tile: &mut SpecialTile, rng: &mut StdRng) {
        tile.direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        tile.state = rng.random_range(0.0..WIND_PERIOD);
    }

    fn on_land(&self, platform: &mut Platform, _ctx: &mut LandingContext<'_>) -> Vec<TileEffect> {
        platform.effects.trigger(EffectKind::Tilt, 1.0);
        let direction = platform.special.as_ref().map_or(1.0, |t| t.direction);
        vec![TileEffect::Nudge(direction * WIND_FORCE * 0.5)]
    }

    fn on_tick(&self, platform: &mut Platform, dt: f32) -> Option<TickEffect> {
        let tile = special_mut(platform)?;
        tile.state -= dt;
        if tile.state > 0.0 {
            return None;
        }
        tile.state += WIND_PERIOD;
        let force = tile.direction * WIND_FORCE;
        platform.effects.trigger(EffectKind::Tilt, 0.6);
        Some(TickEffect::WindPulse { force })
    }
}

/// Tiles that hand out a power-up once.
struct Granting {
    kind: TileKind,
    power_up: Option<PowerUpKind>,
}

impl SpecialTileBehavior for Granting {
    fn kind(&self) -> TileKind {
        self.kind
    }

    fn on_land(&self, platform: &mut Platform, ctx: &mut LandingContext<'_>) -> Vec<TileEffect> {
        let Some(tile) = special_mut(platform) else {
            return Vec::new();
        };
        if !tile.armed {
            return Vec::new();
        }
        tile.armed = false;
        platform.effects.trigger(EffectKind::Glow, 1.0);

        // Rainbow tiles roll from the positive table.
        let kind = self.power_up.unwrap_or_else(|| {
            let idx = ctx.rng.random_range(0..PowerUpKind::POSITIVE.len());
            PowerUpKind::POSITIVE[idx]
        });
        vec![TileEffect::GrantPowerUp(kind)]
    }
}

struct Phase;

impl Phase {
    fn visible_at(t: f32) -> bool {
        t.rem_euclid(PHASE_ON + PHASE_OFF) < PHASE_ON
    }
}

impl SpecialTileBehavior for Phase {
    fn kind(&self) -> TileKind {
        TileKind::Phase
    }

    fn init(&self, tile: &mut SpecialTile, rng: &mut StdRng) {
        // Start inside the solid part of the cycle.
        tile.state = rng.random_range(0.0..PHASE_ON * 0.5);
    }

    fn on_land(&self, platform: &mut Platform, _ctx: &mut LandingContext<'_>) -> Vec<TileEffect> {
        platform.effects.trigger(EffectKind::Glow, 0.5);
        Vec::new()
    }

    fn on_tick(&self, platform: &mut Platform, dt: f32) -> Option<TickEffect> {
        let tile = special_mut(platform)?;
        tile.state = (tile.state + dt).rem_euclid(PHASE_ON + PHASE_OFF);
        let solid = Self::visible_at(tile.state);
        if solid != platform.solid {
            platform.solid = solid;
            platform.effects.trigger(EffectKind::Fade, 1.0);
        }
        None
    }
}

struct Teleporter;

impl SpecialTileBehavior for Teleporter {
    fn kind(&self) -> TileKind {
        TileKind::Teleporter
    }

    fn on_land(&self, platform: &mut Platform, _ctx: &mut LandingContext<'_>) -> Vec<TileEffect> {
        let Some(tile) = special_mut(platform) else {
            return Vec::new();
        };
        let Some(partner) = tile.partner else {
            return Vec::new();
        };
        if !tile.armed {
            return Vec::new();
        }
        platform.effects.trigger(EffectKind::Glow, 1.0);
        vec![TileEffect::Teleport { partner }]
    }

    fn on_tick(&self, platform: &mut Platform, dt: f32) -> Option<TickEffect> {
        let tile = special_mut(platform)?;
        if !tile.armed {
            tile.timer -= dt;
            if tile.timer <= 0.0 {
                tile.timer = 0.0;
                tile.armed = true;
            }
        }
        None
    }
}

/// Dispatch table from tile kind to its behaviour.
pub struct TileRegistry {
    handlers: HashMap<TileKind, Box<dyn SpecialTileBehavior>>,
}

impl Default for TileRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl TileRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with one handler for every [`TileKind`].
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(Bouncy));
        registry.register(Box::new(Crumbling));
        registry.register(Box::new(Ice));
        registry.register(Box::new(Wind));
        registry.register(Box::new(Granting {
            kind: TileKind::Gravity,
            power_up: Some(PowerUpKind::AntiGravity),
        }));
        registry.register(Box::new(Granting {
            kind: TileKind::Magnetic,
            power_up: Some(PowerUpKind::CoinMagnet),
        }));
        registry.register(Box::new(Granting {
            kind: TileKind::Rainbow,
            power_up: None,
        }));
        registry.register(Box::new(Phase));
        registry.register(Box::new(Teleporter));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn SpecialTileBehavior>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn contains(&self, kind: TileKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Fresh special state for a new platform.
    pub fn create(&self, kind: TileKind, rng: &mut StdRng) -> SpecialTile {
        let mut tile = SpecialTile::new(kind);
        if let Some(handler) = self.handlers.get(&kind) {
            handler.init(&mut tile, rng);
        }
        tile
    }

    pub fn on_land(&self, platform: &mut Platform, ctx: &mut LandingContext<'_>) -> Vec<TileEffect> {
        match platform.kind().and_then(|k| self.handlers.get(&k)) {
            Some(handler) => handler.on_land(platform, ctx),
            None => Vec::new(),
        }
    }

    pub fn tick(&self, platform: &mut Platform, dt: f32) -> Option<TickEffect> {
        let handler = platform.kind().and_then(|k| self.handlers.get(&k))?;
        handler.on_tick(platform, dt)
    }
}

/// Pair the teleporters of one generation batch.
///
/// In creation order, each unpaired teleporter is linked with the nearest
/// other unpaired one. A leftover teleporter becomes a plain platform.
/// Returns the number of pairs formed.
pub fn pair_teleporters(batch: &mut [Platform]) -> usize {
    let mut open: Vec<usize> = batch
        .iter()
        .enumerate()
        .filter(|(_, p)| p.kind() == Some(TileKind::Teleporter))
        .map(|(i, _)| i)
        .collect();

    let mut pairs = 0;
    while !open.is_empty() {
        let first = open.remove(0);
        let (fx, fy) = (batch[first].center_x(), batch[first].y);
        let nearest = open
            .iter()
            .enumerate()
            .map(|(slot, &i)| {
                let dx = batch[i].center_x() - fx;
                let dy = batch[i].y - fy;
                (slot, dx * dx + dy * dy)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(slot, _)| slot);

        match nearest {
            Some(slot) => {
                let second = open.remove(slot);
                let (a, b) = (batch[first].id, batch[second].id);
                if let Some(tile) = batch[first].special.as_mut() {
                    tile.partner = Some(b);
                }
                if let Some(tile) = batch[second].special.as_mut() {
                    tile.partner = Some(a);
                }
                pairs += 1;
            },
            None => {
                tracing::debug!(platform = batch[first].id, "Unpaired teleporter demoted");
                batch[first].special = None;
            },
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::zones::ZoneId;

    fn special(kind: TileKind, registry: &TileRegistry, rng: &mut StdRng) -> Platform {
        let mut p = Platform::new(7, 100.0, 200.0, 80.0, 14.0, ZoneId::Clouds);
        p.special = Some(registry.create(kind, rng));
        p
    }

    fn land(registry: &TileRegistry, platform: &mut Platform, rng: &mut StdRng) -> Vec<TileEffect> {
        let physics = PhysicsConfig::default();
        let mut ctx = LandingContext {
            physics: &physics,
            jump_multiplier: 1.0,
            rng,
        };
        registry.on_land(platform, &mut ctx)
    }

    #[test]
    fn registry_covers_every_kind() {
        let registry = TileRegistry::standard();
        for kind in TileKind::ALL {
            assert!(registry.contains(kind), "{kind:?} has no handler");
        }
    }

    #[test]
    fn bouncy_overrides_rebound() {
        let registry = TileRegistry::standard();
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = special(TileKind::Bouncy, &registry, &mut rng);
        let effects = land(&registry, &mut p, &mut rng);
        assert_eq!(
            effects,
            vec![TileEffect::Rebound(PhysicsConfig::default().bouncy_velocity)]
        );
        assert!(p.effects.is_active(EffectKind::Bounce));
    }

    #[test]
    fn plain_platform_has_no_effects() {
        let registry = TileRegistry::standard();
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Platform::new(1, 0.0, 0.0, 80.0, 14.0, ZoneId::Meadow);
        assert!(land(&registry, &mut p, &mut rng).is_empty());
        assert!(registry.tick(&mut p, 1.0).is_none());
    }

    #[test]
    fn crumbling_waits_then_collapses() {
        let registry = TileRegistry::standard();
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = special(TileKind::Crumbling, &registry, &mut rng);

        // Untouched tiles never decay.
        for _ in 0..120 {
            assert!(registry.tick(&mut p, 1.0 / 60.0).is_none());
        }
        assert!(p.solid);

        land(&registry, &mut p, &mut rng);
        let mut crumbled = false;
        for _ in 0..120 {
            if registry.tick(&mut p, 1.0 / 60.0) == Some(TickEffect::Crumbled) {
                crumbled = true;
                break;
            }
        }
        assert!(crumbled);
        assert!(!p.solid);
        assert!(p.effects.is_active(EffectKind::Fade));
        // Only reported once.
        assert!(registry.tick(&mut p, 1.0 / 60.0).is_none());
    }

    #[test]
    fn wind_pulses_periodically() {
        let registry = TileRegistry::standard();
        let mut rng = StdRng::seed_from_u64(9);
        let mut p = special(TileKind::Wind, &registry, &mut rng);
        let direction = p.special.as_ref().unwrap().direction;

        let pulses = (0..(60.0 * WIND_PERIOD * 3.0) as usize)
            .filter_map(|_| registry.tick(&mut p, 1.0 / 60.0))
            .collect::<Vec<_>>();
        assert!(pulses.len() >= 2);
        assert!(
            pulses
                .iter()
                .all(|e| *e == TickEffect::WindPulse { force: direction * WIND_FORCE })
        );
    }

    #[test]
    fn gravity_and_magnetic_grant_once() {
        let registry = TileRegistry::standard();
        let mut rng = StdRng::seed_from_u64(2);

        let mut gravity = special(TileKind::Gravity, &registry, &mut rng);
        assert_eq!(
            land(&registry, &mut gravity, &mut rng),
            vec![TileEffect::GrantPowerUp(PowerUpKind::AntiGravity)]
        );
        assert!(land(&registry, &mut gravity, &mut rng).is_empty());

        let mut magnetic = special(TileKind::Magnetic, &registry, &mut rng);
        assert_eq!(
            land(&registry, &mut magnetic, &mut rng),
            vec![TileEffect::GrantPowerUp(PowerUpKind::CoinMagnet)]
        );
    }

    #[test]
    fn rainbow_grants_positive_power_up() {
        let registry = TileRegistry::standard();
        let mut rng = StdRng::seed_from_u64(5);
        let mut p = special(TileKind::Rainbow, &registry, &mut rng);
        match land(&registry, &mut p, &mut rng).as_slice() {
            [TileEffect::GrantPowerUp(kind)] => assert!(PowerUpKind::POSITIVE.contains(kind)),
            other => panic!("unexpected effects {other:?}"),
        }
    }

    #[test]
    fn phase_cycles_collision() {
        let registry = TileRegistry::standard();
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = special(TileKind::Phase, &registry, &mut rng);
        let mut saw_off = false;
        let mut saw_back_on = false;
        for _ in 0..(60.0 * (PHASE_ON + PHASE_OFF) * 2.0) as usize {
            registry.tick(&mut p, 1.0 / 60.0);
            if !p.solid {
                saw_off = true;
            } else if saw_off {
                saw_back_on = true;
            }
        }
        assert!(saw_off && saw_back_on);
    }

    #[test]
    fn teleporter_needs_partner_and_rearms() {
        let registry = TileRegistry::standard();
        let mut rng = StdRng::seed_from_u64(4);
        let mut p = special(TileKind::Teleporter, &registry, &mut rng);
        assert!(land(&registry, &mut p, &mut rng).is_empty());

        p.special.as_mut().unwrap().partner = Some(11);
        assert_eq!(
            land(&registry, &mut p, &mut rng),
            vec![TileEffect::Teleport { partner: 11 }]
        );

        p.special.as_mut().unwrap().disarm_for(TELEPORT_COOLDOWN);
        assert!(land(&registry, &mut p, &mut rng).is_empty());
        for _ in 0..61 {
            registry.tick(&mut p, 1.0 / 60.0);
        }
        assert!(p.special.as_ref().unwrap().armed);
    }

    fn teleporter_at(id: u32, x: f32, y: f32) -> Platform {
        let mut p = Platform::new(id, x, y, 60.0, 14.0, ZoneId::Orbit);
        p.special = Some(SpecialTile::new(TileKind::Teleporter));
        p
    }

    #[test]
    fn teleporters_pair_with_nearest_in_creation_order() {
        let mut batch = vec![
            teleporter_at(1, 0.0, 0.0),
            teleporter_at(2, 300.0, 400.0),
            Platform::new(3, 100.0, 100.0, 60.0, 14.0, ZoneId::Orbit),
            teleporter_at(4, 10.0, 100.0),
            teleporter_at(5, 200.0, 600.0),
        ];
        assert_eq!(pair_teleporters(&mut batch), 2);
        let partner = |p: &Platform| p.special.as_ref().and_then(|t| t.partner);
        assert_eq!(partner(&batch[0]), Some(4));
        assert_eq!(partner(&batch[3]), Some(1));
        assert_eq!(partner(&batch[1]), Some(5));
        assert_eq!(partner(&batch[4]), Some(2));
        assert!(batch[2].special.is_none());
    }

    #[test]
    fn odd_teleporter_is_demoted() {
        let mut batch = vec![
            teleporter_at(1, 0.0, 0.0),
            teleporter_at(2, 50.0, 90.0),
            teleporter_at(3, 300.0, 200.0),
        ];
        assert_eq!(pair_teleporters(&mut batch), 1);
        assert!(batch[2].special.is_none());
        assert_eq!(batch[2].kind(), None);
    }
}
