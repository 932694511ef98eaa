use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::config::ClimbConfig;
use crate::entities::{Collectible, CollectibleKind, Enemy, Movement, Platform};
use crate::tiles::{TileRegistry, pair_teleporters};
use crate::zones::{ZoneManager, ZoneProfile};

/// Height of the collectible above the platform it hovers over.
const COLLECTIBLE_HOVER: f32 = 40.0;
/// Smallest gap ever generated, so platforms never overlap.
const MIN_GAP: f32 = 24.0;
/// Upper bound on batches generated in one top-up call.
const MAX_BATCHES_PER_TOP_UP: usize = 8;

/// Entities produced by one or more generation batches.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub platforms: Vec<Platform>,
    pub collectibles: Vec<Collectible>,
    pub enemies: Vec<Enemy>,
}

impl Batch {
    fn extend(&mut self, other: Batch) {
        self.platforms.extend(other.platforms);
        self.collectibles.extend(other.collectibles);
        self.enemies.extend(other.enemies);
    }
}

/// Borrowed world rules the generator consults.
pub struct GenContext<'a> {
    pub config: &'a ClimbConfig,
    pub zones: &'a ZoneManager,
    pub tiles: &'a TileRegistry,
}

/// Generates platforms upward from a frontier. Never generates below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelGenerator {
    /// Top of the highest generated platform.
    pub frontier: f32,
    pub next_id: u32,
    pub batches: u32,
}

impl Default for LevelGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelGenerator {
    pub fn new() -> Self {
        Self {
            frontier: 0.0,
            next_id: 1,
            batches: 0,
        }
    }

    /// Full-width starting platform at height 0 (id 0).
    pub fn floor_platform(cfg: &ClimbConfig) -> Platform {
        Platform::new(
            0,
            0.0,
            0.0,
            cfg.physics.field_width,
            cfg.generation.platform_thickness,
            crate::zones::ZoneId::Meadow,
        )
    }

    pub fn needs_batch(&self, player_height: f32, cfg: &ClimbConfig) -> bool {
        self.frontier - player_height < cfg.generation.lookahead
    }

    /// Generate batches until the frontier is a lookahead above the player.
    pub fn top_up(&mut self, player_height: f32, ctx: &GenContext<'_>, rng: &mut StdRng) -> Batch {
        let mut out = Batch::default();
        for _ in 0..MAX_BATCHES_PER_TOP_UP {
            if !self.needs_batch(player_height, ctx.config) {
                break;
            }
            out.extend(self.generate_batch(ctx, rng));
        }
        out
    }

    /// Generate one batch of platforms above the frontier.
    pub fn generate_batch(&mut self, ctx: &GenContext<'_>, rng: &mut StdRng) -> Batch {
        let cfg = ctx.config;
        let generation = &cfg.generation;
        let max_gap = cfg.max_gap().max(MIN_GAP);
        let field_width = cfg.physics.field_width;
        let mut batch = Batch::default();

        for _ in 0..generation.batch_size {
            let jitter = if generation.gap_jitter > 0.0 {
                rng.random_range(-generation.gap_jitter..=generation.gap_jitter)
            } else {
                0.0
            };
            let gap = (generation.platform_gap + jitter).clamp(MIN_GAP, max_gap);
            let y = self.frontier + gap;
            let zone = ctx.zones.zone_at(y);
            let profile = zone.profile();

            let (lo, hi) = profile.width_range;
            let width = rng.random_range(lo..=hi).min(field_width);
            let x = rng.random_range(0.0..=(field_width - width));

            let mut platform = Platform::new(
                self.next_id,
                x,
                y,
                width,
                generation.platform_thickness,
                zone,
            );
            self.next_id += 1;

            let moving_chance = ctx.zones.blend(y, |p| p.moving_chance as f32);
            if rng.random_bool(f64::from(moving_chance).clamp(0.0, 1.0)) {
                platform.movement = Some(movement_for(&platform, profile, field_width, rng));
            }

            if rng.random_bool(profile.special_chance.clamp(0.0, 1.0))
                && let Some(kind) = weighted_pick(rng, profile.special_weights)
                && ctx.tiles.contains(kind)
            {
                platform.special = Some(ctx.tiles.create(kind, rng));
            }

            if y >= generation.enemy_safe_height
                && platform.movement.is_none()
                && platform.special.is_none()
                && rng.random_bool(generation.enemy_chance.clamp(0.0, 1.0))
            {
                let kinds = profile.enemy_kinds;
                let kind = kinds[rng.random_range(0..kinds.len())];
                let range = (width / 2.0 - kind.radius()).max(0.0);
                let phase = rng.random_range(0.0..std::f32::consts::TAU);
                batch
                    .enemies
                    .push(Enemy::new(kind, platform.center_x(), y, range, phase));
            } else if rng.random_bool(generation.collectible_chance.clamp(0.0, 1.0)) {
                let roll = rng.random_range(0..100u32);
                let kind = if roll < 70 {
                    Some(CollectibleKind::Coin)
                } else if roll < 85 {
                    Some(CollectibleKind::Gem)
                } else {
                    weighted_pick(rng, profile.powerup_weights).map(CollectibleKind::PowerUp)
                };
                if let Some(kind) = kind {
                    batch.collectibles.push(Collectible {
                        x: platform.center_x(),
                        y: y + COLLECTIBLE_HOVER,
                        kind,
                        collected: false,
                    });
                }
            }

            self.frontier = y;
            batch.platforms.push(platform);
        }

        let pairs = pair_teleporters(&mut batch.platforms);
        self.batches += 1;
        tracing::debug!(
            batch = self.batches,
            frontier = self.frontier,
            platforms = batch.platforms.len(),
            enemies = batch.enemies.len(),
            collectibles = batch.collectibles.len(),
            teleporter_pairs = pairs,
            "Generated platform batch"
        );
        batch
    }
}

fn movement_for(
    platform: &Platform,
    profile: &ZoneProfile,
    field_width: f32,
    rng: &mut StdRng,
) -> Movement {
    let (lo, hi) = profile.moving_speed;
    let room = (field_width - platform.width).max(0.0);
    let range = rng.random_range(30.0..=90.0f32).min(room / 2.0);
    // Keep the whole sweep inside the field.
    let anchor_x = platform.x.clamp(range, (room - range).max(range));
    Movement {
        speed: rng.random_range(lo..=hi),
        direction: if rng.random_bool(0.5) { 1.0 } else { -1.0 },
        range,
        anchor_x,
    }
}

/// Pick from a weighted table. `None` when the table is empty or all weights are 0.
pub fn weighted_pick<T: Copy>(rng: &mut StdRng, table: &[(T, u32)]) -> Option<T> {
    let total: u32 = table.iter().map(|(_, w)| *w).sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.random_range(0..total);
    for (item, weight) in table {
        if roll < *weight {
            return Some(*item);
        }
        roll -= weight;
    }
    None
}

/// Drop entities far below the camera floor, plus collected and dead ones.
/// Returns how many platforms were removed.
pub fn prune_below(
    cutoff: f32,
    platforms: &mut Vec<Platform>,
    collectibles: &mut Vec<Collectible>,
    enemies: &mut Vec<Enemy>,
) -> usize {
    let before = platforms.len();
    platforms.retain(|p| p.y >= cutoff);
    collectibles.retain(|c| !c.collected && c.y >= cutoff);
    enemies.retain(|e| !e.dead && e.y >= cutoff);
    before - platforms.len()
}
