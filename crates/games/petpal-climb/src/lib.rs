pub mod achievements;
pub mod camera;
pub mod collision;
pub mod config;
pub mod effects;
pub mod entities;
pub mod events;
pub mod input;
pub mod level_gen;
pub mod physics;
pub mod powerups;
pub mod scoring;
pub mod tiles;
pub mod zones;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use petpal_core::frame_game_boilerplate;
use petpal_core::game_trait::{FrameGame, GameEvent, GameMetadata};
use petpal_core::pet::{self, PLACEHOLDER_SPRITE, PetSpriteSource};
use petpal_core::storage::{MemoryStorage, Storage};

use achievements::AchievementTracker;
use camera::Camera;
use collision::EnemyContact;
use config::ClimbConfig;
use effects::{EffectKind, ParticlePool};
use entities::{Collectible, CollectibleKind, Enemy, Platform};
use events::ClimbEvent;
use level_gen::{GenContext, LevelGenerator};
use physics::{ClimbInput, ClimbPlayer, JumpKind};
use powerups::PowerUpKind;
use tiles::{LandingContext, TELEPORT_COOLDOWN, TickEffect, TileEffect, TileKind, TileRegistry};
use zones::{Palette, ZoneId, ZoneManager, ZoneStatus};

const LANDING_PARTICLES: usize = 6;
const PICKUP_PARTICLES: usize = 10;
const PICKUP_COLOR: u32 = 0xffd84a;

/// Everything the renderer needs for one frame, and everything a snapshot restores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimbState {
    pub player: ClimbPlayer,
    pub platforms: Vec<Platform>,
    pub collectibles: Vec<Collectible>,
    pub enemies: Vec<Enemy>,
    pub particles: ParticlePool,
    pub camera: Camera,
    pub zone: ZoneStatus,
    pub generator: LevelGenerator,
    /// Simulation clock. Only advances inside a step.
    pub elapsed: f32,
    /// Currency value collected this run.
    pub coins: u64,
    pub stomps: u64,
    pub score: u64,
    pub high_score: u64,
    pub seed: u64,
    pub player_sprite: String,
    pub game_over: bool,
}

/// The endless vertical climb.
pub struct ClimbGame {
    config: ClimbConfig,
    state: ClimbState,
    rng: StdRng,
    zones: ZoneManager,
    tiles: TileRegistry,
    tracker: AchievementTracker,
    storage: Box<dyn Storage>,
    pet: Option<Box<dyn PetSpriteSource>>,
    pending_input: ClimbInput,
    accumulator: f32,
    paused: bool,
    hidden: bool,
    /// Events from the last `update`.
    events: Vec<ClimbEvent>,
}

fn new_run(
    config: &ClimbConfig,
    zones: &ZoneManager,
    tiles: &TileRegistry,
    rng: &mut StdRng,
    seed: u64,
    high_score: u64,
    player_sprite: String,
) -> ClimbState {
    let player = ClimbPlayer::new(config.physics.field_width / 2.0, 0.0);
    let mut generator = LevelGenerator::new();
    let mut platforms = vec![LevelGenerator::floor_platform(config)];
    let ctx = GenContext {
        config,
        zones,
        tiles,
    };
    let batch = generator.top_up(player.y, &ctx, rng);
    platforms.extend(batch.platforms);

    let camera = Camera::new(player.y, &config.camera);
    let zone = zones.status(camera.height());
    ClimbState {
        player,
        platforms,
        collectibles: batch.collectibles,
        enemies: batch.enemies,
        particles: ParticlePool::default(),
        camera,
        zone,
        generator,
        elapsed: 0.0,
        coins: 0,
        stomps: 0,
        score: 0,
        high_score,
        seed,
        player_sprite,
        game_over: false,
    }
}

impl ClimbGame {
    /// Create a game backed by `storage` for achievements, stats and high score.
    pub fn new(config: ClimbConfig, storage: Box<dyn Storage>) -> Self {
        let config = config.validated();
        let tracker = AchievementTracker::load(storage.as_ref(), config.persistence.flush_interval_secs);
        let seed = config
            .generation
            .seed
            .unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);
        let zones = ZoneManager::standard();
        let tiles = TileRegistry::standard();
        let state = new_run(
            &config,
            &zones,
            &tiles,
            &mut rng,
            seed,
            tracker.high_score(),
            PLACEHOLDER_SPRITE.to_string(),
        );

        let mut game = Self {
            config,
            state,
            rng,
            zones,
            tiles,
            tracker,
            storage,
            pet: None,
            pending_input: ClimbInput::default(),
            accumulator: 0.0,
            paused: false,
            hidden: false,
            events: Vec::new(),
        };
        game.begin_run();
        game
    }

    /// Use the pet's current look for the player sprite.
    pub fn with_pet(mut self, pet: Box<dyn PetSpriteSource>) -> Self {
        self.pet = Some(pet);
        self.refresh_sprite();
        self
    }

    pub fn state(&self) -> &ClimbState {
        &self.state
    }

    pub fn config(&self) -> &ClimbConfig {
        &self.config
    }

    pub fn tracker(&self) -> &AchievementTracker {
        &self.tracker
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Climb events produced by the last `update`.
    pub fn recent_events(&self) -> &[ClimbEvent] {
        &self.events
    }

    /// Colors of the zone the camera is in.
    pub fn palette(&self) -> Palette {
        self.state.zone.current.profile().palette
    }

    fn begin_run(&mut self) {
        // The starting zone counts as visited.
        self.tracker.observe(&ClimbEvent::ZoneEntered {
            zone: self.state.zone.current,
            first_visit: !self.tracker.has_visited(self.state.zone.current),
        });
        tracing::info!(seed = self.state.seed, "Climb run started");
    }

    fn refresh_sprite(&mut self) {
        let sprite = match &self.pet {
            Some(source) => pet::resolve_sprite(source.as_ref()),
            None => PLACEHOLDER_SPRITE.to_string(),
        };
        if sprite != self.state.player_sprite {
            self.state.player_sprite = sprite;
        }
    }

    /// Advance the world by one fixed step.
    fn step(&mut self, input: &ClimbInput, dt: f32) -> Vec<ClimbEvent> {
        let mut events = Vec::new();
        self.state.elapsed += dt;
        let now = self.state.elapsed;
        let field_width = self.config.physics.field_width;
        let half_width = self.config.physics.player_width / 2.0;
        let body_height = self.config.physics.player_height;

        // Intent and velocity
        let jump = physics::integrate(&mut self.state.player, input, &self.config.physics, dt);
        if let Some(kind) = jump {
            if kind == JumpKind::Extra
                && powerups::consume(&mut self.state.player, PowerUpKind::DoubleJump)
            {
                events.push(ClimbEvent::PowerUpConsumed {
                    kind: PowerUpKind::DoubleJump,
                });
            }
            events.push(ClimbEvent::Jumped {
                air: kind != JumpKind::Ground,
            });
        }

        // Content ahead of the player
        let ctx = GenContext {
            config: &self.config,
            zones: &self.zones,
            tiles: &self.tiles,
        };
        let reach = self.state.player.max_height.max(self.state.player.y);
        let batch = self.state.generator.top_up(reach, &ctx, &mut self.rng);
        self.state.platforms.extend(batch.platforms);
        self.state.collectibles.extend(batch.collectibles);
        self.state.enemies.extend(batch.enemies);

        // Moving platforms and per-tick tile behaviour
        for platform in &mut self.state.platforms {
            platform.advance(dt, field_width);
            match self.tiles.tick(platform, dt) {
                Some(TickEffect::WindPulse { force }) => {
                    if (self.state.player.y - platform.y).abs() <= tiles::WIND_REACH {
                        let max = self.config.physics.max_horizontal_speed;
                        self.state.player.vx = (self.state.player.vx + force).clamp(-max, max);
                    }
                },
                Some(TickEffect::Crumbled) => {
                    tracing::debug!(platform = platform.id, "Platform crumbled");
                },
                None => {},
            }
        }

        // Swept landing
        let fall_vy = self.state.player.vy;
        let prev_y = self.state.player.y;
        let next_y = prev_y + fall_vy * dt;
        self.state.player.x =
            physics::wrap_x(self.state.player.x + self.state.player.vx * dt, field_width);
        let landing = if fall_vy < 0.0 {
            collision::find_landing(
                prev_y,
                next_y,
                self.state.player.x,
                half_width,
                &self.state.platforms,
            )
        } else {
            None
        };

        match landing {
            Some(landing) => {
                let player = &mut self.state.player;
                let platform = &mut self.state.platforms[landing.index];
                player.y = landing.top;
                player.x = physics::wrap_x(landing.corrected_x + platform.last_dx, field_width);
                player.vy = self.config.physics.landing_rebound(player.jump_multiplier);
                player.grounded = true;
                player.double_jump_available = true;
                player.surface = platform.kind();
                player.attached_platform = platform.movement.as_ref().map(|_| platform.id);
                platform.effects.trigger(EffectKind::Squish, 0.3);
                events.push(ClimbEvent::Landed {
                    platform: platform.id,
                    zone: platform.zone,
                    special: platform.kind(),
                });
                self.state.particles.spawn_burst(
                    &mut self.rng,
                    player.x,
                    landing.top,
                    platform.zone.profile().palette.accent,
                    LANDING_PARTICLES,
                );

                let mut ctx = LandingContext {
                    physics: &self.config.physics,
                    jump_multiplier: player.jump_multiplier,
                    rng: &mut self.rng,
                };
                let tile_effects = self.tiles.on_land(platform, &mut ctx);
                let (from, zone) = (platform.id, platform.zone);
                for effect in tile_effects {
                    self.apply_tile_effect(effect, from, zone, now, &mut events);
                }
            },
            None => {
                let player = &mut self.state.player;
                player.y = next_y;
                player.grounded = false;
                player.attached_platform = None;
            },
        }

        // Enemies
        let mut hit = false;
        for enemy in &mut self.state.enemies {
            enemy.advance(dt);
            let player = &mut self.state.player;
            let contact = collision::enemy_contact(
                player.x,
                player.y,
                prev_y,
                fall_vy,
                half_width,
                body_height,
                enemy,
            );
            match contact {
                Some(EnemyContact::Stomp) => {
                    enemy.dead = true;
                    player.vy = self.config.physics.landing_rebound(player.jump_multiplier);
                    self.state.stomps += 1;
                    events.push(ClimbEvent::EnemyStomped { kind: enemy.kind });
                },
                Some(EnemyContact::Hit) if player.shield => {
                    enemy.dead = true;
                    powerups::consume(player, PowerUpKind::Shield);
                    events.push(ClimbEvent::ShieldBroken);
                    events.push(ClimbEvent::PowerUpConsumed {
                        kind: PowerUpKind::Shield,
                    });
                },
                Some(EnemyContact::Hit) => {
                    hit = true;
                    break;
                },
                None => {},
            }
        }

        // Collectibles and magnet
        let cx = self.state.player.x;
        let cy = self.state.player.y + body_height / 2.0;
        let magnet = self.state.player.magnet_range;
        let zone_now = self.state.zone.current;
        for c in &mut self.state.collectibles {
            if c.collected {
                continue;
            }
            collision::magnet_pull(c, cx, cy, magnet, dt);
            if !collision::within_pickup(cx, cy, c) {
                continue;
            }
            c.collected = true;
            match c.kind {
                CollectibleKind::PowerUp(kind) => {
                    powerups::apply(&mut self.state.player, kind, zone_now, now);
                    events.push(ClimbEvent::PowerUpCollected {
                        kind,
                        zone: zone_now,
                    });
                },
                currency => {
                    self.state.coins += u64::from(currency.value());
                    events.push(ClimbEvent::CoinCollected {
                        value: currency.value(),
                        magnetized: magnet > 0.0,
                    });
                },
            }
            self.state
                .particles
                .spawn_burst(&mut self.rng, c.x, c.y, PICKUP_COLOR, PICKUP_PARTICLES);
        }
        self.state.collectibles.retain(|c| !c.collected);

        // Power-up timers
        for kind in powerups::update(&mut self.state.player, now) {
            events.push(ClimbEvent::PowerUpExpired { kind });
        }

        // Progress, camera and zone
        let player = &mut self.state.player;
        player.max_height = player.max_height.max(player.y);
        self.tracker.record_height(player.max_height);
        self.state
            .camera
            .update(player.y, player.vy, &self.config.camera);

        let status = self.zones.status(self.state.camera.height());
        if status.current != self.state.zone.current {
            let first_visit = !self.tracker.has_visited(status.current);
            if first_visit {
                tracing::info!(zone = status.current.name(), "Entered new zone");
            }
            events.push(ClimbEvent::ZoneEntered {
                zone: status.current,
                first_visit,
            });
        }
        self.state.zone = status;

        // Bounded world
        let cutoff = self.state.camera.floor() - self.config.generation.prune_distance;
        level_gen::prune_below(
            cutoff,
            &mut self.state.platforms,
            &mut self.state.collectibles,
            &mut self.state.enemies,
        );
        for platform in &mut self.state.platforms {
            platform.effects.decay(dt);
        }
        self.state.platforms.retain(|p| {
            let crumbled = p.kind() == Some(TileKind::Crumbling)
                && p.special.as_ref().is_some_and(|s| s.state <= 0.0);
            !(crumbled && !p.effects.is_active(EffectKind::Fade))
        });
        self.state.particles.update(dt);

        self.state.score = scoring::run_score(
            self.state.player.max_height,
            self.state.coins,
            self.state.stomps,
        );

        // Falling out of view
        let mut ended = hit;
        if !hit && self.state.player.y < self.state.camera.floor() {
            let player = &mut self.state.player;
            if player.shield {
                powerups::consume(player, PowerUpKind::Shield);
                player.y = self.state.camera.floor();
                player.vy = self.config.physics.bouncy_velocity;
                player.grounded = false;
                events.push(ClimbEvent::ShieldBroken);
                events.push(ClimbEvent::PowerUpConsumed {
                    kind: PowerUpKind::Shield,
                });
            } else {
                ended = true;
            }
        }

        for event in &events {
            self.tracker.observe(event);
        }
        events.extend(self.tracker.take_unlocked());

        if ended {
            self.finish_run(&mut events);
        } else {
            self.tracker.tick(dt, self.storage.as_mut());
        }
        events
    }

    fn apply_tile_effect(
        &mut self,
        effect: TileEffect,
        from: u32,
        zone: ZoneId,
        now: f32,
        events: &mut Vec<ClimbEvent>,
    ) {
        let player = &mut self.state.player;
        match effect {
            TileEffect::Rebound(velocity) => player.vy = velocity,
            TileEffect::GrantPowerUp(kind) => {
                powerups::apply(player, kind, zone, now);
                events.push(ClimbEvent::PowerUpCollected { kind, zone });
            },
            TileEffect::Teleport { partner } => {
                let Some(dest) = self.state.platforms.iter_mut().find(|p| p.id == partner) else {
                    return;
                };
                // The camera never comes back down for a partner below it.
                if dest.y < self.state.camera.target {
                    tracing::debug!(from, to = partner, "Teleport partner out of view, skipped");
                    return;
                }
                if let Some(tile) = dest.special.as_mut() {
                    tile.disarm_for(TELEPORT_COOLDOWN);
                }
                dest.effects.trigger(EffectKind::Glow, 1.0);
                player.x = dest.center_x();
                player.y = dest.y;
                player.attached_platform = None;
                events.push(ClimbEvent::Teleported { from, to: partner });
            },
            TileEffect::Nudge(force) => {
                let max = self.config.physics.max_horizontal_speed;
                player.vx = (player.vx + force).clamp(-max, max);
            },
        }
    }

    fn finish_run(&mut self, events: &mut Vec<ClimbEvent>) {
        self.state.game_over = true;
        self.tracker.record_game_played();
        let score = self.state.score;
        let new_high_score = self.tracker.submit_score(score, self.storage.as_mut());
        self.state.high_score = self.tracker.high_score();
        events.extend(self.tracker.take_unlocked());
        let _ = self.tracker.flush(self.storage.as_mut());

        tracing::info!(
            score,
            high_score = self.state.high_score,
            new_high_score,
            height = self.state.player.max_height,
            "Climb run over"
        );
        events.push(ClimbEvent::GameOver {
            score,
            high_score: self.state.high_score,
            new_high_score,
        });
    }
}

impl Default for ClimbGame {
    fn default() -> Self {
        Self::new(ClimbConfig::default(), Box::new(MemoryStorage::new()))
    }
}

impl FrameGame for ClimbGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Sky Climb".to_string(),
            description: "Bounce your pet ever higher through the sky!".to_string(),
            estimated_round_duration: Duration::from_secs(90),
        }
    }

    fn tick_rate(&self) -> f32 {
        self.config.tick_rate_hz
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.paused || self.hidden || self.state.game_over || !dt.is_finite() || dt <= 0.0 {
            return Vec::new();
        }
        self.refresh_sprite();
        self.events.clear();

        let step_dt = self.config.fixed_dt();
        let score_before = self.state.score;
        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= step_dt && steps < self.config.max_steps_per_frame {
            let input = self.pending_input.clone();
            // Press edges count for one step only.
            self.pending_input.jump_pressed = false;
            let step_events = self.step(&input, step_dt);
            self.events.extend(step_events);
            self.accumulator -= step_dt;
            steps += 1;
            if self.state.game_over {
                self.accumulator = 0.0;
                break;
            }
        }
        if self.accumulator >= step_dt {
            tracing::debug!(dropped = self.accumulator, "Dropping surplus frame time");
            self.accumulator = 0.0;
        }

        let mut out = Vec::new();
        if self.state.score != score_before {
            out.push(GameEvent::ScoreUpdate {
                score: self.state.score,
            });
        }
        for event in &self.events {
            match event {
                ClimbEvent::AchievementUnlocked { title, reward, .. } => {
                    out.push(GameEvent::Notification {
                        title: title.clone(),
                        reward_credits: *reward,
                    });
                },
                ClimbEvent::GameOver {
                    score,
                    new_high_score,
                    ..
                } => out.push(GameEvent::RoundComplete {
                    score: *score,
                    new_high_score: *new_high_score,
                }),
                _ => {},
            }
        }
        out
    }

    frame_game_boilerplate!(state_type: ClimbState);

    fn apply_input(&mut self, input: &[u8]) {
        let Ok(ci) = rmp_serde::from_slice::<ClimbInput>(input) else {
            tracing::debug!("Ignoring undecodable climb input ({} bytes)", input.len());
            return;
        };
        if ci.pause_pressed {
            self.paused = !self.paused;
        }
        // Edges accumulate until a step consumes them; levels take the latest value.
        self.pending_input.axis = ci.axis;
        self.pending_input.jump_held = ci.jump_held;
        if ci.jump_pressed {
            self.pending_input.jump_pressed = true;
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if visible == !self.hidden {
            return;
        }
        self.hidden = !visible;
        if self.hidden {
            if self.tracker.is_dirty() {
                let _ = self.tracker.flush(self.storage.as_mut());
            }
        } else {
            // Time spent hidden is not simulated.
            self.accumulator = 0.0;
        }
    }

    fn restart(&mut self) {
        let seed = self
            .config
            .generation
            .seed
            .unwrap_or_else(|| self.rng.random());
        self.rng = StdRng::seed_from_u64(seed);
        let sprite = std::mem::take(&mut self.state.player_sprite);
        self.state = new_run(
            &self.config,
            &self.zones,
            &self.tiles,
            &mut self.rng,
            seed,
            self.tracker.high_score(),
            sprite,
        );
        self.pending_input = ClimbInput::default();
        self.accumulator = 0.0;
        self.paused = false;
        self.events.clear();
        self.begin_run();
    }
}

#[cfg(test)]
mod tests {
    use petpal_core::pet::{PetMood, StaticPet};
    use petpal_core::test_helpers::FRAME_DT;

    use super::*;
    use crate::achievements::HIGH_SCORE_KEY;

    fn test_game() -> ClimbGame {
        let mut config = ClimbConfig::default();
        config.generation.seed = Some(7);
        ClimbGame::new(config, Box::new(MemoryStorage::new()))
    }

    /// Replace the world with `platforms` and stop further generation.
    fn isolate(game: &mut ClimbGame, platforms: Vec<Platform>) {
        game.state.platforms = platforms;
        game.state.enemies.clear();
        game.state.collectibles.clear();
        game.state.generator.frontier = 1.0e6;
    }

    fn falling_at(game: &mut ClimbGame, x: f32, y: f32, vy: f32) {
        let player = &mut game.state.player;
        player.x = x;
        player.y = y;
        player.vy = vy;
        player.grounded = false;
        player.coyote_timer = 0.0;
    }

    fn encode(input: &ClimbInput) -> Vec<u8> {
        rmp_serde::to_vec(input).unwrap()
    }

    fn idle() -> ClimbInput {
        ClimbInput::default()
    }

    #[test]
    fn new_run_starts_on_floor_with_content_ahead() {
        let game = test_game();
        let state = game.state();
        assert_eq!(state.player.y, 0.0);
        assert!(state.player.grounded);
        assert_eq!(state.platforms[0].id, 0);
        assert!(state.generator.frontier >= game.config().generation.lookahead);
        assert_eq!(state.zone.current, ZoneId::Meadow);
        assert!(game.tracker().has_visited(ZoneId::Meadow));
    }

    #[test]
    fn falling_onto_bouncy_uses_bouncy_impulse() {
        let mut game = test_game();
        let mut platform = Platform::new(99, 150.0, -0.5, 100.0, 14.0, ZoneId::Meadow);
        platform.special = Some(game.tiles.create(TileKind::Bouncy, &mut game.rng));
        isolate(&mut game, vec![platform]);
        falling_at(&mut game, 200.0, 0.0, -10.0);

        let events = game.step(&idle(), FRAME_DT);
        assert!(game.state.player.grounded);
        assert_eq!(game.state.player.vy, game.config.physics.bouncy_velocity);
        assert_ne!(
            game.state.player.vy,
            game.config.physics.landing_rebound(1.0),
            "Bouncy tile must replace the default rebound"
        );
        assert!(events.iter().any(|e| matches!(
            e,
            ClimbEvent::Landed {
                platform: 99,
                special: Some(TileKind::Bouncy),
                ..
            }
        )));
    }

    #[test]
    fn plain_landing_uses_dampened_rebound() {
        let mut game = test_game();
        isolate(
            &mut game,
            vec![Platform::new(5, 150.0, -0.5, 100.0, 14.0, ZoneId::Meadow)],
        );
        falling_at(&mut game, 200.0, 0.0, -10.0);
        game.step(&idle(), FRAME_DT);
        assert_eq!(
            game.state.player.vy,
            game.config.physics.landing_rebound(1.0)
        );
        assert_eq!(game.state.player.y, -0.5);
    }

    #[test]
    fn every_tile_kind_lands_grounded_with_upward_rebound() {
        for kind in TileKind::ALL {
            let mut game = test_game();
            let mut platform = Platform::new(1, 150.0, -0.5, 100.0, 14.0, ZoneId::Orbit);
            platform.special = Some(game.tiles.create(kind, &mut game.rng));
            isolate(&mut game, vec![platform]);
            falling_at(&mut game, 200.0, 0.0, -10.0);

            game.step(&idle(), FRAME_DT);
            // A granted rocket launches straight off the tile.
            let launched = game.state.player.power_ups.contains(PowerUpKind::Rocket);
            assert!(
                game.state.player.grounded || launched,
                "{kind:?} landing must ground"
            );
            assert!(game.state.player.vy > 0.0, "{kind:?} landing must rebound");
        }
    }

    fn teleporter_pair(game: &mut ClimbGame, partner_y: f32) {
        let mut source = Platform::new(1, 150.0, 999.5, 100.0, 14.0, ZoneId::Orbit);
        let mut tile = game.tiles.create(TileKind::Teleporter, &mut game.rng);
        tile.partner = Some(2);
        source.special = Some(tile.clone());
        let mut dest = Platform::new(2, 150.0, partner_y, 100.0, 14.0, ZoneId::Orbit);
        tile.partner = Some(1);
        dest.special = Some(tile);
        isolate(game, vec![source, dest]);
        game.state.camera.y = 750.0;
        game.state.camera.target = 750.0;
        falling_at(game, 200.0, 1000.0, -10.0);
    }

    #[test]
    fn teleport_skips_partner_below_the_view() {
        let mut game = test_game();
        teleporter_pair(&mut game, 500.0);

        let events = game.step(&idle(), FRAME_DT);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, ClimbEvent::Teleported { .. }))
        );
        assert!(!game.state.game_over);
        assert!(game.state.player.grounded);
        assert!((game.state.player.y - 999.5).abs() < 1e-3);
    }

    #[test]
    fn teleport_moves_player_to_partner_above() {
        let mut game = test_game();
        teleporter_pair(&mut game, 1400.0);

        let events = game.step(&idle(), FRAME_DT);
        assert!(events.contains(&ClimbEvent::Teleported { from: 1, to: 2 }));
        assert!(!game.state.game_over);
        assert_eq!(game.state.player.y, 1400.0);
        assert_eq!(game.state.player.x, 200.0);
        let dest = game.state.platforms.iter().find(|p| p.id == 2).unwrap();
        assert!(!dest.special.as_ref().unwrap().armed);
    }

    #[test]
    fn powerup_air_jump_is_spent_after_landing_charge() {
        let mut game = test_game();
        isolate(&mut game, Vec::new());
        falling_at(&mut game, 200.0, 400.0, 0.0);
        let zone = game.state.zone.current;
        powerups::apply(&mut game.state.player, PowerUpKind::DoubleJump, zone, 0.0);
        let press = ClimbInput {
            jump_pressed: true,
            jump_held: true,
            ..Default::default()
        };

        let first = game.step(&press, FRAME_DT);
        assert!(first.contains(&ClimbEvent::Jumped { air: true }));
        assert!(game.state.player.power_ups.contains(PowerUpKind::DoubleJump));

        let second = game.step(&press, FRAME_DT);
        assert!(second.contains(&ClimbEvent::Jumped { air: true }));
        assert!(second.contains(&ClimbEvent::PowerUpConsumed {
            kind: PowerUpKind::DoubleJump
        }));
        assert!(!game.state.player.power_ups.contains(PowerUpKind::DoubleJump));
        let third = game.step(&press, FRAME_DT);
        assert!(!third.iter().any(|e| matches!(e, ClimbEvent::Jumped { .. })));
    }

    #[test]
    fn landing_restores_air_jump_and_inherits_platform_motion() {
        let mut game = test_game();
        let mut platform = Platform::new(3, 150.0, -0.5, 100.0, 14.0, ZoneId::Clouds);
        platform.movement = Some(entities::Movement {
            speed: 60.0,
            direction: 1.0,
            range: 40.0,
            anchor_x: 150.0,
        });
        isolate(&mut game, vec![platform]);
        falling_at(&mut game, 200.0, 0.0, -10.0);
        game.state.player.double_jump_available = false;

        game.step(&idle(), FRAME_DT);
        let player = &game.state.player;
        assert!(player.double_jump_available);
        assert_eq!(player.attached_platform, Some(3));
        assert!(player.x > 200.0, "Rider should move with the platform");
    }

    #[test]
    fn coin_magnet_twice_keeps_one_record_with_fresh_expiry() {
        let mut game = test_game();
        game.state.collectibles.clear();
        game.state.enemies.clear();
        let drop_magnet = |game: &mut ClimbGame| {
            let p = &game.state.player;
            let magnet = Collectible {
                x: p.x,
                y: p.y + game.config.physics.player_height / 2.0,
                kind: CollectibleKind::PowerUp(PowerUpKind::CoinMagnet),
                collected: false,
            };
            game.state.collectibles.push(magnet);
        };

        drop_magnet(&mut game);
        game.step(&idle(), FRAME_DT);
        let first = game
            .state
            .player
            .power_ups
            .get(PowerUpKind::CoinMagnet)
            .map(|p| p.started_at)
            .unwrap();

        for _ in 0..30 {
            game.step(&idle(), FRAME_DT);
        }
        drop_magnet(&mut game);
        game.step(&idle(), FRAME_DT);
        let now = game.state.elapsed;

        let magnets: Vec<_> = game
            .state
            .player
            .power_ups
            .iter()
            .filter(|p| p.kind == PowerUpKind::CoinMagnet)
            .collect();
        assert_eq!(magnets.len(), 1);
        assert!(magnets[0].started_at > first);
        assert_eq!(
            magnets[0].expires_at(),
            now + powerups::scaled_duration(PowerUpKind::CoinMagnet, ZoneId::Meadow)
        );
    }

    #[test]
    fn zone_entry_unlocks_once_across_flicker() {
        let mut game = test_game();
        isolate(&mut game, Vec::new());
        game.state.camera.y = 1300.0;
        game.state.camera.target = 1300.0;
        falling_at(&mut game, 200.0, 1700.0, 0.0);

        let events = game.step(&idle(), FRAME_DT);
        assert_eq!(game.state.zone.current, ZoneId::Clouds);
        assert!((0.0..=1.0).contains(&game.state.zone.progress));
        assert!(events.contains(&ClimbEvent::ZoneEntered {
            zone: ZoneId::Clouds,
            first_visit: true
        }));
        let unlocks = |events: &[ClimbEvent]| {
            events
                .iter()
                .filter(|e| {
                    matches!(e, ClimbEvent::AchievementUnlocked { id, .. } if id == "zone_clouds")
                })
                .count()
        };
        assert_eq!(unlocks(&events), 1);

        // Report the boundary crossing again.
        game.state.zone.current = ZoneId::Meadow;
        falling_at(&mut game, 200.0, 1700.0, 0.0);
        let events = game.step(&idle(), FRAME_DT);
        assert!(events.contains(&ClimbEvent::ZoneEntered {
            zone: ZoneId::Clouds,
            first_visit: false
        }));
        assert_eq!(unlocks(&events), 0);
    }

    #[test]
    fn falling_below_view_ends_run_and_persists_high_score() {
        let mut game = test_game();
        isolate(&mut game, Vec::new());
        game.state.player.max_height = 2000.0;
        let floor = game.state.camera.floor();
        falling_at(&mut game, 200.0, floor - 50.0, -500.0);

        let events = game.step(&idle(), FRAME_DT);
        assert!(game.state.game_over);
        assert!(events.contains(&ClimbEvent::GameOver {
            score: 200,
            high_score: 200,
            new_high_score: true
        }));
        assert_eq!(
            game.storage().get(HIGH_SCORE_KEY).unwrap().as_deref(),
            Some("200")
        );
        assert_eq!(game.tracker().stats().games_played, 1);

        assert!(game.is_round_complete());
        assert!(game.update(0.5).is_empty(), "A finished run stays frozen");

        game.restart();
        assert!(!game.is_round_complete());
        assert_eq!(game.state.high_score, 200);
        assert_eq!(game.state.elapsed, 0.0);
        assert_eq!(game.state.player.y, 0.0);
    }

    #[test]
    fn shield_rescues_from_fall() {
        let mut game = test_game();
        isolate(&mut game, Vec::new());
        powerups::apply(&mut game.state.player, PowerUpKind::Shield, ZoneId::Meadow, 0.0);
        let floor = game.state.camera.floor();
        falling_at(&mut game, 200.0, floor - 10.0, -500.0);

        let events = game.step(&idle(), FRAME_DT);
        assert!(!game.state.game_over);
        assert!(!game.state.player.shield);
        assert!(game.state.player.vy > 0.0);
        assert!(events.contains(&ClimbEvent::ShieldBroken));
    }

    #[test]
    fn stomping_enemy_rebounds() {
        let mut game = test_game();
        isolate(&mut game, Vec::new());
        falling_at(&mut game, 200.0, 100.0, -300.0);
        let radius = entities::EnemyKind::Beetle.radius();
        game.state.enemies.push(Enemy::new(
            entities::EnemyKind::Beetle,
            200.0,
            99.0 - 2.0 * radius,
            0.0,
            0.0,
        ));

        let events = game.step(&idle(), FRAME_DT);
        assert!(events.iter().any(|e| matches!(e, ClimbEvent::EnemyStomped { .. })));
        assert!(game.state.player.vy > 0.0);
        assert_eq!(game.state.stomps, 1);
        assert!(game.state.enemies.iter().all(|e| e.dead) || game.state.enemies.is_empty());
        assert!(!game.state.game_over);
    }

    #[test]
    fn enemy_hit_ends_run_without_shield() {
        let mut game = test_game();
        isolate(&mut game, Vec::new());
        falling_at(&mut game, 200.0, 100.0, 300.0);
        game.state.enemies.push(Enemy::new(
            entities::EnemyKind::Beetle,
            200.0,
            90.0,
            0.0,
            0.0,
        ));
        let events = game.step(&idle(), FRAME_DT);
        assert!(game.state.game_over);
        assert!(events.iter().any(|e| matches!(e, ClimbEvent::GameOver { .. })));
    }

    #[test]
    fn enemy_hit_with_shield_breaks_shield() {
        let mut game = test_game();
        isolate(&mut game, Vec::new());
        powerups::apply(&mut game.state.player, PowerUpKind::Shield, ZoneId::Meadow, 0.0);
        falling_at(&mut game, 200.0, 100.0, 300.0);
        game.state.enemies.push(Enemy::new(
            entities::EnemyKind::Beetle,
            200.0,
            90.0,
            0.0,
            0.0,
        ));
        let events = game.step(&idle(), FRAME_DT);
        assert!(!game.state.game_over);
        assert!(events.contains(&ClimbEvent::ShieldBroken));
        assert!(!game.state.player.shield);
    }

    #[test]
    fn jump_edge_survives_overwrite_before_tick() {
        let mut game = test_game();
        game.apply_input(&encode(&ClimbInput {
            jump_pressed: true,
            jump_held: true,
            ..Default::default()
        }));
        game.apply_input(&encode(&ClimbInput {
            axis: 1.0,
            ..Default::default()
        }));
        assert!(game.pending_input.jump_pressed);
        assert!(!game.pending_input.jump_held);
        assert_eq!(game.pending_input.axis, 1.0);

        game.update(FRAME_DT);
        assert!(!game.pending_input.jump_pressed, "Edge is consumed by the step");
        assert!(
            game.recent_events()
                .iter()
                .any(|e| matches!(e, ClimbEvent::Jumped { air: false }))
        );
    }

    #[test]
    fn edge_waits_when_no_step_runs() {
        let mut game = test_game();
        game.apply_input(&encode(&ClimbInput {
            jump_pressed: true,
            ..Default::default()
        }));
        game.update(FRAME_DT / 4.0);
        assert!(game.pending_input.jump_pressed);
    }

    #[test]
    fn pause_key_toggles() {
        let mut game = test_game();
        let pause = encode(&ClimbInput {
            pause_pressed: true,
            ..Default::default()
        });
        game.apply_input(&pause);
        assert!(game.is_paused());
        let elapsed = game.state.elapsed;
        game.update(0.5);
        assert_eq!(game.state.elapsed, elapsed, "Timers freeze while paused");
        game.apply_input(&pause);
        assert!(!game.is_paused());
    }

    #[test]
    fn long_frames_drop_surplus_time() {
        let mut game = test_game();
        game.update(10.0);
        let max = game.config.max_steps_per_frame as f32 * game.config.fixed_dt();
        assert!((game.state.elapsed - max).abs() < 1e-4);
        assert_eq!(game.accumulator, 0.0);
    }

    #[test]
    fn world_stays_bounded_while_climbing() {
        let mut game = test_game();
        for _ in 0..600 {
            game.state.enemies.clear();
            game.state.player.y += 30.0;
            game.state.player.vy = 0.0;
            game.step(&idle(), FRAME_DT);
            assert!(!game.state.game_over);
        }
        let cutoff = game.state.camera.floor() - game.config.generation.prune_distance;
        assert!(game.state.platforms.iter().all(|p| p.y >= cutoff));
        assert!(game.state.platforms.len() < 200);
        assert_eq!(game.state.zone.current, ZoneId::Nebula);
    }

    #[test]
    fn pet_sprite_follows_mood_with_placeholder_fallback() {
        let game = test_game().with_pet(Box::new(StaticPet::new(PetMood::Happy)));
        assert_eq!(game.state.player_sprite, "sprites/pet/happy.png");

        let game = test_game().with_pet(Box::new(StaticPet {
            mood: PetMood::Sad,
            missing: vec![PetMood::Sad],
        }));
        assert_eq!(game.state.player_sprite, PLACEHOLDER_SPRITE);
    }

    #[test]
    fn hiding_flushes_dirty_progress() {
        let mut game = test_game();
        game.update(FRAME_DT);
        assert!(game.tracker().is_dirty());
        game.set_visible(false);
        assert!(!game.tracker().is_dirty());
        assert!(game.storage().get(achievements::STATS_KEY).unwrap().is_some());
    }

    #[test]
    fn score_update_reported_on_progress() {
        let mut game = test_game();
        isolate(&mut game, Vec::new());
        falling_at(&mut game, 200.0, 505.0, 0.0);
        let events = game.update(FRAME_DT);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::ScoreUpdate { score: 50 }))
        );
    }

    // ================================================================
    // Game trait contract tests
    // ================================================================

    #[test]
    fn contract_fresh_game_has_state() {
        let game = test_game();
        petpal_core::test_helpers::contract_fresh_game_has_state(&game);
    }

    #[test]
    fn contract_apply_input_changes_state() {
        let mut game = test_game();
        let data = encode(&ClimbInput {
            axis: 1.0,
            jump_pressed: true,
            jump_held: true,
            pause_pressed: false,
        });
        petpal_core::test_helpers::contract_apply_input_changes_state(&mut game, &data);
    }

    #[test]
    fn contract_update_advances_time() {
        let mut game = test_game();
        petpal_core::test_helpers::contract_update_advances_time(&mut game);
    }

    #[test]
    fn contract_state_roundtrip_preserves() {
        let mut game = test_game();
        petpal_core::test_helpers::run_frames(&mut game, 30, FRAME_DT);
        petpal_core::test_helpers::contract_state_roundtrip_preserves(&mut game);
    }

    #[test]
    fn contract_pause_stops_updates() {
        let mut game = test_game();
        petpal_core::test_helpers::contract_pause_stops_updates(&mut game);
    }

    #[test]
    fn contract_hidden_stops_updates() {
        let mut game = test_game();
        petpal_core::test_helpers::contract_hidden_stops_updates(&mut game);
    }

    #[test]
    fn contract_garbage_input_ignored() {
        let mut game = test_game();
        petpal_core::test_helpers::contract_garbage_input_ignored(&mut game);
    }

    #[test]
    fn contract_truncated_state_ignored() {
        let mut game = test_game();
        petpal_core::test_helpers::contract_truncated_state_ignored(&mut game);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn camera_never_retreats_during_play(
                seed in 0u64..200,
                moves in proptest::collection::vec((-1i8..=1, any::<bool>()), 30..240)
            ) {
                let mut config = ClimbConfig::default();
                config.generation.seed = Some(seed);
                let mut game = ClimbGame::new(config, Box::new(MemoryStorage::new()));
                let field_width = game.config().physics.field_width;
                let mut last = game.state().camera.y;

                for (axis, jump) in moves {
                    game.apply_input(&encode(&ClimbInput {
                        axis: f32::from(axis),
                        jump_pressed: jump,
                        jump_held: jump,
                        pause_pressed: false,
                    }));
                    game.update(FRAME_DT);

                    let state = game.state();
                    prop_assert!(state.camera.y >= last);
                    prop_assert!(state.player.x.is_finite() && state.player.y.is_finite());
                    prop_assert!(state.player.x >= 0.0 && state.player.x <= field_width);
                    last = state.camera.y;
                    if game.is_round_complete() {
                        break;
                    }
                }
            }
        }
    }
}
