use serde::{Deserialize, Serialize};

/// Gravity while airborne (px/s^2, downward).
pub const GRAVITY: f32 = 1800.0;
/// Gravity inside the coyote window right after touching a platform.
pub const GROUNDED_GRAVITY: f32 = 1500.0;
/// Initial velocity of a ground (or coyote) jump.
pub const JUMP_VELOCITY: f32 = 820.0;
/// Air jump impulse relative to a ground jump.
pub const DOUBLE_JUMP_FACTOR: f32 = 0.85;
/// Rebound velocity applied on every landing before dampening.
pub const LANDING_BOUNCE: f32 = 760.0;
/// Global dampening applied to the landing rebound.
pub const BOUNCE_DAMPENING: f32 = 0.95;
/// Rebound from a bouncy tile (replaces the landing rebound).
pub const BOUNCY_VELOCITY: f32 = 1250.0;
/// Horizontal speed at full axis deflection.
pub const BASE_SPEED: f32 = 260.0;
/// Hard cap on horizontal speed.
pub const MAX_HORIZONTAL_SPEED: f32 = 520.0;
/// Hard cap on fall speed.
pub const TERMINAL_VELOCITY: f32 = 1100.0;
/// Fraction of the gap to the target horizontal speed closed per tick on the ground.
pub const GROUND_CONTROL: f32 = 0.25;
/// Air control relative to ground control.
pub const AIR_CONTROL_RATIO: f32 = 0.82;
/// Ground control while the last surface was ice.
pub const ICE_CONTROL: f32 = 0.04;
/// Grace window after leaving a platform in which a jump counts as grounded.
pub const COYOTE_TIME: f32 = 0.2;
/// How long an early jump press is remembered.
pub const JUMP_BUFFER: f32 = 0.15;
/// Play-field width; horizontal position wraps at both edges.
pub const FIELD_WIDTH: f32 = 400.0;
pub const PLAYER_WIDTH: f32 = 28.0;
pub const PLAYER_HEIGHT: f32 = 32.0;

/// Physics tuning, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub grounded_gravity: f32,
    pub jump_velocity: f32,
    pub double_jump_factor: f32,
    pub landing_bounce: f32,
    pub bounce_dampening: f32,
    pub bouncy_velocity: f32,
    pub base_speed: f32,
    pub max_horizontal_speed: f32,
    pub terminal_velocity: f32,
    pub ground_control: f32,
    pub air_control_ratio: f32,
    pub ice_control: f32,
    pub coyote_time: f32,
    pub jump_buffer: f32,
    pub field_width: f32,
    pub player_width: f32,
    pub player_height: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            grounded_gravity: GROUNDED_GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            double_jump_factor: DOUBLE_JUMP_FACTOR,
            landing_bounce: LANDING_BOUNCE,
            bounce_dampening: BOUNCE_DAMPENING,
            bouncy_velocity: BOUNCY_VELOCITY,
            base_speed: BASE_SPEED,
            max_horizontal_speed: MAX_HORIZONTAL_SPEED,
            terminal_velocity: TERMINAL_VELOCITY,
            ground_control: GROUND_CONTROL,
            air_control_ratio: AIR_CONTROL_RATIO,
            ice_control: ICE_CONTROL,
            coyote_time: COYOTE_TIME,
            jump_buffer: JUMP_BUFFER,
            field_width: FIELD_WIDTH,
            player_width: PLAYER_WIDTH,
            player_height: PLAYER_HEIGHT,
        }
    }
}

impl PhysicsConfig {
    /// Apex of a ground jump with no modifiers, under airborne gravity.
    pub fn max_jump_height(&self) -> f32 {
        self.jump_velocity * self.jump_velocity / (2.0 * self.gravity)
    }

    /// Rebound applied by a plain landing with the given jump multiplier.
    pub fn landing_rebound(&self, jump_multiplier: f32) -> f32 {
        self.landing_bounce * jump_multiplier * self.bounce_dampening
    }
}

/// Procedural generation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Nominal vertical distance between consecutive platforms.
    pub platform_gap: f32,
    /// Random +/- variation applied to the gap.
    pub gap_jitter: f32,
    /// Largest gap as a fraction of the reachable jump height.
    pub reach_safety: f32,
    pub platform_thickness: f32,
    pub batch_size: usize,
    /// Generate the next batch once the player is this close to the frontier.
    pub lookahead: f32,
    pub enemy_chance: f64,
    /// No enemies below this height.
    pub enemy_safe_height: f32,
    pub collectible_chance: f64,
    /// Entities this far below the camera floor are dropped.
    pub prune_distance: f32,
    /// Fixed seed for reproducible runs. Random when unset.
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            platform_gap: 95.0,
            gap_jitter: 20.0,
            reach_safety: 0.85,
            platform_thickness: 14.0,
            batch_size: 12,
            lookahead: 900.0,
            enemy_chance: 0.12,
            enemy_safe_height: 800.0,
            collectible_chance: 0.35,
            prune_distance: 600.0,
            seed: None,
        }
    }
}

/// Camera follow tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub viewport_height: f32,
    /// Seconds of vertical velocity added to the follow target.
    pub lookahead: f32,
    pub min_smoothing: f32,
    pub max_smoothing: f32,
    /// Extra smoothing per pixel of remaining distance.
    pub smoothing_per_px: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            viewport_height: 600.0,
            lookahead: 0.15,
            min_smoothing: 0.08,
            max_smoothing: 0.35,
            smoothing_per_px: 0.002,
        }
    }
}

/// Progress persistence tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Minimum simulation time between achievement/stat flushes.
    pub flush_interval_secs: f32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: 5.0,
        }
    }
}

/// Top-level climb configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimbConfig {
    pub physics: PhysicsConfig,
    pub generation: GenerationConfig,
    pub camera: CameraConfig,
    pub persistence: PersistenceConfig,
    pub tick_rate_hz: f32,
    /// Fixed steps allowed per frame before surplus time is dropped.
    pub max_steps_per_frame: u32,
}

impl Default for ClimbConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            generation: GenerationConfig::default(),
            camera: CameraConfig::default(),
            persistence: PersistenceConfig::default(),
            tick_rate_hz: 60.0,
            max_steps_per_frame: 5,
        }
    }
}

impl ClimbConfig {
    /// Load config from a TOML file. Falls back to defaults if the file is missing
    /// or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("PETPAL_CLIMB_CONFIG")
            .unwrap_or_else(|_| "config/climb.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(cfg) => cfg.validated(),
                Err(e) => {
                    tracing::warn!("Failed to parse {path}: {e}, using defaults");
                    ClimbConfig::default()
                },
            },
            Err(_) => ClimbConfig::default(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<ClimbConfig>(content)
    }

    /// Clamp values that would make the game unplayable or the loop unstable.
    ///
    /// The widest generated gap must stay under the reachable jump height,
    /// otherwise a run can become unwinnable.
    pub fn validated(mut self) -> Self {
        if !(self.tick_rate_hz.is_finite() && self.tick_rate_hz >= 10.0) {
            tracing::warn!("tick_rate_hz {} too low, using 60", self.tick_rate_hz);
            self.tick_rate_hz = 60.0;
        }
        self.max_steps_per_frame = self.max_steps_per_frame.max(1);
        self.generation.batch_size = self.generation.batch_size.max(1);
        self.generation.reach_safety = self.generation.reach_safety.clamp(0.1, 1.0);

        let reach = self.max_gap();
        let widest = self.generation.platform_gap + self.generation.gap_jitter;
        if widest > reach || self.generation.platform_gap <= 0.0 {
            let jitter = self.generation.gap_jitter.clamp(0.0, reach * 0.2);
            let gap = (reach - jitter).max(1.0);
            tracing::warn!(
                "Platform gap {widest} exceeds reachable height {reach}, clamping to {gap}+/-{jitter}"
            );
            self.generation.platform_gap = gap;
            self.generation.gap_jitter = jitter;
        }
        self
    }

    /// Largest vertical gap the generator may produce.
    pub fn max_gap(&self) -> f32 {
        self.physics.max_jump_height() * self.generation.reach_safety
    }

    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_rate_hz
    }
}
