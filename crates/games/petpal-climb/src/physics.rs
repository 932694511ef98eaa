use serde::{Deserialize, Serialize};

use petpal_core::powerup::PowerUpSet;

use crate::config::PhysicsConfig;
use crate::powerups::PowerUpKind;
use crate::tiles::TileKind;

/// State of the climbing player.
///
/// `x` is the horizontal center, `y` the height of the feet. +y is up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClimbPlayer {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub grounded: bool,
    pub jump_multiplier: f32,
    pub speed_multiplier: f32,
    pub gravity_multiplier: f32,
    pub magnet_range: f32,
    pub shield: bool,
    pub double_jump_available: bool,
    pub coyote_timer: f32,
    pub jump_buffer_timer: f32,
    /// Moving platform the player is riding, if any.
    pub attached_platform: Option<u32>,
    /// Special kind of the platform last landed on.
    pub surface: Option<TileKind>,
    pub max_height: f32,
    pub power_ups: PowerUpSet<PowerUpKind>,
}

impl ClimbPlayer {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            grounded: true,
            jump_multiplier: 1.0,
            speed_multiplier: 1.0,
            gravity_multiplier: 1.0,
            magnet_range: 0.0,
            shield: false,
            double_jump_available: true,
            coyote_timer: 0.0,
            jump_buffer_timer: 0.0,
            attached_platform: None,
            surface: None,
            max_height: y,
            power_ups: PowerUpSet::new(),
        }
    }

    /// Within the coyote window or standing on something.
    pub fn has_footing(&self) -> bool {
        self.grounded || self.coyote_timer > 0.0
    }
}

/// Player intent for one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClimbInput {
    /// -1 (left), 0, +1 (right).
    pub axis: f32,
    /// Jump key went down since the last tick.
    pub jump_pressed: bool,
    /// Jump key is currently down.
    pub jump_held: bool,
    /// Pause key went down since the last tick.
    pub pause_pressed: bool,
}

/// Which jump fired during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Ground,
    /// Spent the charge restored on landing.
    Air,
    /// Spent a held double-jump power-up after the landing charge.
    Extra,
}

fn sanitize_axis(axis: f32) -> f32 {
    if axis.is_finite() {
        axis.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Update timers, resolve jumps and integrate velocity for one fixed step.
///
/// Position is not advanced here; collision resolution consumes the velocity.
pub fn integrate(
    player: &mut ClimbPlayer,
    input: &ClimbInput,
    cfg: &PhysicsConfig,
    dt: f32,
) -> Option<JumpKind> {
    // Only a fresh press arms the buffer; holding the key lets it run out.
    if input.jump_pressed {
        player.jump_buffer_timer = cfg.jump_buffer;
    } else {
        player.jump_buffer_timer = (player.jump_buffer_timer - dt).max(0.0);
    }

    if player.grounded {
        player.coyote_timer = cfg.coyote_time;
    } else {
        player.coyote_timer = (player.coyote_timer - dt).max(0.0);
    }

    let mut jumped = None;
    if player.has_footing() && player.jump_buffer_timer > 0.0 {
        player.vy = cfg.jump_velocity * player.jump_multiplier;
        player.jump_buffer_timer = 0.0;
        player.coyote_timer = 0.0;
        player.grounded = false;
        player.attached_platform = None;
        jumped = Some(JumpKind::Ground);
    } else if !player.has_footing() && input.jump_pressed {
        let kind = if player.double_jump_available {
            player.double_jump_available = false;
            Some(JumpKind::Air)
        } else if player.power_ups.contains(PowerUpKind::DoubleJump) {
            Some(JumpKind::Extra)
        } else {
            None
        };
        if kind.is_some() {
            player.vy = cfg.jump_velocity * cfg.double_jump_factor * player.jump_multiplier;
            player.jump_buffer_timer = 0.0;
            player.attached_platform = None;
        }
        jumped = kind;
    }

    let gravity = if player.coyote_timer > 0.0 {
        cfg.grounded_gravity
    } else {
        cfg.gravity
    };
    player.vy -= gravity * player.gravity_multiplier * dt;
    player.vy = player.vy.max(-cfg.terminal_velocity);

    let target = sanitize_axis(input.axis) * cfg.base_speed * player.speed_multiplier;
    let control = if player.has_footing() {
        if player.surface == Some(TileKind::Ice) {
            cfg.ice_control
        } else {
            cfg.ground_control
        }
    } else {
        cfg.ground_control * cfg.air_control_ratio
    };
    player.vx += (target - player.vx) * control;
    player.vx = player
        .vx
        .clamp(-cfg.max_horizontal_speed, cfg.max_horizontal_speed);

    jumped
}

/// Wrap a horizontal position into `[0, field_width)`.
pub fn wrap_x(x: f32, field_width: f32) -> f32 {
    if !x.is_finite() {
        return field_width / 2.0;
    }
    let wrapped = x.rem_euclid(field_width);
    // Tiny negatives round up to exactly `field_width`.
    if wrapped >= field_width {
        0.0
    } else {
        wrapped
    }
}
