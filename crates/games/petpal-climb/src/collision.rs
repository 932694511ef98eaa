use crate::entities::{Collectible, Enemy, Platform};

/// How far below a platform top the feet may already be and still land.
pub const LAND_TOLERANCE: f32 = 4.0;
/// Horizontal distance past a platform edge that still counts as a landing.
pub const CORNER_TOLERANCE: f32 = 6.0;
/// Extra height above an enemy's head that counts as a stomp.
pub const STOMP_TOLERANCE: f32 = 8.0;
pub const PICKUP_RADIUS: f32 = 24.0;
/// Speed at which magnetised collectibles fly toward the player (px/s).
pub const MAGNET_SPEED: f32 = 420.0;

/// Result of a swept landing test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landing {
    pub index: usize,
    pub top: f32,
    /// Player x after corner correction.
    pub corrected_x: f32,
}

/// Find the platform the feet land on while moving from `prev_y` to `next_y`.
///
/// Only downward motion lands. When several tops are crossed in one step the
/// highest wins, since it was reached first.
pub fn find_landing(
    prev_y: f32,
    next_y: f32,
    x: f32,
    half_width: f32,
    platforms: &[Platform],
) -> Option<Landing> {
    if next_y >= prev_y {
        return None;
    }
    let mut best: Option<Landing> = None;
    for (index, p) in platforms.iter().enumerate() {
        if !p.solid {
            continue;
        }
        let top = p.y;
        if prev_y < top - LAND_TOLERANCE || next_y > top {
            continue;
        }
        let Some(corrected_x) = horizontal_support(x, half_width, p) else {
            continue;
        };
        if best.is_none_or(|b| top > b.top) {
            best = Some(Landing {
                index,
                top,
                corrected_x,
            });
        }
    }
    best
}

/// Horizontal position on `p` for a player centered at `x`, with corner correction.
fn horizontal_support(x: f32, half_width: f32, p: &Platform) -> Option<f32> {
    let left = x - half_width;
    let right = x + half_width;
    if right >= p.x && left <= p.right() {
        return Some(x);
    }
    let gap = if right < p.x { p.x - right } else { left - p.right() };
    if gap <= CORNER_TOLERANCE {
        // Nudge so the player's center sits on the near edge.
        Some(x.clamp(p.x, p.right()))
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyContact {
    /// Player came down on the enemy's head.
    Stomp,
    Hit,
}

/// Box test between the player and a live enemy.
///
/// The player box spans `[x - half_width, x + half_width] x [y, y + height]`,
/// the enemy box a square of its radius resting on `enemy.y`.
pub fn enemy_contact(
    x: f32,
    y: f32,
    prev_y: f32,
    vy: f32,
    half_width: f32,
    height: f32,
    enemy: &Enemy,
) -> Option<EnemyContact> {
    if enemy.dead {
        return None;
    }
    let r = enemy.kind.radius();
    let enemy_top = enemy.y + 2.0 * r;
    let overlap_x = (x - enemy.x).abs() <= half_width + r;
    let overlap_y = y <= enemy_top && y + height >= enemy.y;
    if !(overlap_x && overlap_y) {
        return None;
    }
    if vy < 0.0 && prev_y >= enemy_top - STOMP_TOLERANCE {
        Some(EnemyContact::Stomp)
    } else {
        Some(EnemyContact::Hit)
    }
}

/// Whether the player's body center is within pickup range.
pub fn within_pickup(cx: f32, cy: f32, c: &Collectible) -> bool {
    let dx = c.x - cx;
    let dy = c.y - cy;
    dx * dx + dy * dy <= PICKUP_RADIUS * PICKUP_RADIUS
}

/// Move a currency collectible toward the player when inside magnet range.
/// Returns whether it was pulled.
pub fn magnet_pull(c: &mut Collectible, cx: f32, cy: f32, range: f32, dt: f32) -> bool {
    if c.collected || range <= 0.0 || !c.kind.is_currency() {
        return false;
    }
    let dx = cx - c.x;
    let dy = cy - c.y;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist > range || dist <= f32::EPSILON {
        return false;
    }
    let step = (MAGNET_SPEED * dt).min(dist);
    c.x += dx / dist * step;
    c.y += dy / dist * step;
    true
}
