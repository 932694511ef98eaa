use rand::Rng;
use serde::{Deserialize, Serialize};

/// Feedback animations a platform can play. Purely cosmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Bounce,
    Tilt,
    Squish,
    Glow,
    Wiggle,
    Fade,
}

impl EffectKind {
    pub fn default_duration(self) -> f32 {
        match self {
            EffectKind::Bounce => 0.25,
            EffectKind::Tilt => 0.4,
            EffectKind::Squish => 0.15,
            EffectKind::Glow => 0.6,
            EffectKind::Wiggle => 0.35,
            EffectKind::Fade => 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectTimer {
    pub kind: EffectKind,
    pub remaining: f32,
    pub duration: f32,
    pub magnitude: f32,
}

impl EffectTimer {
    /// 1.0 right after triggering, decaying linearly to 0.0.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.remaining / self.duration).clamp(0.0, 1.0)
    }
}

/// Per-entity list of decaying effect timers, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectTimers(Vec<EffectTimer>);

impl EffectTimers {
    /// Start (or restart) an effect with its default duration.
    pub fn trigger(&mut self, kind: EffectKind, magnitude: f32) {
        self.trigger_for(kind, kind.default_duration(), magnitude);
    }

    pub fn trigger_for(&mut self, kind: EffectKind, duration: f32, magnitude: f32) {
        let timer = EffectTimer {
            kind,
            remaining: duration,
            duration,
            magnitude,
        };
        match self.0.iter_mut().find(|t| t.kind == kind) {
            Some(existing) => *existing = timer,
            None => self.0.push(timer),
        }
    }

    /// Single decay pass; timers that reach zero are dropped.
    pub fn decay(&mut self, dt: f32) {
        for timer in &mut self.0 {
            timer.remaining -= dt;
        }
        self.0.retain(|t| t.remaining > 0.0);
    }

    /// Current scaled value of an effect, 0.0 when inactive.
    pub fn value(&self, kind: EffectKind) -> f32 {
        self.0
            .iter()
            .find(|t| t.kind == kind)
            .map(|t| t.magnitude * t.progress())
            .unwrap_or(0.0)
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.0.iter().any(|t| t.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectTimer> {
        self.0.iter()
    }
}

const PARTICLE_GRAVITY: f32 = 900.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub lifetime: f32,
    pub max_lifetime: f32,
    pub color: u32,
}

/// Bounded pool of feedback particles. Oldest particles are dropped first
/// when a burst would exceed capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    capacity: usize,
}

impl Default for ParticlePool {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

impl ParticlePool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::new(),
            capacity,
        }
    }

    /// Spawn a burst fanning upward from a point.
    pub fn spawn_burst(&mut self, rng: &mut impl Rng, x: f32, y: f32, color: u32, count: usize) {
        for _ in 0..count {
            let angle = rng.random_range(0.0..std::f32::consts::PI);
            let speed: f32 = rng.random_range(60.0..180.0);
            let lifetime: f32 = rng.random_range(0.3..0.6);
            self.particles.push(Particle {
                x,
                y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                lifetime,
                max_lifetime: lifetime,
                color,
            });
        }
        if self.particles.len() > self.capacity {
            let excess = self.particles.len() - self.capacity;
            self.particles.drain(..excess);
        }
    }

    pub fn update(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.vy -= PARTICLE_GRAVITY * dt;
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            p.lifetime -= dt;
        }
        self.particles.retain(|p| p.lifetime > 0.0);
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn timers_decay_to_baseline_without_contact() {
        let mut effects = EffectTimers::default();
        effects.trigger(EffectKind::Bounce, 1.0);
        effects.trigger(EffectKind::Glow, 0.5);
        assert!(effects.value(EffectKind::Bounce) > 0.0);

        for _ in 0..60 {
            effects.decay(1.0 / 60.0);
        }
        assert!(effects.is_empty());
        assert_eq!(effects.value(EffectKind::Glow), 0.0);
    }

    #[test]
    fn retrigger_restarts_instead_of_duplicating() {
        let mut effects = EffectTimers::default();
        effects.trigger(EffectKind::Squish, 1.0);
        effects.decay(0.1);
        effects.trigger(EffectKind::Squish, 1.0);
        assert_eq!(effects.iter().count(), 1);
        assert_eq!(effects.value(EffectKind::Squish), 1.0);
    }

    #[test]
    fn value_scales_with_remaining_time() {
        let mut effects = EffectTimers::default();
        effects.trigger_for(EffectKind::Tilt, 1.0, 2.0);
        effects.decay(0.5);
        assert!((effects.value(EffectKind::Tilt) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn pool_is_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = ParticlePool::with_capacity(10);
        pool.spawn_burst(&mut rng, 0.0, 0.0, 0xffffff, 8);
        pool.spawn_burst(&mut rng, 0.0, 0.0, 0xff0000, 8);
        assert_eq!(pool.len(), 10);
        // The newest burst survives intact.
        assert_eq!(pool.iter().filter(|p| p.color == 0xff0000).count(), 8);
    }

    #[test]
    fn particles_expire() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut pool = ParticlePool::default();
        pool.spawn_burst(&mut rng, 10.0, 10.0, 0xffffff, 12);
        assert!(pool.iter().all(|p| p.vy >= 0.0));
        for _ in 0..60 {
            pool.update(1.0 / 60.0);
        }
        assert!(pool.is_empty());
    }
}
