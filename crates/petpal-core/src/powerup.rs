use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Trait for game-specific power-up kind enums.
pub trait PowerUpKind: Clone + Copy + PartialEq + Serialize + DeserializeOwned {
    /// Base duration in seconds. Use `f32::INFINITY` for effects that last until consumed.
    fn base_duration(&self) -> f32;
}

/// Active power-up effect, generic over the kind enum.
///
/// Times are on the game's simulation clock, so a paused game does not age them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ActivePowerUp<K: PowerUpKind> {
    pub kind: K,
    pub started_at: f32,
    pub duration: f32,
    pub strength: f32,
    /// Index of the zone/area the power-up was acquired in.
    pub source_zone: u8,
}

impl<K: PowerUpKind> ActivePowerUp<K> {
    pub fn new(kind: K, started_at: f32, duration: f32, strength: f32, source_zone: u8) -> Self {
        Self {
            kind,
            started_at,
            duration,
            strength,
            source_zone,
        }
    }

    /// Simulation time at which the effect ends (infinite for consume-only effects).
    pub fn expires_at(&self) -> f32 {
        self.started_at + self.duration
    }

    pub fn remaining(&self, now: f32) -> f32 {
        (self.expires_at() - now).max(0.0)
    }

    pub fn is_expired(&self, now: f32) -> bool {
        self.duration.is_finite() && now - self.started_at >= self.duration
    }
}

/// Set of active power-ups holding at most one record per kind.
///
/// Acquiring a kind that is already active replaces the record (fresh timer),
/// it never stacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PowerUpSet<K: PowerUpKind> {
    active: Vec<ActivePowerUp<K>>,
}

impl<K: PowerUpKind> Default for PowerUpSet<K> {
    fn default() -> Self {
        Self { active: Vec::new() }
    }
}

impl<K: PowerUpKind> PowerUpSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the one it replaced.
    pub fn insert(&mut self, power_up: ActivePowerUp<K>) -> Option<ActivePowerUp<K>> {
        match self.active.iter_mut().find(|p| p.kind == power_up.kind) {
            Some(existing) => Some(std::mem::replace(existing, power_up)),
            None => {
                self.active.push(power_up);
                None
            },
        }
    }

    pub fn get(&self, kind: K) -> Option<&ActivePowerUp<K>> {
        self.active.iter().find(|p| p.kind == kind)
    }

    pub fn contains(&self, kind: K) -> bool {
        self.get(kind).is_some()
    }

    pub fn remove(&mut self, kind: K) -> Option<ActivePowerUp<K>> {
        let idx = self.active.iter().position(|p| p.kind == kind)?;
        Some(self.active.remove(idx))
    }

    /// Remove and return every record whose duration has elapsed at `now`.
    pub fn expire(&mut self, now: f32) -> Vec<ActivePowerUp<K>> {
        let (expired, kept): (Vec<_>, Vec<_>) =
            self.active.drain(..).partition(|p| p.is_expired(now));
        self.active = kept;
        expired
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivePowerUp<K>> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}
