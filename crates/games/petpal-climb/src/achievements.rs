use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use petpal_core::storage::{self, Storage, StorageError};

use crate::events::ClimbEvent;
use crate::zones::ZoneId;

pub const ACHIEVEMENTS_KEY: &str = "climb.achievements";
pub const STATS_KEY: &str = "climb.stats";
pub const HIGH_SCORE_KEY: &str = "climb.high_score";

/// Lifetime quantity an achievement tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AchievementMetric {
    Jumps,
    Landings,
    Coins,
    PowerUps,
    MagnetPickups,
    BestHeight,
    GamesPlayed,
    ZoneVisited(ZoneId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub credits: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub metric: AchievementMetric,
    pub target: u64,
    pub current: u64,
    pub completed: bool,
    pub reward: Reward,
}

impl Achievement {
    fn new(id: &str, title: &str, metric: AchievementMetric, target: u64, credits: u32) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            metric,
            target: target.max(1),
            current: 0,
            completed: false,
            reward: Reward { credits },
        }
    }

    /// Raise progress to `value` (never lowers it). Returns true only on the
    /// observation that completes the achievement.
    pub fn observe(&mut self, value: u64) -> bool {
        self.current = self.current.max(value.min(self.target));
        if !self.completed && self.current >= self.target {
            self.completed = true;
            return true;
        }
        false
    }
}

/// Built-in achievement list.
pub fn catalogue() -> Vec<Achievement> {
    use AchievementMetric::*;
    vec![
        Achievement::new("first_jump", "First Hop", Jumps, 1, 5),
        Achievement::new("jumps_100", "Spring Legs", Jumps, 100, 25),
        Achievement::new("landings_50", "Sure Footed", Landings, 50, 20),
        Achievement::new("coins_100", "Coin Collector", Coins, 100, 30),
        Achievement::new("magnet_25", "Magnetic Personality", MagnetPickups, 25, 30),
        Achievement::new("powerups_10", "Powered Up", PowerUps, 10, 25),
        Achievement::new("height_5000", "Sky High", BestHeight, 5000, 50),
        Achievement::new("games_10", "Dedicated Climber", GamesPlayed, 10, 20),
        Achievement::new("zone_clouds", "Head in the Clouds", ZoneVisited(ZoneId::Clouds), 1, 15),
        Achievement::new(
            "zone_stratosphere",
            "Thin Air",
            ZoneVisited(ZoneId::Stratosphere),
            1,
            25,
        ),
        Achievement::new("zone_orbit", "Escape Velocity", ZoneVisited(ZoneId::Orbit), 1, 40),
        Achievement::new("zone_nebula", "Stardust", ZoneVisited(ZoneId::Nebula), 1, 60),
    ]
}

/// Aggregate lifetime stats persisted under [`STATS_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimbStats {
    pub total_jumps: u64,
    pub total_landings: u64,
    pub total_coins: u64,
    pub total_power_ups: u64,
    pub magnet_pickups: u64,
    pub games_played: u64,
    pub best_height: u64,
    pub banked_credits: u64,
    pub zones_visited: BTreeSet<ZoneId>,
}

impl ClimbStats {
    pub fn value(&self, metric: AchievementMetric) -> u64 {
        match metric {
            AchievementMetric::Jumps => self.total_jumps,
            AchievementMetric::Landings => self.total_landings,
            AchievementMetric::Coins => self.total_coins,
            AchievementMetric::PowerUps => self.total_power_ups,
            AchievementMetric::MagnetPickups => self.magnet_pickups,
            AchievementMetric::BestHeight => self.best_height,
            AchievementMetric::GamesPlayed => self.games_played,
            AchievementMetric::ZoneVisited(zone) => u64::from(self.zones_visited.contains(&zone)),
        }
    }
}

/// Observes climb events, keeps lifetime stats and achievement progress,
/// and flushes both to storage at a bounded rate.
#[derive(Debug, Clone)]
pub struct AchievementTracker {
    achievements: Vec<Achievement>,
    stats: ClimbStats,
    high_score: u64,
    unlocked: Vec<ClimbEvent>,
    dirty: bool,
    since_flush: f32,
    flush_interval: f32,
}

impl AchievementTracker {
    /// Fresh tracker with the default catalogue and no stored progress.
    pub fn new(flush_interval: f32) -> Self {
        Self {
            achievements: catalogue(),
            stats: ClimbStats::default(),
            high_score: 0,
            unlocked: Vec::new(),
            dirty: false,
            since_flush: 0.0,
            flush_interval: flush_interval.max(0.0),
        }
    }

    /// Restore progress from storage. Missing or malformed data yields defaults.
    ///
    /// Stored progress for catalogue entries is merged with `max`, so it can
    /// only raise what the stats already imply; it is never added to them.
    pub fn load(storage: &dyn Storage, flush_interval: f32) -> Self {
        let mut tracker = Self::new(flush_interval);
        tracker.stats = storage::load_json_or_default(storage, STATS_KEY);
        tracker.high_score = storage::load_json_or_default(storage, HIGH_SCORE_KEY);

        let stored: Vec<Achievement> = storage::load_json_or_default(storage, ACHIEVEMENTS_KEY);
        for achievement in &mut tracker.achievements {
            if let Some(saved) = stored.iter().find(|s| s.id == achievement.id) {
                achievement.current = saved.current.min(achievement.target);
                achievement.completed = saved.completed;
            }
        }
        // Catch up with stored stats quietly: no credits, no notifications.
        for achievement in &mut tracker.achievements {
            if achievement.observe(tracker.stats.value(achievement.metric)) {
                tracker.dirty = true;
            }
        }
        tracing::debug!(
            completed = tracker.completed_count(),
            high_score = tracker.high_score,
            "Loaded climb progress"
        );
        tracker
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn stats(&self) -> &ClimbStats {
        &self.stats
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn completed_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.completed).count()
    }

    /// Feed one gameplay event into the stats.
    pub fn observe(&mut self, event: &ClimbEvent) {
        let changed = match event {
            ClimbEvent::Jumped { .. } => {
                self.stats.total_jumps += 1;
                true
            },
            ClimbEvent::Landed { .. } => {
                self.stats.total_landings += 1;
                true
            },
            ClimbEvent::CoinCollected { value, magnetized } => {
                self.stats.total_coins += u64::from(*value);
                if *magnetized {
                    self.stats.magnet_pickups += 1;
                }
                true
            },
            ClimbEvent::PowerUpCollected { .. } => {
                self.stats.total_power_ups += 1;
                true
            },
            ClimbEvent::ZoneEntered { zone, .. } => self.stats.zones_visited.insert(*zone),
            _ => false,
        };
        if changed {
            self.dirty = true;
            self.evaluate();
        }
    }

    /// Whether `zone` has ever been visited, before recording this visit.
    pub fn has_visited(&self, zone: ZoneId) -> bool {
        self.stats.zones_visited.contains(&zone)
    }

    pub fn record_height(&mut self, height: f32) {
        let height = height.max(0.0) as u64;
        if height > self.stats.best_height {
            self.stats.best_height = height;
            self.dirty = true;
            self.evaluate();
        }
    }

    pub fn record_game_played(&mut self) {
        self.stats.games_played += 1;
        self.dirty = true;
        self.evaluate();
    }

    fn evaluate(&mut self) {
        for achievement in &mut self.achievements {
            let value = self.stats.value(achievement.metric);
            if achievement.observe(value) {
                self.stats.banked_credits += u64::from(achievement.reward.credits);
                self.dirty = true;
                tracing::info!(
                    id = %achievement.id,
                    reward = achievement.reward.credits,
                    "Achievement unlocked: {}",
                    achievement.title
                );
                self.unlocked.push(ClimbEvent::AchievementUnlocked {
                    id: achievement.id.clone(),
                    title: achievement.title.clone(),
                    reward: achievement.reward.credits,
                });
            }
        }
    }

    /// Unlock events queued since the last call.
    pub fn take_unlocked(&mut self) -> Vec<ClimbEvent> {
        std::mem::take(&mut self.unlocked)
    }

    /// Advance the flush clock; writes at most once per interval when dirty.
    pub fn tick(&mut self, dt: f32, storage: &mut dyn Storage) {
        self.since_flush += dt;
        if self.since_flush >= self.flush_interval {
            self.since_flush = 0.0;
            if self.dirty {
                let _ = self.flush(storage);
            }
        }
    }

    /// Write achievements and stats now. Failures are logged and dropped;
    /// the next flush writes the then-current snapshot.
    pub fn flush(&mut self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        self.dirty = false;
        self.since_flush = 0.0;
        let result = storage::save_json(storage, ACHIEVEMENTS_KEY, &self.achievements)
            .and_then(|()| storage::save_json(storage, STATS_KEY, &self.stats));
        if let Err(e) = &result {
            tracing::warn!("Failed to persist climb progress: {e}");
        }
        result
    }

    /// Record a finished run's score, persisting it when it beats the best.
    pub fn submit_score(&mut self, score: u64, storage: &mut dyn Storage) -> bool {
        if score <= self.high_score {
            return false;
        }
        self.high_score = score;
        if let Err(e) = storage::save_json(storage, HIGH_SCORE_KEY, &score) {
            tracing::warn!("Failed to persist high score: {e}");
        }
        true
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
