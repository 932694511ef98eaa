use serde::{Deserialize, Serialize};

/// Sprite used when the pet source has no image for the current mood.
pub const PLACEHOLDER_SPRITE: &str = "sprites/pet/placeholder.png";

/// Emotional state published by the pet-care side of the app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetMood {
    #[default]
    Happy,
    Content,
    Hungry,
    Sleepy,
    Sad,
    Sick,
}

impl PetMood {
    pub fn as_str(self) -> &'static str {
        match self {
            PetMood::Happy => "happy",
            PetMood::Content => "content",
            PetMood::Hungry => "hungry",
            PetMood::Sleepy => "sleepy",
            PetMood::Sad => "sad",
            PetMood::Sick => "sick",
        }
    }
}

/// Source of the pet's current mood and the sprite that represents it.
///
/// Owned by the pet-care subsystem. Mini-games only read from it to pick the
/// player sprite; no gameplay depends on pet stats.
pub trait PetSpriteSource {
    fn mood(&self) -> PetMood;

    /// Asset key for `mood`, or `None` when the image failed to load.
    fn sprite_for(&self, mood: PetMood) -> Option<String>;
}

/// Resolve the sprite for the pet's current mood, falling back to the placeholder.
pub fn resolve_sprite(source: &dyn PetSpriteSource) -> String {
    let mood = source.mood();
    source.sprite_for(mood).unwrap_or_else(|| {
        tracing::debug!("No sprite for pet mood {}, using placeholder", mood.as_str());
        PLACEHOLDER_SPRITE.to_string()
    })
}

/// A pet source with a fixed mood and the default sprite sheet layout.
#[derive(Debug, Clone, Default)]
pub struct StaticPet {
    pub mood: PetMood,
    /// Moods whose image is known to be missing.
    pub missing: Vec<PetMood>,
}

impl StaticPet {
    pub fn new(mood: PetMood) -> Self {
        Self {
            mood,
            missing: Vec::new(),
        }
    }
}

impl PetSpriteSource for StaticPet {
    fn mood(&self) -> PetMood {
        self.mood
    }

    fn sprite_for(&self, mood: PetMood) -> Option<String> {
        if self.missing.contains(&mood) {
            return None;
        }
        Some(format!("sprites/pet/{}.png", mood.as_str()))
    }
}
