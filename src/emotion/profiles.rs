// Static emotion -> playlist profile table
//
// Every label owns exactly one profile and one catalog search phrase.
// Lookups by name fall back to `neutral` for anything unrecognized.

use serde::Serialize;
use tracing::warn;

use super::{EmotionLabel, EMOTION_COUNT};

/// Query used when a label has no search phrase of its own.
pub const DEFAULT_SEARCH_PHRASE: &str = "focus";

/// Thematic description of the playlist recommended for an emotion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaylistProfile {
    pub name: &'static str,
    pub description: &'static str,
    /// Target intensity, 0.0 - 1.0
    pub energy: f64,
    /// Target positivity, 0.0 - 1.0
    pub valence: f64,
}

#[derive(Debug)]
struct ProfileEntry {
    profile: PlaylistProfile,
    search_phrase: &'static str,
}

const fn entry(
    name: &'static str,
    description: &'static str,
    energy: f64,
    valence: f64,
    search_phrase: &'static str,
) -> ProfileEntry {
    ProfileEntry {
        profile: PlaylistProfile {
            name,
            description,
            energy,
            valence,
        },
        search_phrase,
    }
}

// Indexed by `EmotionLabel as usize`
static ENTRIES: [ProfileEntry; EMOTION_COUNT] = [
    entry("Inspiring Vibes", "Music that fuels admiration and awe", 0.6, 0.8, "inspirational music"),
    entry("Fun & Laughter", "Playful tracks to keep the mood light", 0.8, 0.9, "fun upbeat playlist"),
    entry("Calm & Release", "Relaxing songs to cool down anger", 0.3, 0.4, "calm relaxing music"),
    entry("Peaceful Reset", "Soothing sounds to reduce irritation", 0.4, 0.5, "chill peace vibes"),
    entry("Positive Affirmations", "Uplifting music for encouragement", 0.7, 0.8, "positive uplifting"),
    entry("Warm & Caring", "Gentle songs full of kindness", 0.5, 0.7, "kind gentle tracks"),
    entry("Focus Flow", "Tracks to clear your head", 0.5, 0.6, "focus concentration"),
    entry("Discover & Explore", "Eclectic tracks for curious minds", 0.7, 0.8, "eclectic discovery music"),
    entry("Passion Waves", "Romantic and passionate songs", 0.7, 0.8, "romantic passion songs"),
    entry("Healing Tones", "Comforting tracks to lift your spirit", 0.3, 0.4, "comfort emotional healing"),
    entry("Reset & Recharge", "Balanced tracks to stabilize emotions", 0.4, 0.5, "neutral focus calm"),
    entry("Clean Slate", "Refreshing sounds to shake off negativity", 0.5, 0.6, "fresh reset cleanse music"),
    entry("Confidence Boost", "Empowering tracks to lift self-esteem", 0.7, 0.7, "confidence empowerment"),
    entry("High Energy Boost", "Hype tracks to fuel excitement", 0.9, 0.9, "high energy workout party"),
    entry("Safe & Secure", "Comforting songs to ease fears", 0.3, 0.5, "comfort secure calm"),
    entry("Thankful Vibes", "Songs of appreciation and joy", 0.7, 0.9, "thankful appreciation vibes"),
    entry("Gentle Healing", "Emotional tracks for grieving hearts", 0.2, 0.3, "healing emotional piano"),
    entry("Pure Happiness", "Upbeat songs for joyful moods", 0.9, 0.95, "happy upbeat feel good"),
    entry("Romantic Tunes", "Heartfelt love songs", 0.7, 0.9, "romantic love songs"),
    entry("Calm Focus", "Tracks to ease nervous energy", 0.4, 0.6, "calm meditation focus"),
    entry("Bright Future", "Hopeful and cheerful music", 0.8, 0.9, "bright cheerful happy"),
    entry("Victory Anthems", "Empowering tracks to celebrate wins", 0.8, 0.8, "victory anthems celebration"),
    entry("Lightbulb Moments", "Reflective tracks for clarity", 0.6, 0.7, "reflective calm discovery"),
    entry("Breathe Easy", "Relaxing music for relief", 0.4, 0.7, "relax chill unwind"),
    entry("Forgiveness & Growth", "Soothing tracks for self-healing", 0.3, 0.4, "forgiveness emotional"),
    entry("Soft Comfort", "Gentle emotional tracks", 0.2, 0.3, "sad melancholic emotional"),
    entry("Unexpected Joys", "Eclectic tracks for surprising moods", 0.7, 0.8, "unexpected eclectic playlist"),
    entry("Everyday Flow", "Balanced tracks for any mood", 0.5, 0.5, "focus concentration study"),
];

/// Read-only lookup from emotion label to playlist profile and search phrase.
#[derive(Debug, Clone, Copy)]
pub struct EmotionProfileTable {
    entries: &'static [ProfileEntry; EMOTION_COUNT],
}

impl Default for EmotionProfileTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EmotionProfileTable {
    pub fn new() -> Self {
        Self { entries: &ENTRIES }
    }

    /// Resolve a label name to a known label, substituting `neutral` for
    /// anything outside the closed set.
    pub fn resolve(&self, label: &str) -> EmotionLabel {
        match EmotionLabel::parse(label) {
            Some(known) => known,
            None => {
                warn!("Unknown emotion label {:?}, falling back to neutral", label);
                EmotionLabel::Neutral
            }
        }
    }

    /// Profile for a label name (case-insensitive, unknown -> neutral).
    pub fn profile_for(&self, label: &str) -> &PlaylistProfile {
        self.profile(self.resolve(label))
    }

    /// Search phrase for a label name (case-insensitive, unknown -> neutral).
    pub fn search_phrase_for(&self, label: &str) -> &str {
        self.search_phrase(self.resolve(label))
    }

    pub fn profile(&self, label: EmotionLabel) -> &PlaylistProfile {
        &self.entries[label.index()].profile
    }

    pub fn search_phrase(&self, label: EmotionLabel) -> &str {
        let phrase = self.entries[label.index()].search_phrase;
        if phrase.is_empty() {
            DEFAULT_SEARCH_PHRASE
        } else {
            phrase
        }
    }

    /// All entries in label order.
    pub fn entries(&self) -> impl Iterator<Item = (EmotionLabel, &PlaylistProfile, &str)> + '_ {
        EmotionLabel::ALL
            .iter()
            .map(move |&label| (label, self.profile(label), self.search_phrase(label)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_label_has_well_formed_entry() {
        let table = EmotionProfileTable::new();
        for label in EmotionLabel::ALL {
            let profile = table.profile_for(label.as_str());
            assert!(!profile.name.is_empty(), "{} has no name", label);
            assert!(!profile.description.is_empty(), "{} has no description", label);
            assert!((0.0..=1.0).contains(&profile.energy), "{} energy out of range", label);
            assert!((0.0..=1.0).contains(&profile.valence), "{} valence out of range", label);
            assert!(!table.search_phrase_for(label.as_str()).is_empty());
        }
        assert_eq!(table.entries().count(), EMOTION_COUNT);
    }

    #[test]
    fn test_unknown_labels_fall_back_to_neutral() {
        let table = EmotionProfileTable::new();
        let neutral = table.profile(EmotionLabel::Neutral);
        assert_eq!(neutral.name, "Everyday Flow");

        for unknown in ["", "   ", "happy", "joyful", "unknown_27"] {
            assert_eq!(table.resolve(unknown), EmotionLabel::Neutral);
            assert_eq!(table.profile_for(unknown), neutral);
            assert_eq!(table.search_phrase_for(unknown), "focus concentration study");
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = EmotionProfileTable::new();
        let profile = table.profile_for("JOY");
        assert_eq!(profile.name, "Pure Happiness");
        assert_eq!(profile.description, "Upbeat songs for joyful moods");
        assert_eq!(profile.energy, 0.9);
        assert_eq!(profile.valence, 0.95);
        assert_eq!(table.search_phrase_for("Joy"), "happy upbeat feel good");
    }

    #[test]
    fn test_known_entries() {
        let table = EmotionProfileTable::new();
        assert_eq!(table.profile(EmotionLabel::Admiration).name, "Inspiring Vibes");
        assert_eq!(table.profile(EmotionLabel::Grief).name, "Gentle Healing");
        assert_eq!(table.search_phrase(EmotionLabel::Excitement), "high energy workout party");
        assert_eq!(table.search_phrase(EmotionLabel::Sadness), "sad melancholic emotional");
    }

    #[test]
    fn test_repeated_lookups_are_identical() {
        let table = EmotionProfileTable::new();
        let first = *table.profile_for("fear");
        let second = *table.profile_for("fear");
        assert_eq!(first, second);
        assert_eq!(table.search_phrase_for("fear"), table.search_phrase_for("fear"));
    }
}
