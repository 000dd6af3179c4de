//! Fixed lexical tables driving emotion classification
//!
//! Table order is load-bearing: score ties between emotions resolve to the
//! first entry, so `Emotion::CORE` doubles as the tie-break order.

use serde::{Deserialize, Serialize};

/// Core emotion classes plus the neutral fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Happy,
    Excited,
    Calm,
    Grateful,
    Sad,
    Angry,
    Frustrated,
    Anxious,
    Confused,
    Neutral,
}

impl Emotion {
    /// Scoring and tie-break order.
    pub const CORE: [Emotion; 9] = [
        Emotion::Happy,
        Emotion::Excited,
        Emotion::Calm,
        Emotion::Grateful,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Frustrated,
        Emotion::Anxious,
        Emotion::Confused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Excited => "excited",
            Emotion::Calm => "calm",
            Emotion::Grateful => "grateful",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Frustrated => "frustrated",
            Emotion::Anxious => "anxious",
            Emotion::Confused => "confused",
            Emotion::Neutral => "neutral",
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(
            self,
            Emotion::Happy | Emotion::Excited | Emotion::Calm | Emotion::Grateful
        )
    }

    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            Emotion::Sad | Emotion::Angry | Emotion::Frustrated | Emotion::Anxious
        )
    }

    /// Valence/arousal coordinates used for transition significance.
    pub fn coordinates(&self) -> (f64, f64) {
        match self {
            Emotion::Happy => (8.0, 6.0),
            Emotion::Excited => (9.0, 9.0),
            Emotion::Calm => (7.0, 2.0),
            Emotion::Grateful => (8.0, 4.0),
            Emotion::Sad => (2.0, 3.0),
            Emotion::Angry => (2.0, 9.0),
            Emotion::Frustrated => (3.0, 7.0),
            Emotion::Anxious => (3.0, 8.0),
            Emotion::Confused => (4.0, 5.0),
            Emotion::Neutral => (5.0, 5.0),
        }
    }
}

/// Keyword profile for one core emotion.
pub struct EmotionProfile {
    pub emotion: Emotion,
    pub synonyms: &'static [&'static str],
    pub physical: &'static [&'static str],
}

pub const PROFILES: [EmotionProfile; 9] = [
    EmotionProfile {
        emotion: Emotion::Happy,
        synonyms: &["joyful", "glad", "cheerful", "delighted", "content", "pleased"],
        physical: &["smiling", "laughing", "grinning"],
    },
    EmotionProfile {
        emotion: Emotion::Excited,
        synonyms: &["thrilled", "eager", "pumped", "enthusiastic", "stoked"],
        physical: &["heart racing", "butterflies"],
    },
    EmotionProfile {
        emotion: Emotion::Calm,
        synonyms: &["relaxed", "peaceful", "serene", "tranquil", "at ease"],
        physical: &["deep breath", "at peace"],
    },
    EmotionProfile {
        emotion: Emotion::Grateful,
        synonyms: &["thankful", "appreciative", "blessed", "touched"],
        physical: &[],
    },
    EmotionProfile {
        emotion: Emotion::Sad,
        synonyms: &["unhappy", "down", "depressed", "miserable", "heartbroken", "gloomy"],
        physical: &["crying", "tears"],
    },
    EmotionProfile {
        emotion: Emotion::Angry,
        synonyms: &["mad", "furious", "irate", "enraged", "livid"],
        physical: &["clenched", "blood boiling", "seething"],
    },
    EmotionProfile {
        emotion: Emotion::Frustrated,
        synonyms: &["annoyed", "irritated", "exasperated", "fed up", "aggravated"],
        physical: &["pulling my hair"],
    },
    EmotionProfile {
        emotion: Emotion::Anxious,
        synonyms: &["worried", "nervous", "uneasy", "stressed", "apprehensive", "scared"],
        physical: &["shaking", "trembling", "sweating", "knot in my stomach"],
    },
    EmotionProfile {
        emotion: Emotion::Confused,
        synonyms: &["puzzled", "lost", "bewildered", "unsure", "perplexed"],
        physical: &["scratching my head"],
    },
];

/// Intensity modifier tiers. Scan order is priority order: the first tier
/// with any match decides the intensity, regardless of word position.
pub const VERY_HIGH_MODIFIERS: &[&str] =
    &["incredibly", "absolutely", "extremely", "utterly", "completely"];
pub const HIGH_MODIFIERS: &[&str] = &["really", "very", "so", "totally"];
pub const MEDIUM_MODIFIERS: &[&str] = &["quite", "pretty", "fairly", "rather"];
pub const LOW_MODIFIERS: &[&str] = &["slightly", "a little", "a bit", "somewhat", "kind of"];

/// Sentiment polarity lexicons.
pub const POSITIVE_WORDS: [&str; 10] = [
    "good", "great", "happy", "love", "wonderful", "amazing", "joy", "excited", "grateful",
    "fantastic",
];
pub const NEGATIVE_WORDS: [&str; 10] = [
    "bad", "sad", "angry", "hate", "terrible", "awful", "frustrated", "anxious", "lonely",
    "horrible",
];

/// Context tags and their keyword sets. Highest hit count wins; ties resolve
/// to table order; no hits means "general".
pub const CONTEXT_TAGS: [(&str, &[&str]); 8] = [
    ("work_stress", &["work", "job", "boss", "deadline", "meeting", "overtime"]),
    ("work_achievement", &["promotion", "raise", "accomplished", "project", "success"]),
    ("relationship_joy", &["love", "partner", "boyfriend", "girlfriend", "wedding", "anniversary"]),
    ("relationship_strain", &["argument", "breakup", "fight", "divorce", "ignored"]),
    ("health_concern", &["doctor", "sick", "pain", "hospital", "diagnosis", "tired"]),
    ("family_matter", &["family", "mother", "father", "parents", "sister", "brother", "kids"]),
    ("financial_stress", &["money", "bills", "debt", "rent", "afford", "broke"]),
    ("personal_growth", &["learning", "goal", "habit", "progress", "improve", "growth"]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_order_starts_with_happy() {
        assert_eq!(Emotion::CORE[0], Emotion::Happy);
        assert_eq!(Emotion::CORE[1], Emotion::Excited);
    }

    #[test]
    fn test_profiles_follow_core_order() {
        // Classification folds over PROFILES, so its order must be the
        // documented CORE tie-break order.
        assert_eq!(PROFILES.len(), Emotion::CORE.len());
        for (profile, &emotion) in PROFILES.iter().zip(Emotion::CORE.iter()) {
            assert_eq!(profile.emotion, emotion);
        }
    }

    #[test]
    fn test_polarity_sets_are_disjoint() {
        for emotion in Emotion::CORE {
            assert!(!(emotion.is_positive() && emotion.is_negative()));
        }
        assert!(!Emotion::Neutral.is_positive());
        assert!(!Emotion::Neutral.is_negative());
    }

    #[test]
    fn test_serialization_is_snake_case() {
        assert_eq!(serde_json::to_string(&Emotion::Happy).unwrap(), "\"happy\"");
    }
}
