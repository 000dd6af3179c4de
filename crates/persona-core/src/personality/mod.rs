//! Per-agent personality traits and response styling
//!
//! Seven trait dimensions drive a deterministic styling pipeline over draft
//! responses. Randomized insertions go through an injectable `Rng` so tests
//! can force both branches.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod style;

pub use style::{adapt_response, ResponseContext, RelationshipStage};

/// Named trait dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitName {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
    Playfulness,
    Wisdom,
}

impl TraitName {
    pub const ALL: [TraitName; 7] = [
        TraitName::Openness,
        TraitName::Conscientiousness,
        TraitName::Extraversion,
        TraitName::Agreeableness,
        TraitName::Neuroticism,
        TraitName::Playfulness,
        TraitName::Wisdom,
    ];
}

/// A complete 7-dimension trait vector, each value in [1,10].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityTraits {
    pub openness: u8,
    pub conscientiousness: u8,
    pub extraversion: u8,
    pub agreeableness: u8,
    pub neuroticism: u8,
    pub playfulness: u8,
    pub wisdom: u8,
}

impl PersonalityTraits {
    pub fn get(&self, name: TraitName) -> u8 {
        match name {
            TraitName::Openness => self.openness,
            TraitName::Conscientiousness => self.conscientiousness,
            TraitName::Extraversion => self.extraversion,
            TraitName::Agreeableness => self.agreeableness,
            TraitName::Neuroticism => self.neuroticism,
            TraitName::Playfulness => self.playfulness,
            TraitName::Wisdom => self.wisdom,
        }
    }
}

impl Default for PersonalityTraits {
    fn default() -> Self {
        Self {
            openness: 5,
            conscientiousness: 5,
            extraversion: 5,
            agreeableness: 5,
            neuroticism: 5,
            playfulness: 5,
            wisdom: 5,
        }
    }
}

/// Preset trait vector for an agent kind; unknown kinds get the default.
pub fn initialize_traits(agent_kind: &str) -> PersonalityTraits {
    match agent_kind {
        "emotional_support" => PersonalityTraits {
            openness: 7,
            conscientiousness: 6,
            extraversion: 5,
            agreeableness: 9,
            neuroticism: 7,
            playfulness: 4,
            wisdom: 8,
        },
        "creative_writer" => PersonalityTraits {
            openness: 9,
            conscientiousness: 5,
            extraversion: 6,
            agreeableness: 6,
            neuroticism: 5,
            playfulness: 8,
            wisdom: 6,
        },
        "analytical" => PersonalityTraits {
            openness: 6,
            conscientiousness: 9,
            extraversion: 3,
            agreeableness: 5,
            neuroticism: 3,
            playfulness: 2,
            wisdom: 7,
        },
        "playful_companion" => PersonalityTraits {
            openness: 7,
            conscientiousness: 3,
            extraversion: 9,
            agreeableness: 7,
            neuroticism: 3,
            playfulness: 9,
            wisdom: 4,
        },
        "wise_mentor" => PersonalityTraits {
            openness: 8,
            conscientiousness: 7,
            extraversion: 4,
            agreeableness: 7,
            neuroticism: 4,
            playfulness: 3,
            wisdom: 9,
        },
        _ => PersonalityTraits::default(),
    }
}

/// Compatibility between user preferences and an agent's traits: average of
/// `1 − |diff|/10` over the dimensions the preferences actually specify.
/// Empty preferences mean no signal, so neutral 0.5.
pub fn compatibility(user_prefs: &HashMap<TraitName, u8>, traits: &PersonalityTraits) -> f64 {
    if user_prefs.is_empty() {
        return 0.5;
    }
    let sum: f64 = user_prefs
        .iter()
        .map(|(&name, &pref)| {
            let diff = (pref as f64 - traits.get(name) as f64).abs();
            1.0 - diff / 10.0
        })
        .sum();
    sum / user_prefs.len() as f64
}

/// Feedback tallies accumulated from user ratings and flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackCounters {
    pub too_formal: u32,
    pub too_casual: u32,
    pub not_empathetic: u32,
    pub too_verbose: u32,
}

/// Suggested trait deltas from feedback tallies. Advisory only, never
/// auto-applied; each delta is dropped if the adjusted value would leave
/// [1,10].
pub fn suggest_adjustments(
    feedback: &FeedbackCounters,
    traits: &PersonalityTraits,
) -> HashMap<TraitName, i8> {
    let mut deltas: HashMap<TraitName, i8> = HashMap::new();
    let mut propose = |name: TraitName, delta: i8| {
        let adjusted = traits.get(name) as i16 + delta as i16;
        if (1..=10).contains(&adjusted) {
            *deltas.entry(name).or_insert(0) += delta;
        }
    };

    if feedback.too_formal > 3 {
        propose(TraitName::Playfulness, 1);
        propose(TraitName::Extraversion, 1);
    }
    if feedback.too_casual > 3 {
        propose(TraitName::Conscientiousness, 1);
        propose(TraitName::Playfulness, -1);
    }
    if feedback.not_empathetic > 2 {
        propose(TraitName::Agreeableness, 1);
        propose(TraitName::Neuroticism, 1);
    }
    if feedback.too_verbose > 3 {
        propose(TraitName::Conscientiousness, -1);
    }
    deltas.retain(|_, d| *d != 0);
    deltas
}

/// Facade bundling trait lookup and styling behind one value.
pub struct PersonalityEngine;

impl PersonalityEngine {
    pub fn traits_for(agent_kind: &str) -> PersonalityTraits {
        initialize_traits(agent_kind)
    }

    pub fn adapt(
        draft: &str,
        traits: &PersonalityTraits,
        context: &ResponseContext,
        rng: &mut impl Rng,
    ) -> String {
        adapt_response(draft, traits, context, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_complete_vectors() {
        for kind in [
            "emotional_support",
            "creative_writer",
            "analytical",
            "playful_companion",
            "wise_mentor",
            "unknown_kind",
        ] {
            let traits = initialize_traits(kind);
            for name in TraitName::ALL {
                assert!((1..=10).contains(&traits.get(name)), "{kind} {name:?}");
            }
        }
    }

    #[test]
    fn test_compatibility_is_symmetric() {
        // Diff-based, so comparing A-against-B equals B-against-A when the
        // same dimensions are specified.
        let traits = initialize_traits("wise_mentor");
        let mut prefs = HashMap::new();
        for name in TraitName::ALL {
            prefs.insert(name, initialize_traits("playful_companion").get(name));
        }
        let mut reverse = HashMap::new();
        for name in TraitName::ALL {
            reverse.insert(name, traits.get(name));
        }
        let forward = compatibility(&prefs, &traits);
        let backward = compatibility(&reverse, &initialize_traits("playful_companion"));
        assert!((forward - backward).abs() < 1e-9);
    }

    #[test]
    fn test_compatibility_empty_prefs_is_neutral() {
        assert_eq!(compatibility(&HashMap::new(), &PersonalityTraits::default()), 0.5);
    }

    #[test]
    fn test_identical_vectors_score_one() {
        let traits = PersonalityTraits::default();
        let prefs: HashMap<_, _> = TraitName::ALL.iter().map(|&n| (n, traits.get(n))).collect();
        assert!((compatibility(&prefs, &traits) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_adjustments_from_feedback() {
        let feedback = FeedbackCounters { too_formal: 4, ..Default::default() };
        let deltas = suggest_adjustments(&feedback, &PersonalityTraits::default());
        assert_eq!(deltas.get(&TraitName::Playfulness), Some(&1));
        assert_eq!(deltas.get(&TraitName::Extraversion), Some(&1));
    }

    #[test]
    fn test_adjustments_respect_bounds() {
        let traits = PersonalityTraits { playfulness: 10, extraversion: 10, ..Default::default() };
        let feedback = FeedbackCounters { too_formal: 4, ..Default::default() };
        assert!(suggest_adjustments(&feedback, &traits).is_empty());
    }

    #[test]
    fn test_below_threshold_yields_no_adjustments() {
        let feedback = FeedbackCounters { too_formal: 3, not_empathetic: 2, ..Default::default() };
        assert!(suggest_adjustments(&feedback, &PersonalityTraits::default()).is_empty());
    }
}
