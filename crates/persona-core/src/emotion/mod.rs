//! Lexical emotion analysis
//!
//! Pure rule-based scoring over fixed keyword tables: no model calls, no
//! state between invocations. A message comes in, a full `EmotionAnalysis`
//! comes out, and malformed input degrades to the neutral default instead of
//! erroring.

use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod lexicon;
pub mod patterns;

pub use lexicon::Emotion;
pub use patterns::{
    analyze_pattern, detect_transition, EmotionPattern, EmotionTransition, Significance,
    StabilityLevel, TransitionClass, Trend,
};

use lexicon::{
    CONTEXT_TAGS, HIGH_MODIFIERS, LOW_MODIFIERS, MEDIUM_MODIFIERS, NEGATIVE_WORDS,
    POSITIVE_WORDS, PROFILES, VERY_HIGH_MODIFIERS,
};

/// Response tone suggested by the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    DeeplySupportive,
    GentlySupportive,
    CalmingAndValidating,
    PatientAndUnderstanding,
    EnthusiasticallyMatching,
    WarmlyPositive,
    ClarifyingAndPatient,
    PeacefullyPresent,
    WarmlyAppreciative,
    BalancedAndAdaptive,
}

/// Caller-supplied situational hints.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    /// Late-night messages read as more intense than their wording.
    pub late_night: bool,
    /// Primary emotion of the previous turn, for transition detection.
    pub previous_emotion: Option<Emotion>,
}

/// Full classification of one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionAnalysis {
    pub primary_emotion: Emotion,
    /// At most 2, lenient-scored; may repeat the primary.
    pub secondary_emotions: Vec<Emotion>,
    pub intensity: u8,
    pub sentiment_score: f64,
    pub context_tag: String,
    pub confidence: f64,
    /// Self-referential phrases found in the text, at most 5.
    pub indicators: Vec<String>,
    pub suggested_tone: Tone,
    pub transition: Option<EmotionTransition>,
}

impl EmotionAnalysis {
    /// Default returned for blank input.
    fn neutral() -> Self {
        Self {
            primary_emotion: Emotion::Neutral,
            secondary_emotions: Vec::new(),
            intensity: 5,
            sentiment_score: 0.0,
            context_tag: "general".to_string(),
            confidence: 0.3,
            indicators: Vec::new(),
            suggested_tone: Tone::BalancedAndAdaptive,
            transition: None,
        }
    }
}

pub struct EmotionAnalyzer {
    indicator_patterns: Vec<Regex>,
}

impl EmotionAnalyzer {
    pub fn new() -> Self {
        let patterns = [
            r"i feel [a-z']+(?: [a-z']+){0,2}",
            r"i am [a-z']+(?: [a-z']+){0,2}",
            r"i'm [a-z']+(?: [a-z']+){0,2}",
            r"this makes me [a-z']+(?: [a-z']+){0,2}",
            r"feeling [a-z']+(?: [a-z']+){0,2}",
        ];
        let indicator_patterns = patterns
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self { indicator_patterns }
    }

    /// Classify one message. Blank text yields the neutral default.
    pub fn analyze(&self, text: &str, context: &AnalysisContext) -> EmotionAnalysis {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return EmotionAnalysis::neutral();
        }
        // Padding lets multi-word phrases match on word boundaries.
        let padded = format!(" {} ", normalized);

        let modifier_points = modifier_points(&padded);
        let mut scores: Vec<(Emotion, u32)> = Vec::with_capacity(PROFILES.len());
        for profile in &PROFILES {
            let mut base = 0u32;
            if contains_phrase(&padded, profile.emotion.as_str()) {
                base += 10;
            }
            base += 8 * count_phrases(&padded, profile.synonyms);
            base += 6 * count_phrases(&padded, profile.physical);
            // Intensity modifiers amplify emotions the text actually names.
            let total = if base > 0 { base + modifier_points } else { 0 };
            scores.push((profile.emotion, total));
        }

        // First max wins: ties resolve to table order.
        let (primary, top_score) = scores
            .iter()
            .fold((Emotion::Neutral, 0u32), |(best, high), &(e, s)| {
                if s > high {
                    (e, s)
                } else {
                    (best, high)
                }
            });
        let primary = if top_score == 0 { Emotion::Neutral } else { primary };

        let secondary = secondary_emotions(&padded);
        let intensity = self.intensity(text, &padded, context);
        let sentiment_score = sentiment(&normalized);
        let context_tag = context_tag(&padded);
        let confidence = confidence(&normalized, &padded);
        let indicators = self.indicators(text);
        let suggested_tone = suggested_tone(primary, intensity);

        let transition = context
            .previous_emotion
            .filter(|&prev| prev != primary)
            .map(|prev| detect_transition(prev, primary));

        EmotionAnalysis {
            primary_emotion: primary,
            secondary_emotions: secondary,
            intensity,
            sentiment_score,
            context_tag,
            confidence,
            indicators,
            suggested_tone,
            transition,
        }
    }

    /// Intensity [0,10]. The first modifier tier with any match decides it
    /// outright; otherwise base 5 adjusted for shouting and exclamations.
    fn intensity(&self, original: &str, padded: &str, context: &AnalysisContext) -> u8 {
        let from_modifiers = [
            (VERY_HIGH_MODIFIERS, 10u8),
            (HIGH_MODIFIERS, 8),
            (MEDIUM_MODIFIERS, 6),
            (LOW_MODIFIERS, 3),
        ]
        .iter()
        .find(|(words, _)| words.iter().any(|w| contains_phrase(padded, w)))
        .map(|&(_, level)| level);

        let mut intensity = match from_modifiers {
            Some(level) => level,
            None => {
                let mut base = 5u8;
                let letters = original.chars().filter(|c| c.is_alphabetic()).count();
                let upper = original.chars().filter(|c| c.is_uppercase()).count();
                if letters > 0 && upper as f64 / letters as f64 > 0.3 {
                    base += 2;
                }
                let exclamations = original.chars().filter(|&c| c == '!').count();
                base + exclamations.min(3) as u8
            }
        };
        if context.late_night {
            intensity += 1;
        }
        intensity.min(10)
    }

    /// First 5 unique self-referential phrases.
    fn indicators(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut found = Vec::new();
        for pattern in &self.indicator_patterns {
            for m in pattern.find_iter(&lowered) {
                let phrase = m.as_str().to_string();
                if !found.contains(&phrase) {
                    found.push(phrase);
                }
                if found.len() == 5 {
                    return found;
                }
            }
        }
        found
    }
}

impl Default for EmotionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase, punctuation to whitespace, collapsed whitespace.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_phrase(padded: &str, phrase: &str) -> bool {
    padded.contains(&format!(" {} ", phrase))
}

fn count_phrases(padded: &str, phrases: &[&str]) -> u32 {
    phrases.iter().filter(|p| contains_phrase(padded, p)).count() as u32
}

/// Σ 5 × tier multiplier per modifier word present (low 1, medium 2, high 3).
fn modifier_points(padded: &str) -> u32 {
    let mut points = 0;
    points += 15 * count_phrases(padded, VERY_HIGH_MODIFIERS);
    points += 15 * count_phrases(padded, HIGH_MODIFIERS);
    points += 10 * count_phrases(padded, MEDIUM_MODIFIERS);
    points += 5 * count_phrases(padded, LOW_MODIFIERS);
    points
}

/// Lenient re-scoring for secondary emotions: synonyms only, +3 each,
/// threshold 5, top 2 by score. The primary is not excluded.
fn secondary_emotions(padded: &str) -> Vec<Emotion> {
    let mut scored: Vec<(Emotion, u32)> = PROFILES
        .iter()
        .map(|p| (p.emotion, 3 * count_phrases(padded, p.synonyms)))
        .filter(|&(_, s)| s >= 5)
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().take(2).map(|(e, _)| e).collect()
}

/// (positive − negative) / total words; 0.0 for empty text.
fn sentiment(normalized: &str) -> f64 {
    let words: Vec<&str> = normalized.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let positive = words.iter().filter(|w| POSITIVE_WORDS.contains(w)).count() as f64;
    let negative = words.iter().filter(|w| NEGATIVE_WORDS.contains(w)).count() as f64;
    (positive - negative) / words.len() as f64
}

fn context_tag(padded: &str) -> String {
    let mut best = ("general", 0u32);
    for (tag, keywords) in &CONTEXT_TAGS {
        let hits = count_phrases(padded, keywords);
        if hits > best.1 {
            best = (tag, hits);
        }
    }
    best.0.to_string()
}

/// 0.5 base + up to 0.3 for length + up to 0.4 for emotion-word density,
/// rounded to 2 decimals, capped at 1.0.
fn confidence(normalized: &str, padded: &str) -> f64 {
    let length_part = (normalized.len() as f64 / 100.0).min(1.0) * 0.3;
    let word_count = normalized.split_whitespace().count().max(1) as f64;
    let emotion_words: u32 = PROFILES
        .iter()
        .map(|p| {
            count_phrases(padded, p.synonyms)
                + contains_phrase(padded, p.emotion.as_str()) as u32
        })
        .sum();
    let density_part = (emotion_words as f64 / word_count * 2.0).min(0.4);
    let raw = (0.5 + length_part + density_part).min(1.0);
    (raw * 100.0).round() / 100.0
}

fn suggested_tone(primary: Emotion, intensity: u8) -> Tone {
    let high = intensity > 7;
    match primary {
        Emotion::Sad | Emotion::Anxious if high => Tone::DeeplySupportive,
        Emotion::Sad | Emotion::Anxious => Tone::GentlySupportive,
        Emotion::Angry | Emotion::Frustrated if high => Tone::CalmingAndValidating,
        Emotion::Angry | Emotion::Frustrated => Tone::PatientAndUnderstanding,
        Emotion::Excited | Emotion::Happy if high => Tone::EnthusiasticallyMatching,
        Emotion::Excited | Emotion::Happy => Tone::WarmlyPositive,
        Emotion::Confused => Tone::ClarifyingAndPatient,
        Emotion::Calm => Tone::PeacefullyPresent,
        Emotion::Grateful => Tone::WarmlyAppreciative,
        Emotion::Neutral => Tone::BalancedAndAdaptive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> EmotionAnalysis {
        EmotionAnalyzer::new().analyze(text, &AnalysisContext::default())
    }

    #[test]
    fn test_blank_text_yields_neutral_default() {
        for text in ["", "   ", "\t\n", "!!! ..."] {
            let analysis = analyze(text);
            assert_eq!(analysis.primary_emotion, Emotion::Neutral);
            assert_eq!(analysis.intensity, 5);
            assert_eq!(analysis.sentiment_score, 0.0);
            assert_eq!(analysis.confidence, 0.3);
            assert!(analysis.secondary_emotions.is_empty());
        }
    }

    #[test]
    fn test_intense_happy_message() {
        let analysis = analyze("I am so incredibly happy and excited!!!");
        // Happy and excited tie; first table entry wins.
        assert_eq!(analysis.primary_emotion, Emotion::Happy);
        assert_eq!(analysis.intensity, 10);
        assert!(analysis.sentiment_score > 0.0);
    }

    #[test]
    fn test_bounds_hold_for_arbitrary_input() {
        for text in [
            "absolutely FURIOUS about everything!!!!!!!",
            "a bit tired and somewhat confused, kind of lost",
            "x",
            "the quick brown fox jumps over the lazy dog",
        ] {
            let analysis = analyze(text);
            assert!(analysis.intensity <= 10);
            assert!((0.0..=1.0).contains(&analysis.confidence));
            assert!(analysis.secondary_emotions.len() <= 2);
            assert!(analysis.indicators.len() <= 5);
        }
    }

    #[test]
    fn test_synonym_only_detection() {
        let analysis = analyze("feeling really worried and nervous about tomorrow");
        assert_eq!(analysis.primary_emotion, Emotion::Anxious);
    }

    #[test]
    fn test_no_emotion_words_is_neutral() {
        let analysis = analyze("the meeting is at three on tuesday");
        assert_eq!(analysis.primary_emotion, Emotion::Neutral);
        assert_eq!(analysis.suggested_tone, Tone::BalancedAndAdaptive);
    }

    #[test]
    fn test_modifier_short_circuit_priority() {
        // "slightly" (low) appears first in the text, but "extremely"
        // (very_high) wins on tier priority.
        let analysis = analyze("slightly annoyed but extremely angry");
        assert_eq!(analysis.intensity, 10);
    }

    #[test]
    fn test_shouting_and_exclamations_raise_intensity() {
        let analysis = analyze("I CANNOT BELIEVE THIS HAPPENED!!");
        // No modifier words: base 5 + 2 caps + 2 exclamations.
        assert_eq!(analysis.intensity, 9);
    }

    #[test]
    fn test_late_night_bumps_intensity() {
        let context = AnalysisContext { late_night: true, ..Default::default() };
        let analysis = EmotionAnalyzer::new().analyze("I am sad", &context);
        assert_eq!(analysis.intensity, 6);
    }

    #[test]
    fn test_context_tag_from_keywords() {
        let analysis = analyze("my boss moved the deadline again and work is piling up");
        assert_eq!(analysis.context_tag, "work_stress");
        assert_eq!(analyze("nothing specific here").context_tag, "general");
    }

    #[test]
    fn test_indicators_extracted() {
        let analysis = analyze("I feel so lost lately. This makes me angry.");
        assert!(analysis.indicators.iter().any(|i| i.starts_with("i feel")));
        assert!(analysis.indicators.iter().any(|i| i.starts_with("this makes me")));
    }

    #[test]
    fn test_transition_attached_when_previous_differs() {
        let context = AnalysisContext {
            previous_emotion: Some(Emotion::Sad),
            ..Default::default()
        };
        let analysis = EmotionAnalyzer::new().analyze("I am so happy today", &context);
        let transition = analysis.transition.expect("transition expected");
        assert_eq!(transition.class, TransitionClass::Improvement);

        let same = AnalysisContext {
            previous_emotion: Some(Emotion::Happy),
            ..Default::default()
        };
        let analysis = EmotionAnalyzer::new().analyze("I am so happy today", &same);
        assert!(analysis.transition.is_none());
    }

    #[test]
    fn test_negative_sentiment() {
        let analysis = analyze("this is terrible and awful and i hate it");
        assert!(analysis.sentiment_score < 0.0);
    }

    #[test]
    fn test_tone_mapping() {
        assert_eq!(analyze("I am absolutely devastated and sad").suggested_tone, Tone::DeeplySupportive);
        assert_eq!(analyze("feeling confused by all this").suggested_tone, Tone::ClarifyingAndPatient);
        assert_eq!(analyze("feeling calm and peaceful").suggested_tone, Tone::PeacefullyPresent);
    }
}
