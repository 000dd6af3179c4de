//! Trait-driven response styling pipeline
//!
//! Each stage reads the trait vector and rewrites the draft in place-order:
//! empathy, softening, depth, formality, emoji density, structure, emotion
//! overlay, relationship overlay. Probabilistic insertions use fixed,
//! documented probabilities and a caller-supplied random source.

use rand::Rng;
use regex::Regex;

use crate::emotion::Emotion;

use super::PersonalityTraits;

/// Probability of a reflective opener when wisdom is high.
pub const REFLECTIVE_OPENER_PROBABILITY: f64 = 0.4;
/// Probability of inserting a flowing transition between sentences.
pub const TRANSITION_PROBABILITY: f64 = 0.3;
/// Probability of an intimacy phrase at the deep-relationship stage.
pub const INTIMACY_PROBABILITY: f64 = 0.5;

const EMPATHY_PHRASES: [&str; 4] = ["i hear you", "i understand", "that sounds", "i can imagine"];
const COMFORT_PHRASE: &str = "I'm here with you. ";
const CALMING_PHRASE: &str = "Let's take a breath and work through this together. ";
const WELCOME_PHRASE: &str = "It's lovely to meet you. ";
const INTIMACY_PHRASE: &str = " I'm always glad we can talk like this.";
const REFLECTIVE_OPENER: &str = "Taking a moment to reflect on this... ";

/// Contraction pairs as (formal, casual).
const CONTRACTIONS: [(&str, &str); 6] = [
    ("cannot", "can't"),
    ("do not", "don't"),
    ("will not", "won't"),
    ("it is", "it's"),
    ("I will", "I'll"),
    ("you are", "you're"),
];

/// Keyword → emoji, first match wins.
const EMOJI_TABLE: [(&str, &str); 6] = [
    ("love", "💕"),
    ("congrat", "🎉"),
    ("celebrat", "🎉"),
    ("happy", "😊"),
    ("idea", "💡"),
    ("think", "🤔"),
];
const DEFAULT_EMOJI: &str = "😊";

/// Where the conversation stands between this user and agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipStage {
    FirstInteraction,
    Established,
    DeepRelationship,
}

/// Situational inputs to the styling pipeline.
#[derive(Debug, Clone, Default)]
pub struct ResponseContext {
    pub emotion: Option<Emotion>,
    pub relationship_stage: Option<RelationshipStage>,
}

/// Apply the full styling pipeline to a draft response.
pub fn adapt_response(
    draft: &str,
    traits: &PersonalityTraits,
    context: &ResponseContext,
    rng: &mut impl Rng,
) -> String {
    let mut text = draft.to_string();

    if traits.agreeableness > 7 && !contains_any(&text, &EMPATHY_PHRASES) {
        text = format!("I hear you. {}", text);
    }

    if traits.neuroticism > 6 {
        text = soften(&text);
    }

    if traits.wisdom > 7 && rng.random_bool(REFLECTIVE_OPENER_PROBABILITY) {
        text = format!("{}{}", REFLECTIVE_OPENER, text);
    }

    let formality = traits.conscientiousness + (10 - traits.playfulness);
    if formality <= 8 {
        text = casualize(&text);
    } else if formality >= 15 {
        text = formalize(&text);
    }

    let expressiveness = (traits.playfulness + traits.extraversion) / 2;
    if expressiveness <= 3 {
        text = strip_emoji(&text);
    } else if expressiveness >= 8 {
        text = append_emoji(&text);
    }

    if traits.openness > 7 && traits.wisdom > 6 && rng.random_bool(TRANSITION_PROBABILITY) {
        text = insert_transition(&text);
    }
    if traits.conscientiousness > 8 {
        text = number_lines(&text);
    }

    text = emotion_overlay(&text, context.emotion);

    match context.relationship_stage {
        Some(RelationshipStage::FirstInteraction) => {
            text = format!("{}{}", WELCOME_PHRASE, text);
        }
        Some(RelationshipStage::DeepRelationship) => {
            if rng.random_bool(INTIMACY_PROBABILITY) {
                text.push_str(INTIMACY_PHRASE);
            }
        }
        _ => {}
    }

    text
}

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    phrases.iter().any(|p| lowered.contains(p))
}

/// Replace directive phrasing with tentative phrasing.
fn soften(text: &str) -> String {
    let mut result = text
        .replace("you should", "you might consider")
        .replace("You should", "You might consider");
    for (pattern, replacement) in [(r"\bmust\b", "could"), (r"\bobviously\b", "perhaps"), (r"\bObviously\b", "Perhaps")] {
        if let Ok(re) = Regex::new(pattern) {
            result = re.replace_all(&result, replacement).into_owned();
        }
    }
    result
}

fn casualize(text: &str) -> String {
    let mut result = text.to_string();
    for (formal, casual) in CONTRACTIONS {
        result = result.replace(formal, casual);
    }
    result
}

fn formalize(text: &str) -> String {
    let mut result = text.to_string();
    for (formal, casual) in CONTRACTIONS {
        result = result.replace(casual, formal);
    }
    result
}

fn is_emoji(c: char) -> bool {
    matches!(c,
        '\u{1F000}'..='\u{1FAFF}' | '\u{2600}'..='\u{27BF}' | '\u{2B00}'..='\u{2BFF}' | '\u{FE0F}'
    )
}

fn strip_emoji(text: &str) -> String {
    let stripped: String = text.chars().filter(|&c| !is_emoji(c)).collect();
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Append one contextual emoji chosen by the first matching keyword.
fn append_emoji(text: &str) -> String {
    if text.chars().any(is_emoji) {
        return text.to_string();
    }
    let lowered = text.to_lowercase();
    let emoji = EMOJI_TABLE
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|&(_, e)| e)
        .unwrap_or(DEFAULT_EMOJI);
    format!("{} {}", text.trim_end(), emoji)
}

/// Prefix the second sentence with a flowing transition.
fn insert_transition(text: &str) -> String {
    let Some(split) = text.find(". ") else {
        return text.to_string();
    };
    let (first, rest) = text.split_at(split + 2);
    if rest.is_empty() {
        return text.to_string();
    }
    let mut chars = rest.chars();
    let rest_lowered = match chars.next() {
        Some(c) => format!("{}{}", c.to_lowercase(), chars.as_str()),
        None => return text.to_string(),
    };
    format!("{}Moreover, {}", first, rest_lowered)
}

/// Number each line of a multi-line response, skipping blanks and lines
/// already numbered.
fn number_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.iter().filter(|l| !l.trim().is_empty()).count() < 2 {
        return text.to_string();
    }
    if lines.iter().any(|l| {
        l.trim_start()
            .split('.')
            .next()
            .map(|head| head.chars().all(|c| c.is_ascii_digit()) && !head.is_empty())
            .unwrap_or(false)
    }) {
        return text.to_string();
    }
    let mut counter = 0;
    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                counter += 1;
                format!("{}. {}", counter, line.trim_start())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn emotion_overlay(text: &str, emotion: Option<Emotion>) -> String {
    match emotion {
        Some(Emotion::Sad) | Some(Emotion::Anxious) => {
            if text.to_lowercase().contains("i'm here") {
                text.to_string()
            } else {
                format!("{}{}", COMFORT_PHRASE, text)
            }
        }
        Some(Emotion::Excited) | Some(Emotion::Happy) => text
            .replace("good", "great")
            .replace("nice", "wonderful"),
        Some(Emotion::Frustrated) | Some(Emotion::Angry) => {
            if text.to_lowercase().contains("take a breath") {
                text.to_string()
            } else {
                format!("{}{}", CALMING_PHRASE, text)
            }
        }
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    /// Constant-output source: 0 forces every probabilistic branch on,
    /// u64::MAX forces every branch off.
    struct ConstRng(u64);

    impl RngCore for ConstRng {
        fn next_u32(&mut self) -> u32 {
            self.0 as u32
        }
        fn next_u64(&mut self) -> u64 {
            self.0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            let bytes = self.0.to_le_bytes();
            for (i, b) in dest.iter_mut().enumerate() {
                *b = bytes[i % 8];
            }
        }
    }

    fn always() -> ConstRng {
        ConstRng(0)
    }

    fn never() -> ConstRng {
        ConstRng(u64::MAX)
    }

    fn plain_traits() -> PersonalityTraits {
        PersonalityTraits::default()
    }

    #[test]
    fn test_default_traits_leave_draft_unchanged() {
        let out = adapt_response(
            "Here is my answer.",
            &plain_traits(),
            &ResponseContext::default(),
            &mut never(),
        );
        assert_eq!(out, "Here is my answer.");
    }

    #[test]
    fn test_high_agreeableness_prepends_empathy() {
        let traits = PersonalityTraits { agreeableness: 9, ..plain_traits() };
        let out = adapt_response("Try again.", &traits, &ResponseContext::default(), &mut never());
        assert!(out.starts_with("I hear you. "));

        // Existing empathy phrase suppresses the insertion.
        let out = adapt_response(
            "That sounds hard. Try again.",
            &traits,
            &ResponseContext::default(),
            &mut never(),
        );
        assert!(!out.starts_with("I hear you."));
    }

    #[test]
    fn test_high_neuroticism_softens_directives() {
        let traits = PersonalityTraits { neuroticism: 8, ..plain_traits() };
        let out = adapt_response(
            "You should rest. Obviously you must slow down.",
            &traits,
            &ResponseContext::default(),
            &mut never(),
        );
        assert!(out.contains("You might consider rest"));
        assert!(out.contains("Perhaps"));
        assert!(out.contains("could slow down"));
        assert!(!out.contains("must"));
    }

    #[test]
    fn test_softening_respects_word_boundaries() {
        let traits = PersonalityTraits { neuroticism: 8, ..plain_traits() };
        let out = adapt_response(
            "Pass the mustard.",
            &traits,
            &ResponseContext::default(),
            &mut never(),
        );
        assert_eq!(out, "Pass the mustard.");
    }

    #[test]
    fn test_wisdom_opener_is_probabilistic() {
        let traits = PersonalityTraits { wisdom: 9, ..plain_traits() };
        let on = adapt_response("Consider this.", &traits, &ResponseContext::default(), &mut always());
        assert!(on.starts_with("Taking a moment to reflect"));
        let off = adapt_response("Consider this.", &traits, &ResponseContext::default(), &mut never());
        assert_eq!(off, "Consider this.");
    }

    #[test]
    fn test_low_formality_casualizes() {
        // conscientiousness 3 + (10 − playfulness 9) = 4.
        let traits = PersonalityTraits { conscientiousness: 3, playfulness: 9, ..plain_traits() };
        let out = adapt_response(
            "I cannot say whether it is fine, do not worry.",
            &traits,
            &ResponseContext::default(),
            &mut never(),
        );
        assert_eq!(out, "I can't say whether it's fine, don't worry.");
    }

    #[test]
    fn test_high_formality_formalizes() {
        // conscientiousness 9 + (10 − playfulness 2) = 17.
        let traits = PersonalityTraits { conscientiousness: 9, playfulness: 2, ..plain_traits() };
        let out = adapt_response(
            "Here is the plan, don't rush, it's simple.",
            &traits,
            &ResponseContext::default(),
            &mut never(),
        );
        assert!(out.contains("do not rush"));
        assert!(out.contains("it is simple"));
    }

    #[test]
    fn test_low_expressiveness_strips_emoji() {
        let traits = PersonalityTraits { playfulness: 2, extraversion: 3, ..plain_traits() };
        let out = adapt_response(
            "Well done 🎉 keep going 😊",
            &traits,
            &ResponseContext::default(),
            &mut never(),
        );
        assert_eq!(out, "Well done keep going");
    }

    #[test]
    fn test_high_expressiveness_appends_contextual_emoji() {
        let traits = PersonalityTraits { playfulness: 9, extraversion: 8, ..plain_traits() };
        let out = adapt_response(
            "Congratulations on the launch",
            &traits,
            &ResponseContext::default(),
            &mut never(),
        );
        assert!(out.ends_with("🎉"));

        // Already has an emoji: nothing appended.
        let out = adapt_response("Done! 😊", &traits, &ResponseContext::default(), &mut never());
        assert_eq!(out, "Done! 😊");
    }

    #[test]
    fn test_structure_numbering() {
        let traits = PersonalityTraits { conscientiousness: 9, playfulness: 8, ..plain_traits() };
        let out = adapt_response(
            "First do this\nThen do that",
            &traits,
            &ResponseContext::default(),
            &mut never(),
        );
        assert_eq!(out, "1. First do this\n2. Then do that");

        let single = adapt_response("Just one line", &traits, &ResponseContext::default(), &mut never());
        assert_eq!(single, "Just one line");
    }

    #[test]
    fn test_flowing_transition_inserted() {
        let traits = PersonalityTraits { openness: 8, wisdom: 7, ..plain_traits() };
        let out = adapt_response(
            "This is one idea. Here is another.",
            &traits,
            &ResponseContext::default(),
            &mut always(),
        );
        assert!(out.contains("Moreover, here is another."));
    }

    #[test]
    fn test_sad_context_prepends_comfort() {
        let context = ResponseContext { emotion: Some(Emotion::Sad), ..Default::default() };
        let out = adapt_response("Things will settle.", &plain_traits(), &context, &mut never());
        assert!(out.starts_with("I'm here with you. "));
    }

    #[test]
    fn test_happy_context_boosts_positivity() {
        let context = ResponseContext { emotion: Some(Emotion::Happy), ..Default::default() };
        let out = adapt_response("That is a good plan.", &plain_traits(), &context, &mut never());
        assert_eq!(out, "That is a great plan.");
    }

    #[test]
    fn test_angry_context_prepends_calming() {
        let context = ResponseContext { emotion: Some(Emotion::Angry), ..Default::default() };
        let out = adapt_response("Let me explain.", &plain_traits(), &context, &mut never());
        assert!(out.starts_with("Let's take a breath"));
    }

    #[test]
    fn test_relationship_overlays() {
        let first = ResponseContext {
            relationship_stage: Some(RelationshipStage::FirstInteraction),
            ..Default::default()
        };
        let out = adapt_response("How can I help?", &plain_traits(), &first, &mut never());
        assert!(out.starts_with("It's lovely to meet you. "));

        let deep = ResponseContext {
            relationship_stage: Some(RelationshipStage::DeepRelationship),
            ..Default::default()
        };
        let on = adapt_response("Good to see you.", &plain_traits(), &deep, &mut always());
        assert!(on.ends_with("I'm always glad we can talk like this."));
        let off = adapt_response("Good to see you.", &plain_traits(), &deep, &mut never());
        assert_eq!(off, "Good to see you.");
    }
}
