//! Emotion transitions and pattern-over-time analytics

use serde::{Deserialize, Serialize};

use super::lexicon::Emotion;

/// Direction class of a change between two consecutive classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionClass {
    Improvement,
    Decline,
    PositiveShift,
    NegativeShift,
    NeutralShift,
}

/// Magnitude of a transition, bucketed from valence/arousal distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Minor,
    Moderate,
    Significant,
    Major,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionTransition {
    pub from: Emotion,
    pub to: Emotion,
    pub class: TransitionClass,
    pub significance: Significance,
    pub acknowledgment: String,
}

/// Classify the change between two consecutive emotions.
pub fn detect_transition(prev: Emotion, curr: Emotion) -> EmotionTransition {
    let class = match (prev.is_positive(), curr.is_positive()) {
        _ if prev == Emotion::Neutral || curr == Emotion::Neutral => TransitionClass::NeutralShift,
        (false, true) if prev.is_negative() => TransitionClass::Improvement,
        (true, false) if curr.is_negative() => TransitionClass::Decline,
        (true, true) => TransitionClass::PositiveShift,
        (false, false) if prev.is_negative() && curr.is_negative() => {
            TransitionClass::NegativeShift
        }
        _ => TransitionClass::NeutralShift,
    };

    let (px, py) = prev.coordinates();
    let (cx, cy) = curr.coordinates();
    let distance = ((cx - px).powi(2) + (cy - py).powi(2)).sqrt();
    let significance = if distance <= 2.0 {
        Significance::Minor
    } else if distance <= 5.0 {
        Significance::Moderate
    } else if distance <= 8.0 {
        Significance::Significant
    } else {
        Significance::Major
    };

    EmotionTransition {
        from: prev,
        to: curr,
        class,
        significance,
        acknowledgment: acknowledgment_for(class).to_string(),
    }
}

fn acknowledgment_for(class: TransitionClass) -> &'static str {
    match class {
        TransitionClass::Improvement => "It's good to see your spirits lifting.",
        TransitionClass::Decline => "I can sense this has been weighing on you.",
        TransitionClass::PositiveShift => "Your positive energy is taking a new shape.",
        TransitionClass::NegativeShift => "I notice the feeling has shifted, and I'm here with you.",
        TransitionClass::NeutralShift => "I notice a change in how you're feeling.",
    }
}

/// Positivity trend across a rolling history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityLevel {
    High,
    Moderate,
    Low,
}

/// Summary of a rolling emotion history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionPattern {
    /// Top emotions by frequency, as (emotion, percentage), at most 3.
    pub dominant: Vec<(Emotion, f64)>,
    /// Percentage of adjacent pairs that changed emotion.
    pub volatility: f64,
    pub trend: Trend,
    pub stability: StabilityLevel,
}

/// Analyze a rolling history, oldest first. Volatility needs at least 3
/// entries (else 0); the trend needs at least 5 (else stable).
pub fn analyze_pattern(history: &[Emotion]) -> EmotionPattern {
    let total = history.len();

    let mut counts: Vec<(Emotion, usize)> = Vec::new();
    for &emotion in history {
        match counts.iter_mut().find(|(e, _)| *e == emotion) {
            Some((_, n)) => *n += 1,
            None => counts.push((emotion, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    let dominant = counts
        .iter()
        .take(3)
        .map(|&(e, n)| (e, n as f64 / total.max(1) as f64 * 100.0))
        .collect();

    let volatility = if total >= 3 {
        let changes = history.windows(2).filter(|w| w[0] != w[1]).count();
        changes as f64 / (total - 1) as f64 * 100.0
    } else {
        0.0
    };

    let trend = if total >= 5 {
        let mid = total / 2;
        let ratio = |slice: &[Emotion]| {
            slice.iter().filter(|e| e.is_positive()).count() as f64 / slice.len() as f64
        };
        let delta = ratio(&history[mid..]) - ratio(&history[..mid]);
        if delta > 0.1 {
            Trend::Improving
        } else if delta < -0.1 {
            Trend::Declining
        } else {
            Trend::Stable
        }
    } else {
        Trend::Stable
    };

    let stability = if volatility < 20.0 {
        StabilityLevel::High
    } else if volatility < 50.0 {
        StabilityLevel::Moderate
    } else {
        StabilityLevel::Low
    };

    EmotionPattern {
        dominant,
        volatility,
        trend,
        stability,
    }
}
