//! 形容詞・副詞の極性を平均する英語スコアラー。
use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};

use super::scorer::PolarityScorer;
use crate::normalize::{Language, TextNormalizer};

const LEXICON_TSV: &str = include_str!("../resources/pattern_lexicon.tsv");
const NEGATION_FACTOR: f64 = -0.5;

#[derive(Debug, Clone, Copy)]
struct Entry {
    polarity: f64,
    intensity: f64,
}

static LEXICON: Lazy<FxHashMap<String, Entry>> = Lazy::new(|| {
    let parse = |value: &str| value.parse::<f64>().expect("pattern lexicon number");
    LEXICON_TSV
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let columns: Vec<&str> = line.split('\t').collect();
            let entry = Entry {
                polarity: parse(columns[1]),
                intensity: columns.get(2).map_or(1.0, |v| parse(v)),
            };
            (columns[0].to_string(), entry)
        })
        .collect()
});

static NEGATIONS: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| ["not", "never", "no", "n't", "nothing", "hardly"].into_iter().collect());

/// 極性語の平均を返す。強調語は直後の極性語に掛かり、否定は符号を反転して弱める。
#[derive(Debug)]
pub struct PatternScorer {
    normalizer: TextNormalizer,
}

impl Default for PatternScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternScorer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            normalizer: TextNormalizer::new(Language::English),
        }
    }
}

impl PolarityScorer for PatternScorer {
    fn score(&self, text: &str) -> f64 {
        let mut assessments: Vec<f64> = Vec::new();
        let mut modifier = 1.0;
        let mut negated = false;

        for token in self.normalizer.tokenize(text) {
            if token.chars().all(|c| !c.is_alphanumeric() && c != '\'') {
                modifier = 1.0;
                negated = false;
                continue;
            }
            if NEGATIONS.contains(token.as_str()) || token.ends_with("n't") {
                negated = true;
                continue;
            }
            let Some(entry) = LEXICON.get(&token) else {
                continue;
            };
            if entry.polarity == 0.0 {
                modifier *= entry.intensity;
                continue;
            }
            let mut value = entry.polarity * modifier;
            if negated {
                value *= NEGATION_FACTOR;
            }
            assessments.push(value);
            modifier = 1.0;
            negated = false;
        }

        if assessments.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = assessments.iter().sum::<f64>() / assessments.len() as f64;
        mean.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(text: &str) -> f64 {
        PatternScorer::new().score(text)
    }

    #[test]
    fn averages_polarities() {
        assert!((score("A good and clean park") - (0.7 + 0.37) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn intensifier_scales_next_word() {
        assert!((score("The park is very good") - 0.91).abs() < 1e-9);
    }

    #[test]
    fn negation_reverses_and_dampens() {
        assert!((score("The park is not good") + 0.35).abs() < 1e-9);
    }

    #[test]
    fn punctuation_resets_negation() {
        assert!((score("Not today. The park is good") - 0.7).abs() < 1e-9);
    }

    #[test]
    fn clamps_to_unit_range() {
        assert!((score("extremely perfect") - 1.0).abs() < 1e-9);
        assert!(score("The bus leaves at nine").abs() < f64::EPSILON);
    }
}
