//! 語彙とルールに基づく英語の極性スコアラー (VADER)。
//!
//! 強調語・否定・大文字強調・感嘆符・逆接 "but" を考慮し、合計値を
//! `s / sqrt(s² + 15)` で [-1, 1] の compound スコアに正規化する。
use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{lexicon::parse_rows, scorer::PolarityScorer};

const LEXICON_TSV: &str = include_str!("../resources/vader_lexicon.tsv");

const BOOST_INCR: f64 = 0.293;
const BOOST_DECR: f64 = -0.293;
const CAPS_INCR: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
const ALPHA: f64 = 15.0;

static LEXICON: Lazy<FxHashMap<String, f64>> = Lazy::new(|| {
    parse_rows("builtin:vader_lexicon.tsv", LEXICON_TSV)
        .expect("parse vader lexicon")
        .into_iter()
        .map(|(_, word, value)| (word.to_string(), value.parse().expect("vader valence")))
        .collect()
});

static NEGATIONS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "dont",
        "hadnt", "hasnt", "havent", "isnt", "mightnt", "mustnt", "neither", "never", "none",
        "nope", "nor", "not", "nothing", "nowhere", "shouldnt", "wasnt", "werent", "without",
        "wont", "wouldnt", "rarely", "seldom", "despite",
    ]
    .into_iter()
    .collect()
});

static BOOSTERS: Lazy<FxHashMap<&'static str, f64>> = Lazy::new(|| {
    let increments = [
        "absolutely", "amazingly", "completely", "considerably", "deeply", "effing",
        "enormously", "entirely", "especially", "exceptionally", "extremely", "fabulously",
        "greatly", "highly", "hugely", "incredibly", "intensely", "majorly", "more", "most",
        "particularly", "purely", "quite", "really", "remarkably", "so", "substantially",
        "thoroughly", "totally", "tremendously", "uber", "unbelievably", "unusually",
        "utterly", "very",
    ];
    let decrements = [
        "almost", "barely", "hardly", "less", "little", "marginally", "occasionally",
        "partly", "scarcely", "slightly", "somewhat",
    ];
    increments
        .into_iter()
        .map(|w| (w, BOOST_INCR))
        .chain(decrements.into_iter().map(|w| (w, BOOST_DECR)))
        .collect()
});

/// VADER の compound スコアを返す。
#[derive(Debug, Default, Clone, Copy)]
pub struct VaderScorer;

impl PolarityScorer for VaderScorer {
    fn score(&self, text: &str) -> f64 {
        let words = split_words(text);
        if words.is_empty() {
            return 0.0;
        }
        let lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let caps_differential = allcap_differential(&words);

        let mut sentiments: Vec<f64> = Vec::with_capacity(words.len());
        for (i, word) in lower.iter().enumerate() {
            if BOOSTERS.contains_key(word.as_str())
                || (word == "kind" && lower.get(i + 1).is_some_and(|next| next == "of"))
            {
                sentiments.push(0.0);
                continue;
            }
            sentiments.push(valence(&words, &lower, i, caps_differential));
        }

        but_check(&lower, &mut sentiments);
        compound(text, sentiments.iter().sum())
    }
}

/// 前後の句読点を落とす。落とした結果が2文字以下なら顔文字とみなして残す。
fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|raw| {
            let stripped = raw.trim_matches(|c: char| c.is_ascii_punctuation());
            let word = if stripped.chars().count() <= 2 { raw } else { stripped };
            (word.chars().count() > 1).then(|| word.replace('\'', ""))
        })
        .collect()
}

fn is_upper(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && !word.chars().any(char::is_lowercase)
}

/// 一部の語だけが大文字で書かれているか。
fn allcap_differential(words: &[String]) -> bool {
    let caps = words.iter().filter(|w| is_upper(w)).count();
    caps > 0 && caps < words.len()
}

fn valence(words: &[String], lower: &[String], i: usize, caps_differential: bool) -> f64 {
    let Some(&base) = LEXICON.get(&lower[i]) else {
        return 0.0;
    };
    let mut valence = base;
    if caps_differential && is_upper(&words[i]) {
        valence += if valence > 0.0 { CAPS_INCR } else { -CAPS_INCR };
    }

    for start in 0..3 {
        if i <= start {
            break;
        }
        let prior = i - (start + 1);
        if LEXICON.contains_key(&lower[prior]) {
            continue;
        }
        let mut scalar = booster_scalar(&words[prior], &lower[prior], valence, caps_differential);
        if start == 1 {
            scalar *= 0.95;
        } else if start == 2 {
            scalar *= 0.9;
        }
        valence += scalar;
        valence = negation_check(valence, lower, start, i);
    }
    least_check(valence, lower, i)
}

fn booster_scalar(word: &str, lower: &str, valence: f64, caps_differential: bool) -> f64 {
    let Some(&boost) = BOOSTERS.get(lower) else {
        return 0.0;
    };
    let mut scalar = if valence < 0.0 { -boost } else { boost };
    if caps_differential && is_upper(word) {
        scalar += if valence > 0.0 { CAPS_INCR } else { -CAPS_INCR };
    }
    scalar
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(word) || word.contains("n't")
}

fn negation_check(valence: f64, lower: &[String], start: usize, i: usize) -> f64 {
    let at = |back: usize| lower[i - back].as_str();
    match start {
        0 if is_negation(at(1)) => valence * NEGATION_SCALAR,
        1 => {
            if at(2) == "never" && matches!(at(1), "so" | "this") {
                valence * 1.25
            } else if at(2) == "without" && at(1) == "doubt" {
                valence
            } else if is_negation(at(2)) {
                valence * NEGATION_SCALAR
            } else {
                valence
            }
        }
        2 => {
            if at(3) == "never" && (matches!(at(2), "so" | "this") || matches!(at(1), "so" | "this"))
            {
                valence * 1.25
            } else if at(3) == "without" && (at(2) == "doubt" || at(1) == "doubt") {
                valence
            } else if is_negation(at(3)) {
                valence * NEGATION_SCALAR
            } else {
                valence
            }
        }
        _ => valence,
    }
}

fn least_check(valence: f64, lower: &[String], i: usize) -> f64 {
    if i > 0 && lower[i - 1] == "least" && !LEXICON.contains_key("least") {
        if i > 1 && matches!(lower[i - 2].as_str(), "at" | "very") {
            return valence;
        }
        return valence * NEGATION_SCALAR;
    }
    valence
}

/// "but" の前を弱め、後を強める。
fn but_check(lower: &[String], sentiments: &mut [f64]) {
    let Some(pivot) = lower.iter().position(|w| w == "but") else {
        return;
    };
    for (idx, sentiment) in sentiments.iter_mut().enumerate() {
        if idx < pivot {
            *sentiment *= 0.5;
        } else if idx > pivot {
            *sentiment *= 1.5;
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let exclamations = text.chars().filter(|&c| c == '!').count().min(4) as f64 * 0.292;
    let questions = text.chars().filter(|&c| c == '?').count();
    #[allow(clippy::cast_precision_loss)]
    let question_amp = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * 0.18,
        _ => 0.96,
    };
    exclamations + question_amp
}

fn compound(text: &str, sum: f64) -> f64 {
    if sum == 0.0 {
        return 0.0;
    }
    let emphasis = punctuation_emphasis(text);
    let total = if sum > 0.0 { sum + emphasis } else { sum - emphasis };
    (total / (total * total + ALPHA).sqrt()).clamp(-1.0, 1.0)
}
