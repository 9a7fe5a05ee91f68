//! 感情分析: 文書ごとの極性スコアと pos / neu / neg の判定。
//!
//! 英語はスコアラーで直接評価する。組み込みまたは注入された極性辞書を持つ言語は
//! 辞書の生スコアをバッチの最小・最大で [-1, 1] に再スケールする。
//! それ以外の言語は英語に翻訳してから英語スコアラーで評価する。
pub mod lexicon;
pub mod pattern;
pub mod scorer;
pub mod vader;

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use self::lexicon::PolarityLexicon;
pub use self::pattern::PatternScorer;
pub use self::scorer::{PolarityScorer, ScorerKind};
pub use self::vader::VaderScorer;
use crate::normalize::{IdentityTranslator, Language, Translator};
use crate::util::error::{AnalysisError, AnalysisResult};

/// 感情分析の設定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub neu_inf_lim: f64,
    pub neu_sup_lim: f64,
    pub language: Language,
    pub scorer: ScorerKind,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            neu_inf_lim: -0.3,
            neu_sup_lim: 0.3,
            language: Language::English,
            scorer: ScorerKind::Vader,
        }
    }
}

impl SentimentConfig {
    /// # Errors
    /// 閾値が [-1, 1] の外、または `neu_inf_lim >= neu_sup_lim` の場合は設定エラー。
    pub fn validate(&self) -> AnalysisResult<()> {
        for (name, value) in [("neu_inf_lim", self.neu_inf_lim), ("neu_sup_lim", self.neu_sup_lim)] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(AnalysisError::config(format!(
                    "{name} must be within [-1, 1], got {value}"
                )));
            }
        }
        if self.neu_inf_lim >= self.neu_sup_lim {
            return Err(AnalysisError::config(format!(
                "neu_inf_lim ({}) must be lower than neu_sup_lim ({})",
                self.neu_inf_lim, self.neu_sup_lim
            )));
        }
        Ok(())
    }

    /// スコアを分類する。`neu_inf_lim` は neu、`neu_sup_lim` は pos に含まれる。
    #[must_use]
    pub fn classify(&self, score: f64) -> SentimentClass {
        if score < self.neu_inf_lim {
            SentimentClass::Neg
        } else if score < self.neu_sup_lim {
            SentimentClass::Neu
        } else {
            SentimentClass::Pos
        }
    }
}

/// 感情の分類。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentClass {
    Pos,
    Neu,
    Neg,
}

impl SentimentClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pos => "pos",
            Self::Neu => "neu",
            Self::Neg => "neg",
        }
    }
}

impl fmt::Display for SentimentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 文書1件の判定結果。`doc` は翻訳前の原文。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentTag {
    pub doc: String,
    pub class: SentimentClass,
    pub score: f64,
}

/// バッチ内の生スコアの最小・最大。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    min: f64,
    max: f64,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl ScoreRange {
    #[must_use]
    pub fn observe(mut self, score: f64) -> Self {
        self.min = self.min.min(score);
        self.max = self.max.max(score);
        self
    }

    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64)> {
        (self.min <= self.max).then_some((self.min, self.max))
    }

    /// `[min, max]` を `[-1, 1]` に線形変換する。幅が0なら [-1, 1] に丸めるだけ。
    #[must_use]
    pub fn rescale(&self, score: f64) -> f64 {
        match self.bounds() {
            Some((min, max)) if max > min => -1.0 + (score - min) * 2.0 / (max - min),
            _ => score.clamp(-1.0, 1.0),
        }
    }
}

/// 感情分析器。翻訳器と追加の極性辞書を保持する。
pub struct SentimentAnalyzer {
    translator: Box<dyn Translator>,
    lexicon: Option<PolarityLexicon>,
}

impl fmt::Debug for SentimentAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentimentAnalyzer")
            .field("lexicon", &self.lexicon.as_ref().map(PolarityLexicon::language))
            .finish_non_exhaustive()
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentAnalyzer {
    /// 翻訳しない（恒等翻訳の）分析器。
    #[must_use]
    pub fn new() -> Self {
        Self::with_translator(IdentityTranslator)
    }

    #[must_use]
    pub fn with_translator(translator: impl Translator + 'static) -> Self {
        Self {
            translator: Box::new(translator),
            lexicon: None,
        }
    }

    /// 組み込み辞書より優先して使う極性辞書を設定する。
    #[must_use]
    pub fn with_lexicon(mut self, lexicon: PolarityLexicon) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    fn lexicon_for(&self, language: Language) -> Option<&PolarityLexicon> {
        self.lexicon
            .as_ref()
            .filter(|lexicon| lexicon.language() == language)
            .or_else(|| PolarityLexicon::builtin(language))
    }

    /// 文書ごとに極性スコアと分類を求める。結果は入力順。
    ///
    /// # Errors
    /// 閾値が不正な場合や辞書スコアラーに対応する辞書がない場合は
    /// [`AnalysisError::Configuration`]、翻訳が失敗し続けた場合は
    /// [`AnalysisError::TranslationUnavailable`]、翻訳要求が拒否された場合は
    /// [`AnalysisError::TranslationRejected`] を返す。
    pub fn analyze<S: AsRef<str>>(
        &self,
        docs: &[S],
        config: &SentimentConfig,
    ) -> AnalysisResult<Vec<SentimentTag>> {
        config.validate()?;
        info!(
            documents = docs.len(),
            language = %config.language,
            scorer = %config.scorer,
            "starting sentiment analysis"
        );

        let lexicon = self.lexicon_for(config.language);
        match (config.scorer, lexicon) {
            (ScorerKind::Lexicon, None) => Err(AnalysisError::config(format!(
                "no polarity lexicon available for {}",
                config.language
            ))),
            (ScorerKind::Lexicon, Some(lexicon)) => Ok(score_with_lexicon(docs, lexicon, config)),
            (_, Some(lexicon)) if config.language != Language::English => {
                Ok(score_with_lexicon(docs, lexicon, config))
            }
            (kind, _) if config.language == Language::English => {
                let scorer = english_scorer(kind);
                Ok(docs
                    .iter()
                    .map(|doc| tag(doc.as_ref(), scorer.score(doc.as_ref()), config))
                    .collect())
            }
            (kind, _) => self.score_translated(docs, kind, config),
        }
    }

    fn score_translated<S: AsRef<str>>(
        &self,
        docs: &[S],
        kind: ScorerKind,
        config: &SentimentConfig,
    ) -> AnalysisResult<Vec<SentimentTag>> {
        let scorer = english_scorer(kind);
        let translated = docs
            .iter()
            .map(|doc| {
                self.translator
                    .translate(doc.as_ref(), config.language, Language::English)
            })
            .collect::<AnalysisResult<Vec<String>>>()?;
        debug!(documents = translated.len(), "translated documents to english");

        Ok(docs
            .iter()
            .zip(&translated)
            .map(|(original, english)| tag(original.as_ref(), scorer.score(english), config))
            .collect())
    }
}

fn english_scorer(kind: ScorerKind) -> Box<dyn PolarityScorer> {
    match kind {
        ScorerKind::Pattern => Box::new(PatternScorer::new()),
        ScorerKind::Vader | ScorerKind::Lexicon => Box::new(VaderScorer),
    }
}

fn tag(doc: &str, score: f64, config: &SentimentConfig) -> SentimentTag {
    SentimentTag {
        doc: doc.to_string(),
        class: config.classify(score),
        score,
    }
}

/// 辞書の生スコアを求め、バッチの最小・最大で再スケールして分類し直す。
fn score_with_lexicon<S: AsRef<str>>(
    docs: &[S],
    lexicon: &PolarityLexicon,
    config: &SentimentConfig,
) -> Vec<SentimentTag> {
    let (raw, range) = docs.iter().fold(
        (Vec::with_capacity(docs.len()), ScoreRange::default()),
        |(mut raw, range), doc| {
            let score = lexicon.score(doc.as_ref());
            raw.push(tag(doc.as_ref(), score, config));
            (raw, range.observe(score))
        },
    );

    match range.bounds() {
        Some((min, max)) if min == max && min == 0.0 => {
            debug!("all lexicon scores are zero; keeping raw labels");
            raw
        }
        _ => raw
            .into_iter()
            .map(|tagged| {
                let score = range.rescale(tagged.score);
                SentimentTag {
                    class: config.classify(score),
                    score,
                    doc: tagged.doc,
                }
            })
            .collect(),
    }
}

/// クラスごとにまとめた結果。順序は pos, neu, neg。
#[must_use]
pub fn group_by_class(tags: &[SentimentTag]) -> Vec<(SentimentClass, Vec<&SentimentTag>)> {
    let mut groups: BTreeMap<SentimentClass, Vec<&SentimentTag>> = BTreeMap::new();
    for tagged in tags {
        groups.entry(tagged.class).or_default().push(tagged);
    }
    groups.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(-0.31, SentimentClass::Neg)]
    #[case(-0.3, SentimentClass::Neu)]
    #[case(0.0, SentimentClass::Neu)]
    #[case(0.29, SentimentClass::Neu)]
    #[case(0.3, SentimentClass::Pos)]
    #[case(1.0, SentimentClass::Pos)]
    fn half_open_boundaries(#[case] score: f64, #[case] expected: SentimentClass) {
        assert_eq!(SentimentConfig::default().classify(score), expected);
    }

    #[rstest]
    #[case(0.3, 0.3)]
    #[case(0.5, 0.1)]
    #[case(-1.5, 0.3)]
    #[case(-0.3, 1.2)]
    fn rejects_invalid_limits(#[case] inf: f64, #[case] sup: f64) {
        let config = SentimentConfig {
            neu_inf_lim: inf,
            neu_sup_lim: sup,
            ..SentimentConfig::default()
        };
        assert!(matches!(
            SentimentAnalyzer::new().analyze(&["text"], &config),
            Err(AnalysisError::Configuration(_))
        ));
    }

    #[test]
    fn rescale_maps_bounds_to_unit_range() {
        let range = [2.0, -1.0, 0.5]
            .into_iter()
            .fold(ScoreRange::default(), ScoreRange::observe);
        assert!((range.rescale(-1.0) + 1.0).abs() < 1e-12);
        assert!((range.rescale(2.0) - 1.0).abs() < 1e-12);
        assert!(range.rescale(0.5).abs() < 1e-12);
    }

    #[test]
    fn constant_range_clamps() {
        let range = ScoreRange::default().observe(3.0).observe(3.0);
        assert!((range.rescale(3.0) - 1.0).abs() < f64::EPSILON);
        assert_eq!(ScoreRange::default().bounds(), None);
    }

    #[test]
    fn english_documents_keep_input_order() {
        let docs = ["The park is wonderful", "The bus leaves at nine", "The service is terrible"];
        let tags = SentimentAnalyzer::new()
            .analyze(&docs, &SentimentConfig::default())
            .expect("analyze");
        let classes: Vec<SentimentClass> = tags.iter().map(|t| t.class).collect();
        assert_eq!(
            classes,
            vec![SentimentClass::Pos, SentimentClass::Neu, SentimentClass::Neg]
        );
        assert_eq!(tags[1].doc, docs[1]);
    }

    #[test]
    fn spanish_uses_builtin_lexicon_with_rescaling() {
        let docs = ["El parque es bonito", "El autobús es horrible", "Hay un parque"];
        let config = SentimentConfig {
            language: Language::Spanish,
            ..SentimentConfig::default()
        };
        let tags = SentimentAnalyzer::new().analyze(&docs, &config).expect("analyze");
        assert!((tags[0].score - 1.0).abs() < 1e-12);
        assert!((tags[1].score + 1.0).abs() < 1e-12);
        assert_eq!(tags[0].class, SentimentClass::Pos);
        assert_eq!(tags[1].class, SentimentClass::Neg);
        assert!(tags.iter().all(|t| (-1.0..=1.0).contains(&t.score)));
    }

    #[test]
    fn all_zero_lexicon_scores_are_left_alone() {
        let config = SentimentConfig {
            language: Language::Spanish,
            scorer: ScorerKind::Lexicon,
            ..SentimentConfig::default()
        };
        let tags = SentimentAnalyzer::new()
            .analyze(&["Hay un parque", "El autobús llega"], &config)
            .expect("analyze");
        assert!(tags.iter().all(|t| t.score == 0.0 && t.class == SentimentClass::Neu));
    }

    #[test]
    fn lexicon_scorer_without_lexicon_is_configuration_error() {
        let config = SentimentConfig {
            scorer: ScorerKind::Lexicon,
            ..SentimentConfig::default()
        };
        assert!(matches!(
            SentimentAnalyzer::new().analyze(&["good"], &config),
            Err(AnalysisError::Configuration(_))
        ));
    }

    #[derive(Debug, Default)]
    struct DictionaryTranslator {
        calls: AtomicUsize,
    }

    impl Translator for DictionaryTranslator {
        fn translate(&self, text: &str, _: Language, _: Language) -> AnalysisResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text.replace("magnifique", "wonderful").replace("affreux", "awful"))
        }
    }

    #[test]
    fn translated_documents_are_paired_with_originals() {
        let docs = ["Le parc est magnifique", "Le bus est affreux"];
        let config = SentimentConfig {
            language: Language::French,
            ..SentimentConfig::default()
        };
        let tags = SentimentAnalyzer::with_translator(DictionaryTranslator::default())
            .analyze(&docs, &config)
            .expect("analyze");
        assert_eq!(tags[0].doc, "Le parc est magnifique");
        assert_eq!(tags[0].class, SentimentClass::Pos);
        assert_eq!(tags[1].class, SentimentClass::Neg);
    }

    #[test]
    fn groups_in_class_order() {
        let tags = vec![
            SentimentTag { doc: "a".into(), class: SentimentClass::Neg, score: -0.9 },
            SentimentTag { doc: "b".into(), class: SentimentClass::Pos, score: 0.9 },
            SentimentTag { doc: "c".into(), class: SentimentClass::Neg, score: -0.5 },
        ];
        let groups = group_by_class(&tags);
        assert_eq!(groups[0].0, SentimentClass::Pos);
        assert_eq!(groups[1].1.len(), 2);
    }
}
