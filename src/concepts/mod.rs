//! 概念抽出: 頻出する名詞と n-gram を文書集合から取り出す。
//!
//! 1. 各文書を正規化（ストップワード除去、ステミングなし）
//! 2. 品詞タグで絞り込んだ単語の頻度分布から上位を取る
//! 3. n-gram は文書内で連続する正規化トークンから数える
//! 4. 最下位の単語より頻度が厳密に高い n-gram だけを残し、構成語を単語側から取り除く
pub mod frequency;
pub mod pos;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use self::frequency::FrequencyDistribution;
pub use self::pos::{PosTagger, RuleBasedTagger};
use crate::normalize::{Language, NormalizeOptions, TextNormalizer};
use crate::util::error::{AnalysisError, AnalysisResult};

/// 概念抽出の設定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConceptConfig {
    pub num_concepts: usize,
    pub context_words: Vec<String>,
    pub ngram_range: (usize, usize),
    pub pos_tags: Vec<String>,
    pub consider_urls: bool,
    pub language: Language,
}

impl Default for ConceptConfig {
    fn default() -> Self {
        Self {
            num_concepts: 5,
            context_words: Vec::new(),
            ngram_range: (1, 1),
            pos_tags: vec!["NN".to_string(), "NNP".to_string()],
            consider_urls: false,
            language: Language::English,
        }
    }
}

impl ConceptConfig {
    /// # Errors
    /// n-gram 範囲が `(1, 1)`〜`(1, 3)` の外にある場合は設定エラー。
    pub fn validate(&self) -> AnalysisResult<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n != 1 {
            return Err(AnalysisError::config(format!(
                "the minimum of ngram_range must be 1, got {min_n}"
            )));
        }
        if max_n < min_n || max_n > 3 {
            return Err(AnalysisError::config(format!(
                "the maximum of ngram_range must be between 1 and 3, got {max_n}"
            )));
        }
        Ok(())
    }
}

/// 抽出された概念と出現回数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptEntry {
    pub term: String,
    pub frequency: usize,
}

/// 概念抽出の結果。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConceptSummary {
    pub concepts: Vec<ConceptEntry>,
    /// 品詞フィルタ後の単語の総出現数
    pub total_words: usize,
    /// 品詞フィルタ後の単語の異なり数
    pub unique_words: usize,
}

impl ConceptSummary {
    #[must_use]
    pub fn terms(&self) -> Vec<String> {
        self.concepts.iter().map(|entry| entry.term.clone()).collect()
    }
}

/// 頻度ベースの概念抽出器。
pub struct ConceptExtractor {
    tagger: Box<dyn PosTagger>,
}

impl std::fmt::Debug for ConceptExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConceptExtractor").finish_non_exhaustive()
    }
}

impl Default for ConceptExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConceptExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_tagger(RuleBasedTagger)
    }

    #[must_use]
    pub fn with_tagger(tagger: impl PosTagger + 'static) -> Self {
        Self {
            tagger: Box::new(tagger),
        }
    }

    /// 文書集合から頻出概念を抽出する。
    ///
    /// # Errors
    /// n-gram 範囲が不正な場合は [`AnalysisError::Configuration`] を返す。
    /// 空の文書集合はエラーにならず、空の結果を返す。
    pub fn extract<S: AsRef<str>>(
        &self,
        docs: &[S],
        config: &ConceptConfig,
    ) -> AnalysisResult<ConceptSummary> {
        config.validate()?;
        if docs.is_empty() || config.num_concepts == 0 {
            return Ok(ConceptSummary::default());
        }

        let normalizer = TextNormalizer::new(config.language);
        let options =
            NormalizeOptions::surface(&config.context_words).with_url_stripping(!config.consider_urls);
        let tokenized: Vec<Vec<String>> = docs
            .iter()
            .map(|doc| normalizer.normalize(doc.as_ref(), &options))
            .collect();

        let mut unigrams = FrequencyDistribution::new();
        for tokens in &tokenized {
            let tags = self.tagger.tag(tokens);
            for (token, tag) in tokens.iter().zip(&tags) {
                if config.pos_tags.iter().any(|wanted| wanted == tag) {
                    unigrams.push(token.clone());
                }
            }
        }

        let mut common: Vec<ConceptEntry> = unigrams
            .most_common(config.num_concepts)
            .into_iter()
            .map(|(term, frequency)| ConceptEntry { term, frequency })
            .collect();

        let summary = |concepts| ConceptSummary {
            concepts,
            total_words: unigrams.total(),
            unique_words: unigrams.unique(),
        };

        let (_, max_n) = config.ngram_range;
        if max_n == 1 {
            return Ok(summary(common));
        }

        let threshold = common.last().map_or(0, |entry| entry.frequency);
        let mut retained: Vec<ConceptEntry> = Vec::new();
        for n in 2..=max_n {
            let dist: FrequencyDistribution<String> = tokenized
                .iter()
                .flat_map(|tokens| tokens.windows(n).map(|window| window.join(" ")))
                .collect();
            retained.extend(
                dist.most_common(config.num_concepts)
                    .into_iter()
                    .take_while(|(_, frequency)| *frequency > threshold)
                    .map(|(term, frequency)| ConceptEntry { term, frequency }),
            );
        }

        debug!(
            unigrams = common.len(),
            ngrams = retained.len(),
            threshold,
            "merging n-grams into concept list"
        );

        let components: Vec<&str> = retained
            .iter()
            .flat_map(|entry| entry.term.split(' '))
            .collect();
        common.retain(|entry| !components.contains(&entry.term.as_str()));
        common.extend(retained);

        // 安定ソートなので同頻度は単語→bigram→trigramの順を保つ
        common.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        common.truncate(config.num_concepts);

        Ok(summary(common))
    }
}
