//! 語彙の有無による二値特徴量。
use rustc_hash::FxHashSet;

use crate::normalize::{Language, NormalizeOptions, TextNormalizer};

/// 固定語彙に対する出現フラグを作る。
#[derive(Debug)]
pub struct FeatureExtractor {
    vocabulary: Vec<String>,
    term_tokens: Vec<Vec<String>>,
    normalizer: TextNormalizer,
    options: NormalizeOptions,
}

impl FeatureExtractor {
    #[must_use]
    pub fn new(vocabulary: Vec<String>, language: Language) -> Self {
        let term_tokens = vocabulary
            .iter()
            .map(|term| term.split_whitespace().map(str::to_string).collect())
            .collect();
        Self {
            vocabulary,
            term_tokens,
            normalizer: TextNormalizer::new(language),
            options: NormalizeOptions::default().with_url_stripping(true),
        }
    }

    #[must_use]
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    /// 語彙の各語が文書に現れるかどうか。
    ///
    /// 複数語の語は正規化後のトークン列に連続して現れる必要がある。
    #[must_use]
    pub fn extract(&self, doc: &str) -> Vec<bool> {
        let tokens = self.normalizer.normalize(doc, &self.options);
        let present: FxHashSet<&str> = tokens.iter().map(String::as_str).collect();

        self.term_tokens
            .iter()
            .map(|parts| match parts.as_slice() {
                [] => false,
                [single] => present.contains(single.as_str()),
                many => {
                    many.iter().all(|part| present.contains(part.as_str()))
                        && tokens.windows(many.len()).any(|window| window == many)
                }
            })
            .collect()
    }
}
