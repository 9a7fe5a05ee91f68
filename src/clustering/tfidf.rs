//! TF-IDF ベクトル化。
//!
//! トークンは `\b\w\w+\b`、語彙はアルファベット順、idf は平滑化
//! `ln((1 + n) / (1 + df)) + 1`、各行は L2 正規化される。
use std::collections::BTreeMap;

use ndarray::Array2;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::util::error::{AnalysisError, AnalysisResult};

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("compile token regex"));

/// 文書頻度の上下限。割合（0.0〜1.0）または文書数で指定する。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocFrequencyBound {
    Count(usize),
    Fraction(f64),
}

impl DocFrequencyBound {
    /// 文書数に換算する。
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn resolve(self, n_docs: usize) -> f64 {
        match self {
            Self::Count(count) => count as f64,
            Self::Fraction(fraction) => fraction * n_docs as f64,
        }
    }

    fn validate(self, name: &str) -> AnalysisResult<()> {
        if let Self::Fraction(fraction) = self
            && !(0.0..=1.0).contains(&fraction)
        {
            return Err(AnalysisError::config(format!(
                "{name} as a fraction must be within [0.0, 1.0], got {fraction}"
            )));
        }
        Ok(())
    }
}

/// 学習済みの TF-IDF 行列と語彙。
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    /// 文書 × 語彙
    pub matrix: Array2<f64>,
    /// アルファベット順の語彙
    pub terms: Vec<String>,
    pub idf: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct TfidfVectorizer {
    pub ngram_range: (usize, usize),
    pub min_df: DocFrequencyBound,
    pub max_df: DocFrequencyBound,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self {
            ngram_range: (1, 1),
            min_df: DocFrequencyBound::Fraction(0.1),
            max_df: DocFrequencyBound::Fraction(0.9),
        }
    }
}

impl TfidfVectorizer {
    fn analyze(&self, doc: &str) -> Vec<String> {
        let tokens: Vec<&str> = TOKEN_RE
            .find_iter(doc)
            .map(|m| m.as_str())
            .collect();
        let (min_n, max_n) = self.ngram_range;
        let mut grams = Vec::new();
        for n in min_n.max(1)..=max_n {
            grams.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        grams
    }

    /// 語彙を学習し、文書ごとの TF-IDF 行列を返す。
    ///
    /// # Errors
    /// n-gram 範囲が不正な場合は設定エラー、語彙が空になる場合は
    /// [`AnalysisError::InsufficientData`] を返す。
    pub fn fit_transform<S: AsRef<str>>(&self, docs: &[S]) -> AnalysisResult<TfidfMatrix> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || max_n < min_n {
            return Err(AnalysisError::config(format!(
                "invalid ngram_range ({min_n}, {max_n})"
            )));
        }
        self.min_df.validate("min_df")?;
        self.max_df.validate("max_df")?;

        let n_docs = docs.len();
        let analyzed: Vec<Vec<String>> = docs.iter().map(|doc| self.analyze(doc.as_ref())).collect();

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for grams in &analyzed {
            let mut seen: Vec<&str> = grams.iter().map(String::as_str).collect();
            seen.sort_unstable();
            seen.dedup();
            for gram in seen {
                *doc_freq.entry(gram).or_insert(0) += 1;
            }
        }
        if doc_freq.is_empty() {
            return Err(AnalysisError::insufficient(
                "empty vocabulary; the documents may only contain stop words",
            ));
        }

        let max_count = self.max_df.resolve(n_docs);
        let min_count = self.min_df.resolve(n_docs);
        if max_count < min_count {
            return Err(AnalysisError::insufficient(
                "max_df corresponds to fewer documents than min_df",
            ));
        }

        #[allow(clippy::cast_precision_loss)]
        let kept: Vec<(&str, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| {
                let df = *df as f64;
                df >= min_count && df <= max_count
            })
            .collect();
        if kept.is_empty() {
            return Err(AnalysisError::insufficient(
                "after pruning, no terms remain; try a lower min_df or a higher max_df",
            ));
        }

        let index: BTreeMap<&str, usize> = kept
            .iter()
            .enumerate()
            .map(|(idx, (term, _))| (*term, idx))
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let idf: Vec<f64> = kept
            .iter()
            .map(|(_, df)| ((1.0 + n_docs as f64) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();

        let mut matrix = Array2::<f64>::zeros((n_docs, kept.len()));
        for (row, grams) in analyzed.iter().enumerate() {
            for gram in grams {
                if let Some(&col) = index.get(gram.as_str()) {
                    matrix[[row, col]] += 1.0;
                }
            }
            let mut row_view = matrix.row_mut(row);
            for (col, value) in row_view.iter_mut().enumerate() {
                *value *= idf[col];
            }
            let norm = row_view.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                row_view.mapv_inplace(|v| v / norm);
            }
        }

        let terms = kept.iter().map(|(term, _)| (*term).to_string()).collect();
        Ok(TfidfMatrix { matrix, terms, idf })
    }
}
