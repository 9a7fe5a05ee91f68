//! TSV 形式の極性辞書と見出し語辞書。
use std::{fs, path::Path};

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use tracing::info;

use super::scorer::PolarityScorer;
use crate::normalize::{Language, TextNormalizer};
use crate::util::error::{AnalysisError, AnalysisResult};

const SPANISH_POLARITY_TSV: &str = include_str!("../resources/es_polarity.tsv");
const SPANISH_LEMMAS_TSV: &str = include_str!("../resources/es_lemmas.tsv");

static SPANISH: Lazy<PolarityLexicon> = Lazy::new(|| {
    PolarityLexicon::from_sources(
        Language::Spanish,
        ("builtin:es_polarity.tsv", SPANISH_POLARITY_TSV),
        Some(("builtin:es_lemmas.tsv", SPANISH_LEMMAS_TSV)),
    )
    .expect("parse builtin spanish lexicon")
});

/// 語 → 極性、活用形 → 見出し語の辞書。
#[derive(Debug)]
pub struct PolarityLexicon {
    language: Language,
    polarities: FxHashMap<String, f64>,
    lemmas: FxHashMap<String, String>,
    normalizer: TextNormalizer,
}

impl PolarityLexicon {
    /// 組み込み辞書があればそれを返す。
    #[must_use]
    pub fn builtin(language: Language) -> Option<&'static Self> {
        match language {
            Language::Spanish => Some(&*SPANISH),
            _ => None,
        }
    }

    /// ファイルから辞書を読み込む。
    ///
    /// # Errors
    /// ファイルが読めない、または行の形式が不正な場合は
    /// [`AnalysisError::ResourceLoad`] を返す。
    pub fn load(
        language: Language,
        polarity_path: &Path,
        lemma_path: Option<&Path>,
    ) -> AnalysisResult<Self> {
        let polarity = read_resource(polarity_path)?;
        let lemmas = lemma_path.map(read_resource).transpose()?;
        let polarity_name = polarity_path.display().to_string();
        let lemma_name = lemma_path.map(|p| p.display().to_string());

        let lexicon = Self::from_sources(
            language,
            (&polarity_name, &polarity),
            lemma_name.as_deref().zip(lemmas.as_deref()),
        )?;
        info!(
            language = %language,
            path = %polarity_name,
            words = lexicon.polarities.len(),
            lemmas = lexicon.lemmas.len(),
            "loaded polarity lexicon"
        );
        Ok(lexicon)
    }

    fn from_sources(
        language: Language,
        polarity: (&str, &str),
        lemmas: Option<(&str, &str)>,
    ) -> AnalysisResult<Self> {
        let (name, raw) = polarity;
        let polarities = parse_rows(name, raw)?
            .into_iter()
            .map(|(line, word, value)| {
                value
                    .parse::<f64>()
                    .map(|polarity| (word.to_lowercase(), polarity))
                    .map_err(|err| resource_error(name, format!("line {line}: {err}")))
            })
            .collect::<AnalysisResult<FxHashMap<_, _>>>()?;
        if polarities.is_empty() {
            return Err(resource_error(name, "no polarity entries"));
        }

        let lemmas = match lemmas {
            Some((name, raw)) => parse_rows(name, raw)?
                .into_iter()
                .map(|(_, form, lemma)| (form.to_lowercase(), lemma.to_lowercase()))
                .collect(),
            None => FxHashMap::default(),
        };

        Ok(Self {
            language,
            polarities,
            lemmas,
            normalizer: TextNormalizer::new(language),
        })
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// 語の極性。直接見つからなければ見出し語で引く。
    #[must_use]
    pub fn polarity(&self, word: &str) -> Option<f64> {
        self.polarities.get(word).copied().or_else(|| {
            self.lemmas
                .get(word)
                .and_then(|lemma| self.polarities.get(lemma))
                .copied()
        })
    }
}

impl PolarityScorer for PolarityLexicon {
    /// 正規化前の生スコア（極性の総和）。
    fn score(&self, text: &str) -> f64 {
        self.normalizer
            .tokenize(text)
            .iter()
            .filter_map(|token| self.polarity(token))
            .sum()
    }
}

fn read_resource(path: &Path) -> AnalysisResult<String> {
    fs::read_to_string(path).map_err(|err| resource_error(&path.display().to_string(), err.to_string()))
}

fn resource_error(path: &str, message: impl Into<String>) -> AnalysisError {
    AnalysisError::ResourceLoad {
        path: path.to_string(),
        message: message.into(),
    }
}

/// 空行と `#` 行を除き、2列の TSV を `(行番号, 1列目, 2列目)` に分解する。
/// 3列目以降は無視する。
pub(crate) fn parse_rows<'a>(
    name: &str,
    raw: &'a str,
) -> AnalysisResult<Vec<(usize, &'a str, &'a str)>> {
    raw.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            let mut columns = line.split('\t');
            match (columns.next(), columns.next()) {
                (Some(first), Some(second)) if !first.trim().is_empty() => {
                    Ok((line_no, first.trim(), second.trim()))
                }
                _ => Err(resource_error(
                    name,
                    format!("line {line_no}: expected tab-separated columns"),
                )),
            }
        })
        .collect()
}
