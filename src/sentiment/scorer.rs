use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::util::error::AnalysisError;

/// 文書1件の極性スコアを返すバックエンド。
pub trait PolarityScorer: Send + Sync {
    fn score(&self, text: &str) -> f64;
}

/// 極性スコアの算出方式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerKind {
    /// 語彙とルールによる英語スコアラー
    #[default]
    Vader,
    /// 形容詞・副詞の極性を平均する英語スコアラー
    Pattern,
    /// 言語ごとの極性辞書
    Lexicon,
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vader => "vader",
            Self::Pattern => "pattern",
            Self::Lexicon => "lexicon",
        })
    }
}

impl FromStr for ScorerKind {
    type Err = AnalysisError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "vader" | "nltk_vader" => Ok(Self::Vader),
            "pattern" | "textblob" | "textblob_base" => Ok(Self::Pattern),
            "lexicon" => Ok(Self::Lexicon),
            other => Err(AnalysisError::config(format!(
                "unknown sentiment scorer: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("vader", ScorerKind::Vader)]
    #[case("nltk_vader", ScorerKind::Vader)]
    #[case("textblob_base", ScorerKind::Pattern)]
    #[case("Lexicon", ScorerKind::Lexicon)]
    fn parses_scorer_names(#[case] raw: &str, #[case] expected: ScorerKind) {
        assert_eq!(raw.parse::<ScorerKind>().expect("known"), expected);
    }

    #[test]
    fn rejects_unknown_scorer() {
        assert!("afinn".parse::<ScorerKind>().is_err());
    }
}
