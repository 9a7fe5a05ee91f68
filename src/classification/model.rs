//! 二値特徴量を入力とする分類モデル群。
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::util::error::{AnalysisError, AnalysisResult};

mod forest;
mod naive_bayes;
mod svm;
mod tree;

pub use forest::RandomForest;
pub use naive_bayes::NaiveBayes;
pub use svm::LinearSvm;
pub use tree::DecisionTree;

/// 学習済みモデルの共通インターフェース。
pub trait TrainedModel: Send + Sync + fmt::Debug {
    /// 特徴量ベクトルに対するカテゴリを返す。
    fn predict(&self, features: &[bool]) -> String;
}

/// 学習アルゴリズムの種類。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    #[default]
    #[serde(alias = "naive_bayes", alias = "nb")]
    NaiveBayes,
    #[serde(alias = "decision_tree", alias = "tree")]
    DecisionTree,
    #[serde(alias = "random_forest", alias = "forest")]
    RandomForest,
    #[serde(alias = "linear_svm", alias = "svm")]
    LinearSvm,
}

impl ModelKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NaiveBayes => "naive-bayes",
            Self::DecisionTree => "decision-tree",
            Self::RandomForest => "random-forest",
            Self::LinearSvm => "linear-svm",
        }
    }

    /// 学習データからモデルを作る。
    ///
    /// # Errors
    /// 学習データが空、または行とラベルの数が一致しない場合はエラーを返す。
    pub fn train(
        self,
        rows: &[Vec<bool>],
        labels: &[String],
        seed: u64,
    ) -> AnalysisResult<Box<dyn TrainedModel>> {
        let data = TrainingData::new(rows, labels)?;
        Ok(match self {
            Self::NaiveBayes => Box::new(NaiveBayes::fit(&data)),
            Self::DecisionTree => Box::new(DecisionTree::fit(&data, &tree::TreeParams::default())),
            Self::RandomForest => Box::new(RandomForest::fit(&data, seed)),
            Self::LinearSvm => Box::new(LinearSvm::fit(&data, seed)),
        })
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = AnalysisError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "naive-bayes" | "naivebayes" | "nb" => Ok(Self::NaiveBayes),
            "decision-tree" | "tree" => Ok(Self::DecisionTree),
            "random-forest" | "forest" => Ok(Self::RandomForest),
            "linear-svm" | "svm" => Ok(Self::LinearSvm),
            other => Err(AnalysisError::config(format!("unknown model '{other}'"))),
        }
    }
}

/// 検証済みの学習データ。ラベルは名前順のクラス番号に変換済み。
#[derive(Debug)]
pub(crate) struct TrainingData<'a> {
    pub(crate) rows: &'a [Vec<bool>],
    pub(crate) targets: Vec<usize>,
    pub(crate) classes: Vec<String>,
    pub(crate) dimension: usize,
}

impl<'a> TrainingData<'a> {
    pub(crate) fn new(rows: &'a [Vec<bool>], labels: &[String]) -> AnalysisResult<Self> {
        if rows.is_empty() {
            return Err(AnalysisError::insufficient("no training rows"));
        }
        if rows.len() != labels.len() {
            return Err(AnalysisError::config(format!(
                "{} feature rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        let dimension = rows[0].len();
        if rows.iter().any(|row| row.len() != dimension) {
            return Err(AnalysisError::config("feature rows differ in length"));
        }

        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        let targets = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or(0))
            .collect();

        Ok(Self {
            rows,
            targets,
            classes,
            dimension,
        })
    }

    pub(crate) fn class_count(&self) -> usize {
        self.classes.len()
    }
}

/// 最大値の添字。同値なら小さい添字を優先する。
pub(crate) fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = idx;
        }
    }
    best
}
