//! 文書分類の高水準API。
//!
//! ラベル付き文書から語彙を作り、出現フラグを特徴量としてモデルを学習し、
//! テストセットで評価したうえでラベルなし文書のカテゴリを推定する。
pub mod features;
pub mod model;
pub mod split;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use self::features::FeatureExtractor;
pub use self::model::{ModelKind, TrainedModel};
pub use self::split::{LabeledText, SplitPolicy, TrainTestSplit, split_train_and_test};
use crate::concepts::{ConceptConfig, ConceptExtractor};
use crate::evaluation::{ClassificationMetrics, MetricsCalculator};
use crate::normalize::Language;
use crate::util::error::{AnalysisError, AnalysisResult};

/// 分類の設定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub train_p: f64,
    pub eq_label_num: bool,
    pub complete_p: bool,
    pub vocab_size: usize,
    #[serde(rename = "model_kind")]
    pub model: ModelKind,
    pub seed: u64,
    pub language: Language,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            train_p: 0.8,
            eq_label_num: true,
            complete_p: true,
            vocab_size: 250,
            model: ModelKind::NaiveBayes,
            seed: 42,
            language: Language::English,
        }
    }
}

impl ClassifierConfig {
    #[must_use]
    pub fn split_policy(&self) -> SplitPolicy {
        SplitPolicy {
            train_p: self.train_p,
            eq_label_num: self.eq_label_num,
            complete_p: self.complete_p,
            seed: self.seed,
        }
    }
}

/// ラベルなし文書1件の推定結果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedDocument {
    pub doc: String,
    pub category: String,
}

/// カテゴリごとにまとめた推定結果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub members: Vec<String>,
}

impl CategoryGroup {
    #[must_use]
    pub fn count(&self) -> usize {
        self.members.len()
    }
}

/// 分類の実行結果。
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    pub metrics: ClassificationMetrics,
    /// 入力順のラベルなし文書の推定結果
    pub predictions: Vec<ClassifiedDocument>,
    pub vocabulary: Vec<String>,
    pub train_size: usize,
    pub test_size: usize,
}

impl ClassificationReport {
    /// カテゴリ名順のグループ。各グループ内は入力順。
    #[must_use]
    pub fn grouped(&self) -> Vec<CategoryGroup> {
        let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for prediction in &self.predictions {
            groups
                .entry(prediction.category.as_str())
                .or_default()
                .push(prediction.doc.clone());
        }
        groups
            .into_iter()
            .map(|(category, members)| CategoryGroup {
                category: category.to_string(),
                members,
            })
            .collect()
    }
}

/// `(本文, ラベル)` の混在入力をラベル付きとラベルなしに分ける。
///
/// ラベルが `None` または空文字列の文書はラベルなしとして扱う。
#[must_use]
pub fn partition_labeled(docs: &[(String, Option<String>)]) -> (Vec<LabeledText>, Vec<String>) {
    let mut labeled = Vec::new();
    let mut unlabeled = Vec::new();
    for (text, label) in docs {
        match label.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => labeled.push((text.clone(), label.to_string())),
            _ => unlabeled.push(text.clone()),
        }
    }
    (labeled, unlabeled)
}

/// 語彙特徴量による文書分類器。
#[derive(Debug, Default)]
pub struct DocumentClassifier {
    extractor: ConceptExtractor,
}

impl DocumentClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 語彙抽出に使う概念抽出器を差し替える。
    #[must_use]
    pub fn with_extractor(extractor: ConceptExtractor) -> Self {
        Self { extractor }
    }

    /// 学習・評価・推定をまとめて行う。
    ///
    /// # Errors
    /// 分割設定が不正な場合は [`AnalysisError::Configuration`]、
    /// ラベル付き文書がない場合や語彙が空の場合は
    /// [`AnalysisError::InsufficientData`] を返す。
    pub fn classify(
        &self,
        labeled: &[LabeledText],
        unlabeled: &[String],
        config: &ClassifierConfig,
    ) -> AnalysisResult<ClassificationReport> {
        let split = split_train_and_test(labeled, &config.split_policy())?;
        info!(
            labeled = labeled.len(),
            unlabeled = unlabeled.len(),
            train = split.train.len(),
            test = split.test.len(),
            model = %config.model,
            "starting classification"
        );

        let texts: Vec<&str> = labeled.iter().map(|(text, _)| text.as_str()).collect();
        let concept_config = ConceptConfig {
            num_concepts: config.vocab_size,
            language: config.language,
            ..ConceptConfig::default()
        };
        let vocabulary = self.extractor.extract(&texts, &concept_config)?.terms();
        if vocabulary.is_empty() {
            return Err(AnalysisError::insufficient(
                "labeled documents produced an empty vocabulary",
            ));
        }
        debug!(vocabulary = vocabulary.len(), "built feature vocabulary");

        let features = FeatureExtractor::new(vocabulary, config.language);
        let (rows, labels): (Vec<Vec<bool>>, Vec<String>) = split
            .train
            .iter()
            .map(|(text, label)| (features.extract(text), label.clone()))
            .unzip();
        let model = config.model.train(&rows, &labels, config.seed)?;

        let mut calculator = MetricsCalculator::new();
        for (_, label) in labeled {
            calculator.register(label);
        }
        for (index, (text, expected)) in split.test.iter().enumerate() {
            let predicted = model.predict(&features.extract(text));
            calculator.push(index, expected, &predicted);
        }
        let metrics = calculator.finalize();

        let predictions: Vec<ClassifiedDocument> = unlabeled
            .iter()
            .map(|doc| ClassifiedDocument {
                category: model.predict(&features.extract(doc)),
                doc: doc.clone(),
            })
            .collect();
        info!(
            accuracy = ?metrics.accuracy,
            predicted = predictions.len(),
            "classification finished"
        );

        Ok(ClassificationReport {
            metrics,
            predictions,
            vocabulary: features.vocabulary().to_vec(),
            train_size: split.train.len(),
            test_size: split.test.len(),
        })
    }
}
