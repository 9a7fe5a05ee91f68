//! 分析ジョブの封筒と実行。
//!
//! `{"analysis": ..., "documents": [...], "params": {...}}` を受け取り、
//! 環境変数の既定値にジョブのパラメータを重ねて該当する分析器を呼ぶ。
pub mod synthetic;

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::{info, warn};

pub use self::synthetic::{synthetic_documents, synthetic_grouped_corpus, synthetic_labeled_corpus};
use crate::classification::{ClassifierConfig, DocumentClassifier, partition_labeled};
use crate::clustering::{ClusteringConfig, DocumentClusterer, IterativeClusterer, IterativeConfig};
use crate::concepts::{ConceptConfig, ConceptExtractor};
use crate::config::Config;
use crate::normalize::{HttpTranslator, Language, RetryingTranslator};
use crate::schema::{AnalysisOutput, job::ANALYSIS_JOB_SCHEMA, validate_json};
use crate::sentiment::{PolarityLexicon, SentimentAnalyzer, SentimentConfig};

/// 分析の種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Concepts,
    Clustering,
    Classification,
    Sentiment,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Concepts => "concepts",
            Self::Clustering => "clustering",
            Self::Classification => "classification",
            Self::Sentiment => "sentiment",
        })
    }
}

/// 入力文書。分類ジョブではラベル付きの形も受け付ける。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobDocument {
    Text(String),
    Labeled {
        text: String,
        #[serde(default)]
        label: Option<String>,
    },
}

impl JobDocument {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Labeled { text, .. } => text,
        }
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Labeled { label, .. } => label.as_deref(),
        }
    }
}

/// 1件の分析ジョブ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub analysis: AnalysisKind,
    pub documents: Vec<JobDocument>,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl AnalysisJob {
    /// JSON 文字列を検証してジョブに変換する。
    ///
    /// # Errors
    /// JSON として不正な場合やスキーマに適合しない場合はエラーを返す。
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).context("job is not valid JSON")?;
        let validation = validate_json(&ANALYSIS_JOB_SCHEMA, &value);
        if !validation.valid {
            anyhow::bail!("job does not match schema: {}", validation.errors.join("; "));
        }
        serde_json::from_value(value).context("failed to deserialize analysis job")
    }

    fn texts(&self) -> Vec<&str> {
        self.documents.iter().map(JobDocument::text).collect()
    }

    fn flag(&self, key: &str) -> bool {
        self.params.get(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

/// 既定値の設定にジョブのパラメータを上書きする。
fn resolve<T: Serialize + DeserializeOwned>(defaults: &T, params: &Map<String, Value>) -> Result<T> {
    let mut merged = match serde_json::to_value(defaults).context("failed to encode defaults")? {
        Value::Object(map) => map,
        _ => anyhow::bail!("defaults must encode as a JSON object"),
    };
    for (key, value) in params {
        if merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(Value::Object(merged)).context("invalid analysis parameters")
}

/// ジョブを実行して JSON 出力用の結果を返す。
///
/// # Errors
/// パラメータが不正な場合、または分析器がエラーを返した場合はエラーを返す。
pub fn run(job: &AnalysisJob, config: &Config) -> Result<AnalysisOutput> {
    info!(
        analysis = %job.analysis,
        documents = job.documents.len(),
        params = job.params.len(),
        "running analysis job"
    );
    let texts = job.texts();

    let output = match job.analysis {
        AnalysisKind::Concepts => {
            let defaults = ConceptConfig {
                language: config.language(),
                ..ConceptConfig::default()
            };
            let params: ConceptConfig = resolve(&defaults, &job.params)?;
            let summary = ConceptExtractor::new()
                .extract(&texts, &params)
                .context("concept extraction failed")?;
            AnalysisOutput::concepts(&summary)
        }
        AnalysisKind::Clustering => {
            let defaults = IterativeConfig {
                base: ClusteringConfig {
                    language: config.language(),
                    seed: config.seed(),
                    ..ClusteringConfig::default()
                },
                threshold: config.cluster_threshold(),
                n_sub_clusters: config.sub_clusters(),
                ..IterativeConfig::default()
            };
            let params: IterativeConfig = resolve(&defaults, &job.params)?;
            if job.flag("iterative") {
                let outcome = IterativeClusterer
                    .run(&texts, &params)
                    .context("iterative clustering failed")?;
                AnalysisOutput::iterative_clustering(&texts, &outcome)
            } else {
                let outcome = DocumentClusterer
                    .cluster(&texts, &params.base)
                    .context("clustering failed")?;
                AnalysisOutput::clustering(&texts, &outcome, params.top_terms)
            }
        }
        AnalysisKind::Classification => {
            let defaults = ClassifierConfig {
                language: config.language(),
                seed: config.seed(),
                ..ClassifierConfig::default()
            };
            let params: ClassifierConfig = resolve(&defaults, &job.params)?;
            let mixed: Vec<(String, Option<String>)> = job
                .documents
                .iter()
                .map(|doc| (doc.text().to_string(), doc.label().map(str::to_string)))
                .collect();
            let (labeled, unlabeled) = partition_labeled(&mixed);
            let report = DocumentClassifier::new()
                .classify(&labeled, &unlabeled, &params)
                .context("classification failed")?;
            AnalysisOutput::classification(&report)
        }
        AnalysisKind::Sentiment => {
            let defaults = SentimentConfig {
                language: config.language(),
                ..SentimentConfig::default()
            };
            let params: SentimentConfig = resolve(&defaults, &job.params)?;
            let tags = sentiment_analyzer(config)?
                .analyze(&texts, &params)
                .context("sentiment analysis failed")?;
            AnalysisOutput::sentiment(&tags)
        }
    };
    Ok(output)
}

/// 設定に応じて翻訳器と追加辞書を組み込んだ感情分析器を作る。
///
/// # Errors
/// 翻訳クライアントの構築や辞書の読み込みに失敗した場合はエラーを返す。
pub fn sentiment_analyzer(config: &Config) -> Result<SentimentAnalyzer> {
    let analyzer = match config.translator_url() {
        Some(url) => {
            let client = HttpTranslator::new(
                url,
                config.translator_timeout(),
                config.translator_api_key().map(str::to_string),
            )?;
            SentimentAnalyzer::with_translator(RetryingTranslator::new(
                client,
                config.translation_retry(),
            ))
        }
        None => {
            if config.language() != Language::English {
                warn!(
                    language = %config.language(),
                    "no translator configured; non-English text is scored untranslated"
                );
            }
            SentimentAnalyzer::new()
        }
    };

    match config.sentiment_lexicon() {
        Some(path) => {
            let lexicon = PolarityLexicon::load(
                config.sentiment_lexicon_language(),
                path,
                config.sentiment_lemmas().map(PathBuf::as_path),
            )
            .context("failed to load sentiment lexicon")?;
            Ok(analyzer.with_lexicon(lexicon))
        }
        None => Ok(analyzer),
    }
}
