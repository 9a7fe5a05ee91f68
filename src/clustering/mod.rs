//! 文書クラスタリング。
//!
//! 正規化+ステミング → TF-IDF → k-means / 凝集型 → 上位語・2次元座標。
pub mod agglomerative;
pub mod iterative;
pub mod tfidf;

use std::{fmt, str::FromStr};

use ndarray::{Array2, Axis};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use self::iterative::{IterativeCluster, IterativeClusterer, IterativeConfig, IterativeOutcome};
pub use self::tfidf::{DocFrequencyBound, TfidfMatrix, TfidfVectorizer};
use crate::concepts::FrequencyDistribution;
use crate::normalize::{Language, NormalizeOptions, TextNormalizer};
use crate::util::{
    error::{AnalysisError, AnalysisResult},
    kmeans::KMeans,
    mds::{MdsConfig, smacof},
};

/// クラスタリング手法。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterAlgorithm {
    #[default]
    KMeans,
    Agglomerative,
}

impl fmt::Display for ClusterAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KMeans => f.write_str("kmeans"),
            Self::Agglomerative => f.write_str("agglomerative"),
        }
    }
}

impl FromStr for ClusterAlgorithm {
    type Err = AnalysisError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "kmeans" | "k-means" => Ok(Self::KMeans),
            "agglomerative" | "hierarchical" => Ok(Self::Agglomerative),
            other => Err(AnalysisError::config(format!(
                "unknown clustering algorithm: {other}"
            ))),
        }
    }
}

/// クラスタリングの設定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub num_clusters: usize,
    pub context_words: Vec<String>,
    pub ngram_range: (usize, usize),
    pub min_df: DocFrequencyBound,
    pub max_df: DocFrequencyBound,
    pub consider_urls: bool,
    pub language: Language,
    pub algorithm: ClusterAlgorithm,
    pub seed: u64,
    pub max_iterations: usize,
    /// k-means の初期化をやり直す回数。慣性が最小の結果を採用する
    pub n_init: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            num_clusters: 5,
            context_words: Vec::new(),
            ngram_range: (1, 1),
            min_df: DocFrequencyBound::Fraction(0.1),
            max_df: DocFrequencyBound::Fraction(0.9),
            consider_urls: false,
            language: Language::English,
            algorithm: ClusterAlgorithm::KMeans,
            seed: 42,
            max_iterations: 300,
            n_init: 10,
        }
    }
}

/// 語と重み。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermScore {
    pub term: String,
    pub score: f64,
}

/// クラスタごとの上位語。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterTerms {
    pub cluster_id: String,
    pub terms: Vec<TermScore>,
}

impl ClusterTerms {
    /// `"term1, term2, term3"` 形式に連結する。
    #[must_use]
    pub fn joined(&self) -> String {
        self.terms
            .iter()
            .map(|t| t.term.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// 文書ごとの2次元座標とクラスタラベル。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateVector {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

/// 1回のクラスタリング結果。
#[derive(Debug, Clone)]
pub struct ClusteringOutcome {
    labels: Vec<String>,
    cluster_ids: Vec<String>,
    tfidf: TfidfMatrix,
    feature_weights: Vec<TermScore>,
    surface_forms: FxHashMap<String, String>,
    seed: u64,
}

impl ClusteringOutcome {
    /// 文書ごとのクラスタラベル（入力順）。
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// クラスタ ID（`"0"` から昇順）。
    #[must_use]
    pub fn cluster_ids(&self) -> &[String] {
        &self.cluster_ids
    }

    /// TF-IDF の語彙（ステム形）。
    #[must_use]
    pub fn features(&self) -> &[String] {
        &self.tfidf.terms
    }

    /// 平均 TF-IDF 重みの降順。
    #[must_use]
    pub fn feature_weights(&self) -> &[TermScore] {
        &self.feature_weights
    }

    #[must_use]
    pub fn tfidf(&self) -> &TfidfMatrix {
        &self.tfidf
    }

    /// クラスタに属する文書番号。
    #[must_use]
    pub fn members(&self, cluster_id: &str) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.as_str() == cluster_id)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// クラスタごとの文書数（クラスタ ID 順）。
    #[must_use]
    pub fn num_docs_per_cluster(&self) -> Vec<(String, usize)> {
        self.cluster_ids
            .iter()
            .map(|id| (id.clone(), self.labels.iter().filter(|l| *l == id).count()))
            .collect()
    }

    /// 各クラスタの重心で語を順位付けし、上位 `n` 語を表層形で返す。
    #[must_use]
    pub fn top_terms_per_cluster(&self, n: usize) -> Vec<ClusterTerms> {
        let centroids = self.centroids();
        self.cluster_ids
            .iter()
            .zip(centroids.axis_iter(Axis(0)))
            .map(|(cluster_id, centroid)| {
                let mut order: Vec<usize> = (0..centroid.len()).collect();
                order.sort_by(|&a, &b| centroid[b].total_cmp(&centroid[a]).then(a.cmp(&b)));
                let terms = order
                    .into_iter()
                    .take(n)
                    .map(|col| TermScore {
                        term: self.surface_form(&self.tfidf.terms[col]),
                        score: centroid[col],
                    })
                    .collect();
                ClusterTerms {
                    cluster_id: cluster_id.clone(),
                    terms,
                }
            })
            .collect()
    }

    /// コサイン距離 `1 - cos` を SMACOF で2次元に埋め込む。
    #[must_use]
    pub fn coordinate_vectors(&self) -> Vec<CoordinateVector> {
        let distances = cosine_distances(&self.tfidf.matrix);
        let config = MdsConfig {
            seed: self.seed,
            ..MdsConfig::default()
        };
        let positions = smacof(distances.view(), &config);
        positions
            .axis_iter(Axis(0))
            .zip(&self.labels)
            .map(|(row, label)| CoordinateVector {
                x: row[0],
                y: row[1],
                label: label.clone(),
            })
            .collect()
    }

    /// クラスタごとのメンバー平均ベクトル。
    fn centroids(&self) -> Array2<f64> {
        let dim = self.tfidf.matrix.ncols();
        let mut centroids = Array2::<f64>::zeros((self.cluster_ids.len(), dim));
        let position: FxHashMap<&str, usize> = self
            .cluster_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.as_str(), idx))
            .collect();
        let mut counts = vec![0_usize; self.cluster_ids.len()];
        for (row, label) in self.tfidf.matrix.axis_iter(Axis(0)).zip(&self.labels) {
            if let Some(&slot) = position.get(label.as_str()) {
                let mut target = centroids.row_mut(slot);
                target += &row;
                counts[slot] += 1;
            }
        }
        for (slot, &count) in counts.iter().enumerate() {
            if count > 0 {
                #[allow(clippy::cast_precision_loss)]
                let scale = 1.0 / count as f64;
                centroids.row_mut(slot).mapv_inplace(|v| v * scale);
            }
        }
        centroids
    }

    fn surface_form(&self, feature: &str) -> String {
        feature
            .split(' ')
            .map(|stem| {
                self.surface_forms
                    .get(stem)
                    .cloned()
                    .unwrap_or_else(|| stem.to_string())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 行ベクトル間のコサイン距離行列。行は L2 正規化済みであること。
#[must_use]
pub fn cosine_distances(matrix: &Array2<f64>) -> Array2<f64> {
    let similarity = matrix.dot(&matrix.t());
    let n = matrix.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            0.0
        } else {
            (1.0 - similarity[[i, j]]).max(0.0)
        }
    })
}

/// 文書クラスタリングの実行器。
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentClusterer;

impl DocumentClusterer {
    /// 文書集合をクラスタに分割する。
    ///
    /// # Errors
    /// `num_clusters` が 0 の場合は設定エラー、文書数が足りない場合や
    /// 語彙が空になる場合は [`AnalysisError::InsufficientData`] を返す。
    pub fn cluster<S: AsRef<str>>(
        &self,
        docs: &[S],
        config: &ClusteringConfig,
    ) -> AnalysisResult<ClusteringOutcome> {
        self.cluster_with_seeds(docs, config, None)
    }

    /// k-means の初期重心を文書番号で指定してクラスタリングする。
    ///
    /// # Errors
    /// [`DocumentClusterer::cluster`] と同じ。
    pub fn cluster_with_seeds<S: AsRef<str>>(
        &self,
        docs: &[S],
        config: &ClusteringConfig,
        seeds: Option<&[usize]>,
    ) -> AnalysisResult<ClusteringOutcome> {
        if config.num_clusters == 0 {
            return Err(AnalysisError::config("num_clusters must be at least 1"));
        }
        if docs.len() < config.num_clusters {
            return Err(AnalysisError::insufficient(format!(
                "{} document(s) cannot form {} clusters",
                docs.len(),
                config.num_clusters
            )));
        }

        let normalizer = TextNormalizer::new(config.language);
        let stem_options = NormalizeOptions::stemmed(&config.context_words)
            .with_url_stripping(!config.consider_urls);
        let surface_options = NormalizeOptions::surface(&config.context_words)
            .with_url_stripping(!config.consider_urls);

        let mut surface_counts: FxHashMap<String, FrequencyDistribution<String>> =
            FxHashMap::default();
        let mut stemmed_docs = Vec::with_capacity(docs.len());
        for doc in docs {
            // 同じパイプラインなので表層形とステムは1対1に並ぶ
            let stems = normalizer.normalize(doc.as_ref(), &stem_options);
            let surface = normalizer.normalize(doc.as_ref(), &surface_options);
            for (stem, word) in stems.iter().zip(surface) {
                surface_counts.entry(stem.clone()).or_default().push(word);
            }
            stemmed_docs.push(stems.join(" "));
        }

        let vectorizer = TfidfVectorizer {
            ngram_range: config.ngram_range,
            min_df: config.min_df,
            max_df: config.max_df,
        };
        let tfidf = vectorizer.fit_transform(&stemmed_docs)?;
        info!(
            documents = docs.len(),
            vocabulary = tfidf.terms.len(),
            algorithm = %config.algorithm,
            "built tf-idf matrix"
        );

        let raw_labels = match config.algorithm {
            ClusterAlgorithm::KMeans => {
                let model = match seeds {
                    Some(rows) if rows.len() == config.num_clusters => KMeans::with_initial_rows(
                        tfidf.matrix.view(),
                        rows,
                        config.max_iterations,
                        config.seed,
                    ),
                    _ => KMeans::best_of(
                        tfidf.matrix.view(),
                        config.num_clusters,
                        config.max_iterations,
                        config.seed,
                        config.n_init.max(1),
                    ),
                };
                debug!(iterations = model.iterations, "k-means converged");
                model.assignments
            }
            ClusterAlgorithm::Agglomerative => {
                let distances = cosine_distances(&tfidf.matrix);
                agglomerative::average_linkage(distances.view(), config.num_clusters)
            }
        };

        let feature_weights = mean_weights(&tfidf);
        let surface_forms = surface_counts
            .into_iter()
            .filter_map(|(stem, dist)| {
                dist.most_common(1)
                    .into_iter()
                    .next()
                    .map(|(word, _)| (stem, word))
            })
            .collect();

        let cluster_ids = (0..config.num_clusters).map(|id| id.to_string()).collect();
        let labels: Vec<String> = raw_labels.iter().map(ToString::to_string).collect();

        Ok(ClusteringOutcome {
            labels,
            cluster_ids,
            tfidf,
            feature_weights,
            surface_forms,
            seed: config.seed,
        })
    }
}

fn mean_weights(tfidf: &TfidfMatrix) -> Vec<TermScore> {
    let Some(means) = tfidf.matrix.mean_axis(Axis(0)) else {
        return Vec::new();
    };
    let mut weights: Vec<TermScore> = tfidf
        .terms
        .iter()
        .zip(means.iter())
        .map(|(term, weight)| TermScore {
            term: term.clone(),
            score: *weight,
        })
        .collect();
    weights.sort_by(|a, b| b.score.total_cmp(&a.score));
    weights
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn corpus() -> Vec<String> {
        [
            "The bus route needs more buses and better bus stops",
            "Bus drivers want a new bus route downtown",
            "More buses on the downtown route",
            "Plant trees in the park and protect the park trees",
            "The park needs trees and a garden",
            "Garden and park volunteers plant trees",
        ]
        .iter()
        .map(ToString::to_string)
        .collect()
    }

    fn config(algorithm: ClusterAlgorithm) -> ClusteringConfig {
        ClusteringConfig {
            num_clusters: 2,
            min_df: DocFrequencyBound::Count(1),
            max_df: DocFrequencyBound::Fraction(1.0),
            algorithm,
            ..ClusteringConfig::default()
        }
    }

    #[test]
    fn kmeans_separates_topics() {
        let outcome = DocumentClusterer
            .cluster(&corpus(), &config(ClusterAlgorithm::KMeans))
            .expect("cluster");
        let labels = outcome.labels();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[rstest]
    fn kmeans_separates_topics_for_any_seed(#[values(0, 1, 2, 3, 4, 5, 6, 7, 8, 9)] seed: u64) {
        let config = ClusteringConfig {
            seed,
            ..config(ClusterAlgorithm::KMeans)
        };
        let outcome = DocumentClusterer.cluster(&corpus(), &config).expect("cluster");
        let labels = outcome.labels();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn agglomerative_separates_topics() {
        let outcome = DocumentClusterer
            .cluster(&corpus(), &config(ClusterAlgorithm::Agglomerative))
            .expect("cluster");
        assert_eq!(outcome.labels(), ["0", "0", "0", "1", "1", "1"]);
        assert_eq!(
            outcome.num_docs_per_cluster(),
            vec![("0".to_string(), 3), ("1".to_string(), 3)]
        );
    }

    #[test]
    fn top_terms_use_surface_forms() {
        let outcome = DocumentClusterer
            .cluster(&corpus(), &config(ClusterAlgorithm::Agglomerative))
            .expect("cluster");
        let top = outcome.top_terms_per_cluster(3);
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|cluster| cluster.terms.len() == 3));
        assert_eq!(top[0].terms[0].term, "bus");
        assert_eq!(top[1].terms[0].term, "park");
        assert_eq!(top[0].joined().matches(", ").count(), 2);
    }

    #[test]
    fn feature_weights_are_sorted_descending() {
        let outcome = DocumentClusterer
            .cluster(&corpus(), &config(ClusterAlgorithm::KMeans))
            .expect("cluster");
        let weights = outcome.feature_weights();
        assert!(!weights.is_empty());
        assert!(weights.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[test]
    fn coordinates_pair_with_documents() {
        let outcome = DocumentClusterer
            .cluster(&corpus(), &config(ClusterAlgorithm::KMeans))
            .expect("cluster");
        let coords = outcome.coordinate_vectors();
        assert_eq!(coords.len(), 6);
        assert_eq!(coords, outcome.coordinate_vectors());
        assert!(coords.iter().all(|c| c.x.is_finite() && c.y.is_finite()));
    }

    #[test]
    fn rejects_zero_and_excessive_cluster_counts() {
        let docs = corpus();
        let zero = ClusteringConfig {
            num_clusters: 0,
            ..config(ClusterAlgorithm::KMeans)
        };
        assert!(matches!(
            DocumentClusterer.cluster(&docs, &zero),
            Err(AnalysisError::Configuration(_))
        ));

        let too_many = ClusteringConfig {
            num_clusters: 7,
            ..config(ClusterAlgorithm::KMeans)
        };
        assert!(matches!(
            DocumentClusterer.cluster(&docs, &too_many),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn algorithm_parses_from_str() {
        assert_eq!("kmeans".parse::<ClusterAlgorithm>().expect("k"), ClusterAlgorithm::KMeans);
        assert_eq!(
            "Agglomerative".parse::<ClusterAlgorithm>().expect("a"),
            ClusterAlgorithm::Agglomerative
        );
        assert!("dbscan".parse::<ClusterAlgorithm>().is_err());
    }
}
