//! 大きすぎるクラスタを再分割する反復クラスタリング。
//!
//! 保留中の分割をキューで管理する。キューから取り出した要素は必ず
//! 確定されるか、厳密に小さい子クラスタとして積み直されるため、処理は停止する。
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ClusteringConfig, CoordinateVector, DocumentClusterer, TermScore};
use crate::util::{
    error::{AnalysisError, AnalysisResult},
    text::hash_text,
};

/// 反復クラスタリングの設定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterativeConfig {
    #[serde(flatten)]
    pub base: ClusteringConfig,
    /// 全文書数に対する割合。これを超えるクラスタを再分割する
    pub threshold: f64,
    pub n_sub_clusters: usize,
    pub max_depth: usize,
    pub top_terms: usize,
}

impl Default for IterativeConfig {
    fn default() -> Self {
        Self {
            base: ClusteringConfig::default(),
            threshold: 0.5,
            n_sub_clusters: 2,
            max_depth: 8,
            top_terms: 3,
        }
    }
}

impl IterativeConfig {
    fn validate(&self) -> AnalysisResult<()> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(AnalysisError::config(format!(
                "threshold must be within (0, 1], got {}",
                self.threshold
            )));
        }
        if self.n_sub_clusters < 2 {
            return Err(AnalysisError::config(format!(
                "n_sub_clusters must be at least 2, got {}",
                self.n_sub_clusters
            )));
        }
        Ok(())
    }
}

/// 確定したクラスタ。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterativeCluster {
    /// `"2"` や `"2.1"` のような階層 ID
    pub cluster_id: String,
    pub members: Vec<usize>,
    pub top_terms: Vec<TermScore>,
    pub depth: usize,
}

/// 反復クラスタリングの結果。
#[derive(Debug, Clone)]
pub struct IterativeOutcome {
    pub clusters: Vec<IterativeCluster>,
    /// 全体クラスタリングで求めた座標。ラベルは最終的な階層 ID
    pub coordinates: Vec<CoordinateVector>,
}

impl IterativeOutcome {
    /// 文書ごとの最終ラベル。
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.coordinates.iter().map(|c| c.label.clone()).collect()
    }
}

#[derive(Debug)]
struct PendingSplit {
    cluster_id: String,
    members: Vec<usize>,
    top_terms: Vec<TermScore>,
    depth: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IterativeClusterer;

impl IterativeClusterer {
    /// 全体をクラスタリングした後、閾値を超えるクラスタを子クラスタに分割し続ける。
    ///
    /// # Errors
    /// 設定が不正な場合、または最初の全体クラスタリングが失敗した場合はエラーを返す。
    /// 部分集合の再分割で語彙が足りない場合はエラーにせず、そのクラスタを確定する。
    pub fn run<S: AsRef<str>>(
        &self,
        docs: &[S],
        config: &IterativeConfig,
    ) -> AnalysisResult<IterativeOutcome> {
        config.validate()?;

        let global = DocumentClusterer.cluster(docs, &config.base)?;
        let mut coordinates = global.coordinate_vectors();
        let top_terms = global.top_terms_per_cluster(config.top_terms);

        #[allow(clippy::cast_precision_loss)]
        let limit = config.threshold * docs.len() as f64;

        let mut queue: VecDeque<PendingSplit> = top_terms
            .into_iter()
            .map(|terms| PendingSplit {
                members: global.members(&terms.cluster_id),
                cluster_id: terms.cluster_id,
                top_terms: terms.terms,
                depth: 0,
            })
            .filter(|pending| !pending.members.is_empty())
            .collect();

        let mut finished: Vec<IterativeCluster> = Vec::new();
        while let Some(pending) = queue.pop_front() {
            #[allow(clippy::cast_precision_loss)]
            let size = pending.members.len() as f64;
            if size <= limit {
                finished.push(finalize(pending));
                continue;
            }
            if pending.depth >= config.max_depth {
                warn!(
                    cluster_id = %pending.cluster_id,
                    size = pending.members.len(),
                    max_depth = config.max_depth,
                    "cluster exceeds threshold at max depth; keeping it"
                );
                finished.push(finalize(pending));
                continue;
            }

            match split(docs, &pending, &coordinates, config)? {
                Some(children) => {
                    info!(
                        cluster_id = %pending.cluster_id,
                        size = pending.members.len(),
                        children = children.len(),
                        "split oversized cluster"
                    );
                    queue.extend(children);
                }
                None => finished.push(finalize(pending)),
            }
        }

        finished.sort_by(|a, b| compare_ids(&a.cluster_id, &b.cluster_id));
        for cluster in &finished {
            for &doc in &cluster.members {
                coordinates[doc].label.clone_from(&cluster.cluster_id);
            }
        }

        Ok(IterativeOutcome {
            clusters: finished,
            coordinates,
        })
    }
}

fn finalize(pending: PendingSplit) -> IterativeCluster {
    IterativeCluster {
        cluster_id: pending.cluster_id,
        members: pending.members,
        top_terms: pending.top_terms,
        depth: pending.depth,
    }
}

/// 分割できれば子クラスタを返す。縮小できない場合は `None`。
fn split<S: AsRef<str>>(
    docs: &[S],
    pending: &PendingSplit,
    coordinates: &[CoordinateVector],
    config: &IterativeConfig,
) -> AnalysisResult<Option<Vec<PendingSplit>>> {
    if pending.members.len() < config.n_sub_clusters {
        return Ok(None);
    }

    let sub_docs: Vec<&str> = pending.members.iter().map(|&idx| docs[idx].as_ref()).collect();
    let seeds = farthest_apart(&pending.members, coordinates, config.n_sub_clusters);
    let sub_config = ClusteringConfig {
        num_clusters: config.n_sub_clusters,
        seed: config.base.seed ^ hash_text(&pending.cluster_id),
        ..config.base.clone()
    };

    let outcome = match DocumentClusterer.cluster_with_seeds(&sub_docs, &sub_config, Some(&seeds)) {
        Ok(outcome) => outcome,
        Err(AnalysisError::InsufficientData(reason)) => {
            warn!(cluster_id = %pending.cluster_id, %reason, "cannot re-cluster; keeping cluster");
            return Ok(None);
        }
        Err(other) => return Err(other),
    };

    let child_terms = outcome.top_terms_per_cluster(config.top_terms);
    let children: Vec<PendingSplit> = child_terms
        .into_iter()
        .map(|terms| PendingSplit {
            cluster_id: format!("{}.{}", pending.cluster_id, terms.cluster_id),
            members: outcome
                .members(&terms.cluster_id)
                .into_iter()
                .map(|local| pending.members[local])
                .collect(),
            top_terms: terms.terms,
            depth: pending.depth + 1,
        })
        .filter(|child| !child.members.is_empty())
        .collect();

    if children.len() < 2 {
        warn!(
            cluster_id = %pending.cluster_id,
            size = pending.members.len(),
            "re-clustering did not shrink the cluster; keeping it"
        );
        return Ok(None);
    }
    Ok(Some(children))
}

/// 座標上で互いに最も離れた `k` 文書を選ぶ（ローカル番号で返す）。
fn farthest_apart(members: &[usize], coordinates: &[CoordinateVector], k: usize) -> Vec<usize> {
    let point = |local: usize| {
        let c = &coordinates[members[local]];
        (c.x, c.y)
    };
    let dist = |a: (f64, f64), b: (f64, f64)| (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2);

    #[allow(clippy::cast_precision_loss)]
    let centre = {
        let n = members.len() as f64;
        let (sx, sy) = (0..members.len())
            .map(point)
            .fold((0.0, 0.0), |acc, p| (acc.0 + p.0, acc.1 + p.1));
        (sx / n, sy / n)
    };

    let first = (0..members.len())
        .max_by(|&a, &b| dist(point(a), centre).total_cmp(&dist(point(b), centre)).then(b.cmp(&a)))
        .unwrap_or(0);
    let mut chosen = vec![first];
    while chosen.len() < k.min(members.len()) {
        let next = (0..members.len())
            .filter(|idx| !chosen.contains(idx))
            .max_by(|&a, &b| {
                let da = chosen.iter().map(|&c| dist(point(a), point(c))).fold(f64::MAX, f64::min);
                let db = chosen.iter().map(|&c| dist(point(b), point(c))).fold(f64::MAX, f64::min);
                da.total_cmp(&db).then(b.cmp(&a))
            });
        match next {
            Some(idx) => chosen.push(idx),
            None => break,
        }
    }
    chosen
}

/// `"2.10"` が `"2.9"` の後に来るよう、数値の階層順で比較する。
fn compare_ids(a: &str, b: &str) -> std::cmp::Ordering {
    let parse = |id: &str| -> Vec<u64> { id.split('.').map(|p| p.parse().unwrap_or(u64::MAX)).collect() };
    parse(a).cmp(&parse(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{ClusterAlgorithm, DocFrequencyBound};

    fn corpus() -> Vec<String> {
        let mut docs = Vec::new();
        for i in 0..6 {
            docs.push(format!("bus route schedule downtown transit {i}"));
            docs.push(format!("bike lane safety helmet cycling {i}"));
        }
        for i in 0..4 {
            docs.push(format!("park trees garden flowers playground {i}"));
        }
        docs
    }

    fn config(threshold: f64) -> IterativeConfig {
        IterativeConfig {
            base: ClusteringConfig {
                num_clusters: 2,
                min_df: DocFrequencyBound::Count(1),
                max_df: DocFrequencyBound::Fraction(1.0),
                algorithm: ClusterAlgorithm::Agglomerative,
                ..ClusteringConfig::default()
            },
            threshold,
            ..IterativeConfig::default()
        }
    }

    #[test]
    fn oversized_cluster_is_split_with_dotted_ids() {
        let docs = corpus();
        let outcome = IterativeClusterer.run(&docs, &config(0.5)).expect("run");

        let total: usize = outcome.clusters.iter().map(|c| c.members.len()).sum();
        assert_eq!(total, docs.len());
        assert!(outcome.clusters.iter().any(|c| c.cluster_id.contains('.')));
        #[allow(clippy::cast_precision_loss)]
        let limit = 0.5 * docs.len() as f64;
        assert!(outcome.clusters.iter().all(|c| c.members.len() as f64 <= limit));
    }

    #[test]
    fn labels_partition_documents() {
        let docs = corpus();
        let outcome = IterativeClusterer.run(&docs, &config(0.5)).expect("run");
        let labels = outcome.labels();
        assert_eq!(labels.len(), docs.len());
        for cluster in &outcome.clusters {
            for &doc in &cluster.members {
                assert_eq!(labels[doc], cluster.cluster_id);
            }
        }
    }

    #[test]
    fn terminates_on_identical_documents() {
        let docs: Vec<String> = (0..8).map(|_| "same words every time".to_string()).collect();
        let outcome = IterativeClusterer.run(&docs, &config(0.1)).expect("run");
        let total: usize = outcome.clusters.iter().map(|c| c.members.len()).sum();
        assert_eq!(total, 8);
    }

    #[test]
    fn rejects_single_sub_cluster() {
        let cfg = IterativeConfig {
            n_sub_clusters: 1,
            ..config(0.5)
        };
        assert!(matches!(
            IterativeClusterer.run(&corpus(), &cfg),
            Err(AnalysisError::Configuration(_))
        ));
    }

    #[test]
    fn hierarchical_ids_sort_numerically() {
        let mut ids = vec!["2.10", "10", "2.9", "2"];
        ids.sort_by(|a, b| compare_ids(a, b));
        assert_eq!(ids, vec!["2", "2.9", "2.10", "10"]);
    }
}
