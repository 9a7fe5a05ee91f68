//! 分析結果の JSON レコード。
use serde::Serialize;

use crate::classification::ClassificationReport;
use crate::clustering::{ClusteringOutcome, CoordinateVector, IterativeOutcome, TermScore};
use crate::concepts::ConceptSummary;
use crate::evaluation::CategoryMetrics;
use crate::sentiment::{SentimentClass, SentimentTag, group_by_class};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptRecord {
    pub concept: String,
    pub occurrence_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterMember {
    pub doc: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterRecord {
    pub cluster_id: String,
    pub top_terms: Vec<TermScore>,
    pub members: Vec<ClusterMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocRecord {
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRecord {
    pub category: String,
    pub count: usize,
    pub members: Vec<DocRecord>,
}

/// 分類結果。推定グループと評価値。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationOutput {
    pub categories: Vec<CategoryRecord>,
    pub accuracy: Option<f64>,
    pub macro_f_measure: Option<f64>,
    pub per_category: Vec<CategoryMetrics>,
    pub train_size: usize,
    pub test_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDoc {
    pub doc: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentRecord {
    pub sentiment_class: SentimentClass,
    pub members: Vec<ScoredDoc>,
}

/// ジョブ種別ごとの結果。`{"analysis": ..., "result": ...}` として出力する。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "analysis", content = "result", rename_all = "lowercase")]
pub enum AnalysisOutput {
    Concepts(Vec<ConceptRecord>),
    Clustering(Vec<ClusterRecord>),
    Classification(ClassificationOutput),
    Sentiment(Vec<SentimentRecord>),
}

impl AnalysisOutput {
    #[must_use]
    pub fn concepts(summary: &ConceptSummary) -> Self {
        Self::Concepts(
            summary
                .concepts
                .iter()
                .map(|entry| ConceptRecord {
                    concept: entry.term.clone(),
                    occurrence_count: entry.frequency,
                })
                .collect(),
        )
    }

    /// 単一階層のクラスタリング結果。
    #[must_use]
    pub fn clustering<S: AsRef<str>>(docs: &[S], outcome: &ClusteringOutcome, top_terms: usize) -> Self {
        let coordinates = outcome.coordinate_vectors();
        Self::Clustering(
            outcome
                .top_terms_per_cluster(top_terms)
                .into_iter()
                .map(|terms| ClusterRecord {
                    members: members(docs, &coordinates, &outcome.members(&terms.cluster_id)),
                    cluster_id: terms.cluster_id,
                    top_terms: terms.terms,
                })
                .collect(),
        )
    }

    /// 反復クラスタリングの結果。クラスタ ID は階層表記。
    #[must_use]
    pub fn iterative_clustering<S: AsRef<str>>(docs: &[S], outcome: &IterativeOutcome) -> Self {
        Self::Clustering(
            outcome
                .clusters
                .iter()
                .map(|cluster| ClusterRecord {
                    cluster_id: cluster.cluster_id.clone(),
                    top_terms: cluster.top_terms.clone(),
                    members: members(docs, &outcome.coordinates, &cluster.members),
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn classification(report: &ClassificationReport) -> Self {
        Self::Classification(ClassificationOutput {
            categories: report
                .grouped()
                .into_iter()
                .map(|group| CategoryRecord {
                    count: group.count(),
                    category: group.category,
                    members: group.members.into_iter().map(|doc| DocRecord { doc }).collect(),
                })
                .collect(),
            accuracy: report.metrics.accuracy,
            macro_f_measure: report.metrics.macro_f_measure,
            per_category: report.metrics.per_category.clone(),
            train_size: report.train_size,
            test_size: report.test_size,
        })
    }

    #[must_use]
    pub fn sentiment(tags: &[SentimentTag]) -> Self {
        Self::Sentiment(
            group_by_class(tags)
                .into_iter()
                .map(|(sentiment_class, members)| SentimentRecord {
                    sentiment_class,
                    members: members
                        .into_iter()
                        .map(|tagged| ScoredDoc {
                            doc: tagged.doc.clone(),
                            score: tagged.score,
                        })
                        .collect(),
                })
                .collect(),
        )
    }
}

fn members<S: AsRef<str>>(
    docs: &[S],
    coordinates: &[CoordinateVector],
    indices: &[usize],
) -> Vec<ClusterMember> {
    indices
        .iter()
        .map(|&idx| ClusterMember {
            doc: docs[idx].as_ref().to_string(),
            x: coordinates[idx].x,
            y: coordinates[idx].y,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::concepts::ConceptEntry;

    #[test]
    fn concepts_serialize_with_occurrence_count() {
        let summary = ConceptSummary {
            concepts: vec![ConceptEntry {
                term: "park".into(),
                frequency: 4,
            }],
            total_words: 10,
            unique_words: 6,
        };
        let value = serde_json::to_value(AnalysisOutput::concepts(&summary)).expect("json");
        assert_eq!(
            value,
            json!({ "analysis": "concepts", "result": [{ "concept": "park", "occurrence_count": 4 }] })
        );
    }

    #[test]
    fn sentiment_groups_serialize_lowercase_classes() {
        let tags = vec![SentimentTag {
            doc: "great park".into(),
            class: SentimentClass::Pos,
            score: 0.62,
        }];
        let value = serde_json::to_value(AnalysisOutput::sentiment(&tags)).expect("json");
        assert_eq!(value["result"][0]["sentiment_class"], "pos");
        assert_eq!(value["result"][0]["members"][0]["doc"], "great park");
    }
}
