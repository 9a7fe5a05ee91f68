//! 学習用・テスト用への分割。
use std::collections::BTreeMap;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::debug;

use crate::util::error::{AnalysisError, AnalysisResult};

/// ラベル付き文書 `(本文, カテゴリ)`。
pub type LabeledText = (String, String);

/// 分割の方針。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPolicy {
    pub train_p: f64,
    pub eq_label_num: bool,
    pub complete_p: bool,
    pub seed: u64,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            train_p: 0.8,
            eq_label_num: true,
            complete_p: true,
            seed: 42,
        }
    }
}

/// 分割結果。両側は互いに素で、和集合は入力と一致する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<LabeledText>,
    pub test: Vec<LabeledText>,
}

impl TrainTestSplit {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn train_fraction(&self) -> f64 {
        let total = self.train.len() + self.test.len();
        if total == 0 {
            0.0
        } else {
            self.train.len() as f64 / total as f64
        }
    }
}

/// ラベル付き文書を学習用とテスト用に分ける。
///
/// # Errors
/// `train_p` が (0, 1) の外なら設定エラー、文書が空なら
/// [`AnalysisError::InsufficientData`] を返す。
pub fn split_train_and_test(
    docs: &[LabeledText],
    policy: &SplitPolicy,
) -> AnalysisResult<TrainTestSplit> {
    if !(policy.train_p > 0.0 && policy.train_p < 1.0) {
        return Err(AnalysisError::config(format!(
            "train_p must be within (0, 1), got {}",
            policy.train_p
        )));
    }
    if docs.is_empty() {
        return Err(AnalysisError::insufficient("no labeled documents to split"));
    }

    let mut rng = StdRng::seed_from_u64(policy.seed);

    if !policy.eq_label_num {
        let mut shuffled = docs.to_vec();
        shuffled.shuffle(&mut rng);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let cut = ((policy.train_p * docs.len() as f64).floor() as usize).min(docs.len());
        let test = shuffled.split_off(cut);
        return Ok(TrainTestSplit {
            train: shuffled,
            test,
        });
    }

    let mut by_category: BTreeMap<&str, Vec<LabeledText>> = BTreeMap::new();
    for (text, label) in docs {
        by_category
            .entry(label.as_str())
            .or_default()
            .push((text.clone(), label.clone()));
    }
    let min_count = by_category.values().map(Vec::len).min().unwrap_or(0);

    let mut split = TrainTestSplit::default();
    for (_, mut category_docs) in by_category {
        category_docs.shuffle(&mut rng);
        let rest = category_docs.split_off(min_count);
        split.train.extend(category_docs);
        split.test.extend(rest);
    }
    debug!(
        min_count,
        train = split.train.len(),
        test = split.test.len(),
        "balanced split"
    );

    if policy.complete_p && split.train_fraction() < policy.train_p {
        let mut pool = std::mem::take(&mut split.test);
        pool.shuffle(&mut rng);
        let mut pool = pool.into_iter();
        #[allow(clippy::cast_precision_loss)]
        let fraction = |train: usize| train as f64 / docs.len() as f64;
        while fraction(split.train.len()) < policy.train_p {
            match pool.next() {
                Some(doc) => split.train.push(doc),
                None => break,
            }
        }
        split.test = pool.collect();
        debug!(
            train = split.train.len(),
            test = split.test.len(),
            "completed train side up to train_p"
        );
    }

    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(counts: &[(&str, usize)]) -> Vec<LabeledText> {
        counts
            .iter()
            .flat_map(|(label, count)| {
                (0..*count).map(move |i| (format!("{label} doc {i}"), (*label).to_string()))
            })
            .collect()
    }

    #[test]
    fn rejects_train_p_out_of_range() {
        let docs = labeled(&[("a", 2)]);
        for train_p in [0.0, 1.0, -0.5, 1.5] {
            let policy = SplitPolicy {
                train_p,
                ..SplitPolicy::default()
            };
            assert!(matches!(
                split_train_and_test(&docs, &policy),
                Err(AnalysisError::Configuration(_))
            ));
        }
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            split_train_and_test(&[], &SplitPolicy::default()),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn balanced_without_completion_takes_min_count_per_category() {
        let docs = labeled(&[("a", 10), ("b", 4), ("c", 7)]);
        let policy = SplitPolicy {
            complete_p: false,
            ..SplitPolicy::default()
        };
        let split = split_train_and_test(&docs, &policy).expect("split");
        for label in ["a", "b", "c"] {
            assert_eq!(split.train.iter().filter(|(_, l)| l == label).count(), 4);
        }
        assert_eq!(split.test.len(), 21 - 12);
    }

    #[test]
    fn completion_stops_at_train_p() {
        let docs = labeled(&[("a", 100), ("b", 40)]);
        let split = split_train_and_test(&docs, &SplitPolicy::default()).expect("split");
        assert_eq!(split.train.len(), 112);
        assert_eq!(split.test.len(), 28);
    }

    #[test]
    fn unbalanced_split_takes_floor_fraction() {
        let docs = labeled(&[("a", 7), ("b", 3)]);
        let policy = SplitPolicy {
            train_p: 0.75,
            eq_label_num: false,
            ..SplitPolicy::default()
        };
        let split = split_train_and_test(&docs, &policy).expect("split");
        assert_eq!(split.train.len(), 7);
        assert_eq!(split.test.len(), 3);
    }

    #[test]
    fn same_seed_same_split() {
        let docs = labeled(&[("a", 12), ("b", 5)]);
        let first = split_train_and_test(&docs, &SplitPolicy::default()).expect("first");
        let second = split_train_and_test(&docs, &SplitPolicy::default()).expect("second");
        assert_eq!(first, second);
    }
}
