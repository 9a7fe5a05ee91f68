use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// カテゴリごとの参照・予測インデックス集合。
#[derive(Debug, Default, Clone)]
struct LabelSets {
    reference: BTreeSet<usize>,
    predicted: BTreeSet<usize>,
}

/// カテゴリ別の評価値。分母が0の比率は `None`。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMetrics {
    pub category: String,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f_measure: Option<f64>,
    /// 正解データに含まれるそのカテゴリの件数
    pub support: usize,
}

/// テストセット全体の評価結果。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationMetrics {
    /// テストセットが空なら `None`
    pub accuracy: Option<f64>,
    pub macro_f_measure: Option<f64>,
    pub per_category: Vec<CategoryMetrics>,
}

/// テストセットに対するメトリクス集計器。
#[derive(Debug, Default)]
pub struct MetricsCalculator {
    per_label: BTreeMap<String, LabelSets>,
    total_samples: usize,
    correct_samples: usize,
}

impl MetricsCalculator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 既知のカテゴリを登録する。テストセットに現れなくても結果に含める。
    pub fn register(&mut self, category: &str) {
        self.per_label.entry(category.to_string()).or_default();
    }

    /// 1件の正解ラベルと予測ラベルを登録する。
    ///
    /// # Arguments
    /// * `index` - テストセット内の文書番号
    /// * `expected` - 正解ラベル
    /// * `predicted` - 予測ラベル
    pub fn push(&mut self, index: usize, expected: &str, predicted: &str) {
        self.total_samples += 1;
        if expected == predicted {
            self.correct_samples += 1;
        }
        self.per_label
            .entry(expected.to_string())
            .or_default()
            .reference
            .insert(index);
        self.per_label
            .entry(predicted.to_string())
            .or_default()
            .predicted
            .insert(index);
    }

    #[must_use]
    pub fn finalize(&self) -> ClassificationMetrics {
        #[allow(clippy::cast_precision_loss)]
        let accuracy = (self.total_samples > 0)
            .then(|| self.correct_samples as f64 / self.total_samples as f64);

        let per_category: Vec<CategoryMetrics> = self
            .per_label
            .iter()
            .map(|(category, sets)| {
                let hits = sets.reference.intersection(&sets.predicted).count();
                let precision = ratio(hits, sets.predicted.len());
                let recall = ratio(hits, sets.reference.len());
                CategoryMetrics {
                    category: category.clone(),
                    precision,
                    recall,
                    f_measure: f_measure(precision, recall),
                    support: sets.reference.len(),
                }
            })
            .collect();

        let defined: Vec<f64> = per_category.iter().filter_map(|m| m.f_measure).collect();
        #[allow(clippy::cast_precision_loss)]
        let macro_f_measure =
            (!defined.is_empty()).then(|| defined.iter().sum::<f64>() / defined.len() as f64);

        ClassificationMetrics {
            accuracy,
            macro_f_measure,
            per_category,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

fn f_measure(precision: Option<f64>, recall: Option<f64>) -> Option<f64> {
    let (p, r) = (precision?, recall?);
    if p == 0.0 || r == 0.0 {
        return Some(0.0);
    }
    Some(2.0 * p * r / (p + r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_set_based_precision_and_recall() {
        let mut calc = MetricsCalculator::new();
        calc.push(0, "parks", "parks");
        calc.push(1, "parks", "transit");
        calc.push(2, "transit", "transit");
        calc.push(3, "transit", "transit");

        let metrics = calc.finalize();
        assert_eq!(metrics.accuracy, Some(0.75));

        let parks = &metrics.per_category[0];
        assert_eq!(parks.category, "parks");
        assert_eq!(parks.precision, Some(1.0));
        assert_eq!(parks.recall, Some(0.5));
        let f = parks.f_measure.expect("defined");
        assert!((f - 2.0 / 3.0).abs() < 1e-12);

        let transit = &metrics.per_category[1];
        assert!((transit.precision.expect("p") - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(transit.recall, Some(1.0));
        assert_eq!(transit.support, 2);
    }

    #[test]
    fn undefined_ratios_are_none() {
        let mut calc = MetricsCalculator::new();
        calc.register("health");
        calc.push(0, "parks", "parks");

        let metrics = calc.finalize();
        let health = metrics
            .per_category
            .iter()
            .find(|m| m.category == "health")
            .expect("registered");
        assert_eq!(health.precision, None);
        assert_eq!(health.recall, None);
        assert_eq!(health.f_measure, None);
        assert_eq!(metrics.macro_f_measure, Some(1.0));
    }

    #[test]
    fn empty_test_set_has_no_accuracy() {
        let metrics = MetricsCalculator::new().finalize();
        assert_eq!(metrics.accuracy, None);
        assert!(metrics.per_category.is_empty());
    }

    #[test]
    fn never_predicted_category_gets_zero_f() {
        let mut calc = MetricsCalculator::new();
        calc.push(0, "parks", "transit");
        let metrics = calc.finalize();
        let parks = &metrics.per_category[0];
        assert_eq!(parks.precision, None);
        assert_eq!(parks.recall, Some(0.0));
        assert_eq!(parks.f_measure, None);
        let transit = &metrics.per_category[1];
        assert_eq!(transit.precision, Some(0.0));
        assert_eq!(transit.f_measure, None);
    }
}
