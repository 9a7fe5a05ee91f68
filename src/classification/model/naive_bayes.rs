//! ベルヌーイ型ナイーブベイズ。
//!
//! 事前確率は最尤推定、特徴の条件付き確率は期待尤度推定 (+0.5) で平滑化する。
use super::{TrainedModel, TrainingData, argmax};

#[derive(Debug, Clone)]
pub struct NaiveBayes {
    classes: Vec<String>,
    log_prior: Vec<f64>,
    /// `[class][feature]` = (log P(true | class), log P(false | class))
    log_likelihood: Vec<Vec<(f64, f64)>>,
}

impl NaiveBayes {
    pub(crate) fn fit(data: &TrainingData<'_>) -> Self {
        let classes = data.class_count();
        let mut class_totals = vec![0usize; classes];
        let mut true_counts = vec![vec![0usize; data.dimension]; classes];
        let mut seen_true = vec![false; data.dimension];
        let mut seen_false = vec![false; data.dimension];

        for (row, &target) in data.rows.iter().zip(&data.targets) {
            class_totals[target] += 1;
            for (feature, &value) in row.iter().enumerate() {
                if value {
                    true_counts[target][feature] += 1;
                    seen_true[feature] = true;
                } else {
                    seen_false[feature] = true;
                }
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let n = data.rows.len() as f64;
        #[allow(clippy::cast_precision_loss)]
        let log_prior = class_totals.iter().map(|&c| (c as f64 / n).ln()).collect();

        #[allow(clippy::cast_precision_loss)]
        let log_likelihood = (0..classes)
            .map(|class| {
                let total = class_totals[class] as f64;
                (0..data.dimension)
                    .map(|feature| {
                        let bins =
                            f64::from(u8::from(seen_true[feature]) + u8::from(seen_false[feature]));
                        let denom = total + 0.5 * bins;
                        let t = true_counts[class][feature] as f64;
                        let f = total - t;
                        (((t + 0.5) / denom).ln(), ((f + 0.5) / denom).ln())
                    })
                    .collect()
            })
            .collect();

        Self {
            classes: data.classes.clone(),
            log_prior,
            log_likelihood,
        }
    }

    /// クラスごとの対数事後確率（正規化前）。
    #[must_use]
    pub fn log_scores(&self, features: &[bool]) -> Vec<f64> {
        self.log_prior
            .iter()
            .zip(&self.log_likelihood)
            .map(|(prior, likelihood)| {
                prior
                    + likelihood
                        .iter()
                        .zip(features)
                        .map(|(&(yes, no), &value)| if value { yes } else { no })
                        .sum::<f64>()
            })
            .collect()
    }
}

impl TrainedModel for NaiveBayes {
    fn predict(&self, features: &[bool]) -> String {
        self.classes[argmax(&self.log_scores(features))].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prior_dominates_without_evidence() {
        let rows = vec![vec![false], vec![false], vec![false]];
        let labels: Vec<String> = ["a", "a", "b"].iter().map(ToString::to_string).collect();
        let data = TrainingData::new(&rows, &labels).expect("data");
        let model = NaiveBayes::fit(&data);
        assert_eq!(model.predict(&[false]), "a");
    }

    #[test]
    fn unseen_value_keeps_probability_nonzero() {
        let rows = vec![vec![false], vec![false]];
        let labels: Vec<String> = ["a", "b"].iter().map(ToString::to_string).collect();
        let data = TrainingData::new(&rows, &labels).expect("data");
        let scores = NaiveBayes::fit(&data).log_scores(&[true]);
        assert!(scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn uses_expected_likelihood_estimate() {
        let rows = vec![vec![true], vec![false], vec![true], vec![true]];
        let labels: Vec<String> = ["a", "a", "b", "b"].iter().map(ToString::to_string).collect();
        let data = TrainingData::new(&rows, &labels).expect("data");
        let model = NaiveBayes::fit(&data);
        // class a: 1 of 2 true -> (1 + 0.5) / (2 + 1)
        let (yes, _) = model.log_likelihood[0][0];
        assert!((yes.exp() - 0.5).abs() < 1e-12);
        // class b: 2 of 2 true -> (2 + 0.5) / 3
        let (yes, no) = model.log_likelihood[1][0];
        assert!((yes.exp() - 2.5 / 3.0).abs() < 1e-12);
        assert!((no.exp() - 0.5 / 3.0).abs() < 1e-12);
    }
}
