//! Pegasos 確率的劣勾配法による one-vs-rest 線形 SVM。
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{TrainedModel, TrainingData, argmax};

const LAMBDA: f64 = 1e-3;
const EPOCHS: usize = 30;
const MIN_STEPS: usize = 500;

#[derive(Debug, Clone)]
pub struct LinearSvm {
    classes: Vec<String>,
    /// クラスごとの重み。末尾がバイアス
    weights: Vec<Vec<f64>>,
}

impl LinearSvm {
    pub(crate) fn fit(data: &TrainingData<'_>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let steps = (EPOCHS * data.rows.len()).max(MIN_STEPS);
        let weights = (0..data.class_count())
            .map(|class| pegasos(data, class, steps, &mut rng))
            .collect();
        Self {
            classes: data.classes.clone(),
            weights,
        }
    }

    /// クラスごとの決定関数値。
    #[must_use]
    pub fn decision_values(&self, features: &[bool]) -> Vec<f64> {
        self.weights.iter().map(|w| margin(w, features)).collect()
    }
}

impl TrainedModel for LinearSvm {
    fn predict(&self, features: &[bool]) -> String {
        self.classes[argmax(&self.decision_values(features))].clone()
    }
}

fn margin(weights: &[f64], features: &[bool]) -> f64 {
    let (bias, rest) = weights.split_last().map_or((0.0, weights), |(b, r)| (*b, r));
    bias + rest
        .iter()
        .zip(features)
        .filter(|(_, on)| **on)
        .map(|(w, _)| w)
        .sum::<f64>()
}

fn pegasos(data: &TrainingData<'_>, class: usize, steps: usize, rng: &mut StdRng) -> Vec<f64> {
    let mut w = vec![0.0; data.dimension + 1];
    for t in 1..=steps {
        let idx = rng.random_range(0..data.rows.len());
        let row = &data.rows[idx];
        let y = if data.targets[idx] == class { 1.0 } else { -1.0 };
        #[allow(clippy::cast_precision_loss)]
        let eta = 1.0 / (LAMBDA * t as f64);
        let violated = y * margin(&w, row) < 1.0;

        let shrink = 1.0 - eta * LAMBDA;
        for value in &mut w {
            *value *= shrink;
        }
        if violated {
            for (value, &on) in w.iter_mut().zip(row) {
                if on {
                    *value += eta * y;
                }
            }
            if let Some(bias) = w.last_mut() {
                *bias += eta * y;
            }
        }
    }
    w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::model::fixtures;

    #[test]
    fn positive_margin_for_own_class() {
        let (rows, labels) = fixtures::separable();
        let data = TrainingData::new(&rows, &labels).expect("data");
        let svm = LinearSvm::fit(&data, 5);
        let values = svm.decision_values(&[true, false, false]);
        assert!(values[0] > values[1]);
    }

    #[test]
    fn margin_includes_bias() {
        assert!((margin(&[2.0, -1.0, 0.5], &[true, true]) - 1.5).abs() < 1e-12);
        assert!((margin(&[2.0, -1.0, 0.5], &[false, false]) - 0.5).abs() < 1e-12);
    }
}
