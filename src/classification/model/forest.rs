//! バギングによるランダムフォレスト。
use rand::{SeedableRng, rngs::StdRng};
use tracing::debug;

use super::{
    TrainedModel, TrainingData, argmax,
    tree::{DecisionTree, TreeParams, bootstrap},
};

const TREE_COUNT: usize = 25;

#[derive(Debug, Clone)]
pub struct RandomForest {
    classes: Vec<String>,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub(crate) fn fit(data: &TrainingData<'_>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let max_features = ((data.dimension as f64).sqrt().ceil() as usize).max(1);
        let params = TreeParams {
            max_features: Some(max_features),
            ..TreeParams::default()
        };

        let trees = (0..TREE_COUNT)
            .map(|_| {
                let samples = bootstrap(&mut rng, data.rows.len());
                DecisionTree::fit_sampled(data, &params, &samples, &mut rng)
            })
            .collect();
        debug!(trees = TREE_COUNT, max_features, "trained random forest");

        Self {
            classes: data.classes.clone(),
            trees,
        }
    }

    /// クラスごとの得票数。
    #[must_use]
    pub fn votes(&self, features: &[bool]) -> Vec<usize> {
        let mut votes = vec![0; self.classes.len()];
        for tree in &self.trees {
            votes[tree.predict_class(features)] += 1;
        }
        votes
    }
}

impl TrainedModel for RandomForest {
    fn predict(&self, features: &[bool]) -> String {
        #[allow(clippy::cast_precision_loss)]
        let votes: Vec<f64> = self.votes(features).into_iter().map(|v| v as f64).collect();
        self.classes[argmax(&votes)].clone()
    }
}
