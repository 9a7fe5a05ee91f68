//! Gini 不純度による CART 決定木。
use rand::{Rng, rngs::StdRng, seq::index::sample};

use super::{TrainedModel, TrainingData, argmax};

#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub(crate) max_depth: usize,
    pub(crate) min_samples_split: usize,
    /// 各分岐で候補にする特徴数。`None` なら全特徴
    pub(crate) max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 12,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(usize),
    Split {
        feature: usize,
        when_true: Box<Node>,
        when_false: Box<Node>,
    },
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    classes: Vec<String>,
    root: Node,
}

impl DecisionTree {
    pub(crate) fn fit(data: &TrainingData<'_>, params: &TreeParams) -> Self {
        let samples: Vec<usize> = (0..data.rows.len()).collect();
        let root = Builder {
            data,
            params,
            rng: None,
        }
        .grow(&samples, 0);
        Self {
            classes: data.classes.clone(),
            root,
        }
    }

    /// 指定した標本（重複可）で学習する。特徴の部分抽出に `rng` を使う。
    pub(crate) fn fit_sampled(
        data: &TrainingData<'_>,
        params: &TreeParams,
        samples: &[usize],
        rng: &mut StdRng,
    ) -> Self {
        let root = Builder {
            data,
            params,
            rng: Some(rng),
        }
        .grow(samples, 0);
        Self {
            classes: data.classes.clone(),
            root,
        }
    }

    pub(crate) fn predict_class(&self, features: &[bool]) -> usize {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(class) => return *class,
                Node::Split {
                    feature,
                    when_true,
                    when_false,
                } => {
                    node = if features.get(*feature).copied().unwrap_or(false) {
                        when_true
                    } else {
                        when_false
                    };
                }
            }
        }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf(_) => 0,
                Node::Split {
                    when_true,
                    when_false,
                    ..
                } => 1 + walk(when_true).max(walk(when_false)),
            }
        }
        walk(&self.root)
    }
}

impl TrainedModel for DecisionTree {
    fn predict(&self, features: &[bool]) -> String {
        self.classes[self.predict_class(features)].clone()
    }
}

struct Builder<'d, 'r> {
    data: &'d TrainingData<'d>,
    params: &'d TreeParams,
    rng: Option<&'r mut StdRng>,
}

impl Builder<'_, '_> {
    fn grow(&mut self, samples: &[usize], depth: usize) -> Node {
        let counts = self.class_counts(samples);
        #[allow(clippy::cast_precision_loss)]
        let majority = argmax(&counts.iter().map(|&c| c as f64).collect::<Vec<_>>());

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if pure || depth >= self.params.max_depth || samples.len() < self.params.min_samples_split
        {
            return Node::Leaf(majority);
        }

        let parent = gini(&counts, samples.len());
        let mut best: Option<(usize, f64)> = None;
        for feature in self.candidate_features() {
            let (yes, no): (Vec<usize>, Vec<usize>) =
                samples.iter().copied().partition(|&s| self.data.rows[s][feature]);
            if yes.is_empty() || no.is_empty() {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let weighted = (yes.len() as f64 * gini(&self.class_counts(&yes), yes.len())
                + no.len() as f64 * gini(&self.class_counts(&no), no.len()))
                / samples.len() as f64;
            if weighted < parent - 1e-12 && best.is_none_or(|(_, score)| weighted < score) {
                best = Some((feature, weighted));
            }
        }

        let Some((feature, _)) = best else {
            return Node::Leaf(majority);
        };
        let (yes, no): (Vec<usize>, Vec<usize>) =
            samples.iter().copied().partition(|&s| self.data.rows[s][feature]);
        Node::Split {
            feature,
            when_true: Box::new(self.grow(&yes, depth + 1)),
            when_false: Box::new(self.grow(&no, depth + 1)),
        }
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let dimension = self.data.dimension;
        match (self.params.max_features, self.rng.as_deref_mut()) {
            (Some(k), Some(rng)) if k < dimension => {
                let mut picked = sample(rng, dimension, k).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..dimension).collect(),
        }
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.data.class_count()];
        for &s in samples {
            counts[self.data.targets[s]] += 1;
        }
        counts
    }
}

#[allow(clippy::cast_precision_loss)]
fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| (c as f64 / total).powi(2))
        .sum::<f64>()
}

/// ブートストラップ標本を引く。
pub(crate) fn bootstrap(rng: &mut StdRng, n: usize) -> Vec<usize> {
    (0..n).map(|_| rng.random_range(0..n)).collect()
}
