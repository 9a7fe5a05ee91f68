//! SMACOF による計量多次元尺度構成法（MDS）。
//!
//! 事前計算済みの非類似度行列を受け取り、2次元座標を返す。
use ndarray::{Array2, ArrayView2};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// SMACOF の反復設定。
#[derive(Debug, Clone, Copy)]
pub struct MdsConfig {
    pub dimensions: usize,
    pub max_iterations: usize,
    pub epsilon: f64,
    pub seed: u64,
}

impl Default for MdsConfig {
    fn default() -> Self {
        Self {
            dimensions: 2,
            max_iterations: 300,
            epsilon: 1e-3,
            seed: 1,
        }
    }
}

/// 非類似度行列を低次元に埋め込む。
///
/// 行列は対称かつ対角がゼロであることを前提とする。
#[must_use]
pub fn smacof(dissimilarities: ArrayView2<'_, f64>, config: &MdsConfig) -> Array2<f64> {
    let n = dissimilarities.nrows();
    let dims = config.dimensions.max(1);
    if n == 0 {
        return Array2::zeros((0, dims));
    }
    if n == 1 {
        return Array2::zeros((1, dims));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut x = Array2::<f64>::from_shape_fn((n, dims), |_| rng.random::<f64>());

    let mut previous_stress: Option<f64> = None;
    #[allow(clippy::cast_precision_loss)]
    let n_f = n as f64;

    for _ in 0..config.max_iterations {
        let distances = euclidean_distances(x.view());

        let mut stress = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let diff = distances[[i, j]] - dissimilarities[[i, j]];
                stress += diff * diff;
            }
        }

        // Guttman transform: X <- (1/n) B(X) X
        let mut b = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in 0..n {
                if i != j && distances[[i, j]] > f64::EPSILON {
                    b[[i, j]] = -dissimilarities[[i, j]] / distances[[i, j]];
                }
            }
        }
        for i in 0..n {
            let row_sum: f64 = b.row(i).sum();
            b[[i, i]] = -row_sum;
        }
        x = b.dot(&x) / n_f;

        let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        if let Some(prev) = previous_stress
            && norm > 0.0
            && (prev - stress) / norm < config.epsilon
        {
            break;
        }
        previous_stress = Some(stress);
    }

    x
}

fn euclidean_distances(points: ArrayView2<'_, f64>) -> Array2<f64> {
    let n = points.nrows();
    let mut out = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let d = points
                .row(i)
                .iter()
                .zip(points.row(j).iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt();
            out[[i, j]] = d;
            out[[j, i]] = d;
        }
    }
    out
}
