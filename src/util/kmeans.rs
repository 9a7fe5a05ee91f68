use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Seeded K-Means over the rows of a dense matrix.
///
/// Initialization is greedy k-means++ unless explicit starting rows are supplied.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub centroids: Array2<f64>,
    pub assignments: Vec<usize>,
    pub iterations: usize,
}

impl KMeans {
    /// Runs K-Means clustering.
    ///
    /// # Arguments
    /// * `data` - One data point per row.
    /// * `k` - Number of clusters (clamped to the number of rows).
    /// * `max_iterations` - Maximum number of Lloyd iterations.
    /// * `seed` - Seed for the k-means++ initialization.
    #[must_use]
    pub fn new(data: ArrayView2<'_, f64>, k: usize, max_iterations: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let k = k.min(data.nrows());
        let initial = plus_plus_init(data, k, &mut rng);
        Self::with_initial_rows(data, &initial, max_iterations, seed)
    }

    /// Runs K-Means `n_init` times and keeps the run with the lowest inertia.
    ///
    /// The first run uses `seed` itself; later runs draw their seeds from an RNG
    /// seeded with `seed`, so the result is reproducible. Ties keep the earlier run.
    #[must_use]
    pub fn best_of(
        data: ArrayView2<'_, f64>,
        k: usize,
        max_iterations: usize,
        seed: u64,
        n_init: usize,
    ) -> Self {
        let mut seeds = StdRng::seed_from_u64(seed);
        let mut best = Self::new(data, k, max_iterations, seed);
        let mut best_inertia = best.inertia(data);
        for _ in 1..n_init {
            let candidate = Self::new(data, k, max_iterations, seeds.random::<u64>());
            let inertia = candidate.inertia(data);
            if inertia < best_inertia {
                best = candidate;
                best_inertia = inertia;
            }
        }
        best
    }

    /// Runs K-Means starting from the given row indices as centroids.
    #[must_use]
    pub fn with_initial_rows(
        data: ArrayView2<'_, f64>,
        initial_rows: &[usize],
        max_iterations: usize,
        seed: u64,
    ) -> Self {
        let dim = data.ncols();
        let k = initial_rows.len();
        if data.nrows() == 0 || k == 0 {
            return Self {
                centroids: Array2::zeros((0, dim)),
                assignments: Vec::new(),
                iterations: 0,
            };
        }

        let mut rng = StdRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15);
        let mut centroids = Array2::<f64>::zeros((k, dim));
        for (slot, &row) in initial_rows.iter().enumerate() {
            centroids.row_mut(slot).assign(&data.row(row));
        }

        let mut assignments = vec![usize::MAX; data.nrows()];
        let mut iterations = 0;

        while iterations < max_iterations.max(1) {
            iterations += 1;

            // E-step: assign points to nearest centroid
            let new_assignments: Vec<usize> = data
                .axis_iter(Axis(0))
                .map(|point| nearest(point, centroids.view()).0)
                .collect();

            let changed = new_assignments != assignments;
            assignments = new_assignments;
            if !changed {
                break;
            }

            // M-step: update centroids
            let mut sums = Array2::<f64>::zeros((k, dim));
            let mut counts = vec![0_usize; k];
            for (point, &cluster) in data.axis_iter(Axis(0)).zip(&assignments) {
                let mut row = sums.row_mut(cluster);
                row += &point;
                counts[cluster] += 1;
            }

            for (cluster, &count) in counts.iter().enumerate() {
                if count > 0 {
                    #[allow(clippy::cast_precision_loss)]
                    let mean = &sums.row(cluster) / count as f64;
                    centroids.row_mut(cluster).assign(&mean);
                } else {
                    // Empty cluster takes the point farthest from its current centroid
                    let farthest = farthest_point(data, centroids.view(), &assignments)
                        .unwrap_or_else(|| rng.random_range(0..data.nrows()));
                    centroids.row_mut(cluster).assign(&data.row(farthest));
                    assignments[farthest] = cluster;
                }
            }
        }

        Self {
            centroids,
            assignments,
            iterations,
        }
    }

    /// Sum of squared distances of points to their centroid.
    #[must_use]
    pub fn inertia(&self, data: ArrayView2<'_, f64>) -> f64 {
        data.axis_iter(Axis(0))
            .zip(&self.assignments)
            .map(|(point, &cluster)| distance_sq(point, self.centroids.row(cluster)))
            .sum()
    }
}

/// Greedy k-means++: each step samples a few candidates and keeps the one that
/// lowers the total squared distance the most.
fn plus_plus_init(data: ArrayView2<'_, f64>, k: usize, rng: &mut StdRng) -> Vec<usize> {
    let n = data.nrows();
    if n == 0 || k == 0 {
        return Vec::new();
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let local_trials = 2 + (k as f64).ln() as usize;

    let mut chosen = vec![rng.random_range(0..n)];
    let mut closest: Vec<f64> = data
        .axis_iter(Axis(0))
        .map(|point| distance_sq(point, data.row(chosen[0])))
        .collect();

    while chosen.len() < k {
        let total: f64 = closest.iter().sum();
        if total <= f64::EPSILON {
            // All remaining points coincide with a centroid; take the first unused row
            chosen.push((0..n).find(|idx| !chosen.contains(idx)).unwrap_or(0));
            continue;
        }

        let mut best: Option<(f64, usize, Vec<f64>)> = None;
        for _ in 0..local_trials {
            let candidate = sample_weighted(&closest, total, rng);
            let updated: Vec<f64> = data
                .axis_iter(Axis(0))
                .zip(&closest)
                .map(|(point, &current)| current.min(distance_sq(point, data.row(candidate))))
                .collect();
            let potential: f64 = updated.iter().sum();
            if best.as_ref().is_none_or(|(lowest, _, _)| potential < *lowest) {
                best = Some((potential, candidate, updated));
            }
        }
        if let Some((_, candidate, updated)) = best {
            chosen.push(candidate);
            closest = updated;
        }
    }

    chosen
}

fn sample_weighted(weights: &[f64], total: f64, rng: &mut StdRng) -> usize {
    let mut target = rng.random::<f64>() * total;
    for (idx, weight) in weights.iter().enumerate() {
        if target < *weight {
            return idx;
        }
        target -= weight;
    }
    weights.len() - 1
}

fn nearest(point: ArrayView1<'_, f64>, centroids: ArrayView2<'_, f64>) -> (usize, f64) {
    let mut best = (0, f64::MAX);
    for (idx, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
        let d = distance_sq(point, centroid);
        if d < best.1 {
            best = (idx, d);
        }
    }
    best
}

fn farthest_point(
    data: ArrayView2<'_, f64>,
    centroids: ArrayView2<'_, f64>,
    assignments: &[usize],
) -> Option<usize> {
    data.axis_iter(Axis(0))
        .zip(assignments)
        .enumerate()
        .map(|(idx, (point, &cluster))| (idx, distance_sq(point, centroids.row(cluster))))
        .filter(|(_, d)| *d > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(idx, _)| idx)
}

pub(crate) fn distance_sq(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}
