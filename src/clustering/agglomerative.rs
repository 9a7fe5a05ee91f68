//! 平均連結法による凝集型クラスタリング。
//!
//! 距離の更新は Lance-Williams 式、各クラスタの最近傍をキャッシュして探索を省く。
use ndarray::ArrayView2;

/// `distances` を `k` 個のクラスタにまとめ、文書ごとのラベルを返す。
///
/// ラベルは各クラスタの最小メンバー番号の昇順に `0..k` で振られる。
#[must_use]
pub fn average_linkage(distances: ArrayView2<'_, f64>, k: usize) -> Vec<usize> {
    let n = distances.nrows();
    if n == 0 {
        return Vec::new();
    }
    let k = k.clamp(1, n);

    let mut dist = distances.to_owned();
    let mut sizes = vec![1_usize; n];
    let mut active = vec![true; n];
    let mut members: Vec<Vec<usize>> = (0..n).map(|idx| vec![idx]).collect();

    let nearest_of = |dist: &ndarray::Array2<f64>, active: &[bool], i: usize| -> (usize, f64) {
        let mut best = (usize::MAX, f64::INFINITY);
        for j in 0..n {
            if j != i && active[j] && dist[[i, j]] < best.1 {
                best = (j, dist[[i, j]]);
            }
        }
        best
    };

    let mut nearest: Vec<(usize, f64)> = (0..n).map(|i| nearest_of(&dist, &active, i)).collect();
    let mut remaining = n;

    while remaining > k {
        let Some(a) = (0..n)
            .filter(|&i| active[i] && nearest[i].0 != usize::MAX)
            .min_by(|&x, &y| nearest[x].1.total_cmp(&nearest[y].1).then(x.cmp(&y)))
        else {
            break;
        };
        let b = nearest[a].0;
        let (keep, drop) = if a < b { (a, b) } else { (b, a) };

        #[allow(clippy::cast_precision_loss)]
        let (size_keep, size_drop) = (sizes[keep] as f64, sizes[drop] as f64);
        for m in 0..n {
            if m == keep || m == drop || !active[m] {
                continue;
            }
            let merged =
                (size_keep * dist[[keep, m]] + size_drop * dist[[drop, m]]) / (size_keep + size_drop);
            dist[[keep, m]] = merged;
            dist[[m, keep]] = merged;
        }

        sizes[keep] += sizes[drop];
        active[drop] = false;
        let moved = std::mem::take(&mut members[drop]);
        members[keep].extend(moved);
        remaining -= 1;

        nearest[keep] = nearest_of(&dist, &active, keep);
        for m in 0..n {
            if !active[m] || m == keep {
                continue;
            }
            if nearest[m].0 == keep || nearest[m].0 == drop {
                nearest[m] = nearest_of(&dist, &active, m);
            } else if dist[[m, keep]] < nearest[m].1 {
                nearest[m] = (keep, dist[[m, keep]]);
            }
        }
    }

    let mut clusters: Vec<&Vec<usize>> = (0..n).filter(|&i| active[i]).map(|i| &members[i]).collect();
    clusters.sort_by_key(|group| group.iter().min().copied().unwrap_or(usize::MAX));

    let mut labels = vec![0; n];
    for (label, group) in clusters.iter().enumerate() {
        for &doc in *group {
            labels[doc] = label;
        }
    }
    labels
}
