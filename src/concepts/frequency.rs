use std::hash::Hash;

use rustc_hash::FxHashMap;

/// 出現頻度の集計器。同頻度のキーは初出順を保つ。
#[derive(Debug, Clone)]
pub struct FrequencyDistribution<K> {
    counts: FxHashMap<K, (usize, usize)>,
    total: usize,
}

impl<K> Default for FrequencyDistribution<K> {
    fn default() -> Self {
        Self {
            counts: FxHashMap::default(),
            total: 0,
        }
    }
}

impl<K: Eq + Hash + Clone> FrequencyDistribution<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: K) {
        let next_index = self.counts.len();
        let entry = self.counts.entry(key).or_insert((0, next_index));
        entry.0 += 1;
        self.total += 1;
    }

    #[must_use]
    pub fn count(&self, key: &K) -> usize {
        self.counts.get(key).map_or(0, |(count, _)| *count)
    }

    /// 総出現数。
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// 異なり数。
    #[must_use]
    pub fn unique(&self) -> usize {
        self.counts.len()
    }

    /// 頻度の降順に上位 `n` 件を返す。
    #[must_use]
    pub fn most_common(&self, n: usize) -> Vec<(K, usize)> {
        let mut entries: Vec<(&K, usize, usize)> = self
            .counts
            .iter()
            .map(|(key, (count, first_seen))| (key, *count, *first_seen))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        entries
            .into_iter()
            .take(n)
            .map(|(key, count, _)| (key.clone(), count))
            .collect()
    }
}

impl<K: Eq + Hash + Clone> FromIterator<K> for FrequencyDistribution<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut dist = Self::new();
        for key in iter {
            dist.push(key);
        }
        dist
    }
}
