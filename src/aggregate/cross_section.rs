use std::collections::BTreeMap;

use crate::error::AggregateError;
use crate::models::MetricBundle;

/// Key holding the number of contributing transcripts
pub const COUNT_KEY: &str = "n";

/// Sums metric bundles key by key, counting contributions per key.
///
/// Metrics that only some transcripts produce (e.g. `CHI_mlu` when the child
/// never spoke) are averaged over the transcripts that produced them, not
/// over the whole group.
#[derive(Debug, Default, Clone)]
pub struct CrossSectionAccumulator {
    totals: BTreeMap<String, (f64, u32)>,
    n: usize,
}

impl CrossSectionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bundle: &MetricBundle) {
        for (key, value) in bundle.iter() {
            let entry = self.totals.entry(key.to_string()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
        self.n += 1;
    }

    /// Number of bundles added so far
    pub fn count(&self) -> usize {
        self.n
    }

    /// Contributions recorded for `key`
    pub fn contributions(&self, key: &str) -> u32 {
        self.totals.get(key).map(|(_, c)| *c).unwrap_or(0)
    }

    /// Combined bundle: per-key sums, or per-key means when `average` is set
    pub fn finish(&self, average: bool) -> Result<MetricBundle, AggregateError> {
        if self.n == 0 {
            return Err(AggregateError::EmptyPopulation);
        }

        let mut bundle: MetricBundle = self
            .totals
            .iter()
            .map(|(key, &(sum, count))| {
                let value = if average { sum / count as f64 } else { sum };
                (key.as_str(), value)
            })
            .collect();
        bundle.insert(COUNT_KEY, self.n as f64);
        Ok(bundle)
    }
}

/// Combine the bundles of one group into a single bundle with `n`
pub fn cross_section(
    bundles: &[MetricBundle],
    average: bool,
) -> Result<MetricBundle, AggregateError> {
    let mut acc = CrossSectionAccumulator::new();
    for bundle in bundles {
        acc.add(bundle);
    }
    acc.finish(average)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_of_two() {
        let bundles = vec![
            MetricBundle::new().with("ttr", 0.5),
            MetricBundle::new().with("ttr", 0.7),
        ];
        let result = cross_section(&bundles, true).unwrap();

        assert!((result.get("ttr").unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(result.get(COUNT_KEY), Some(2.0));
    }

    #[test]
    fn test_sparse_metric_divides_by_own_count() {
        let bundles = vec![MetricBundle::new().with("ttr", 0.5), MetricBundle::new()];
        let result = cross_section(&bundles, true).unwrap();

        assert_eq!(result.get("ttr"), Some(0.5));
        assert_eq!(result.get(COUNT_KEY), Some(2.0));
    }

    #[test]
    fn test_key_missing_from_seed_is_inserted() {
        let bundles = vec![
            MetricBundle::new().with("MOT_mlu", 4.0),
            MetricBundle::new().with("MOT_mlu", 6.0).with("CHI_mlu", 2.0),
            MetricBundle::new().with("CHI_mlu", 3.0),
        ];

        let mut acc = CrossSectionAccumulator::new();
        for b in &bundles {
            acc.add(b);
        }
        assert_eq!(acc.contributions("CHI_mlu"), 2);
        assert_eq!(acc.contributions("MOT_mlu"), 2);

        let averaged = acc.finish(true).unwrap();
        assert_eq!(averaged.get("CHI_mlu"), Some(2.5));
        assert_eq!(averaged.get("MOT_mlu"), Some(5.0));
        assert_eq!(averaged.get(COUNT_KEY), Some(3.0));
    }

    #[test]
    fn test_sums_without_averaging() {
        let bundles = vec![
            MetricBundle::new().with("c<m", 3.0),
            MetricBundle::new().with("c<m", 4.0),
        ];
        let result = cross_section(&bundles, false).unwrap();
        assert_eq!(result.get("c<m"), Some(7.0));
    }

    #[test]
    fn test_empty_population() {
        assert_eq!(cross_section(&[], true), Err(AggregateError::EmptyPopulation));
    }
}
