//! Monte Carlo price sampling.
//!
//! Draws are `mean + std * z` with `z ~ N(0, 1)`, taken from an explicit
//! [`StdRng`] so a run is reproducible whenever a seed is given.

use std::collections::BTreeMap;

use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::domain::validate::ModelError;

/// Normal distribution of one period's price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceDistribution {
    pub mean: f64,
    pub std: f64,
}

impl PriceDistribution {
    pub fn new(mean: f64, std: f64) -> Self {
        PriceDistribution { mean, std }
    }

    pub fn validate(&self, period: u32) -> Result<(), ModelError> {
        if !self.mean.is_finite() || !self.std.is_finite() || self.std < 0.0 {
            return Err(ModelError::InvalidDistribution {
                period,
                mean: self.mean,
                std: self.std,
            });
        }
        Ok(())
    }
}

/// `S` draws per period, shape T×S. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMatrix {
    rows: BTreeMap<u32, Vec<f64>>,
    sample_count: usize,
}

impl SampleMatrix {
    /// Builds a matrix from explicit rows; every row must hold the same,
    /// non-zero number of draws.
    pub fn from_rows(rows: BTreeMap<u32, Vec<f64>>) -> Result<Self, ModelError> {
        let sample_count = match rows.values().next() {
            Some(first) => first.len(),
            None => return Err(ModelError::NoPeriods),
        };
        if sample_count == 0 {
            return Err(ModelError::NoSamples);
        }
        if rows.values().any(|row| row.len() != sample_count) {
            return Err(ModelError::RaggedSamples);
        }
        Ok(SampleMatrix { rows, sample_count })
    }

    /// Periods in ascending order
    pub fn periods(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.keys().copied()
    }

    pub fn samples(&self, period: u32) -> Option<&[f64]> {
        self.rows.get(&period).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = (u32, &[f64])> + '_ {
        self.rows.iter().map(|(period, row)| (*period, row.as_slice()))
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn period_count(&self) -> usize {
        self.rows.len()
    }

    pub fn mean(&self, period: u32) -> Option<f64> {
        self.samples(period)
            .map(|row| row.iter().sum::<f64>() / row.len() as f64)
    }

    /// Per-period sample means, the effective objective coefficients.
    pub fn means(&self) -> BTreeMap<u32, f64> {
        self.rows
            .iter()
            .map(|(period, row)| (*period, row.iter().sum::<f64>() / row.len() as f64))
            .collect()
    }
}

/// Injectable random source for price scenarios.
pub struct SampleGenerator {
    rng: StdRng,
}

impl SampleGenerator {
    /// Seeded when `seed` is given, otherwise drawn from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        SampleGenerator { rng }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    /// Draws `samples` independent values for every period, in ascending
    /// period order.
    pub fn generate(
        &mut self,
        distributions: &BTreeMap<u32, PriceDistribution>,
        samples: usize,
    ) -> Result<SampleMatrix, ModelError> {
        if distributions.is_empty() {
            return Err(ModelError::NoPeriods);
        }
        if samples == 0 {
            return Err(ModelError::NoSamples);
        }
        for (period, dist) in distributions {
            dist.validate(*period)?;
        }

        let mut rows = BTreeMap::new();
        for (period, dist) in distributions {
            let row: Vec<f64> = (0..samples)
                .map(|_| {
                    let z = self.rng.sample::<f64, _>(StandardNormal);
                    dist.mean + dist.std * z
                })
                .collect();
            rows.insert(*period, row);
        }

        debug!(
            "generated {} samples for {} periods",
            samples,
            distributions.len()
        );

        Ok(SampleMatrix {
            rows,
            sample_count: samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distributions() -> BTreeMap<u32, PriceDistribution> {
        BTreeMap::from([
            (1, PriceDistribution::new(50.0, 10.0)),
            (2, PriceDistribution::new(30.0, 5.0)),
            (3, PriceDistribution::new(70.0, 15.0)),
        ])
    }

    #[test]
    fn test_generate_shape() {
        let matrix = SampleGenerator::seeded(7)
            .generate(&distributions(), 25)
            .unwrap();

        assert_eq!(matrix.period_count(), 3);
        assert_eq!(matrix.sample_count(), 25);
        assert_eq!(matrix.periods().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(matrix.rows().all(|(_, row)| row.len() == 25));
    }

    #[test]
    fn test_same_seed_gives_same_matrix() {
        let a = SampleGenerator::seeded(42).generate(&distributions(), 50).unwrap();
        let b = SampleGenerator::seeded(42).generate(&distributions(), 50).unwrap();
        let c = SampleGenerator::seeded(43).generate(&distributions(), 50).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_zero_std_collapses_to_mean() {
        let dists = BTreeMap::from([(1, PriceDistribution::new(50.0, 0.0))]);
        let matrix = SampleGenerator::new(None).generate(&dists, 10).unwrap();

        assert!(matrix.samples(1).unwrap().iter().all(|&v| v == 50.0));
        assert_eq!(matrix.mean(1), Some(50.0));
    }

    #[test]
    fn test_means_converge_to_distribution_means() {
        let samples = 20_000;
        let dists = distributions();
        let matrix = SampleGenerator::seeded(2024).generate(&dists, samples).unwrap();

        for (period, mean) in matrix.means() {
            let dist = dists[&period];
            // five standard errors
            let bound = 5.0 * dist.std / (samples as f64).sqrt();
            assert!(
                (mean - dist.mean).abs() < bound,
                "period {}: sample mean {} too far from {}",
                period,
                mean,
                dist.mean
            );
        }
    }

    #[test]
    fn test_more_samples_tighten_the_mean_error() {
        let dists = BTreeMap::from([(1, PriceDistribution::new(80.0, 20.0))]);
        let mean_abs_error = |samples: usize| -> f64 {
            let runs = 40;
            (0..runs)
                .map(|seed| {
                    let matrix = SampleGenerator::seeded(seed).generate(&dists, samples).unwrap();
                    (matrix.mean(1).unwrap() - 80.0).abs()
                })
                .sum::<f64>()
                / runs as f64
        };

        // expected error shrinks by sqrt(100) = 10x
        assert!(mean_abs_error(10_000) < mean_abs_error(100));
    }

    #[test]
    fn test_rejects_zero_samples() {
        let result = SampleGenerator::seeded(1).generate(&distributions(), 0);
        assert_eq!(result, Err(ModelError::NoSamples));
    }

    #[test]
    fn test_rejects_empty_distribution_table() {
        let result = SampleGenerator::seeded(1).generate(&BTreeMap::new(), 10);
        assert_eq!(result, Err(ModelError::NoPeriods));
    }

    #[test]
    fn test_rejects_negative_std() {
        let dists = BTreeMap::from([(4, PriceDistribution::new(60.0, -1.0))]);
        let result = SampleGenerator::seeded(1).generate(&dists, 10);
        assert!(matches!(
            result,
            Err(ModelError::InvalidDistribution { period: 4, .. })
        ));
    }

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        let rows = BTreeMap::from([(1, vec![1.0, 2.0]), (2, vec![3.0])]);
        assert_eq!(SampleMatrix::from_rows(rows), Err(ModelError::RaggedSamples));
    }
}
