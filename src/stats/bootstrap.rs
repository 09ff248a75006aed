//! Percentile bootstrap confidence intervals.
//!
//! Resampling is the only source of randomness in the engine. It goes
//! through a [`ResampleSource`] so callers can pin it with a seed (or replace
//! it entirely in tests). Rounds are independent and run on rayon; each round
//! derives its own generator from `(seed, stream, round)`, so the interval
//! does not depend on thread scheduling.

use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::stats::percentile_sorted;

/// Supplies resample indices for one bootstrap round.
pub trait ResampleSource: Send + Sync {
    /// Draw `len` indices in `0..len` with replacement.
    ///
    /// `stream` separates independent partitions; `round` is the resample
    /// number within that partition.
    fn resample_indices(&self, stream: u64, round: usize, len: usize) -> Vec<usize>;
}

/// Uniform resampling from a `StdRng` seeded per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededSampler {
    seed: u64,
}

impl SeededSampler {
    /// Create a sampler with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create a sampler with a seed drawn from the thread RNG.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// The seed in use, for recording alongside results.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl ResampleSource for SeededSampler {
    fn resample_indices(&self, stream: u64, round: usize, len: usize) -> Vec<usize> {
        let mut rng = StdRng::seed_from_u64(mix(self.seed, stream, round as u64));
        (0..len).map(|_| rng.gen_range(0..len)).collect()
    }
}

/// SplitMix64 finalizer over the three inputs.
fn mix(seed: u64, stream: u64, round: u64) -> u64 {
    let mut z = seed
        ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ round.wrapping_mul(0xD1B5_4A32_D192_ED03);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Stable stream id for a partition key (FNV-1a).
#[must_use]
pub fn stream_id(key: &str) -> u64 {
    key.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01B3)
    })
}

/// Nonparametric percentile bootstrap.
#[derive(Clone)]
pub struct Bootstrap {
    samples: usize,
    confidence: f64,
    source: Arc<dyn ResampleSource>,
}

impl fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bootstrap")
            .field("samples", &self.samples)
            .field("confidence", &self.confidence)
            .finish_non_exhaustive()
    }
}

impl Bootstrap {
    /// Create a bootstrap with an explicit resample source.
    ///
    /// `samples` must be positive and `confidence` strictly inside `(0, 1)`.
    pub fn new(
        samples: usize,
        confidence: f64,
        source: Arc<dyn ResampleSource>,
    ) -> Result<Self> {
        if samples == 0 {
            return Err(Error::InvalidConfig(
                "bootstrap sample count must be positive".to_string(),
            ));
        }
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "bootstrap confidence {confidence} outside (0, 1)"
            )));
        }
        Ok(Self {
            samples,
            confidence,
            source,
        })
    }

    /// Create a bootstrap backed by a [`SeededSampler`].
    pub fn seeded(samples: usize, confidence: f64, seed: u64) -> Result<Self> {
        Self::new(samples, confidence, Arc::new(SeededSampler::new(seed)))
    }

    /// Number of resamples per interval.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Confidence level of the interval.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Percentile interval of `statistic` over resamples of `data`.
    ///
    /// Returns `None` for empty data.
    pub fn interval<F>(&self, data: &[f64], stream: u64, statistic: F) -> Option<(f64, f64)>
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        if data.is_empty() {
            return None;
        }
        let n = data.len();

        let mut stats: Vec<f64> = (0..self.samples)
            .into_par_iter()
            .map(|round| {
                let sample: Vec<f64> = self
                    .source
                    .resample_indices(stream, round, n)
                    .into_iter()
                    .map(|i| data[i])
                    .collect();
                statistic(&sample)
            })
            .collect();
        stats.sort_by(f64::total_cmp);

        let alpha = (1.0 - self.confidence) / 2.0;
        Some((
            percentile_sorted(&stats, alpha),
            percentile_sorted(&stats, 1.0 - alpha),
        ))
    }

    /// Interval for the mean of `data`.
    pub fn mean_interval(&self, data: &[f64], stream: u64) -> Option<(f64, f64)> {
        self.interval(data, stream, crate::stats::mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::mean;

    /// Returns the data unchanged every round.
    struct IdentitySource;

    impl ResampleSource for IdentitySource {
        fn resample_indices(&self, _stream: u64, _round: usize, len: usize) -> Vec<usize> {
            (0..len).collect()
        }
    }

    fn approvals(approved: usize, total: usize) -> Vec<f64> {
        (0..total).map(|i| if i < approved { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let data = approvals(40, 80);
        let a = Bootstrap::seeded(200, 0.95, 7).unwrap();
        let b = Bootstrap::seeded(200, 0.95, 7).unwrap();
        assert_eq!(a.mean_interval(&data, 1), b.mean_interval(&data, 1));
    }

    #[test]
    fn test_interval_brackets_mean() {
        let data = approvals(40, 80);
        let boot = Bootstrap::seeded(500, 0.95, 42).unwrap();
        let (lo, hi) = boot.mean_interval(&data, 0).unwrap();
        assert!(lo <= 0.5 && 0.5 <= hi);
        assert!(lo >= 0.0 && hi <= 1.0);
        assert!(hi - lo > 0.05);
    }

    #[test]
    fn test_confidence_level_sets_width() {
        let data = approvals(40, 80);
        let wide = Bootstrap::seeded(500, 0.95, 13).unwrap();
        let narrow = Bootstrap::seeded(500, 0.5, 13).unwrap();
        let (wl, wu) = wide.mean_interval(&data, 1).unwrap();
        let (nl, nu) = narrow.mean_interval(&data, 1).unwrap();
        assert!(wl <= nl && nu <= wu, "[{nl}, {nu}] not inside [{wl}, {wu}]");
        assert!(nu - nl < wu - wl);
    }

    #[test]
    fn test_constant_data_degenerate_interval() {
        let data = vec![1.0; 25];
        let boot = Bootstrap::seeded(100, 0.95, 3).unwrap();
        assert_eq!(boot.mean_interval(&data, 0), Some((1.0, 1.0)));
    }

    #[test]
    fn test_injected_source() {
        let data = approvals(1, 4);
        let boot = Bootstrap::new(10, 0.9, Arc::new(IdentitySource)).unwrap();
        assert_eq!(boot.interval(&data, 0, mean), Some((0.25, 0.25)));
    }

    #[test]
    fn test_empty_data() {
        let boot = Bootstrap::seeded(10, 0.95, 1).unwrap();
        assert!(boot.mean_interval(&[], 0).is_none());
    }

    #[test]
    fn test_invalid_config() {
        assert!(Bootstrap::seeded(0, 0.95, 1).is_err());
        assert!(Bootstrap::seeded(10, 1.0, 1).is_err());
        assert!(Bootstrap::seeded(10, 0.0, 1).is_err());
    }

    #[test]
    fn test_sampler_indices_in_range() {
        let sampler = SeededSampler::new(11);
        let idx = sampler.resample_indices(stream_id("A"), 3, 17);
        assert_eq!(idx.len(), 17);
        assert!(idx.iter().all(|&i| i < 17));
        assert_eq!(idx, sampler.resample_indices(stream_id("A"), 3, 17));
        assert_ne!(idx, sampler.resample_indices(stream_id("B"), 3, 17));
    }

    #[test]
    fn test_stream_id_stable() {
        assert_eq!(stream_id("overall"), stream_id("overall"));
        assert_ne!(stream_id("A"), stream_id("B"));
    }
}
