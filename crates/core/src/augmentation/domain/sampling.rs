//! Random draws shared by the transformers.
//!
//! All samplers take the RNG by `&mut R` with `R: Rng + ?Sized` so they work
//! with both concrete generators and the `&mut dyn RngCore` handed to
//! transformers.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::shared::error::AugmentError;

/// Rejection attempts before a truncated normal falls back to a uniform draw.
const MAX_REJECTION_ATTEMPTS: usize = 10_000;

/// Normal distribution restricted to `[low, high]` by rejection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TruncatedNormal {
    pub mean: f64,
    pub std_dev: f64,
    pub low: f64,
    pub high: f64,
}

impl TruncatedNormal {
    pub fn new(mean: f64, std_dev: f64, low: f64, high: f64) -> Result<Self, AugmentError> {
        let dist = Self {
            mean,
            std_dev,
            low,
            high,
        };
        dist.validate()?;
        Ok(dist)
    }

    pub fn validate(&self) -> Result<(), AugmentError> {
        if !(self.mean.is_finite()
            && self.std_dev.is_finite()
            && self.low.is_finite()
            && self.high.is_finite())
        {
            return Err(AugmentError::configuration(format!(
                "truncated normal parameters must be finite: {self:?}"
            )));
        }
        if self.std_dev < 0.0 {
            return Err(AugmentError::configuration(format!(
                "standard deviation must be non-negative, got {}",
                self.std_dev
            )));
        }
        if self.low > self.high {
            return Err(AugmentError::configuration(format!(
                "truncation interval is empty: [{}, {}]",
                self.low, self.high
            )));
        }
        Ok(())
    }

    /// Draw a value in `[low, high]`.
    ///
    /// A zero deviation yields the clamped mean. If the interval sits so far
    /// in the tail that rejection keeps failing, the draw falls back to
    /// uniform over the interval.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.std_dev == 0.0 || self.low == self.high {
            return self.mean.clamp(self.low, self.high);
        }
        // Parameters were validated, so construction cannot fail.
        let normal = match Normal::new(self.mean, self.std_dev) {
            Ok(n) => n,
            Err(_) => return self.mean.clamp(self.low, self.high),
        };
        for _ in 0..MAX_REJECTION_ATTEMPTS {
            let x = normal.sample(rng);
            if (self.low..=self.high).contains(&x) {
                return x;
            }
        }
        log::warn!(
            "truncated normal {:?} rejected {} draws, falling back to uniform",
            self,
            MAX_REJECTION_ATTEMPTS
        );
        rng.gen_range(self.low..=self.high)
    }
}

/// Uniform distribution over `[low, high)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniformRange {
    pub low: f64,
    pub high: f64,
}

impl UniformRange {
    pub fn new(low: f64, high: f64) -> Result<Self, AugmentError> {
        let range = Self { low, high };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), AugmentError> {
        if !(self.low.is_finite() && self.high.is_finite()) || self.low > self.high {
            return Err(AugmentError::configuration(format!(
                "invalid uniform range [{}, {})",
                self.low, self.high
            )));
        }
        Ok(())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.low == self.high {
            return self.low;
        }
        rng.gen_range(self.low..self.high)
    }
}

/// `|X|` for `X ~ N(mean, std_dev)`.
///
/// With `mean == 0` this is the half-normal distribution; otherwise it is the
/// folded normal. Draws are never negative.
#[derive(Clone, Copy, Debug)]
pub struct FoldedNormal {
    normal: Normal<f64>,
}

impl FoldedNormal {
    pub fn new(mean: f64, std_dev: f64) -> Result<Self, AugmentError> {
        if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 {
            return Err(AugmentError::configuration(format!(
                "gain distribution needs finite mean and non-negative std dev, got N({mean}, {std_dev})"
            )));
        }
        let normal = Normal::new(mean, std_dev)
            .map_err(|e| AugmentError::configuration(format!("invalid gain distribution: {e}")))?;
        Ok(Self { normal })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.normal.sample(rng).abs()
    }
}

/// Index drawn uniformly from `0..len`. `len` must be non-zero.
pub fn uniform_index<R: Rng + ?Sized>(rng: &mut R, len: usize) -> usize {
    debug_assert!(len > 0);
    rng.gen_range(0..len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use rstest::rstest;

    #[rstest]
    #[case::length(6.0, 3.0, 3.0, 10.0)]
    #[case::width(5.0, 2.0, 3.0, 10.0)]
    #[case::height(2.4, 0.6, 2.2, 5.0)]
    fn test_truncated_normal_stays_in_bounds(
        #[case] mean: f64,
        #[case] sd: f64,
        #[case] low: f64,
        #[case] high: f64,
    ) {
        let dist = TruncatedNormal::new(mean, sd, low, high).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..5000 {
            let x = dist.sample(&mut rng);
            assert!((low..=high).contains(&x), "{x} outside [{low}, {high}]");
        }
    }

    #[test]
    fn test_truncated_normal_zero_sd_is_clamped_mean() {
        let dist = TruncatedNormal::new(12.0, 0.0, 3.0, 10.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_relative_eq!(dist.sample(&mut rng), 10.0);
    }

    #[test]
    fn test_truncated_normal_far_tail_falls_back_to_uniform() {
        let dist = TruncatedNormal::new(0.0, 0.001, 50.0, 51.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let x = dist.sample(&mut rng);
        assert!((50.0..=51.0).contains(&x));
    }

    #[rstest]
    #[case::negative_sd(1.0, -1.0, 0.0, 2.0)]
    #[case::empty_interval(1.0, 1.0, 3.0, 2.0)]
    #[case::nan_mean(f64::NAN, 1.0, 0.0, 2.0)]
    fn test_truncated_normal_rejects_invalid(
        #[case] mean: f64,
        #[case] sd: f64,
        #[case] low: f64,
        #[case] high: f64,
    ) {
        assert!(matches!(
            TruncatedNormal::new(mean, sd, low, high),
            Err(AugmentError::Configuration(_))
        ));
    }

    #[test]
    fn test_uniform_range_bounds() {
        let range = UniformRange::new(0.3, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..1000 {
            let x = range.sample(&mut rng);
            assert!((0.3..1.0).contains(&x));
        }
        assert!(UniformRange::new(2.0, 1.0).is_err());
    }

    #[test]
    fn test_folded_normal_never_negative() {
        let dist = FoldedNormal::new(0.25, 0.1).unwrap();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert!(dist.sample(&mut rng) >= 0.0);
        }
        // A negative mean still yields non-negative gains.
        let dist = FoldedNormal::new(-1.0, 0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..1000 {
            assert!(dist.sample(&mut rng) >= 0.0);
        }
    }

    #[test]
    fn test_folded_normal_zero_sd_is_deterministic() {
        let dist = FoldedNormal::new(1.0, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert_relative_eq!(dist.sample(&mut rng), 1.0);
    }

    #[test]
    fn test_folded_normal_rejects_negative_sd() {
        assert!(FoldedNormal::new(0.25, -0.1).is_err());
    }

    #[test]
    fn test_samplers_accept_dyn_rng() {
        let mut concrete = StdRng::seed_from_u64(4);
        let rng: &mut dyn RngCore = &mut concrete;
        let idx = uniform_index(rng, 3);
        assert!(idx < 3);
        let x = UniformRange::new(1.0, 2.0).unwrap().sample(rng);
        assert!((1.0..2.0).contains(&x));
    }
}
