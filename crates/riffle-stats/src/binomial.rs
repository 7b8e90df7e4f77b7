//! Binomial tail probabilities with real-valued bounds
//!
//! Extrapolated counts are fractional game-equivalents, so tail sums must be
//! defined between integer points. The CDF is extended to real arguments by
//! linear interpolation between the two adjacent integer points:
//!
//! ```text
//! F(x) = F(⌊x⌋) + (x - ⌊x⌋) · (F(⌈x⌉) - F(⌊x⌋))
//! F(x) = 0   for x <= -1
//! F(x) = 1   for x >= trials
//! ```
//!
//! which is continuous and non-decreasing, and agrees with the exact CDF at
//! every integer.

use statrs::distribution::{Binomial as BinomialDist, DiscreteCDF as _};

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("success probability must be within [0, 1], got {probability}")]
pub struct BinomialError {
    pub probability: f64,
}

#[derive(Debug, Clone)]
enum Mass {
    /// All mass at zero successes (`p == 0`)
    Zero,
    /// All mass at `trials` successes (`p == 1`)
    All,
    Spread(BinomialDist),
}

/// Binomial distribution supporting interpolated CDF evaluation.
#[derive(Debug, Clone)]
pub struct Binomial {
    trials: u64,
    mass: Mass,
}

impl Binomial {
    pub fn new(trials: u64, probability: f64) -> Result<Self, BinomialError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(BinomialError { probability });
        }
        let mass = if probability == 0.0 {
            Mass::Zero
        } else if probability == 1.0 {
            Mass::All
        } else {
            BinomialDist::new(probability, trials)
                .map(Mass::Spread)
                .map_err(|_| BinomialError { probability })?
        };
        Ok(Self { trials, mass })
    }

    #[must_use]
    pub fn trials(&self) -> u64 {
        self.trials
    }

    /// `P(X <= k)` for an integer `k`.
    fn cdf_at(&self, k: i64) -> f64 {
        let Ok(k) = u64::try_from(k) else {
            return 0.0;
        };
        if k >= self.trials {
            return 1.0;
        }
        match &self.mass {
            Mass::Zero => 1.0,
            Mass::All => 0.0,
            Mass::Spread(dist) => dist.cdf(k),
        }
    }

    /// `P(X > k)` for an integer `k`.
    ///
    /// Evaluated directly instead of as `1 - cdf` to keep precision in far
    /// upper tails.
    fn sf_at(&self, k: i64) -> f64 {
        let Ok(k) = u64::try_from(k) else {
            return 1.0;
        };
        if k >= self.trials {
            return 0.0;
        }
        match &self.mass {
            Mass::Zero => 0.0,
            Mass::All => 1.0,
            Mass::Spread(dist) => dist.sf(k),
        }
    }

    /// Real-valued CDF, linearly interpolated between integer points.
    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn cdf(&self, x: f64) -> f64 {
        let lo = x.floor();
        let frac = x - lo;
        let lo = lo as i64;
        let f_lo = self.cdf_at(lo);
        if frac == 0.0 {
            return f_lo;
        }
        f_lo + frac * (self.cdf_at(lo + 1) - f_lo)
    }

    /// Real-valued survival function `1 - cdf(x)`, interpolated the same way.
    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn sf(&self, x: f64) -> f64 {
        let lo = x.floor();
        let frac = x - lo;
        let lo = lo as i64;
        let s_lo = self.sf_at(lo);
        if frac == 0.0 {
            return s_lo;
        }
        s_lo + frac * (self.sf_at(lo + 1) - s_lo)
    }

    /// Probability mass over `[lower, upper]`, i.e. `F(upper) - F(lower - 1)`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn interval(&self, lower: f64, upper: f64) -> f64 {
        if upper < lower {
            return 0.0;
        }
        let p = if lower <= 0.0 {
            self.cdf(upper)
        } else if upper >= self.trials as f64 {
            self.sf(lower - 1.0)
        } else {
            self.cdf(upper) - self.cdf(lower - 1.0)
        };
        p.clamp(0.0, 1.0)
    }
}

/// Sums the binomial PMF over `[lower_bound, upper_bound]`.
///
/// Bounds may be fractional and are handled by the interpolated CDF described
/// in the [module documentation](self). A success probability of exactly 0 or
/// 1 is a point mass, not an error.
///
/// # Examples
///
/// ```
/// use riffle_stats::binomial::cumulative_binomial;
///
/// let p = cumulative_binomial(10, 0.0, 10.0, 0.3).unwrap();
/// assert!((p - 1.0).abs() < 1e-12);
///
/// let below = cumulative_binomial(10, 0.0, 2.0, 0.3).unwrap();
/// let between = cumulative_binomial(10, 0.0, 2.5, 0.3).unwrap();
/// let above = cumulative_binomial(10, 0.0, 3.0, 0.3).unwrap();
/// assert!(below < between && between < above);
/// ```
pub fn cumulative_binomial(
    trials: u64,
    lower_bound: f64,
    upper_bound: f64,
    success_probability: f64,
) -> Result<f64, BinomialError> {
    Ok(Binomial::new(trials, success_probability)?.interval(lower_bound, upper_bound))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-10;

    #[test]
    fn test_full_range_is_one() {
        for trials in [1, 5, 47, 500] {
            for p in [0.0, 0.01, 0.425, 0.5, 0.99, 1.0] {
                #[expect(clippy::cast_precision_loss)]
                let total = cumulative_binomial(trials, 0.0, trials as f64, p).unwrap();
                assert!((total - 1.0).abs() < EPS, "n={trials} p={p}: {total}");
            }
        }
    }

    #[test]
    fn test_monotone_in_upper_bound() {
        let dist = Binomial::new(40, 0.425).unwrap();
        let mut prev = 0.0;
        for step in 0..=160 {
            let k = f64::from(step) * 0.25;
            let p = dist.interval(0.0, k);
            assert!(p + EPS >= prev, "cdf decreased at {k}: {prev} -> {p}");
            prev = p;
        }
        assert!((prev - 1.0).abs() < EPS);
    }

    #[test]
    fn test_matches_exact_pmf_sum() {
        // n = 4, p = 0.5: pmf = [1, 4, 6, 4, 1] / 16
        let p = cumulative_binomial(4, 1.0, 3.0, 0.5).unwrap();
        assert!((p - 14.0 / 16.0).abs() < EPS);
        let p = cumulative_binomial(4, 3.0, 4.0, 0.5).unwrap();
        assert!((p - 5.0 / 16.0).abs() < EPS);
        let p = cumulative_binomial(4, 0.0, 0.0, 0.5).unwrap();
        assert!((p - 1.0 / 16.0).abs() < EPS);
    }

    #[test]
    fn test_fractional_bounds_interpolate() {
        let dist = Binomial::new(4, 0.5).unwrap();
        let f1 = dist.cdf(1.0);
        let f2 = dist.cdf(2.0);
        assert!((dist.cdf(1.5) - (f1 + f2) / 2.0).abs() < EPS);
        assert!((dist.cdf(1.25) - (f1 + 0.25 * (f2 - f1))).abs() < EPS);
        // Between -1 and 0 the CDF ramps up from 0 to F(0)
        assert!((dist.cdf(-0.5) - dist.cdf(0.0) / 2.0).abs() < EPS);
        assert_eq!(dist.cdf(-1.0), 0.0);
    }

    #[test]
    fn test_degenerate_probabilities() {
        assert_eq!(cumulative_binomial(10, 0.0, 0.0, 0.0).unwrap(), 1.0);
        assert_eq!(cumulative_binomial(10, 1.0, 10.0, 0.0).unwrap(), 0.0);
        assert_eq!(cumulative_binomial(10, 10.0, 10.0, 1.0).unwrap(), 1.0);
        assert_eq!(cumulative_binomial(10, 0.0, 9.0, 1.0).unwrap(), 0.0);
    }

    #[test]
    fn test_invalid_probability() {
        assert!(cumulative_binomial(10, 0.0, 1.0, -0.1).is_err());
        assert!(cumulative_binomial(10, 0.0, 1.0, 1.5).is_err());
        assert!(cumulative_binomial(10, 0.0, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_empty_interval() {
        assert_eq!(cumulative_binomial(10, 5.0, 4.0, 0.5).unwrap(), 0.0);
    }
}
