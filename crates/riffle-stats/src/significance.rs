//! Cell significance scoring
//!
//! Each cell of a count row is compared against its hypergeometric
//! expectation. The per-cell score ("chance") is a two-tailed-style binomial
//! probability: values near 0 mean the observed count deviates strongly from
//! what a truly random shuffle produces, values near 1 mean the count is
//! unremarkable.
//!
//! Many per-cell chances are folded into one composite chance with
//! [`combine`], which is the CDF of the product of two independent uniform
//! `[0, 1]` variables evaluated at `a * b`. A single very small chance
//! dominates the composite.
//!
//! `None` is "no information": a cell whose expectation is deterministic,
//! or a row without games. It never participates in composition.

use serde::{Deserialize, Serialize};

use crate::binomial::Binomial;

/// A count cell annotated with its significance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCell {
    pub chance: Option<f64>,
    pub count: f64,
}

/// Scores a single cell.
///
/// Returns `None` when no deviation is possible: `num_games` is zero, or the
/// expected count is `0` or exactly `num_games`.
///
/// # Examples
///
/// ```
/// use riffle_stats::significance::cell_chance;
///
/// // Exactly what is expected: unremarkable
/// let chance = cell_chance(100.0, 50.0, 0.5).unwrap();
/// assert!(chance > 0.9);
///
/// // 90 heads in 100 fair flips: very surprising
/// let chance = cell_chance(100.0, 90.0, 0.5).unwrap();
/// assert!(chance < 1e-10);
///
/// assert_eq!(cell_chance(0.0, 0.0, 0.5), None);
/// assert_eq!(cell_chance(100.0, 0.0, 0.0), None);
/// ```
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn cell_chance(num_games: f64, observed: f64, expected_probability: f64) -> Option<f64> {
    if num_games <= 0.0 || !num_games.is_finite() || !expected_probability.is_finite() {
        return None;
    }
    let expected_count = num_games * expected_probability;
    if expected_count <= 0.0 || expected_count >= num_games {
        return None;
    }

    let trials = num_games.round() as u64;
    let dist = Binomial::new(trials, expected_probability).ok()?;
    let tail = if observed < expected_count || observed < 0.5 {
        dist.interval(0.0, observed)
    } else {
        dist.interval(observed, trials as f64)
    };
    Some((tail * 2.0).min(1.0))
}

/// Scores every cell of a count row against its expectation vector.
///
/// `expected` is indexed like `counts`; indices beyond its end are treated as
/// probability 0 and therefore unscored.
#[must_use]
pub fn score_cells(num_games: f64, counts: &[f64], expected: &[f64]) -> Vec<ScoredCell> {
    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let probability = expected.get(i).copied().unwrap_or(0.0);
            ScoredCell {
                chance: cell_chance(num_games, count, probability),
                count,
            }
        })
        .collect()
}

/// Combines two chances into one.
///
/// `combine(a, b) = ab - ab·ln(ab)`, symmetric in its arguments and never
/// larger than 1.
///
/// ```
/// use riffle_stats::significance::combine;
///
/// assert_eq!(combine(0.3, 0.7), combine(0.7, 0.3));
/// assert!((combine(1.0, 1.0) - 1.0).abs() < 1e-12);
/// assert!(combine(0.01, 0.9) < 0.1);
/// ```
#[must_use]
pub fn combine(a: f64, b: f64) -> f64 {
    let ab = a * b;
    if ab <= 0.0 {
        return 0.0;
    }
    (ab - ab * ab.ln()).min(1.0)
}

/// Folds chances with [`combine`], skipping `None`.
///
/// Returns `None` when there is nothing to combine.
///
/// ```
/// use riffle_stats::significance::{combine, composite};
///
/// assert_eq!(composite([None, Some(0.4), None]), Some(0.4));
/// assert_eq!(composite([Some(0.2), Some(0.5)]), Some(combine(0.2, 0.5)));
/// assert_eq!(composite([None, None]), None);
/// ```
pub fn composite<I>(chances: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    chances
        .into_iter()
        .flatten()
        .reduce(combine)
}
