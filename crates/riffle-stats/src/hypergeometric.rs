//! Hypergeometric probability mass functions
//!
//! Drawing `sample_size` cards without replacement from a library of
//! `population` cards, `successes` of which are "hits" (lands, copies of a
//! card, cards from a decklist segment), the number of hits in the sample
//! follows the hypergeometric distribution.
//!
//! The PMF is evaluated in log space with exact log-factorials, which keeps
//! it stable for the library and hand sizes seen in practice (populations up
//! to a few hundred cards).

use statrs::function::factorial::ln_binomial;

/// Computes the full hypergeometric probability mass function.
///
/// The returned vector is indexed by the number of hits in the sample and
/// covers `0..=min(sample_size, successes)`. Entries below the lower end of
/// the support (when the sample must contain some hits) are exactly `0.0`.
///
/// Invalid parameters (`sample_size > population` or
/// `successes > population`) have no support and yield an empty vector.
///
/// # Examples
///
/// ```
/// use riffle_stats::hypergeometric::hypergeometric_distribution;
///
/// // 7 card hand from a 60 card deck with 24 lands
/// let pmf = hypergeometric_distribution(60, 7, 24);
/// assert_eq!(pmf.len(), 8);
/// assert!((pmf.iter().sum::<f64>() - 1.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn hypergeometric_distribution(population: u32, sample_size: u32, successes: u32) -> Vec<f64> {
    if sample_size > population || successes > population {
        return vec![];
    }

    let population = u64::from(population);
    let sample_size = u64::from(sample_size);
    let successes = u64::from(successes);
    let failures = population - successes;
    let ln_total = ln_binomial(population, sample_size);

    (0..=sample_size.min(successes))
        .map(|hits| {
            let misses = sample_size - hits;
            if misses > failures {
                return 0.0;
            }
            (ln_binomial(successes, hits) + ln_binomial(failures, misses) - ln_total).exp()
        })
        .collect()
}

/// Computes the hypergeometric PMF padded with zeros up to `len` entries.
///
/// Count rows produced by the aggregation job may be longer than the PMF
/// support; callers that score such rows need an expectation vector covering
/// the same indices.
#[must_use]
pub fn hypergeometric_distribution_padded(
    population: u32,
    sample_size: u32,
    successes: u32,
    len: usize,
) -> Vec<f64> {
    let mut pmf = hypergeometric_distribution(population, sample_size, successes);
    pmf.resize(len.max(pmf.len()), 0.0);
    pmf
}
