//! Top-N extrapolation of partially revealed libraries
//!
//! A 3D distribution holds, for every library position `p` and hit count
//! `h`, the games whose top `p + 1` cards are known with `h` hits among them.
//! They are split in two: `known` games keep revealing past `p`, and
//! `first_unknown` games stop at `p`, their card at `p + 1` being the first
//! unknown one. The known rows alone are biased towards games that revealed
//! a lot of their library, so they are only half the picture.
//!
//! Extrapolation completes each stopped game with the exact conditional
//! probability of the next card being a hit. A game unknown after position
//! `p` with `h` hits in its first `p + 1` cards is split into
//!
//! ```text
//! hit:  (K - h) / (N - p - 1)             -> cell h + 1 of row p + 1
//! miss: (N - K - (p + 1 - h)) / (N - p - 1) -> cell h     of row p + 1
//! ```
//!
//! and both fractions stay unknown after position `p + 1`, so the split
//! repeats until the library ends. The fractional game-equivalents never
//! disappear: every extrapolated row of a consistent distribution sums to
//! the number of games with any library data.

use crate::{distribution::CountPair, key::Population};

/// Known and extrapolated count rows of one 3D distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Extrapolation {
    /// `known[p][h]`: games known past position `p` with `h` hits through it
    pub known: Vec<Vec<f64>>,
    /// `extrapolated[p][h]`: every game seen through `p`, plus the
    /// probability-weighted games that stopped earlier
    pub extrapolated: Vec<Vec<f64>>,
}

/// Splits every stopped game forward through the library.
///
/// Rows are processed in position order; row `p + 1` depends only on the
/// unknown mass leaving row `p`. The output always covers the whole library,
/// so rows missing from `rows` count as zeros. Cells with more hits than row
/// `p` can hold are impossible and skipped.
///
/// # Examples
///
/// ```
/// use riffle_analysis::{distribution::CountPair, key::Population, top_n::extrapolate};
///
/// // Four cards, two lands. 4 games saw a spell on top and stopped, 10 saw a
/// // land on top and stopped after the second card.
/// let rows = vec![
///     vec![CountPair::new(0, 4), CountPair::new(10, 0)],
///     vec![CountPair::new(0, 0), CountPair::new(0, 6), CountPair::new(0, 4)],
/// ];
/// let result = extrapolate(Population::new(4, 2), &rows);
/// assert_eq!(result.known[0], vec![0.0, 10.0]);
/// assert_eq!(result.extrapolated[0], vec![4.0, 10.0]);
/// assert_eq!(result.extrapolated.len(), 4);
/// for row in &result.extrapolated {
///     assert!((row.iter().sum::<f64>() - 14.0).abs() < 1e-12);
/// }
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn extrapolate(population: Population, rows: &[Vec<CountPair>]) -> Extrapolation {
    let size = f64::from(population.size);
    let successes = f64::from(population.successes);
    let num_rows = rows.len().max(population.size as usize);

    let mut known = Vec::with_capacity(num_rows);
    let mut extrapolated = Vec::with_capacity(num_rows);
    // Unknown mass entering the current row, indexed by hits so far
    let mut carried = vec![0.0; population.row_len(0)];

    for position in 0..num_rows {
        let row_len = population.row_len(position);
        let row = rows.get(position).map_or(&[][..], Vec::as_slice);
        if row.len() > row_len {
            log::debug!(
                "Skipping {} impossible cells of row {position} for {population}",
                row.len() - row_len
            );
        }

        let mut known_row = vec![0.0; row_len];
        let mut unknown = carried;
        unknown.resize(row_len, 0.0);
        for (hits, pair) in row.iter().take(row_len).enumerate() {
            known_row[hits] = pair.known as f64;
            unknown[hits] += pair.first_unknown as f64;
        }

        let extrapolated_row = known_row
            .iter()
            .zip(&unknown)
            .map(|(known, unknown)| known + unknown)
            .collect();

        // Cards seen through this position
        let seen = position as f64 + 1.0;
        let remaining = size - seen;
        carried = vec![0.0; population.row_len(position + 1)];
        if remaining > 0.0 {
            for (hits, &mass) in unknown.iter().enumerate() {
                if mass <= 0.0 {
                    continue;
                }
                let hits_f = hits as f64;
                let hit_weight = ((successes - hits_f) / remaining).clamp(0.0, 1.0);
                let miss_weight = ((size - successes - (seen - hits_f)) / remaining).clamp(0.0, 1.0);
                if hit_weight > 0.0 {
                    carried[hits + 1] += mass * hit_weight;
                }
                if miss_weight > 0.0 {
                    carried[hits] += mass * miss_weight;
                }
            }
        }

        known.push(known_row);
        extrapolated.push(extrapolated_row);
    }

    Extrapolation {
        known,
        extrapolated,
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _, seq::SliceRandom as _};
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::{bucket::sequence_sample, distribution::Distribution};

    const TOLERANCE: f64 = 1e-9;

    fn random_library(rng: &mut Pcg64Mcg, size: u32, successes: u32) -> Vec<bool> {
        let mut cards = (0..size).map(|i| i < successes).collect::<Vec<_>>();
        cards.shuffle(rng);
        cards
    }

    fn sampled_rows(population: Population, games: usize, seed: u64) -> Vec<Vec<CountPair>> {
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let mut total = Distribution::from_pair_rows(vec![]);
        for _ in 0..games {
            let library = random_library(&mut rng, population.size, population.successes);
            let revealed = rng.random_range(1..=library.len());
            let sample = sequence_sample(population, &library[..revealed], true)
                .unwrap()
                .unwrap();
            total.merge_from(&sample).unwrap();
        }
        total.as_pair_rows().unwrap()
    }

    fn unknown_total(row: &[CountPair]) -> f64 {
        row.iter().map(|pair| pair.first_unknown as f64).sum()
    }

    #[test]
    fn test_rows_conserve_games() {
        let population = Population::new(12, 5);
        let games = 300;
        let rows = sampled_rows(population, games, 7);
        let result = extrapolate(population, &rows);

        let row0_total: u64 = rows[0].iter().map(CountPair::total).sum();
        assert_eq!(row0_total, games as u64);
        assert_eq!(result.extrapolated.len(), 12);
        for (position, row) in result.extrapolated.iter().enumerate() {
            let sum: f64 = row.iter().sum();
            assert!(
                (sum - games as f64).abs() < TOLERANCE,
                "row {position} sums to {sum}"
            );
        }
    }

    #[test]
    fn test_row_mass_is_known_plus_unknown() {
        // Each row holds its own games plus everything that stopped before it
        let population = Population::new(10, 4);
        let rows = sampled_rows(population, 200, 11);
        let result = extrapolate(population, &rows);

        let mut stopped_before = 0.0;
        for (position, row) in rows.iter().enumerate() {
            let known: f64 = result.known[position].iter().sum();
            let extrapolated: f64 = result.extrapolated[position].iter().sum();
            let expected = known + unknown_total(row) + stopped_before;
            assert!(
                (extrapolated - expected).abs() < TOLERANCE,
                "row {position}: {extrapolated} vs {expected}"
            );
            stopped_before += unknown_total(row);
        }
    }

    #[test]
    fn test_unknown_after_top_card_splits_into_next_row() {
        // Merged batches [30, 5] and [10, 2] at the top card of a 40 card
        // library with 17 lands
        let population = Population::new(40, 17);
        let rows = vec![vec![CountPair::new(0, 0), CountPair::new(40, 7)]];
        let result = extrapolate(population, &rows);

        assert_eq!(result.known[0], vec![0.0, 40.0]);
        assert_eq!(result.extrapolated[0], vec![0.0, 47.0]);
        assert_eq!(result.extrapolated.len(), 40);

        // 16 lands left among 39 cards
        let next = &result.extrapolated[1];
        assert!((next[2] - 7.0 * 16.0 / 39.0).abs() < TOLERANCE);
        assert!((next[1] - 7.0 * 23.0 / 39.0).abs() < TOLERANCE);
        assert!(next[0].abs() < TOLERANCE);
        for row in &result.extrapolated[1..] {
            assert!((row.iter().sum::<f64>() - 7.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn test_split_uses_remaining_cards() {
        // 5 cards, 2 lands; one game revealed a land then nothing
        let population = Population::new(5, 2);
        let rows = vec![vec![CountPair::new(0, 0), CountPair::new(0, 1)]];
        let result = extrapolate(population, &rows);
        assert_eq!(result.extrapolated[0], vec![0.0, 1.0]);
        // 1 land left among 4 cards
        assert!((result.extrapolated[1][2] - 0.25).abs() < TOLERANCE);
        assert!((result.extrapolated[1][1] - 0.75).abs() < TOLERANCE);
        // 0.25 already at two lands, plus a third of the 0.75
        assert!((result.extrapolated[2][2] - 0.5).abs() < TOLERANCE);
        assert!((result.extrapolated[2][1] - 0.5).abs() < TOLERANCE);
        assert_eq!(result.known[1], vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_top_card_only_matches_hypergeometric_expectation() {
        // Every game stops after the top card; 3 lands in 8 cards puts 375 of
        // 1000 games at one land
        let population = Population::new(8, 3);
        let rows = vec![vec![CountPair::new(0, 625), CountPair::new(0, 375)]];
        let result = extrapolate(population, &rows);
        for (position, row) in result.extrapolated.iter().enumerate() {
            let sample = u32::try_from(position + 1).unwrap();
            let expected = riffle_stats::hypergeometric::hypergeometric_distribution(8, sample, 3);
            for (hits, &value) in row.iter().enumerate() {
                assert!((value - 1000.0 * expected[hits]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_impossible_cells_skipped() {
        // Two hits cannot be seen in the top card
        let population = Population::new(10, 4);
        let rows = vec![vec![
            CountPair::new(3, 0),
            CountPair::new(2, 0),
            CountPair::new(5, 5),
        ]];
        let result = extrapolate(population, &rows);
        assert_eq!(result.known[0], vec![3.0, 2.0]);
        assert_eq!(result.extrapolated[0], vec![3.0, 2.0]);
        assert!(result.extrapolated[1].iter().all(|&cell| cell == 0.0));
    }
}
