//! N-dimensional count distributions and their merge
//!
//! Accumulated statistics are nested arrays of non-negative counts. The
//! nesting depth depends on the analysis kind:
//!
//! ```text
//! 2D: [row][hits]                      -> Leaf(count)
//! 3D: [position][cumulative hits]      -> Pair { known, first_unknown }
//! ```
//!
//! The shape is explicit in [`Distribution`], so merging dispatches on the
//! node kind and reports a dimensionality mismatch instead of coercing it.
//! Raggedness is tolerated: when one side is shorter, the missing entries
//! are treated as zeros of the other side's shape.
//!
//! # Serialization
//!
//! Distributions serialize as naked nested arrays, with pairs as objects:
//!
//! ```json
//! [[{"known": 30, "first_unknown": 0}, {"known": 40, "first_unknown": 7}]]
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pair of counts stored in the innermost dimension of 3D distributions.
///
/// Both count games whose cards up to and including this position are
/// revealed. `known` games reveal the next card too; `first_unknown` games
/// stop here, the next card being the first unrevealed one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountPair {
    pub known: u64,
    pub first_unknown: u64,
}

impl CountPair {
    #[must_use]
    pub fn new(known: u64, first_unknown: u64) -> Self {
        Self {
            known,
            first_unknown,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.known + self.first_unknown
    }
}

/// Nested count distribution.
///
/// Variant order matters for untagged deserialization: numbers are leaves,
/// arrays are vectors, objects are pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Distribution {
    Leaf(u64),
    Vector(Vec<Distribution>),
    Pair(CountPair),
}

/// Node kind of a [`Distribution`], used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum NodeKind {
    #[display("leaf")]
    Leaf,
    #[display("pair")]
    Pair,
    #[display("vector")]
    Vector,
}

/// Index path from the root of a distribution to one of its nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath(pub Vec<usize>);

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for index in &self.0 {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum MergeError {
    #[display("distribution shape mismatch at {path}: {left} vs {right}")]
    ShapeMismatch {
        path: NodePath,
        left: NodeKind,
        right: NodeKind,
    },
}

impl Distribution {
    /// Builds a 2D distribution from rows of plain counts.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Self {
        Self::Vector(
            rows.into_iter()
                .map(|row| Self::Vector(row.into_iter().map(Self::Leaf).collect()))
                .collect(),
        )
    }

    /// Builds a 3D distribution from rows of count pairs.
    #[must_use]
    pub fn from_pair_rows(rows: Vec<Vec<CountPair>>) -> Self {
        Self::Vector(
            rows.into_iter()
                .map(|row| Self::Vector(row.into_iter().map(Self::Pair).collect()))
                .collect(),
        )
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Leaf(_) => NodeKind::Leaf,
            Self::Pair(_) => NodeKind::Pair,
            Self::Vector(_) => NodeKind::Vector,
        }
    }

    /// Returns an all-zero distribution with the same shape.
    #[must_use]
    pub fn zeros_like(&self) -> Self {
        match self {
            Self::Leaf(_) => Self::Leaf(0),
            Self::Pair(_) => Self::Pair(CountPair::default()),
            Self::Vector(items) => Self::Vector(items.iter().map(Self::zeros_like).collect()),
        }
    }

    /// Sum of every count in the distribution.
    #[must_use]
    pub fn total(&self) -> u64 {
        match self {
            Self::Leaf(count) => *count,
            Self::Pair(pair) => pair.total(),
            Self::Vector(items) => items.iter().map(Self::total).sum(),
        }
    }

    /// Returns the elementwise sum of `self` and `other`.
    ///
    /// Missing entries on either side are treated as zeros, so vectors of
    /// different lengths merge to the longer length. Mismatched node kinds
    /// (a leaf against a pair or vector, a pair against a vector) are reported
    /// as [`MergeError::ShapeMismatch`].
    ///
    /// # Examples
    ///
    /// ```
    /// use riffle_analysis::distribution::Distribution;
    ///
    /// let a = Distribution::from_rows(vec![vec![1, 2], vec![3]]);
    /// let b = Distribution::from_rows(vec![vec![10, 20], vec![30, 40], vec![50]]);
    /// let merged = a.merge(&b).unwrap();
    /// assert_eq!(
    ///     merged,
    ///     Distribution::from_rows(vec![vec![11, 22], vec![33, 40], vec![50]])
    /// );
    /// ```
    pub fn merge(&self, other: &Self) -> Result<Self, MergeError> {
        let mut merged = self.clone();
        merged.merge_from(other)?;
        Ok(merged)
    }

    /// Adds `other` into `self` in place.
    ///
    /// On error `self` may be partially updated; callers that need the
    /// original value should use [`merge`](Self::merge).
    pub fn merge_from(&mut self, other: &Self) -> Result<(), MergeError> {
        let mut path = vec![];
        self.merge_at(other, &mut path)
    }

    fn merge_at(&mut self, other: &Self, path: &mut Vec<usize>) -> Result<(), MergeError> {
        match (self, other) {
            (Self::Leaf(a), Self::Leaf(b)) => *a += b,
            (Self::Pair(a), Self::Pair(b)) => {
                a.known += b.known;
                a.first_unknown += b.first_unknown;
            }
            (Self::Vector(a), Self::Vector(b)) => {
                for (i, item) in b.iter().enumerate() {
                    if i < a.len() {
                        path.push(i);
                        a[i].merge_at(item, path)?;
                        path.pop();
                    } else {
                        a.push(item.clone());
                    }
                }
            }
            (this, other) => {
                return Err(MergeError::ShapeMismatch {
                    path: NodePath(path.clone()),
                    left: this.kind(),
                    right: other.kind(),
                });
            }
        }
        Ok(())
    }

    /// Views the distribution as rows of plain counts.
    ///
    /// Returns `None` unless the distribution is exactly two levels of
    /// vectors over leaves.
    #[must_use]
    pub fn as_rows(&self) -> Option<Vec<Vec<u64>>> {
        let Self::Vector(rows) = self else {
            return None;
        };
        rows.iter()
            .map(|row| match row {
                Self::Vector(cells) => cells
                    .iter()
                    .map(|cell| match cell {
                        Self::Leaf(count) => Some(*count),
                        _ => None,
                    })
                    .collect(),
                _ => None,
            })
            .collect()
    }

    /// Views the distribution as rows of count pairs.
    ///
    /// Returns `None` unless the distribution is exactly two levels of
    /// vectors over pairs.
    #[must_use]
    pub fn as_pair_rows(&self) -> Option<Vec<Vec<CountPair>>> {
        let Self::Vector(rows) = self else {
            return None;
        };
        rows.iter()
            .map(|row| match row {
                Self::Vector(cells) => cells
                    .iter()
                    .map(|cell| match cell {
                        Self::Pair(pair) => Some(*pair),
                        _ => None,
                    })
                    .collect(),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng as _};
    use rand_pcg::Pcg64Mcg;

    use super::*;

    fn random_pairs<R>(rng: &mut R, rows: usize) -> Distribution
    where
        R: Rng,
    {
        Distribution::from_pair_rows(
            (0..rows)
                .map(|p| {
                    (0..=p + 1)
                        .map(|_| CountPair::new(rng.random_range(0..100), rng.random_range(0..10)))
                        .collect()
                })
                .collect(),
        )
    }

    fn random_ragged<R>(rng: &mut R) -> Distribution
    where
        R: Rng,
    {
        let rows = rng.random_range(0..6);
        Distribution::from_rows(
            (0..rows)
                .map(|_| {
                    let len = rng.random_range(0..5);
                    (0..len).map(|_| rng.random_range(0..50)).collect()
                })
                .collect(),
        )
    }

    #[test]
    fn test_commutative_and_associative() {
        let mut rng = Pcg64Mcg::seed_from_u64(42);
        for _ in 0..100 {
            let rows = rng.random_range(1..8);
            let a = random_pairs(&mut rng, rows);
            let b = random_pairs(&mut rng, rows);
            let c = random_pairs(&mut rng, rows);

            assert_eq!(a.merge(&b).unwrap(), b.merge(&a).unwrap());
            assert_eq!(
                a.merge(&b).unwrap().merge(&c).unwrap(),
                a.merge(&b.merge(&c).unwrap()).unwrap()
            );
        }
    }

    #[test]
    fn test_ragged_commutative_and_associative() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        for _ in 0..100 {
            let a = random_ragged(&mut rng);
            let b = random_ragged(&mut rng);
            let c = random_ragged(&mut rng);

            assert_eq!(a.merge(&b).unwrap(), b.merge(&a).unwrap());
            assert_eq!(
                a.merge(&b).unwrap().merge(&c).unwrap(),
                a.merge(&b.merge(&c).unwrap()).unwrap()
            );
        }
    }

    #[test]
    fn test_zero_identity() {
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        let a = random_pairs(&mut rng, 5);
        assert_eq!(a.merge(&a.zeros_like()).unwrap(), a);
        assert_eq!(a.zeros_like().merge(&a).unwrap(), a);
        assert_eq!(a.zeros_like().total(), 0);
    }

    #[test]
    fn test_stream_equals_single_merge() {
        // Folding batches one at a time equals merging their sum once
        let batches = [
            Distribution::from_rows(vec![vec![1, 0], vec![0, 2, 1]]),
            Distribution::from_rows(vec![vec![0, 3], vec![1, 1, 0]]),
            Distribution::from_rows(vec![vec![2, 2], vec![0, 0, 4]]),
        ];
        let mut accumulated = batches[0].zeros_like();
        for batch in &batches {
            accumulated.merge_from(batch).unwrap();
        }
        assert_eq!(
            accumulated,
            Distribution::from_rows(vec![vec![3, 5], vec![1, 3, 5]])
        );
        assert_eq!(accumulated.total(), 16);
    }

    #[test]
    fn test_shape_mismatch() {
        let rows = Distribution::from_rows(vec![vec![1, 2]]);
        let pairs = Distribution::from_pair_rows(vec![vec![CountPair::new(1, 0)]]);
        let err = rows.merge(&pairs).unwrap_err();
        let MergeError::ShapeMismatch { path, left, right } = err;
        assert_eq!(path, NodePath(vec![0, 0]));
        assert_eq!(left, NodeKind::Leaf);
        assert_eq!(right, NodeKind::Pair);

        let flat = Distribution::Vector(vec![Distribution::Leaf(1)]);
        assert!(flat.merge(&rows).is_err());
    }

    #[test]
    fn test_as_rows() {
        let rows = Distribution::from_rows(vec![vec![1, 2], vec![]]);
        assert_eq!(rows.as_rows(), Some(vec![vec![1, 2], vec![]]));
        assert_eq!(rows.as_pair_rows(), None);

        let pairs = Distribution::from_pair_rows(vec![vec![CountPair::new(4, 1)]]);
        assert_eq!(pairs.as_pair_rows(), Some(vec![vec![CountPair::new(4, 1)]]));
        assert_eq!(pairs.as_rows(), None);
        assert_eq!(Distribution::Leaf(3).as_rows(), None);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let pairs = Distribution::from_pair_rows(vec![
            vec![CountPair::new(30, 0), CountPair::new(40, 7)],
            vec![],
        ]);
        let json = serde_json::to_string(&pairs).unwrap();
        assert_eq!(
            json,
            r#"[[{"known":30,"first_unknown":0},{"known":40,"first_unknown":7}],[]]"#
        );
        let back: Distribution = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pairs);

        let rows = Distribution::from_rows(vec![vec![1, 2], vec![3]]);
        let back: Distribution = serde_json::from_str("[[1,2],[3]]").unwrap();
        assert_eq!(back, rows);
    }
}
