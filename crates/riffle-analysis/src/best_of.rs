//! Combined "all" view of best-of-1 and best-of-3 statistics
//!
//! Two sibling trees with the same nesting are merged node by node. Raw
//! counts and game totals are summed, children present on one side only pass
//! through unchanged, and every chance is recomputed from the merged counts.
//! Chances are never averaged: they are not linear in the counts.

use std::{borrow::Cow, collections::BTreeMap};

use crate::{
    key::{ALL_BEST_OF_LABEL, BestOf, KeyField},
    transform::{ScoredRow, TransformedRecord},
    tree::StatTree,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CombineError {
    #[display("cannot combine trees at {path}: {reason}")]
    ShapeMismatch {
        #[error(not(source))]
        path: String,
        reason: String,
    },
}

/// Combines the best-of-1 and best-of-3 trees of one group.
///
/// Returns the present side by reference when only one exists.
pub fn combine<'a>(
    one: Option<&'a StatTree>,
    three: Option<&'a StatTree>,
) -> Result<Option<Cow<'a, StatTree>>, CombineError> {
    match (one, three) {
        (None, None) => Ok(None),
        (Some(tree), None) | (None, Some(tree)) => Ok(Some(Cow::Borrowed(tree))),
        (Some(one), Some(three)) => {
            let mut path = vec![];
            Ok(Some(Cow::Owned(merge_trees(one, three, &mut path)?)))
        }
    }
}

/// Adds an "all" child to every best-of node.
///
/// With a single format present, "all" is a copy of it.
pub fn insert_combined(tree: &mut StatTree) -> Result<(), CombineError> {
    let StatTree::Node { field, children } = tree else {
        return Ok(());
    };
    for child in children.values_mut() {
        insert_combined(child)?;
    }
    if *field != KeyField::BestOf {
        return Ok(());
    }
    let all = combine(
        children.get(BestOf::One.label()),
        children.get(BestOf::Three.label()),
    )?
    .map(Cow::into_owned);
    if let Some(all) = all {
        children.insert(ALL_BEST_OF_LABEL.to_owned(), all);
    }
    Ok(())
}

fn mismatch(path: &[&str], reason: String) -> CombineError {
    CombineError::ShapeMismatch {
        path: if path.is_empty() {
            "<root>".to_owned()
        } else {
            path.join("/")
        },
        reason,
    }
}

fn merge_trees<'a>(
    a: &'a StatTree,
    b: &'a StatTree,
    path: &mut Vec<&'a str>,
) -> Result<StatTree, CombineError> {
    match (a, b) {
        (StatTree::Leaf(a), StatTree::Leaf(b)) => {
            if let Some(reason) = incompatibility(a, b) {
                return Err(mismatch(path, reason));
            }
            Ok(StatTree::Leaf(Box::new(sum_records(a, b))))
        }
        (
            StatTree::Node {
                field: field_a,
                children: children_a,
            },
            StatTree::Node {
                field: field_b,
                children: children_b,
            },
        ) => {
            if field_a != field_b {
                return Err(mismatch(
                    path,
                    format!("grouped by {field_a:?} and {field_b:?}"),
                ));
            }
            let mut children = BTreeMap::new();
            for (label, child_a) in children_a {
                path.push(label);
                let child = match children_b.get(label) {
                    Some(child_b) => merge_trees(child_a, child_b, path)?,
                    None => child_a.clone(),
                };
                path.pop();
                children.insert(label.clone(), child);
            }
            for (label, child_b) in children_b {
                children
                    .entry(label.clone())
                    .or_insert_with(|| child_b.clone());
            }
            Ok(StatTree::Node {
                field: *field_a,
                children,
            })
        }
        _ => Err(mismatch(path, "a node against a leaf".to_owned())),
    }
}

/// Elementwise sum of two row sets, zero padding the shorter side.
fn sum_rows(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let sum_row = |a: &[f64], b: &[f64]| {
        (0..a.len().max(b.len()))
            .map(|i| a.get(i).unwrap_or(&0.0) + b.get(i).unwrap_or(&0.0))
            .collect::<Vec<_>>()
    };
    (0..a.len().max(b.len()))
        .map(|i| {
            sum_row(
                a.get(i).map_or(&[][..], Vec::as_slice),
                b.get(i).map_or(&[][..], Vec::as_slice),
            )
        })
        .collect()
}

fn raw_rows(rows: &[ScoredRow]) -> Vec<Vec<f64>> {
    rows.iter().map(ScoredRow::raw_counts).collect()
}

fn incompatibility(a: &TransformedRecord, b: &TransformedRecord) -> Option<String> {
    if a.analysis != b.analysis {
        return Some(format!(
            "analyses {} and {} differ",
            a.analysis.label(),
            b.analysis.label()
        ));
    }
    if a.population != b.population {
        return Some(format!(
            "populations {} and {} differ",
            a.population, b.population
        ));
    }
    None
}

fn sum_records(a: &TransformedRecord, b: &TransformedRecord) -> TransformedRecord {
    let known = sum_rows(&raw_rows(&a.known), &raw_rows(&b.known));
    let extrapolated = match (&a.extrapolated, &b.extrapolated) {
        (None, None) => None,
        (Some(rows), None) | (None, Some(rows)) => Some(raw_rows(rows)),
        (Some(rows_a), Some(rows_b)) => Some(sum_rows(&raw_rows(rows_a), &raw_rows(rows_b))),
    };

    let mut combined = TransformedRecord::from_rows(
        a.analysis,
        a.population,
        a.date.max(b.date),
        &known,
        extrapolated.as_deref(),
    );
    combined.num_games = a.num_games + b.num_games;
    combined
}

/// Sums the raw counts of two records of the same bucket and rescores them.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use riffle_analysis::{
///     best_of::combine_records,
///     key::{Analysis, DecklistEnd, Population},
///     transform::TransformedRecord,
/// };
///
/// let analysis = Analysis::DecklistPosition { end: DecklistEnd::Back };
/// let population = Population::new(40, 1);
/// let one = TransformedRecord::from_rows(analysis, population, Utc::now(), &[vec![98.0, 2.0]], None);
/// let three = TransformedRecord::from_rows(analysis, population, Utc::now(), &[vec![49.0, 1.0]], None);
///
/// let all = combine_records(&one, &three).unwrap();
/// assert_eq!(all.num_games, 150);
/// assert_eq!(all.known[0].raw_counts(), vec![147.0, 3.0]);
/// ```
pub fn combine_records(
    a: &TransformedRecord,
    b: &TransformedRecord,
) -> Result<TransformedRecord, CombineError> {
    if let Some(reason) = incompatibility(a, b) {
        return Err(mismatch(&[], reason));
    }
    Ok(sum_records(a, b))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use riffle_stats::significance::composite;

    use super::*;
    use crate::key::{Analysis, Population};

    fn leaf(counts: &[f64]) -> StatTree {
        StatTree::Leaf(Box::new(TransformedRecord::from_rows(
            Analysis::HandLands,
            Population::new(40, 17),
            Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
            &[counts.to_vec()],
            None,
        )))
    }

    fn node(field: KeyField, children: Vec<(&str, StatTree)>) -> StatTree {
        StatTree::Node {
            field,
            children: children
                .into_iter()
                .map(|(label, child)| (label.to_owned(), child))
                .collect(),
        }
    }

    #[test]
    fn test_single_side_is_borrowed() {
        let tree = leaf(&[10.0, 5.0]);
        let combined = combine(Some(&tree), None).unwrap().unwrap();
        assert!(matches!(combined, Cow::Borrowed(t) if std::ptr::eq(t, &tree)));
        assert!(combine(None, None).unwrap().is_none());
    }

    #[test]
    fn test_one_sided_children_pass_through() {
        let one = node(
            KeyField::Population,
            vec![("17/40", leaf(&[10.0, 5.0])), ("16/40", leaf(&[1.0, 1.0]))],
        );
        let three = node(KeyField::Population, vec![("17/40", leaf(&[2.0, 3.0]))]);
        let combined = combine(Some(&one), Some(&three)).unwrap().unwrap();

        let merged = combined.child("17/40").and_then(StatTree::as_leaf).unwrap();
        assert_eq!(merged.known[0].raw_counts(), vec![12.0, 8.0]);
        assert_eq!(merged.num_games, 20);
        assert_eq!(combined.child("16/40"), one.child("16/40"));
    }

    #[test]
    fn test_chances_recomputed_not_averaged() {
        let one = leaf(&[60.0, 40.0]);
        let three = leaf(&[20.0, 30.0]);
        let combined = combine(Some(&one), Some(&three)).unwrap().unwrap();
        let all = combined.as_leaf().unwrap();

        let expected = TransformedRecord::from_rows(
            Analysis::HandLands,
            Population::new(40, 17),
            all.date,
            &[vec![80.0, 70.0]],
            None,
        );
        assert_eq!(all.known, expected.known);
        assert_eq!(all.chance, composite(expected.known.iter().map(|row| row.chance)));
    }

    #[test]
    fn test_mismatched_shapes_error() {
        let one = node(KeyField::Population, vec![("17/40", leaf(&[1.0, 1.0]))]);
        let three = node(
            KeyField::Population,
            vec![("17/40", node(KeyField::Shuffling, vec![]))],
        );
        let err = combine(Some(&one), Some(&three)).unwrap_err();
        assert!(err.to_string().contains("17/40"));

        let grouped_differently = node(KeyField::Shuffling, vec![]);
        assert!(combine(Some(&one), Some(&grouped_differently)).is_err());
    }

    #[test]
    fn test_insert_combined_adds_all() {
        let mut tree = node(
            KeyField::DeckSize,
            vec![
                (
                    "40",
                    node(
                        KeyField::BestOf,
                        vec![("1", leaf(&[6.0, 4.0])), ("3", leaf(&[2.0, 3.0]))],
                    ),
                ),
                ("60", node(KeyField::BestOf, vec![("1", leaf(&[1.0, 0.0]))])),
            ],
        );
        insert_combined(&mut tree).unwrap();

        let all = tree.get(&["40", "all"]).and_then(StatTree::as_leaf).unwrap();
        assert_eq!(all.num_games, 15);
        assert_eq!(all.known[0].raw_counts(), vec![8.0, 7.0]);
        assert_eq!(tree.get(&["60", "all"]), tree.get(&["60", "1"]));
        assert!(tree.get(&["60", "all"]).is_some());
    }
}
