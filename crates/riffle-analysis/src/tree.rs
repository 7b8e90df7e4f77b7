//! Nested statistics tree for display
//!
//! Transformed records are grouped by bucket key fields in a caller-chosen
//! order, for example deck size, then lands, then match format. Fields the
//! caller does not name are appended in [`KeyField::ALL`] order, so every
//! leaf is reached by exactly one path and the population is always the
//! innermost level unless placed explicitly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    key::KeyField,
    record::AccumulatedRecord,
    transform::{TransformError, TransformedRecord},
};

/// Grouped transformed records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatTree {
    Node {
        field: KeyField,
        children: BTreeMap<String, StatTree>,
    },
    Leaf(Box<TransformedRecord>),
}

/// Completes a field order with every field not already in it.
#[must_use]
pub fn full_field_order(fields: &[KeyField]) -> Vec<KeyField> {
    let mut order = vec![];
    for &field in fields.iter().chain(&KeyField::ALL) {
        if !order.contains(&field) {
            order.push(field);
        }
    }
    order
}

impl StatTree {
    fn empty(field: KeyField) -> Self {
        Self::Node {
            field,
            children: BTreeMap::new(),
        }
    }

    /// Transforms and groups `records` by `fields`.
    pub fn build<'a, I>(records: I, fields: &[KeyField]) -> Result<Self, TransformError>
    where
        I: IntoIterator<Item = &'a AccumulatedRecord>,
    {
        let order = full_field_order(fields);
        let mut root = Self::empty(order[0]);
        for record in records {
            let labels = order
                .iter()
                .map(|&field| record.key.label(field))
                .collect::<Vec<_>>();
            let leaf = Self::Leaf(Box::new(TransformedRecord::from_accumulated(record)?));
            root.insert(&order, &labels, leaf);
        }
        Ok(root)
    }

    fn insert(&mut self, order: &[KeyField], labels: &[String], leaf: Self) {
        let Self::Node { children, .. } = self else {
            return;
        };
        match labels {
            [] => {}
            [label] => {
                children.insert(label.clone(), leaf);
            }
            [label, rest @ ..] => children
                .entry(label.clone())
                .or_insert_with(|| Self::empty(order[1]))
                .insert(&order[1..], rest, leaf),
        }
    }

    /// Child at `label`, when this is a node.
    #[must_use]
    pub fn child(&self, label: &str) -> Option<&Self> {
        match self {
            Self::Node { children, .. } => children.get(label),
            Self::Leaf(_) => None,
        }
    }

    /// Follows a path of labels from this node.
    #[must_use]
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |tree, label| tree.child(label.as_ref()))
    }

    #[must_use]
    pub fn as_leaf(&self) -> Option<&TransformedRecord> {
        match self {
            Self::Leaf(record) => Some(&**record),
            Self::Node { .. } => None,
        }
    }

    /// Every leaf with its label path, in key order.
    #[must_use]
    pub fn leaves(&self) -> Vec<(Vec<&str>, &TransformedRecord)> {
        let mut leaves = vec![];
        self.collect_leaves(&mut vec![], &mut leaves);
        leaves
    }

    fn collect_leaves<'a>(
        &'a self,
        path: &mut Vec<&'a str>,
        leaves: &mut Vec<(Vec<&'a str>, &'a TransformedRecord)>,
    ) {
        match self {
            Self::Leaf(record) => leaves.push((path.clone(), &**record)),
            Self::Node { children, .. } => {
                for (label, child) in children {
                    path.push(label);
                    child.collect_leaves(path, leaves);
                    path.pop();
                }
            }
        }
    }
}
