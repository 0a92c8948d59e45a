// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use super::types::OmniPoint;

/// Insertion-ordered map keyed by point.
///
/// Configurators that batch several properties into one transaction per point
/// use it so output order follows graph declaration order.
#[derive(Debug, Clone)]
pub struct OmniPointMap<V> {
    index: HashMap<OmniPoint, usize>,
    entries: Vec<(OmniPoint, V)>,
}

impl<V> Default for OmniPointMap<V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: vec![],
        }
    }
}

impl<V> OmniPointMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, point: &OmniPoint) -> Option<&V> {
        self.index.get(point).map(|i| &self.entries[*i].1)
    }

    pub fn get_or_insert_with(&mut self, point: &OmniPoint, f: impl FnOnce() -> V) -> &mut V {
        let index = match self.index.get(point) {
            Some(index) => *index,
            None => {
                self.entries.push((point.clone(), f()));
                let index = self.entries.len() - 1;
                self.index.insert(point.clone(), index);
                index
            }
        };
        &mut self.entries[index].1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OmniPoint, &V)> {
        self.entries.iter().map(|(p, v)| (p, v))
    }
}

impl<V> IntoIterator for OmniPointMap<V> {
    type Item = (OmniPoint, V);
    type IntoIter = std::vec::IntoIter<(OmniPoint, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
