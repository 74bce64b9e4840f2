//! Values worksheet editor: pick items, then rank them.
//!
//! After every mutation in the `Prioritize` phase the ranked list's array order
//! and its `priority` fields agree, and priorities are exactly `1..=N`.

use shared::{
    catalog::Catalog,
    worksheet::{RankedItem, ValuesContent},
};

use crate::{error::EditorError, selection::SelectionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Select,
    Prioritize,
}

#[derive(Debug, Clone)]
pub struct PriorityEditor {
    catalog: Catalog,
    selection: SelectionSet,
    ranked: Vec<RankedItem>,
    phase: Phase,
}

impl PriorityEditor {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            selection: SelectionSet::new(),
            ranked: Vec::new(),
            phase: Phase::Select,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn ranked(&self) -> &[RankedItem] {
        &self.ranked
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Flips `name` in the selection. Only the `Select` phase accepts picks; elsewhere
    /// this returns false and changes nothing.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.phase != Phase::Select {
            return false;
        }
        self.selection.toggle(name)
    }

    /// Moves to `Prioritize`, ranking the selection in the order items were picked.
    pub fn commit(&mut self) -> Result<&[RankedItem], EditorError> {
        if self.selection.is_empty() {
            return Err(EditorError::EmptySelection);
        }
        self.ranked = self
            .selection
            .iter()
            .enumerate()
            .map(|(index, name)| RankedItem {
                name: name.to_string(),
                description: self.catalog.describe(name).to_string(),
                priority: index as u32 + 1,
            })
            .collect();
        self.phase = Phase::Prioritize;
        Ok(&self.ranked)
    }

    /// Drag gesture: takes the item at `from` and reinserts it at `to`.
    /// Returns false, leaving the list untouched, when either index is out of range or they are equal.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.ranked.len() || to >= self.ranked.len() {
            return false;
        }
        let item = self.ranked.remove(from);
        self.ranked.insert(to, item);
        renumber(&mut self.ranked);
        true
    }

    /// Drop `dragged` onto the slot currently held by `target`.
    pub fn move_onto(&mut self, dragged: &str, target: &str) -> Result<bool, EditorError> {
        let from = self.index_of(dragged)?;
        let to = self.index_of(target)?;
        Ok(self.reorder(from, to))
    }

    /// Typed rank entry. The edited item is re-sorted by `rank` against the others' current
    /// ranks; ties keep array order. Ranks below 1 or above N land at the respective end.
    pub fn set_priority(&mut self, name: &str, rank: i64) -> Result<(), EditorError> {
        let edited = self.index_of(name)?;
        let mut keyed: Vec<(i64, RankedItem)> = self
            .ranked
            .drain(..)
            .enumerate()
            .map(|(index, item)| {
                let key = if index == edited {
                    rank
                } else {
                    i64::from(item.priority)
                };
                (key, item)
            })
            .collect();
        keyed.sort_by_key(|(key, _)| *key);
        self.ranked = keyed.into_iter().map(|(_, item)| item).collect();
        renumber(&mut self.ranked);
        Ok(())
    }

    /// Drops `name` from both the ranked list and the selection.
    pub fn remove(&mut self, name: &str) -> Result<(), EditorError> {
        let index = self.index_of(name)?;
        self.ranked.remove(index);
        self.selection.remove(name);
        renumber(&mut self.ranked);
        Ok(())
    }

    /// Back to `Select`. The picked names survive; ranks are discarded.
    pub fn reverse_to_selection(&mut self) {
        self.ranked.clear();
        self.phase = Phase::Select;
    }

    /// Re-enters `Prioritize` from a saved worksheet.
    pub fn resume(&mut self, saved: ValuesContent) {
        let mut ranked = saved.selected_values;
        ranked.sort_by_key(|item| item.priority);
        renumber(&mut ranked);
        self.selection = SelectionSet::from_names(ranked.iter().map(|item| item.name.clone()));
        self.ranked = ranked;
        self.phase = Phase::Prioritize;
    }

    pub fn to_content(&self) -> Result<ValuesContent, EditorError> {
        if self.phase != Phase::Prioritize {
            return Err(EditorError::NotPrioritized);
        }
        if self.ranked.is_empty() {
            return Err(EditorError::NothingToSave);
        }
        Ok(ValuesContent {
            selected_values: self.ranked.clone(),
        })
    }

    fn index_of(&self, name: &str) -> Result<usize, EditorError> {
        self.ranked
            .iter()
            .position(|item| item.name == name)
            .ok_or_else(|| EditorError::UnknownItem(name.to_string()))
    }
}

fn renumber(items: &mut [RankedItem]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.priority = index as u32 + 1;
    }
}

#[cfg(test)]
#[path = "tests/priority_tests.rs"]
mod tests;
