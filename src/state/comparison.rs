//! Bounded multi-select of phones for side-by-side comparison.
//!
//! DESIGN
//! ======
//! Membership is a set, display order is insertion order. Capacity is
//! checked only when adding, so a full selection can always shrink.
//! Re-adding the phone removed by the immediately preceding call puts it
//! back in its old slot, which makes `toggle` its own inverse.

#[cfg(test)]
#[path = "comparison_test.rs"]
mod comparison_test;

use crate::net::types::PhoneId;

/// Most phones that can be compared at once.
pub const COMPARISON_CAPACITY: usize = 3;

/// Fewest phones a comparison request needs.
pub const MIN_COMPARISON: usize = 2;

/// What a toggle did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// Returned when adding to a selection that already holds `capacity` phones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("you can compare up to {capacity} phones at once")]
pub struct SelectionFull {
    pub capacity: usize,
}

#[derive(Clone, Debug, Default)]
pub struct ComparisonSelection {
    ids: Vec<PhoneId>,
    /// Id and slot of the last removal, valid until the next mutation.
    last_removed: Option<(PhoneId, usize)>,
}

impl PartialEq for ComparisonSelection {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
    }
}

impl Eq for ComparisonSelection {}

impl ComparisonSelection {
    /// Remove `id` if selected, otherwise append it.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionFull`] without changing anything when `id` is not
    /// selected and the selection is at capacity.
    pub fn toggle(&mut self, id: PhoneId) -> Result<Toggle, SelectionFull> {
        if self.remove(id) {
            return Ok(Toggle::Removed);
        }
        self.insert(id).map(|_| Toggle::Added)
    }

    /// Append `id` if absent. Returns `false` when it was already selected.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionFull`] when `id` is absent and there is no room.
    pub fn insert(&mut self, id: PhoneId) -> Result<bool, SelectionFull> {
        if self.contains(id) {
            return Ok(false);
        }
        if self.is_full() {
            return Err(SelectionFull { capacity: COMPARISON_CAPACITY });
        }
        match self.last_removed.take() {
            Some((removed, slot)) if removed == id => self.ids.insert(slot.min(self.ids.len()), id),
            _ => self.ids.push(id),
        }
        Ok(true)
    }

    /// Remove `id`, keeping the order of the rest. Returns whether it was present.
    pub fn remove(&mut self, id: PhoneId) -> bool {
        match self.ids.iter().position(|&selected| selected == id) {
            Some(slot) => {
                self.ids.remove(slot);
                self.last_removed = Some((id, slot));
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.last_removed = None;
    }

    #[must_use]
    pub fn contains(&self, id: PhoneId) -> bool {
        self.ids.contains(&id)
    }

    /// Selected ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[PhoneId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.ids.len() >= COMPARISON_CAPACITY
    }
}
