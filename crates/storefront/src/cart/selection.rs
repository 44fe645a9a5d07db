//! Checkout selection over cart lines.
//!
//! Pure derived state: no network interaction. The selection tracks which
//! cart lines participate in the checkout total. Lines seen for the first
//! time are selected by default; lines the user deselected stay deselected
//! across snapshot replaces; removed lines are pruned so the selection never
//! holds a dangling id.

use std::collections::HashSet;

use inkberry_core::CartLineId;
use rust_decimal::Decimal;

use crate::commerce::types::{Cart, CartLine};

/// Which cart lines are included in the checkout total.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Ids present in the last reconciled snapshot.
    known: HashSet<CartLineId>,
    /// Ids currently selected; always a subset of `known`.
    selected: HashSet<CartLineId>,
}

impl Selection {
    /// Whether a line is selected.
    #[must_use]
    pub fn is_selected(&self, id: CartLineId) -> bool {
        self.selected.contains(&id)
    }

    /// Whether every known line is selected.
    #[must_use]
    pub fn all_selected(&self) -> bool {
        self.selected.len() == self.known.len()
    }

    /// Number of selected lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Set one line's membership. Ids not in the current snapshot are
    /// ignored, so the selection can never reference a missing line.
    pub fn set(&mut self, id: CartLineId, selected: bool) {
        if !self.known.contains(&id) {
            return;
        }
        if selected {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
    }

    /// Toggle one line's membership. Returns the new state, or `None` if the
    /// id is not in the current snapshot.
    pub fn toggle(&mut self, id: CartLineId) -> Option<bool> {
        if !self.known.contains(&id) {
            return None;
        }
        let now_selected = !self.selected.contains(&id);
        self.set(id, now_selected);
        Some(now_selected)
    }

    /// Select every known line, or none.
    pub fn set_all(&mut self, selected: bool) {
        if selected {
            self.selected = self.known.clone();
        } else {
            self.selected.clear();
        }
    }

    /// Reconcile against a new cart snapshot.
    ///
    /// Removed lines are pruned; lines not seen before default to selected;
    /// membership of surviving lines is untouched (quantity changes never
    /// alter selection).
    pub fn reconcile(&mut self, ids: impl IntoIterator<Item = CartLineId>) {
        let current: HashSet<CartLineId> = ids.into_iter().collect();
        self.selected.retain(|id| current.contains(id));
        for id in &current {
            if !self.known.contains(id) {
                self.selected.insert(*id);
            }
        }
        self.known = current;
    }

    /// Selected ids in deterministic order.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<CartLineId> {
        let mut ids: Vec<CartLineId> = self.selected.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Sum of `unit_price * quantity` over the selected lines of `cart`.
    #[must_use]
    pub fn selected_total(&self, cart: &Cart) -> Decimal {
        cart.lines
            .iter()
            .filter(|line| self.selected.contains(&line.id))
            .map(CartLine::line_total)
            .sum()
    }
}
