//! The cart store: the single in-memory cart snapshot and its selection.
//!
//! An explicit, dependency-injected object rather than ambient shared state:
//! consumers receive a `CartStore` constructed with the client it should
//! talk through, which keeps the store testable in isolation.
//!
//! Mutations replace the whole snapshot with the server's response - never a
//! patch - so a partially applied update is impossible. Overlapping quantity
//! updates on one line are ordered with a monotonic per-line ticket: a
//! response is applied only if it belongs to the line's newest request, so a
//! slow early response can never overwrite a later one.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use inkberry_core::{BookId, CartLineId, VariationId};
use rust_decimal::Decimal;
use tracing::debug;

use crate::commerce::types::{Cart, GuestLine};
use crate::commerce::{CommerceClient, CommerceError};

use super::selection::Selection;

/// Owner of the storefront's cart snapshot and checkout selection.
pub struct CartStore {
    client: CommerceClient,
    inner: Mutex<CartStoreInner>,
}

#[derive(Default)]
struct CartStoreInner {
    cart: Cart,
    selection: Selection,
    /// Monotonic ticket per line for in-flight quantity updates.
    line_tickets: HashMap<CartLineId, u64>,
}

impl CartStore {
    /// Create a store that operates through the given client.
    #[must_use]
    pub fn new(client: CommerceClient) -> Self {
        Self {
            client,
            inner: Mutex::new(CartStoreInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartStoreInner> {
        // The inner state stays consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the snapshot and reconcile derived state.
    fn apply_snapshot(inner: &mut CartStoreInner, cart: Cart) {
        inner
            .selection
            .reconcile(cart.lines.iter().map(|line| line.id));
        inner
            .line_tickets
            .retain(|id, _| cart.lines.iter().any(|line| line.id == *id));
        inner.cart = cart;
    }

    // =========================================================================
    // Remote operations
    // =========================================================================

    /// Fetch the cart from the API and replace the local snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn refresh(&self) -> Result<Cart, CommerceError> {
        let cart = self.client.get_cart().await?;
        let mut inner = self.lock();
        Self::apply_snapshot(&mut inner, cart);
        Ok(inner.cart.clone())
    }

    /// Add a book to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn add_item(
        &self,
        book_id: BookId,
        quantity: u32,
        variation_id: Option<VariationId>,
    ) -> Result<Cart, CommerceError> {
        let cart = self.client.add_item(book_id, quantity, variation_id).await?;
        let mut inner = self.lock();
        Self::apply_snapshot(&mut inner, cart);
        Ok(inner.cart.clone())
    }

    /// Set one line's absolute quantity. Zero removes the line.
    ///
    /// Overlapping calls for the same line are sequenced: only the response
    /// belonging to the newest request replaces the snapshot; stale
    /// responses are discarded and the held snapshot is returned instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn set_quantity(
        &self,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        let ticket = self.issue_ticket(line_id);
        let cart = self.client.update_item(line_id, quantity).await?;

        let mut inner = self.lock();
        if Self::ticket_is_current(&inner, line_id, ticket) {
            Self::apply_snapshot(&mut inner, cart);
        } else {
            debug!(%line_id, ticket, "stale quantity response discarded");
        }
        Ok(inner.cart.clone())
    }

    /// Remove one line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn remove_item(&self, line_id: CartLineId) -> Result<Cart, CommerceError> {
        let cart = self.client.remove_item(line_id).await?;
        let mut inner = self.lock();
        Self::apply_snapshot(&mut inner, cart);
        Ok(inner.cart.clone())
    }

    /// Remove several lines at once.
    ///
    /// An empty id list answers from the held snapshot without touching the
    /// network.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn remove_items(&self, line_ids: &[CartLineId]) -> Result<Cart, CommerceError> {
        if line_ids.is_empty() {
            return Ok(self.lock().cart.clone());
        }
        let cart = self.client.remove_items(line_ids).await?;
        let mut inner = self.lock();
        Self::apply_snapshot(&mut inner, cart);
        Ok(inner.cart.clone())
    }

    /// Remove every currently selected line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn remove_selected(&self) -> Result<Cart, CommerceError> {
        let selected = self.lock().selection.selected_ids();
        self.remove_items(&selected).await
    }

    /// Merge guest lines carried over from an anonymous session.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn merge_guest(&self, guest_lines: Vec<GuestLine>) -> Result<Cart, CommerceError> {
        let cart = self.client.merge_cart(guest_lines).await?;
        let mut inner = self.lock();
        Self::apply_snapshot(&mut inner, cart);
        Ok(inner.cart.clone())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn clear(&self) -> Result<Cart, CommerceError> {
        let cart = self.client.clear_cart().await?;
        let mut inner = self.lock();
        Self::apply_snapshot(&mut inner, cart);
        Ok(inner.cart.clone())
    }

    // =========================================================================
    // Local state
    // =========================================================================

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.lock().cart.clone()
    }

    /// Set one line's selection membership.
    pub fn set_selected(&self, line_id: CartLineId, selected: bool) {
        self.lock().selection.set(line_id, selected);
    }

    /// Select or deselect every line.
    pub fn set_all_selected(&self, selected: bool) {
        self.lock().selection.set_all(selected);
    }

    /// Selected line ids in deterministic order.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<CartLineId> {
        self.lock().selection.selected_ids()
    }

    /// Total over the selected lines; this is the checkout order amount.
    #[must_use]
    pub fn selected_total(&self) -> Decimal {
        let inner = self.lock();
        inner.selection.selected_total(&inner.cart)
    }

    /// Snapshot and selected ids in one consistent read.
    #[must_use]
    pub fn view(&self) -> (Cart, Vec<CartLineId>) {
        let inner = self.lock();
        (inner.cart.clone(), inner.selection.selected_ids())
    }

    // =========================================================================
    // Sequencing bookkeeping
    // =========================================================================

    fn issue_ticket(&self, line_id: CartLineId) -> u64 {
        let mut inner = self.lock();
        let ticket = inner.line_tickets.entry(line_id).or_insert(0);
        *ticket += 1;
        *ticket
    }

    fn ticket_is_current(inner: &CartStoreInner, line_id: CartLineId, ticket: u64) -> bool {
        inner.line_tickets.get(&line_id) == Some(&ticket)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commerce::types::CartLine;
    use crate::config::CommerceApiConfig;
    use rust_decimal::dec;
    use secrecy::SecretString;
    use std::time::Duration;

    fn store() -> CartStore {
        let config = CommerceApiConfig {
            base_url: "http://127.0.0.1:9/v1".parse().unwrap(),
            access_token: SecretString::from("test-token"),
            timeout: Duration::from_secs(1),
        };
        CartStore::new(CommerceClient::new(&config).unwrap())
    }

    fn cart(lines: &[(i64, Decimal, u32)]) -> Cart {
        Cart {
            id: None,
            lines: lines
                .iter()
                .map(|&(id, price, quantity)| CartLine {
                    id: CartLineId::new(id),
                    book_id: BookId::new(id),
                    variation_id: None,
                    title: None,
                    quantity,
                    unit_price: price,
                    client_key: format!("server_{id}"),
                })
                .collect(),
            updated_at: None,
        }
    }

    fn load(store: &CartStore, cart: Cart) {
        let mut inner = store.lock();
        CartStore::apply_snapshot(&mut inner, cart);
    }

    #[test]
    fn test_snapshot_load_selects_all_lines() {
        let store = store();
        load(&store, cart(&[(1, dec!(100), 2), (2, dec!(50), 1)]));
        assert_eq!(
            store.selected_ids(),
            vec![CartLineId::new(1), CartLineId::new(2)]
        );
        assert_eq!(store.selected_total(), dec!(250));
    }

    #[tokio::test]
    async fn test_remove_items_empty_answers_without_network() {
        // The client points at a closed port; a network attempt would error.
        let store = store();
        load(&store, cart(&[(1, dec!(100), 2)]));
        let result = store.remove_items(&[]).await.unwrap();
        assert_eq!(result.subtotal(), dec!(200));
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let store = store();
        load(&store, cart(&[(1, dec!(100), 1)]));

        let first = store.issue_ticket(CartLineId::new(1));
        let second = store.issue_ticket(CartLineId::new(1));

        let inner = store.lock();
        assert!(!CartStore::ticket_is_current(&inner, CartLineId::new(1), first));
        assert!(CartStore::ticket_is_current(&inner, CartLineId::new(1), second));
    }

    #[test]
    fn test_tickets_are_per_line() {
        let store = store();
        load(&store, cart(&[(1, dec!(100), 1), (2, dec!(50), 1)]));

        let line_one = store.issue_ticket(CartLineId::new(1));
        let line_two = store.issue_ticket(CartLineId::new(2));

        let inner = store.lock();
        assert!(CartStore::ticket_is_current(&inner, CartLineId::new(1), line_one));
        assert!(CartStore::ticket_is_current(&inner, CartLineId::new(2), line_two));
    }

    #[test]
    fn test_snapshot_replace_prunes_tickets_and_selection() {
        let store = store();
        load(&store, cart(&[(1, dec!(100), 1), (2, dec!(50), 1)]));
        store.issue_ticket(CartLineId::new(2));

        load(&store, cart(&[(1, dec!(100), 1)]));

        let inner = store.lock();
        assert!(!inner.line_tickets.contains_key(&CartLineId::new(2)));
        assert!(!inner.selection.is_selected(CartLineId::new(2)));
    }

    #[test]
    fn test_lifecycle_totals_track_snapshots() {
        let store = store();

        load(&store, cart(&[(11, dec!(100), 2)]));
        assert_eq!(store.snapshot().subtotal(), dec!(200));
        assert_eq!(store.selected_total(), dec!(200));

        load(&store, cart(&[(11, dec!(100), 5)]));
        assert_eq!(store.snapshot().subtotal(), dec!(500));
        assert_eq!(store.selected_total(), dec!(500));

        load(&store, cart(&[]));
        assert!(store.snapshot().is_empty());
        assert_eq!(store.selected_total(), Decimal::ZERO);
    }

    #[test]
    fn test_selection_flows_through_store() {
        let store = store();
        load(&store, cart(&[(1, dec!(100), 2), (2, dec!(50), 1)]));

        store.set_selected(CartLineId::new(1), false);
        assert_eq!(store.selected_total(), dec!(50));

        store.set_all_selected(false);
        assert_eq!(store.selected_total(), Decimal::ZERO);

        store.set_all_selected(true);
        assert_eq!(store.selected_total(), dec!(250));
    }
}
