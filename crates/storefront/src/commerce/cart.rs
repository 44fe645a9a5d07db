//! Cart operations against the Commerce API.
//!
//! Every operation returns a fresh, normalized cart snapshot. Bulk delete
//! and clear tolerate backend endpoint drift through fallback cascades; the
//! cascades recover from endpoint-shape failures only - transient network
//! faults are never retried here.

use inkberry_core::{BookId, CartLineId, VariationId};
use reqwest::Method;
use tracing::{debug, instrument, warn};

use super::normalize::normalize;
use super::types::{
    AddItemRequest, BulkDeleteRequest, Cart, CartEnvelope, GuestLine, MergeCartRequest, MergeItem,
    UpdateItemRequest,
};
use super::{CommerceClient, CommerceError};

impl CommerceClient {
    /// Fetch the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Cart, CommerceError> {
        let envelope: CartEnvelope = self.get("/cart").await?;
        Ok(normalize(envelope.into_raw()))
    }

    /// Add a book to the cart.
    ///
    /// `quantity` must be positive; the server is the source of truth for
    /// stock and quantity validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        book_id: BookId,
        quantity: u32,
        variation_id: Option<VariationId>,
    ) -> Result<Cart, CommerceError> {
        let body = serde_json::to_value(AddItemRequest {
            book_id,
            quantity,
            variation_id,
        })?;
        let envelope: CartEnvelope = self.execute(Method::POST, "/cart/items", Some(body)).await?;
        Ok(normalize(envelope.into_raw()))
    }

    /// Set the absolute quantity of one cart line.
    ///
    /// A quantity of zero removes the line. This policy lives here, in the
    /// service, so every caller gets the same behavior.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        if quantity == 0 {
            return self.remove_item(line_id).await;
        }

        let body = serde_json::to_value(UpdateItemRequest { quantity })?;
        let envelope: CartEnvelope = self
            .execute(Method::PUT, &format!("/cart/items/{line_id}"), Some(body))
            .await?;
        Ok(normalize(envelope.into_raw()))
    }

    /// Remove one cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, line_id: CartLineId) -> Result<Cart, CommerceError> {
        let envelope: CartEnvelope = self
            .execute(Method::DELETE, &format!("/cart/items/{line_id}"), None)
            .await?;
        Ok(normalize(envelope.into_raw()))
    }

    /// Remove several cart lines at once.
    ///
    /// Attempts the primary bulk endpoint, then the legacy naming variant,
    /// then falls back to sequential per-line removes followed by a single
    /// re-fetch. The cascade exists because bulk-delete endpoint naming has
    /// been inconsistent across backend revisions; whichever tier succeeds,
    /// the caller always ends with a fresh cart reflecting all removals.
    ///
    /// Callers that can answer from a held snapshot should guard the empty
    /// case themselves; see `CartStore::remove_items`.
    ///
    /// # Errors
    ///
    /// Returns an error if every tier fails.
    #[instrument(skip(self), fields(count = line_ids.len()))]
    pub async fn remove_items(&self, line_ids: &[CartLineId]) -> Result<Cart, CommerceError> {
        match self.bulk_delete("/cart/items/bulk-delete", line_ids).await {
            Ok(cart) => return Ok(cart),
            Err(err) => {
                debug!(error = %err, "bulk-delete endpoint failed, trying batch-delete");
            }
        }

        match self.bulk_delete("/cart/items/batch-delete", line_ids).await {
            Ok(cart) => return Ok(cart),
            Err(err) => {
                debug!(error = %err, "batch-delete endpoint failed, removing sequentially");
            }
        }

        for line_id in line_ids {
            match self.remove_item(*line_id).await {
                Ok(_) => {}
                // Already gone counts as removed
                Err(CommerceError::Api { status: 404, .. }) => {
                    debug!(%line_id, "line already absent during sequential removal");
                }
                Err(err) => return Err(err),
            }
        }
        self.get_cart().await
    }

    async fn bulk_delete(
        &self,
        path: &str,
        line_ids: &[CartLineId],
    ) -> Result<Cart, CommerceError> {
        let body = serde_json::to_value(BulkDeleteRequest {
            ids: line_ids.to_vec(),
        })?;
        let envelope: CartEnvelope = self.execute(Method::POST, path, Some(body)).await?;
        Ok(normalize(envelope.into_raw()))
    }

    /// Merge an anonymous session's cart lines into the server-side cart.
    ///
    /// Used exactly once, at login reconciliation. Guest lines missing a
    /// book reference entirely are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, guest_lines), fields(count = guest_lines.len()))]
    pub async fn merge_cart(&self, guest_lines: Vec<GuestLine>) -> Result<Cart, CommerceError> {
        let body = serde_json::to_value(MergeCartRequest {
            items: to_merge_items(guest_lines),
        })?;
        let envelope: CartEnvelope = self.execute(Method::POST, "/cart/merge", Some(body)).await?;
        Ok(normalize(envelope.into_raw()))
    }

    /// Empty the cart.
    ///
    /// Tries the POST-based clear endpoint first and falls back to the
    /// DELETE-based one - the same endpoint-drift tolerance as bulk delete.
    ///
    /// # Errors
    ///
    /// Returns an error if both endpoints fail.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<Cart, CommerceError> {
        match self
            .execute::<CartEnvelope>(Method::POST, "/cart/clear", None)
            .await
        {
            Ok(envelope) => return Ok(normalize(envelope.into_raw())),
            Err(err) => {
                debug!(error = %err, "clear endpoint failed, trying DELETE /cart");
            }
        }

        let envelope: CartEnvelope = self.execute(Method::DELETE, "/cart", None).await?;
        Ok(normalize(envelope.into_raw()))
    }
}

/// Map guest cart lines into the merge endpoint's expected shape.
///
/// Guest lines key off either `book_id` or a generic `id`; quantity defaults
/// to 1 and the variation to null when absent.
fn to_merge_items(guest_lines: Vec<GuestLine>) -> Vec<MergeItem> {
    guest_lines
        .into_iter()
        .filter_map(|line| {
            let Some(book_id) = line.book_id.or(line.id) else {
                warn!("guest cart line without a book reference skipped during merge");
                return None;
            };
            Some(MergeItem {
                book_id,
                quantity: line.quantity.unwrap_or(1),
                variation_id: line.variation_id,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_mapping_prefers_book_id() {
        let items = to_merge_items(vec![GuestLine {
            book_id: Some(BookId::new(10)),
            id: Some(BookId::new(99)),
            quantity: Some(2),
            variation_id: Some(VariationId::new(5)),
        }]);
        assert_eq!(
            items,
            vec![MergeItem {
                book_id: BookId::new(10),
                quantity: 2,
                variation_id: Some(VariationId::new(5)),
            }]
        );
    }

    #[test]
    fn test_merge_mapping_generic_id_with_defaults() {
        // A guest line with only {id, quantity} maps to
        // {book_id: id, quantity, variation_id: null}
        let items = to_merge_items(vec![GuestLine {
            book_id: None,
            id: Some(BookId::new(4)),
            quantity: Some(3),
            variation_id: None,
        }]);
        assert_eq!(
            items,
            vec![MergeItem {
                book_id: BookId::new(4),
                quantity: 3,
                variation_id: None,
            }]
        );
    }

    #[test]
    fn test_merge_mapping_defaults_quantity_to_one() {
        let items = to_merge_items(vec![GuestLine {
            book_id: Some(BookId::new(8)),
            ..GuestLine::default()
        }]);
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().quantity, 1);
    }

    #[test]
    fn test_merge_mapping_skips_lines_without_book_reference() {
        let items = to_merge_items(vec![
            GuestLine::default(),
            GuestLine {
                id: Some(BookId::new(2)),
                ..GuestLine::default()
            },
        ]);
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().book_id, BookId::new(2));
    }
}
