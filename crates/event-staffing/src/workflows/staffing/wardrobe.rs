use std::sync::Arc;

use tracing::{debug, info};

use super::authorization::Principal;
use super::domain::{ClothingItemId, StockKey};
use super::error::StaffingError;
use super::repository::{RepositoryError, WardrobeRepository};

/// Outcome of a stock reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    Reserved,
    OutOfStock,
}

/// Owns per-(item, size) stock and hands it out one unit at a time.
pub struct WardrobeReservationLedger<W> {
    stock: Arc<W>,
}

impl<W> WardrobeReservationLedger<W>
where
    W: WardrobeRepository + 'static,
{
    pub fn new(stock: Arc<W>) -> Self {
        Self { stock }
    }

    /// Take one unit if any is left. A missing row counts as zero stock.
    pub fn reserve(&self, item: ClothingItemId, size: &str) -> Result<Reservation, RepositoryError> {
        let key = StockKey::new(item, size);
        if self.stock.decrement_if_available(&key)? {
            debug!(%key, "wardrobe unit reserved");
            Ok(Reservation::Reserved)
        } else {
            info!(%key, "wardrobe reservation refused: no stock");
            Ok(Reservation::OutOfStock)
        }
    }

    /// Return one unit; creates the row when absent. Returns the new quantity.
    pub fn release(&self, item: ClothingItemId, size: &str) -> Result<u32, RepositoryError> {
        let key = StockKey::new(item, size);
        let quantity = self.stock.increment(&key)?;
        debug!(%key, quantity, "wardrobe unit released");
        Ok(quantity)
    }

    pub fn quantity(&self, item: ClothingItemId, size: &str) -> Result<u32, RepositoryError> {
        Ok(self
            .stock
            .quantity(&StockKey::new(item, size))?
            .unwrap_or(0))
    }

    /// Overwrite a stock level, e.g. after a catalog restock.
    pub fn restock(
        &self,
        principal: &Principal,
        item: ClothingItemId,
        size: &str,
        quantity: u32,
    ) -> Result<(), StaffingError> {
        principal.require_admin()?;
        validate_size(size)?;
        self.stock.set_quantity(&StockKey::new(item, size), quantity)?;
        info!(item = %item, size, quantity, "wardrobe restocked");
        Ok(())
    }

    /// Admin-facing reserve used by the HTTP surface.
    pub fn reserve_as(
        &self,
        principal: &Principal,
        item: ClothingItemId,
        size: &str,
    ) -> Result<Reservation, StaffingError> {
        principal.require_admin()?;
        validate_size(size)?;
        Ok(self.reserve(item, size)?)
    }

    /// Admin-facing release used by the HTTP surface.
    pub fn release_as(
        &self,
        principal: &Principal,
        item: ClothingItemId,
        size: &str,
    ) -> Result<u32, StaffingError> {
        principal.require_admin()?;
        validate_size(size)?;
        Ok(self.release(item, size)?)
    }
}

fn validate_size(size: &str) -> Result<(), StaffingError> {
    if size.trim().is_empty() {
        Err(StaffingError::validation("clothing size must not be empty"))
    } else {
        Ok(())
    }
}
