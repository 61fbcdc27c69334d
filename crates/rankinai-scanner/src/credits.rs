//! Reserve-then-settle credit accounting.
//!
//! A [`CreditReservation`] is taken with an atomic conditional debit before
//! any external call. It settles exactly once: [`commit`] keeps the debit,
//! [`refund`] returns it. Both consume the reservation.
//!
//! The debit and the refund are awaited to completion. Dropping either on a
//! client-side timeout would leave the caller unsure whether the balance
//! moved; the pool's `statement_timeout` bounds them on the server instead.
//!
//! [`commit`]: CreditReservation::commit
//! [`refund`]: CreditReservation::refund

use std::time::Duration;

use rankinai_core::Shop;
use tracing::{error, warn};

use crate::error::{ScanError, StoreError};
use crate::store::{bounded, Store};

const REFUND_ATTEMPTS: u32 = 3;
const REFUND_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug)]
#[must_use = "a reservation must be committed or refunded"]
pub struct CreditReservation {
    shop_id: i64,
    amount: i32,
    balance_before: i32,
    balance_after: i32,
}

impl CreditReservation {
    /// Debit `amount` from `shop` if its balance covers it.
    ///
    /// `store_timeout` bounds only the balance re-read after a lost race.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InsufficientCredits`] when the balance is short,
    /// including when a concurrent debit won the race, and
    /// [`ScanError::PersistenceFailure`] when the store fails.
    pub async fn reserve(
        store: &dyn Store,
        shop: &Shop,
        amount: i32,
        store_timeout: Duration,
    ) -> Result<Self, ScanError> {
        if shop.credits < amount {
            return Err(ScanError::InsufficientCredits {
                required: amount,
                available: shop.credits,
            });
        }

        match store.try_debit_credits(shop.id, amount).await? {
            Some(balance_after) => Ok(Self {
                shop_id: shop.id,
                amount,
                balance_before: balance_after + amount,
                balance_after,
            }),
            None => {
                let available = bounded(store_timeout, store.get_shop(shop.id))
                    .await
                    .ok()
                    .flatten()
                    .map_or(0, |s| s.credits);
                Err(ScanError::InsufficientCredits {
                    required: amount,
                    available,
                })
            }
        }
    }

    #[must_use]
    pub fn shop_id(&self) -> i64 {
        self.shop_id
    }

    #[must_use]
    pub fn amount(&self) -> i32 {
        self.amount
    }

    #[must_use]
    pub fn balance_before(&self) -> i32 {
        self.balance_before
    }

    #[must_use]
    pub fn balance_after(&self) -> i32 {
        self.balance_after
    }

    /// Keep the debit. Returns the balance left after it.
    pub fn commit(self) -> i32 {
        self.balance_after
    }

    /// Return the debit to the shop, retrying store failures.
    ///
    /// Only a returned error is retried; an attempt is never abandoned while
    /// in flight, so one refund cannot land twice.
    ///
    /// # Errors
    ///
    /// Returns the last [`StoreError`] once every attempt has failed. The
    /// failure is also logged at error level with the amount owed.
    pub async fn refund(self, store: &dyn Store) -> Result<i32, StoreError> {
        let mut attempt = 1;
        loop {
            match store.refund_credits(self.shop_id, self.amount).await {
                Ok(balance) => return Ok(balance),
                Err(err) if attempt < REFUND_ATTEMPTS => {
                    warn!(
                        shop_id = self.shop_id,
                        amount = self.amount,
                        attempt,
                        error = %err,
                        "credit refund failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(REFUND_RETRY_DELAY).await;
                }
                Err(err) => {
                    error!(
                        shop_id = self.shop_id,
                        amount = self.amount,
                        error = %err,
                        "credit refund failed, shop is owed credits"
                    );
                    return Err(err);
                }
            }
        }
    }
}
