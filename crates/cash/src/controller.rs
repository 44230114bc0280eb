//! The coin movement contract consumed by handlers.

use mooring_core::HandlerError;
use mooring_store::KvStore;
use mooring_types::{Address, Coin};

/// Moves coins between addresses atomically within the current KV
/// transaction.
pub trait CashController {
    /// Decrement `from`'s balance of `coin.denom` by the coin's value and
    /// increment `to`'s balance by the same.
    ///
    /// Fails with [`HandlerError::InsufficientFunds`] if `from` cannot
    /// cover the amount. Both effects land in `db`, so the enclosing
    /// savepoint reverts them together on rollback.
    fn move_coins(
        &self,
        db: &mut dyn KvStore,
        from: &Address,
        to: &Address,
        coin: &Coin,
    ) -> Result<(), HandlerError>;
}
