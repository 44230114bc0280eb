//! Wallet bucket and the standard cash controller.

use crate::CashController;
use mooring_core::HandlerError;
use mooring_store::{KvStore, StoreError};
use mooring_types::{Address, Coin, CoinError, Coins};
use tracing::trace;

/// Prefix for wallet records.
const WALLET_PREFIX: &[u8] = b"cash:";

/// The standard wallet-backed cash controller.
///
/// Each address owns at most one wallet, stored under
/// `cash:<address bytes>` as an SBOR-encoded [`Coins`] value. Wallets
/// appear on first credit; denominations that reach zero are dropped so
/// the stored sequence keeps its no-zero-entry invariant.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ledger;

impl Ledger {
    /// Create the controller.
    pub fn new() -> Self {
        Self
    }

    fn wallet_key(addr: &Address) -> Vec<u8> {
        let mut key = Vec::with_capacity(WALLET_PREFIX.len() + addr.as_bytes().len());
        key.extend_from_slice(WALLET_PREFIX);
        key.extend_from_slice(addr.as_bytes());
        key
    }

    /// Read an address's balance. Absent wallets read as empty.
    pub fn balance(&self, db: &dyn KvStore, addr: &Address) -> Result<Coins, HandlerError> {
        let key = Self::wallet_key(addr);
        match db.get(&key)? {
            Some(raw) => {
                let coins: Coins =
                    sbor::basic_decode(&raw).map_err(|e| StoreError::Corrupt {
                        key: hex::encode(&key),
                        reason: format!("{e:?}"),
                    })?;
                Ok(coins)
            }
            None => Ok(Coins::empty()),
        }
    }

    fn save_wallet(
        &self,
        db: &mut dyn KvStore,
        addr: &Address,
        coins: &Coins,
    ) -> Result<(), HandlerError> {
        let key = Self::wallet_key(addr);
        if coins.is_empty() {
            db.delete(&key)?;
        } else {
            let raw = sbor::basic_encode(coins)
                .map_err(|e| StoreError::Backend(format!("encode wallet: {e:?}")))?;
            db.set(&key, &raw)?;
        }
        Ok(())
    }

    /// Mint coins into an address's wallet.
    ///
    /// This is the genesis/faucet entry point; normal transaction flow
    /// only ever moves existing coins.
    pub fn issue(
        &self,
        db: &mut dyn KvStore,
        addr: &Address,
        coin: &Coin,
    ) -> Result<(), HandlerError> {
        let wallet = self.balance(db, addr)?.add_coin(coin)?;
        self.save_wallet(db, addr, &wallet)
    }
}

impl CashController for Ledger {
    fn move_coins(
        &self,
        db: &mut dyn KvStore,
        from: &Address,
        to: &Address,
        coin: &Coin,
    ) -> Result<(), HandlerError> {
        if !coin.is_positive() {
            return Err(CoinError::NotPositive(coin.denom.clone()).into());
        }

        // Debit first: an underflow aborts before any credit is written.
        let debited = self.balance(db, from)?.subtract(coin)?;
        self.save_wallet(db, from, &debited)?;

        let credited = self.balance(db, to)?.add_coin(coin)?;
        self.save_wallet(db, to, &credited)?;

        trace!(%from, %to, denom = %coin.denom, "moved coins");
        Ok(())
    }
}
