//! Coins and coin-sequence arithmetic.
//!
//! A [`Coin`] is an amount of one denomination, split into whole units and
//! a fractional part with 10^9 fractional units per whole. A [`Coins`]
//! value is an ordered sequence of coin entries, kept sorted by
//! denomination with no duplicates and no zero entries. Addition and
//! subtraction work entry-wise; subtraction fails if any result would be
//! negative.

use sbor::prelude::*;

/// Fractional units per whole unit.
pub const FRAC_UNIT: i64 = 1_000_000_000;

const MIN_DENOM_LEN: usize = 3;
const MAX_DENOM_LEN: usize = 10;

/// An amount of a single denomination.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Coin {
    /// Whole units.
    pub whole: i64,
    /// Fractional units, in (-FRAC_UNIT, FRAC_UNIT), same sign as `whole`.
    pub fractional: i64,
    /// Denomination ticker, 3..=10 uppercase ASCII letters.
    pub denom: String,
}

impl Coin {
    /// Create a coin. The parts are stored as given; use [`Coin::validate`]
    /// before trusting externally supplied values.
    pub fn new(whole: i64, fractional: i64, denom: impl Into<String>) -> Self {
        Self {
            whole,
            fractional,
            denom: denom.into(),
        }
    }

    /// Create a coin with only whole units.
    pub fn whole(whole: i64, denom: impl Into<String>) -> Self {
        Self::new(whole, 0, denom)
    }

    /// Total value in fractional units.
    fn units(&self) -> i128 {
        self.whole as i128 * FRAC_UNIT as i128 + self.fractional as i128
    }

    /// Rebuild a coin from a total in fractional units.
    fn from_units(units: i128, denom: &str) -> Result<Self, CoinError> {
        let whole = units / FRAC_UNIT as i128;
        let fractional = units % FRAC_UNIT as i128;
        if whole > i64::MAX as i128 || whole < i64::MIN as i128 {
            return Err(CoinError::Overflow(denom.to_string()));
        }
        Ok(Self::new(whole as i64, fractional as i64, denom))
    }

    /// True if the denominations match.
    pub fn same_denom(&self, other: &Coin) -> bool {
        self.denom == other.denom
    }

    /// True if the value is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.units() > 0
    }

    /// True if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.units() == 0
    }

    /// Add another coin of the same denomination.
    pub fn add(&self, other: &Coin) -> Result<Coin, CoinError> {
        if !self.same_denom(other) {
            return Err(CoinError::MismatchedDenoms(
                self.denom.clone(),
                other.denom.clone(),
            ));
        }
        Coin::from_units(self.units() + other.units(), &self.denom)
    }

    /// Subtract another coin of the same denomination.
    ///
    /// Fails with [`CoinError::Insufficient`] if the result would be
    /// negative.
    pub fn subtract(&self, other: &Coin) -> Result<Coin, CoinError> {
        if !self.same_denom(other) {
            return Err(CoinError::MismatchedDenoms(
                self.denom.clone(),
                other.denom.clone(),
            ));
        }
        let diff = self.units() - other.units();
        if diff < 0 {
            return Err(CoinError::Insufficient(self.denom.clone()));
        }
        Coin::from_units(diff, &self.denom)
    }

    /// Check well-formedness: valid ticker, fractional part in range, and
    /// whole/fractional signs not opposed.
    pub fn validate(&self) -> Result<(), CoinError> {
        let len = self.denom.len();
        if len < MIN_DENOM_LEN
            || len > MAX_DENOM_LEN
            || !self.denom.bytes().all(|b| b.is_ascii_uppercase())
        {
            return Err(CoinError::BadDenom(self.denom.clone()));
        }
        if self.fractional.abs() >= FRAC_UNIT {
            return Err(CoinError::BadFractional(self.fractional));
        }
        if (self.whole > 0 && self.fractional < 0) || (self.whole < 0 && self.fractional > 0) {
            return Err(CoinError::BadFractional(self.fractional));
        }
        Ok(())
    }
}

/// An ordered sequence of coin entries.
///
/// Invariant: entries are sorted by denomination, with no duplicates and
/// no zero entries. The invariant is enforced by [`Coins::new`] and
/// preserved by all arithmetic; decoded values must be re-checked with
/// [`Coins::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, BasicSbor)]
#[sbor(transparent)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// The empty sequence.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a sequence from entries, sorting by denomination.
    ///
    /// Fails on invalid entries, zero entries, or duplicate denominations.
    pub fn new(mut coins: Vec<Coin>) -> Result<Self, CoinError> {
        for coin in &coins {
            coin.validate()?;
            if coin.is_zero() {
                return Err(CoinError::NotPositive(coin.denom.clone()));
            }
        }
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        for pair in coins.windows(2) {
            if pair[0].denom == pair[1].denom {
                return Err(CoinError::DuplicateDenom(pair[0].denom.clone()));
            }
        }
        Ok(Self(coins))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the entries in denomination order.
    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    /// Look up the entry for a denomination.
    pub fn get(&self, denom: &str) -> Option<&Coin> {
        self.0.iter().find(|c| c.denom == denom)
    }

    /// True iff the sequence is non-empty and every entry is strictly
    /// positive.
    pub fn is_positive(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(Coin::is_positive)
    }

    /// Add a positive coin, merging with an existing entry of the same
    /// denomination.
    pub fn add_coin(&self, coin: &Coin) -> Result<Coins, CoinError> {
        if !coin.is_positive() {
            return Err(CoinError::NotPositive(coin.denom.clone()));
        }
        let mut entries = self.0.clone();
        match entries.iter().position(|c| c.denom == coin.denom) {
            Some(idx) => entries[idx] = entries[idx].add(coin)?,
            None => {
                let idx = entries.partition_point(|c| c.denom < coin.denom);
                entries.insert(idx, coin.clone());
            }
        }
        Ok(Self(entries))
    }

    /// Subtract a coin entry-wise.
    ///
    /// Fails with [`CoinError::Insufficient`] if the denomination is
    /// absent or the result would be negative. Entries that reach zero are
    /// dropped.
    pub fn subtract(&self, coin: &Coin) -> Result<Coins, CoinError> {
        let idx = self
            .0
            .iter()
            .position(|c| c.denom == coin.denom)
            .ok_or_else(|| CoinError::Insufficient(coin.denom.clone()))?;
        let remaining = self.0[idx].subtract(coin)?;
        let mut entries = self.0.clone();
        if remaining.is_zero() {
            entries.remove(idx);
        } else {
            entries[idx] = remaining;
        }
        Ok(Self(entries))
    }

    /// Re-check the sequence invariant on externally supplied values.
    pub fn validate(&self) -> Result<(), CoinError> {
        for coin in &self.0 {
            coin.validate()?;
            if coin.is_zero() {
                return Err(CoinError::NotPositive(coin.denom.clone()));
            }
        }
        for pair in self.0.windows(2) {
            match pair[0].denom.cmp(&pair[1].denom) {
                std::cmp::Ordering::Less => {}
                std::cmp::Ordering::Equal => {
                    return Err(CoinError::DuplicateDenom(pair[0].denom.clone()))
                }
                std::cmp::Ordering::Greater => return Err(CoinError::Unsorted),
            }
        }
        Ok(())
    }
}

/// Errors from coin arithmetic and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoinError {
    /// Denomination is not 3..=10 uppercase ASCII letters.
    #[error("invalid denomination {0:?}")]
    BadDenom(String),

    /// Fractional part out of range or opposing the whole part's sign.
    #[error("invalid fractional part {0}")]
    BadFractional(i64),

    /// Arithmetic across two different denominations.
    #[error("mismatched denominations {0} vs {1}")]
    MismatchedDenoms(String, String),

    /// Result does not fit the coin representation.
    #[error("amount out of range for {0}")]
    Overflow(String),

    /// Subtraction would underflow below zero.
    #[error("insufficient funds in {0}")]
    Insufficient(String),

    /// A positive amount was required.
    #[error("amount of {0} must be positive")]
    NotPositive(String),

    /// The same denomination appears twice.
    #[error("duplicate denomination {0}")]
    DuplicateDenom(String),

    /// Entries are not in denomination order.
    #[error("unsorted coin entries")]
    Unsorted,
}
