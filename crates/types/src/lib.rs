//! Core types for the mooring escrow subsystem.
//!
//! This crate provides the foundational types used throughout the
//! transaction pipeline:
//!
//! - **Primitives**: Hash, Address
//! - **Authorization**: Permission (tagged principal that hashes to an address)
//! - **Money**: Coin and Coins with entry-wise arithmetic
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend
//! on any other workspace crates, making it the foundation layer. All types
//! serialize canonically via SBOR so that persisted state round-trips
//! byte-identically across replicas.

mod address;
mod coin;
mod hash;

pub use address::{Address, Permission, PermissionError, ADDRESS_LEN};
pub use coin::{Coin, CoinError, Coins, FRAC_UNIT};
pub use hash::Hash;

/// Block height. Heights advance monotonically, one per block.
pub type BlockHeight = u64;
