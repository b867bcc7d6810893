//! Monetary amounts, as carried by transparent outputs, joinsplit public values and
//! shielded value balances.
//!
//! Both types are range-checked at construction, so any value that decodes successfully
//! re-encodes to the same eight bytes.

use std::convert::TryFrom;

/// Number of zatoshis in one ZEC.
pub const COIN: u64 = 1_0000_0000;
/// Total supply ceiling, in zatoshis.
pub const MAX_MONEY: u64 = 21_000_000 * COIN;
/// Largest magnitude of a signed value balance.
pub const MAX_BALANCE: i64 = MAX_MONEY as i64;

/// A net flow of value into or out of a shielded pool, in the range
/// `-MAX_BALANCE..=MAX_BALANCE` zatoshis.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord)]
pub struct ZatBalance(i64);

impl ZatBalance {
    pub const fn zero() -> Self {
        ZatBalance(0)
    }

    /// Returns an error if `amount` lies outside `-MAX_BALANCE..=MAX_BALANCE`.
    pub fn from_i64(amount: i64) -> Result<Self, ()> {
        if (-MAX_BALANCE..=MAX_BALANCE).contains(&amount) {
            Ok(ZatBalance(amount))
        } else {
            Err(())
        }
    }

    /// Decodes a balance from its wire form, a signed 64-bit little-endian integer.
    pub fn from_i64_le_bytes(bytes: [u8; 8]) -> Result<Self, ()> {
        ZatBalance::from_i64(i64::from_le_bytes(bytes))
    }

    pub fn to_i64_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    pub const fn is_negative(self) -> bool {
        self.0.is_negative()
    }
}

impl TryFrom<i64> for ZatBalance {
    type Error = ();

    fn try_from(value: i64) -> Result<Self, ()> {
        ZatBalance::from_i64(value)
    }
}

impl From<ZatBalance> for i64 {
    fn from(amount: ZatBalance) -> i64 {
        amount.0
    }
}

/// A non-negative amount of ZEC, in the range `0..=MAX_MONEY` zatoshis.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord)]
pub struct Zatoshis(u64);

impl Zatoshis {
    pub const ZERO: Self = Zatoshis(0);

    pub fn into_u64(self) -> u64 {
        self.0
    }

    /// Returns an error if `amount` exceeds `MAX_MONEY`.
    pub fn from_u64(amount: u64) -> Result<Self, ()> {
        if amount <= MAX_MONEY {
            Ok(Zatoshis(amount))
        } else {
            Err(())
        }
    }

    pub fn from_u64_le_bytes(bytes: [u8; 8]) -> Result<Self, ()> {
        Zatoshis::from_u64(u64::from_le_bytes(bytes))
    }

    /// Decodes an amount from a two's complement 64-bit little-endian value, rejecting
    /// negative values.
    pub fn from_nonnegative_i64_le_bytes(bytes: [u8; 8]) -> Result<Self, ()> {
        u64::try_from(i64::from_le_bytes(bytes))
            .map_err(|_| ())
            .and_then(Zatoshis::from_u64)
    }

    /// Encodes this amount as a signed 64-bit little-endian value, which is how amounts
    /// appear on the wire.
    pub fn to_i64_le_bytes(self) -> [u8; 8] {
        // MAX_MONEY < i64::MAX
        (self.0 as i64).to_le_bytes()
    }
}

impl From<Zatoshis> for ZatBalance {
    fn from(n: Zatoshis) -> Self {
        ZatBalance(n.0 as i64)
    }
}

impl From<Zatoshis> for u64 {
    fn from(n: Zatoshis) -> Self {
        n.into_u64()
    }
}

impl TryFrom<u64> for Zatoshis {
    type Error = ();

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Zatoshis::from_u64(value)
    }
}

/// Strategies for generating amounts in property tests.
#[cfg(any(test, feature = "test-dependencies"))]
pub mod testing {
    use proptest::prelude::prop_compose;

    use super::{ZatBalance, Zatoshis, MAX_BALANCE, MAX_MONEY};

    prop_compose! {
        pub fn arb_zat_balance()(amt in -MAX_BALANCE..=MAX_BALANCE) -> ZatBalance {
            ZatBalance::from_i64(amt).unwrap()
        }
    }

    prop_compose! {
        pub fn arb_zatoshis()(amt in 0u64..=MAX_MONEY) -> Zatoshis {
            Zatoshis::from_u64(amt).unwrap()
        }
    }
}
