//! Two-dimensional account nonces.
//!
//! A smart account nonce is a 256-bit value whose upper 192 bits select an independent nonce
//! sequence (the key) and whose lower 64 bits are the position in that sequence. Calls signed
//! under different keys never invalidate each other, which lets a client keep several
//! submissions in flight.

use alloy::primitives::{U256, aliases::U192};

/// The nonce key used when none is given.
pub const DEFAULT_NONCE_KEY: U192 = U192::ZERO;

/// A decoded account nonce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Nonce {
    /// The sequence selector.
    pub key: U192,
    /// The position in the sequence.
    pub sequence: u64,
}

impl Nonce {
    /// Creates a new [`Nonce`].
    pub const fn new(key: U192, sequence: u64) -> Self {
        Self { key, sequence }
    }

    /// Encodes the nonce as `key << 64 | sequence`.
    pub fn to_u256(&self) -> U256 {
        let [k0, k1, k2] = *self.key.as_limbs();
        U256::from_limbs([self.sequence, k0, k1, k2])
    }

    /// Decodes a nonce produced by [`Nonce::to_u256`].
    pub fn from_u256(nonce: U256) -> Self {
        let [sequence, k0, k1, k2] = *nonce.as_limbs();
        Self { key: U192::from_limbs([k0, k1, k2]), sequence }
    }
}

impl From<Nonce> for U256 {
    fn from(nonce: Nonce) -> Self {
        nonce.to_u256()
    }
}

impl From<U256> for Nonce {
    fn from(nonce: U256) -> Self {
        Self::from_u256(nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let nonce = Nonce::new(U192::from(10), 3);
        assert_eq!(nonce.to_u256(), (U256::from(10) << 64) | U256::from(3));
        assert_eq!(Nonce::from_u256(U256::from(5)), Nonce::new(DEFAULT_NONCE_KEY, 5));
    }

    #[test]
    fn round_trip_bounds() {
        for nonce in [
            Nonce::default(),
            Nonce::new(U192::ZERO, u64::MAX),
            Nonce::new(U192::MAX, 0),
            Nonce::new(U192::MAX, u64::MAX),
            Nonce::new(U192::from(1) << 100, 42),
        ] {
            assert_eq!(Nonce::from(nonce.to_u256()), nonce);
        }
        assert_eq!(Nonce::new(U192::MAX, u64::MAX).to_u256(), U256::MAX);
    }
}
