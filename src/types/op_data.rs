use crate::error::SmartWalletError;
use alloy::primitives::{Bytes, aliases::U192};

/// Length of the nonce key prefix of an [`OpData`] blob.
pub const NONCE_KEY_LENGTH: usize = 24;

/// The nonce key and signature passed to the account's `execute` entry point.
///
/// Encoded as `uint192 nonceKey ‖ signature`, so the executor can verify the signature and
/// consume the nonce from one blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpData {
    /// The nonce key the signature was produced for.
    pub nonce_key: U192,
    /// The signature over the execution payload.
    pub signature: Bytes,
}

impl OpData {
    /// Creates a new [`OpData`].
    pub const fn new(nonce_key: U192, signature: Bytes) -> Self {
        Self { nonce_key, signature }
    }

    /// Encodes the blob.
    pub fn encode(&self) -> Bytes {
        let mut buf = Vec::with_capacity(NONCE_KEY_LENGTH + self.signature.len());
        buf.extend_from_slice(&self.nonce_key.to_be_bytes::<NONCE_KEY_LENGTH>());
        buf.extend_from_slice(&self.signature);
        buf.into()
    }

    /// Decodes a blob produced by [`OpData::encode`].
    pub fn decode(data: &[u8]) -> Result<Self, SmartWalletError> {
        if data.len() < NONCE_KEY_LENGTH {
            return Err(SmartWalletError::InvalidOpData {
                expected: NONCE_KEY_LENGTH,
                got: data.len(),
            });
        }
        let (key, signature) = data.split_at(NONCE_KEY_LENGTH);
        Ok(Self {
            nonce_key: U192::from_be_slice(key),
            signature: Bytes::copy_from_slice(signature),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::bytes;

    #[test]
    fn layout() {
        let op_data = OpData::new(U192::from(0x0a), bytes!("deadbeef"));
        let encoded = op_data.encode();

        assert_eq!(encoded.len(), NONCE_KEY_LENGTH + 4);
        assert_eq!(encoded[NONCE_KEY_LENGTH - 1], 0x0a);
        assert!(encoded[..NONCE_KEY_LENGTH - 1].iter().all(|b| *b == 0));
        assert_eq!(&encoded[NONCE_KEY_LENGTH..], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(OpData::decode(&encoded).unwrap(), op_data);
    }

    #[test]
    fn too_short() {
        let err = OpData::decode(&[0u8; 23]).unwrap_err();
        assert!(matches!(err, SmartWalletError::InvalidOpData { expected: 24, got: 23 }));
    }
}
