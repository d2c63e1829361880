//! Output addresses: a witness version and a program hash.

use crate::encoding::{CodecError, CodecResult, Decodable, Encodable, Reader, Writer};
use std::fmt;

/// Maximum address program length in bytes.
pub const MAX_ADDRESS_HASH: usize = 64;

/// An output address.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Address {
    /// Witness version.
    pub version: u8,
    /// Program hash, at most [`MAX_ADDRESS_HASH`] bytes.
    pub hash: Vec<u8>,
}

impl Address {
    /// Standard version-0 address over a 20-byte key hash.
    pub fn from_key_hash(hash: [u8; 20]) -> Self {
        Self {
            version: 0,
            hash: hash.to_vec(),
        }
    }

    /// The all-zero version-0 address (burns and placeholders).
    pub fn null() -> Self {
        Self::from_key_hash([0u8; 20])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(v{}, {})", self.version, hex::encode(&self.hash))
    }
}

impl Encodable for Address {
    fn encode(&self, w: &mut Writer) {
        w.write_u8(self.version);
        w.write_u8(self.hash.len() as u8);
        w.write_bytes(&self.hash);
    }
}

impl Decodable for Address {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        let version = r.read_u8()?;
        let len = r.read_u8()? as usize;
        if len > MAX_ADDRESS_HASH {
            return Err(CodecError::Oversize {
                what: "address hash",
                size: len,
                max: MAX_ADDRESS_HASH,
            });
        }
        let hash = r.read_bytes(len)?.to_vec();
        Ok(Self { version, hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip() {
        let addr = Address::from_key_hash([7u8; 20]);
        let bytes = addr.to_vec();
        assert_eq!(bytes.len(), 22);
        assert_eq!(Address::from_bytes(&bytes).unwrap(), addr);
    }

    #[test]
    fn test_oversize_hash_rejected() {
        let mut bytes = vec![0u8, 65];
        bytes.extend_from_slice(&[0u8; 65]);
        assert!(matches!(
            Address::from_bytes(&bytes),
            Err(CodecError::Oversize { .. })
        ));
    }
}
