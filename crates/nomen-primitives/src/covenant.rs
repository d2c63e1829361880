//! Covenants: the typed side-channel on every output that drives the
//! name-auction state machine.
//!
//! Each covenant type has a fixed positional item schema; mis-shaped
//! covenants are rejected at decode time rather than deep inside the
//! state machine.

use crate::address::Address;
use crate::encoding::{CodecError, CodecResult, Decodable, Encodable, Reader, Writer};
use crate::hash::Hash;

/// Maximum number of covenant items.
pub const MAX_COVENANT_ITEMS: usize = 3;

/// Maximum size of a single covenant item in bytes.
pub const MAX_COVENANT_ITEM_SIZE: usize = 512;

/// Maximum name length in bytes (no trailing dot).
pub const MAX_NAME_SIZE: usize = 63;

/// Covenant type tags, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CovenantType {
    None = 0,
    Claim = 1,
    Bid = 2,
    Reveal = 3,
    Redeem = 4,
    Register = 5,
    Update = 6,
    Renew = 7,
    Transfer = 8,
    Finalize = 9,
    Revoke = 10,
}

/// A decoded covenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Covenant {
    /// Pure value transfer.
    None,
    /// Stakes a claim on a pre-reserved root name.
    Claim { name: Vec<u8> },
    /// Commits to a hidden bid; the output value is the lockup.
    Bid { name: Vec<u8>, blind: Hash },
    /// Reveals the true bid; the nonce must reproduce the blind.
    Reveal { name: Vec<u8>, nonce: Vec<u8> },
    /// Reclaims a losing bid's lockup.
    Redeem { name: Vec<u8> },
    /// Installs the initial DNS resource for the winning name.
    Register {
        name: Vec<u8>,
        resource: Vec<u8>,
        tree_hash: Hash,
    },
    /// Mutates the resource of a live name.
    Update { name: Vec<u8>, resource: Vec<u8> },
    /// Extends expiry; the block hash must anchor to a recent entry.
    Renew { name: Vec<u8>, block_hash: Hash },
    /// Begins a delayed ownership transfer.
    Transfer { name: Vec<u8>, address: Address },
    /// Completes a transfer after the delay.
    Finalize { name: Vec<u8> },
    /// Permanently burns the name.
    Revoke { name: Vec<u8> },
}

/// Names are lowercase ASCII letters, digits, hyphen and underscore.
fn is_valid_name(name: &[u8]) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_SIZE
        && name
            .iter()
            .all(|&c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == b'-' || c == b'_')
}

impl Covenant {
    /// Wire tag for this covenant.
    pub fn covenant_type(&self) -> CovenantType {
        match self {
            Covenant::None => CovenantType::None,
            Covenant::Claim { .. } => CovenantType::Claim,
            Covenant::Bid { .. } => CovenantType::Bid,
            Covenant::Reveal { .. } => CovenantType::Reveal,
            Covenant::Redeem { .. } => CovenantType::Redeem,
            Covenant::Register { .. } => CovenantType::Register,
            Covenant::Update { .. } => CovenantType::Update,
            Covenant::Renew { .. } => CovenantType::Renew,
            Covenant::Transfer { .. } => CovenantType::Transfer,
            Covenant::Finalize { .. } => CovenantType::Finalize,
            Covenant::Revoke { .. } => CovenantType::Revoke,
        }
    }

    /// Whether this is a plain value transfer.
    pub fn is_none(&self) -> bool {
        matches!(self, Covenant::None)
    }

    /// The name this covenant operates on, if any.
    pub fn name(&self) -> Option<&[u8]> {
        match self {
            Covenant::None => None,
            Covenant::Claim { name }
            | Covenant::Bid { name, .. }
            | Covenant::Reveal { name, .. }
            | Covenant::Redeem { name }
            | Covenant::Register { name, .. }
            | Covenant::Update { name, .. }
            | Covenant::Renew { name, .. }
            | Covenant::Transfer { name, .. }
            | Covenant::Finalize { name }
            | Covenant::Revoke { name } => Some(name),
        }
    }

    fn items(&self) -> Vec<Vec<u8>> {
        match self {
            Covenant::None => vec![],
            Covenant::Claim { name }
            | Covenant::Redeem { name }
            | Covenant::Finalize { name }
            | Covenant::Revoke { name } => vec![name.clone()],
            Covenant::Bid { name, blind } => vec![name.clone(), blind.as_bytes().to_vec()],
            Covenant::Reveal { name, nonce } => vec![name.clone(), nonce.clone()],
            Covenant::Register {
                name,
                resource,
                tree_hash,
            } => vec![name.clone(), resource.clone(), tree_hash.as_bytes().to_vec()],
            Covenant::Update { name, resource } => vec![name.clone(), resource.clone()],
            Covenant::Renew { name, block_hash } => {
                vec![name.clone(), block_hash.as_bytes().to_vec()]
            }
            Covenant::Transfer { name, address } => vec![name.clone(), address.to_vec()],
        }
    }

    fn expect_items(ty: &'static str, items: &[Vec<u8>], expected: usize) -> CodecResult<()> {
        if items.len() != expected {
            return Err(CodecError::BadArity {
                what: ty,
                expected,
                got: items.len(),
            });
        }
        Ok(())
    }

    fn item_name(item: &[u8]) -> CodecResult<Vec<u8>> {
        if !is_valid_name(item) {
            return Err(CodecError::Invalid {
                what: "covenant name",
                reason: "empty, oversize, or bad charset",
            });
        }
        Ok(item.to_vec())
    }

    fn item_hash(what: &'static str, item: &[u8]) -> CodecResult<Hash> {
        Hash::from_slice(item).ok_or(CodecError::Invalid {
            what,
            reason: "must be exactly 32 bytes",
        })
    }

    fn from_items(tag: u8, items: Vec<Vec<u8>>) -> CodecResult<Self> {
        match tag {
            0 => {
                Self::expect_items("NONE", &items, 0)?;
                Ok(Covenant::None)
            }
            1 => {
                Self::expect_items("CLAIM", &items, 1)?;
                Ok(Covenant::Claim {
                    name: Self::item_name(&items[0])?,
                })
            }
            2 => {
                Self::expect_items("BID", &items, 2)?;
                Ok(Covenant::Bid {
                    name: Self::item_name(&items[0])?,
                    blind: Self::item_hash("bid blind", &items[1])?,
                })
            }
            3 => {
                Self::expect_items("REVEAL", &items, 2)?;
                Ok(Covenant::Reveal {
                    name: Self::item_name(&items[0])?,
                    nonce: items[1].clone(),
                })
            }
            4 => {
                Self::expect_items("REDEEM", &items, 1)?;
                Ok(Covenant::Redeem {
                    name: Self::item_name(&items[0])?,
                })
            }
            5 => {
                Self::expect_items("REGISTER", &items, 3)?;
                Ok(Covenant::Register {
                    name: Self::item_name(&items[0])?,
                    resource: items[1].clone(),
                    tree_hash: Self::item_hash("register tree hash", &items[2])?,
                })
            }
            6 => {
                Self::expect_items("UPDATE", &items, 2)?;
                Ok(Covenant::Update {
                    name: Self::item_name(&items[0])?,
                    resource: items[1].clone(),
                })
            }
            7 => {
                Self::expect_items("RENEW", &items, 2)?;
                Ok(Covenant::Renew {
                    name: Self::item_name(&items[0])?,
                    block_hash: Self::item_hash("renew block hash", &items[1])?,
                })
            }
            8 => {
                Self::expect_items("TRANSFER", &items, 2)?;
                Ok(Covenant::Transfer {
                    name: Self::item_name(&items[0])?,
                    address: Address::from_bytes(&items[1])?,
                })
            }
            9 => {
                Self::expect_items("FINALIZE", &items, 1)?;
                Ok(Covenant::Finalize {
                    name: Self::item_name(&items[0])?,
                })
            }
            10 => {
                Self::expect_items("REVOKE", &items, 1)?;
                Ok(Covenant::Revoke {
                    name: Self::item_name(&items[0])?,
                })
            }
            tag => Err(CodecError::InvalidTag {
                what: "covenant",
                tag,
            }),
        }
    }
}

impl Encodable for Covenant {
    fn encode(&self, w: &mut Writer) {
        w.write_u8(self.covenant_type() as u8);
        let items = self.items();
        w.write_varint(items.len() as u64);
        for item in &items {
            w.write_var_bytes(item);
        }
    }
}

impl Decodable for Covenant {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        let tag = r.read_u8()?;
        let count = r.read_varint()? as usize;
        if count > MAX_COVENANT_ITEMS {
            return Err(CodecError::Oversize {
                what: "covenant items",
                size: count,
                max: MAX_COVENANT_ITEMS,
            });
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(r.read_var_bytes("covenant item", MAX_COVENANT_ITEM_SIZE)?);
        }
        Covenant::from_items(tag, items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::blake2b256;

    #[test]
    fn test_roundtrip_all_types() {
        let name = b"hello".to_vec();
        let covenants = vec![
            Covenant::None,
            Covenant::Claim { name: name.clone() },
            Covenant::Bid {
                name: name.clone(),
                blind: blake2b256(b"blind"),
            },
            Covenant::Reveal {
                name: name.clone(),
                nonce: vec![9u8; 32],
            },
            Covenant::Redeem { name: name.clone() },
            Covenant::Register {
                name: name.clone(),
                resource: vec![1, 2, 3],
                tree_hash: Hash::ZERO,
            },
            Covenant::Update {
                name: name.clone(),
                resource: vec![4, 5],
            },
            Covenant::Renew {
                name: name.clone(),
                block_hash: blake2b256(b"anchor"),
            },
            Covenant::Transfer {
                name: name.clone(),
                address: Address::from_key_hash([3u8; 20]),
            },
            Covenant::Finalize { name: name.clone() },
            Covenant::Revoke { name },
        ];

        for cov in covenants {
            let bytes = cov.to_vec();
            assert_eq!(Covenant::from_bytes(&bytes).unwrap(), cov, "{:?}", cov);
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let bytes = [11u8, 0];
        assert!(matches!(
            Covenant::from_bytes(&bytes),
            Err(CodecError::InvalidTag { tag: 11, .. })
        ));
    }

    #[test]
    fn test_wrong_arity_rejected() {
        // BID with a single item.
        let mut w = Writer::new();
        w.write_u8(2);
        w.write_varint(1);
        w.write_var_bytes(b"hello");
        assert!(matches!(
            Covenant::from_bytes(&w.into_vec()),
            Err(CodecError::BadArity { expected: 2, .. })
        ));
    }

    #[test]
    fn test_bad_name_rejected() {
        let mut w = Writer::new();
        w.write_u8(1);
        w.write_varint(1);
        w.write_var_bytes(b"Hello");
        assert!(matches!(
            Covenant::from_bytes(&w.into_vec()),
            Err(CodecError::Invalid { .. })
        ));
    }

    #[test]
    fn test_short_blind_rejected() {
        let mut w = Writer::new();
        w.write_u8(2);
        w.write_varint(2);
        w.write_var_bytes(b"hello");
        w.write_var_bytes(&[0u8; 16]);
        assert!(matches!(
            Covenant::from_bytes(&w.into_vec()),
            Err(CodecError::Invalid { .. })
        ));
    }
}
