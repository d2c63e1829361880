//! Per-name auction records.
//!
//! A record tracks one name through `Bidding → Reveal → Closed →
//! {Renewed | Revoked}`; the absent record is the null state every
//! unknown name starts in. `highest` is the top revealed bid and
//! `value` the price the winner pays (second-highest, or the zero
//! reserve), so `value <= highest` holds throughout.

use crate::error::{StateError, StateResult};
use nomen_primitives::{blake2b256, Address, Hash, Outpoint};

/// Auction store key: BLAKE2b-256 of the raw name.
pub fn name_hash(name: &[u8]) -> Hash {
    blake2b256(name)
}

/// Lifecycle state of an auction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AuctionState {
    Bidding = 0,
    Reveal = 1,
    Closed = 2,
    Renewed = 3,
    Revoked = 4,
}

impl AuctionState {
    /// A live name accepts UPDATE, RENEW, TRANSFER, and REVOKE.
    pub fn is_live(&self) -> bool {
        matches!(self, AuctionState::Closed | AuctionState::Renewed)
    }

    /// Lowercase state name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            AuctionState::Bidding => "bidding",
            AuctionState::Reveal => "reveal",
            AuctionState::Closed => "closed",
            AuctionState::Renewed => "renewed",
            AuctionState::Revoked => "revoked",
        }
    }

    fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(AuctionState::Bidding),
            1 => Some(AuctionState::Reveal),
            2 => Some(AuctionState::Closed),
            3 => Some(AuctionState::Renewed),
            4 => Some(AuctionState::Revoked),
            _ => None,
        }
    }
}

/// A pending ownership transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Destination address.
    pub address: Address,
    /// Height the transfer was initiated.
    pub height: u32,
}

/// The auction record for one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auction {
    /// Raw name, no trailing dot.
    pub name: Vec<u8>,
    /// Store key.
    pub name_hash: Hash,
    /// Height the current auction opened.
    pub height: u32,
    /// Last renewal height; doubles as the expiry clock.
    pub renewal: u32,
    /// Outpoint currently controlling the name.
    pub owner: Outpoint,
    /// Price the winner pays: second-highest reveal or zero reserve.
    pub value: u64,
    /// Top revealed bid.
    pub highest: u64,
    /// Lifecycle state.
    pub state: AuctionState,
    /// Pending transfer, if any.
    pub transfer: Option<Transfer>,
}

impl Auction {
    /// Open a fresh auction in the bidding state.
    pub fn open(name: Vec<u8>, height: u32) -> Self {
        let name_hash = name_hash(&name);
        Self {
            name,
            name_hash,
            height,
            renewal: height,
            owner: Outpoint::NULL,
            value: 0,
            highest: 0,
            state: AuctionState::Bidding,
            transfer: None,
        }
    }

    /// Whether the record has decayed back to the null state.
    pub fn is_expired(&self, height: u32, expiry_window: u32) -> bool {
        height.saturating_sub(self.renewal) >= expiry_window
    }

    /// Storage form: big-endian fields behind the 32-byte key.
    /// Format: name_hash (32) | name_len (1) | name | height (4) |
    /// renewal (4) | owner (36) | value (8) | highest (8) | state (1) |
    /// transfer flag (1) [ version (1) | addr_len (1) | addr | height (4) ]
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(96 + self.name.len());
        bytes.extend_from_slice(self.name_hash.as_bytes());
        bytes.push(self.name.len() as u8);
        bytes.extend_from_slice(&self.name);
        bytes.extend_from_slice(&self.height.to_be_bytes());
        bytes.extend_from_slice(&self.renewal.to_be_bytes());
        bytes.extend_from_slice(self.owner.hash.as_bytes());
        bytes.extend_from_slice(&self.owner.index.to_be_bytes());
        bytes.extend_from_slice(&self.value.to_be_bytes());
        bytes.extend_from_slice(&self.highest.to_be_bytes());
        bytes.push(self.state as u8);
        match &self.transfer {
            None => bytes.push(0),
            Some(t) => {
                bytes.push(1);
                bytes.push(t.address.version);
                bytes.push(t.address.hash.len() as u8);
                bytes.extend_from_slice(&t.address.hash);
                bytes.extend_from_slice(&t.height.to_be_bytes());
            }
        }
        bytes
    }

    /// Inverse of [`serialize`](Self::serialize).
    pub fn deserialize(bytes: &[u8]) -> StateResult<Self> {
        let err = |reason: &str| StateError::Serialization(format!("auction: {reason}"));

        if bytes.len() < 33 {
            return Err(err("too short"));
        }
        let name_hash =
            Hash::from_slice(&bytes[0..32]).ok_or_else(|| err("bad name hash"))?;
        let name_len = bytes[32] as usize;
        let mut offset = 33;

        if bytes.len() < offset + name_len + 4 + 4 + 36 + 8 + 8 + 1 + 1 {
            return Err(err("truncated"));
        }
        let name = bytes[offset..offset + name_len].to_vec();
        offset += name_len;

        let height = u32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap());
        offset += 4;
        let renewal = u32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap());
        offset += 4;

        let owner_hash =
            Hash::from_slice(&bytes[offset..offset + 32]).ok_or_else(|| err("bad owner"))?;
        offset += 32;
        let owner_index = u32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap());
        offset += 4;

        let value = u64::from_be_bytes(bytes[offset..offset + 8].try_into().unwrap());
        offset += 8;
        let highest = u64::from_be_bytes(bytes[offset..offset + 8].try_into().unwrap());
        offset += 8;

        let state = AuctionState::from_u8(bytes[offset]).ok_or_else(|| err("bad state"))?;
        offset += 1;

        let transfer = match bytes[offset] {
            0 => None,
            1 => {
                offset += 1;
                if bytes.len() < offset + 2 {
                    return Err(err("truncated transfer"));
                }
                let version = bytes[offset];
                let addr_len = bytes[offset + 1] as usize;
                offset += 2;
                if bytes.len() < offset + addr_len + 4 {
                    return Err(err("truncated transfer address"));
                }
                let hash = bytes[offset..offset + addr_len].to_vec();
                offset += addr_len;
                let height =
                    u32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap());
                Some(Transfer {
                    address: Address { version, hash },
                    height,
                })
            }
            _ => return Err(err("bad transfer flag")),
        };

        Ok(Self {
            name,
            name_hash,
            height,
            renewal,
            owner: Outpoint::new(owner_hash, owner_index),
            value,
            highest,
            state,
            transfer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_state() {
        let auction = Auction::open(b"hello".to_vec(), 100);
        assert_eq!(auction.state, AuctionState::Bidding);
        assert_eq!(auction.height, 100);
        assert_eq!(auction.renewal, 100);
        assert_eq!(auction.name_hash, name_hash(b"hello"));
        assert!(auction.value <= auction.highest);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut auction = Auction::open(b"hello".to_vec(), 100);
        auction.state = AuctionState::Closed;
        auction.owner = Outpoint::new(blake2b256(b"owner"), 2);
        auction.value = 3_000_000;
        auction.highest = 5_000_000;
        auction.transfer = Some(Transfer {
            address: Address::from_key_hash([7u8; 20]),
            height: 250,
        });

        let bytes = auction.serialize();
        assert_eq!(Auction::deserialize(&bytes).unwrap(), auction);
    }

    #[test]
    fn test_roundtrip_without_transfer() {
        let auction = Auction::open(b"xyz".to_vec(), 7);
        let bytes = auction.serialize();
        assert_eq!(Auction::deserialize(&bytes).unwrap(), auction);
    }

    #[test]
    fn test_expiry_boundary() {
        let mut auction = Auction::open(b"hello".to_vec(), 1000);
        auction.renewal = 1000;
        let window = 105_120;
        assert!(!auction.is_expired(1000 + window - 1, window));
        assert!(auction.is_expired(1000 + window, window));
    }

    #[test]
    fn test_truncated_rejected() {
        let auction = Auction::open(b"hello".to_vec(), 1);
        let bytes = auction.serialize();
        assert!(Auction::deserialize(&bytes[..bytes.len() - 1]).is_err());
    }
}
