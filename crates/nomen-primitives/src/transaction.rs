//! Transactions: inputs, outputs, witnesses, and the two hash forms.
//!
//! Witness stacks are serialized after the base transaction body and
//! committed separately in the block's witness root. The transaction
//! hash (`txid`) covers the base body only; the witness hash (`wtxid`)
//! covers both.

use crate::address::Address;
use crate::covenant::Covenant;
use crate::encoding::{CodecError, CodecResult, Decodable, Encodable, Reader, Writer};
use crate::hash::{blake2b256, Hash};

/// Maximum inputs or outputs per transaction.
const MAX_TX_VECTOR: usize = 10_000;

/// Maximum witness items per input and bytes per item.
const MAX_WITNESS_ITEMS: usize = 100;
const MAX_WITNESS_ITEM_SIZE: usize = 10_000;

/// A reference to a previous output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Outpoint {
    /// Transaction ID of the funding transaction.
    pub hash: Hash,
    /// Output index within it.
    pub index: u32,
}

impl Outpoint {
    /// The null prevout used by coinbase inputs.
    pub const NULL: Outpoint = Outpoint {
        hash: Hash::ZERO,
        index: u32::MAX,
    };

    /// Create an outpoint.
    pub fn new(hash: Hash, index: u32) -> Self {
        Self { hash, index }
    }

    /// Whether this is the coinbase null prevout.
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl Encodable for Outpoint {
    fn encode(&self, w: &mut Writer) {
        self.hash.encode(w);
        w.write_u32(self.index);
    }
}

impl Decodable for Outpoint {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            hash: Hash::decode(r)?,
            index: r.read_u32()?,
        })
    }
}

/// An input witness stack.
pub type Witness = Vec<Vec<u8>>;

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// Spent output reference.
    pub prevout: Outpoint,
    /// Witness stack (serialized out-of-band).
    pub witness: Witness,
    /// Sequence number.
    pub sequence: u32,
}

impl Input {
    /// Input spending the given outpoint with final sequence.
    pub fn from_outpoint(prevout: Outpoint) -> Self {
        Self {
            prevout,
            witness: Vec::new(),
            sequence: u32::MAX,
        }
    }
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Value in dollarydoos.
    pub value: u64,
    /// Destination address.
    pub address: Address,
    /// Covenant envelope.
    pub covenant: Covenant,
}

impl Output {
    /// Plain value transfer to an address.
    pub fn plain(value: u64, address: Address) -> Self {
        Self {
            value,
            address,
            covenant: Covenant::None,
        }
    }
}

impl Encodable for Output {
    fn encode(&self, w: &mut Writer) {
        w.write_u64(self.value);
        self.address.encode(w);
        self.covenant.encode(w);
    }
}

impl Decodable for Output {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            value: r.read_u64()?,
            address: Address::decode(r)?,
            covenant: Covenant::decode(r)?,
        })
    }
}

/// A transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Transaction version.
    pub version: u32,
    /// Inputs.
    pub inputs: Vec<Input>,
    /// Outputs.
    pub outputs: Vec<Output>,
    /// Lock time (height or UNIX time, per the threshold rule).
    pub locktime: u32,
}

impl Transaction {
    /// Encode the base body (no witness data).
    pub fn encode_base(&self, w: &mut Writer) {
        w.write_u32(self.version);
        w.write_varint(self.inputs.len() as u64);
        for input in &self.inputs {
            input.prevout.encode(w);
            w.write_u32(input.sequence);
        }
        w.write_varint(self.outputs.len() as u64);
        for output in &self.outputs {
            output.encode(w);
        }
        w.write_u32(self.locktime);
    }

    /// Encode the witness section (one stack per input).
    pub fn encode_witness(&self, w: &mut Writer) {
        for input in &self.inputs {
            w.write_varint(input.witness.len() as u64);
            for item in &input.witness {
                w.write_var_bytes(item);
            }
        }
    }

    /// Base body size in bytes.
    pub fn base_size(&self) -> usize {
        let mut w = Writer::new();
        self.encode_base(&mut w);
        w.len()
    }

    /// Full size including witness data.
    pub fn total_size(&self) -> usize {
        let mut w = Writer::new();
        self.encode_base(&mut w);
        self.encode_witness(&mut w);
        w.len()
    }

    /// Transaction hash: BLAKE2b-256 of the base body.
    pub fn txid(&self) -> Hash {
        let mut w = Writer::new();
        self.encode_base(&mut w);
        blake2b256(&w.into_vec())
    }

    /// Witness hash: BLAKE2b-256 of the base body plus witness section.
    pub fn wtxid(&self) -> Hash {
        let mut w = Writer::new();
        self.encode_base(&mut w);
        self.encode_witness(&mut w);
        blake2b256(&w.into_vec())
    }

    /// Whether this is a coinbase (single null-prevout input).
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }

    /// Sum of output values, saturating.
    pub fn output_value(&self) -> u64 {
        self.outputs
            .iter()
            .fold(0u64, |acc, o| acc.saturating_add(o.value))
    }
}

impl Encodable for Transaction {
    fn encode(&self, w: &mut Writer) {
        self.encode_base(w);
        self.encode_witness(w);
    }
}

impl Decodable for Transaction {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        let version = r.read_u32()?;

        let input_count = r.read_varint()? as usize;
        if input_count > MAX_TX_VECTOR {
            return Err(CodecError::Oversize {
                what: "inputs",
                size: input_count,
                max: MAX_TX_VECTOR,
            });
        }
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            let prevout = Outpoint::decode(r)?;
            let sequence = r.read_u32()?;
            inputs.push(Input {
                prevout,
                witness: Vec::new(),
                sequence,
            });
        }

        let output_count = r.read_varint()? as usize;
        if output_count > MAX_TX_VECTOR {
            return Err(CodecError::Oversize {
                what: "outputs",
                size: output_count,
                max: MAX_TX_VECTOR,
            });
        }
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            outputs.push(Output::decode(r)?);
        }

        let locktime = r.read_u32()?;

        // Witness section: one stack per input.
        for input in &mut inputs {
            let item_count = r.read_varint()? as usize;
            if item_count > MAX_WITNESS_ITEMS {
                return Err(CodecError::Oversize {
                    what: "witness items",
                    size: item_count,
                    max: MAX_WITNESS_ITEMS,
                });
            }
            let mut items = Vec::with_capacity(item_count);
            for _ in 0..item_count {
                items.push(r.read_var_bytes("witness item", MAX_WITNESS_ITEM_SIZE)?);
            }
            input.witness = items;
        }

        Ok(Self {
            version,
            inputs,
            outputs,
            locktime,
        })
    }
}
