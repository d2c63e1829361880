//! Consensus wire codec: little-endian integers and compact-size
//! length prefixes over plain byte slices.

use thiserror::Error;

/// Errors raised while encoding or decoding on-chain data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before a field could be read.
    #[error("Unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// Bytes left over after a complete decode.
    #[error("Trailing bytes after decode: {0}")]
    TrailingBytes(usize),

    /// A compact-size prefix used a wider form than necessary.
    #[error("Non-canonical compact-size encoding")]
    NonCanonicalVarint,

    /// A length or count exceeded its consensus bound.
    #[error("Oversize {what}: {size}, max {max}")]
    Oversize {
        what: &'static str,
        size: usize,
        max: usize,
    },

    /// An unrecognized tag byte.
    #[error("Invalid {what} tag: {tag}")]
    InvalidTag { what: &'static str, tag: u8 },

    /// A tagged structure carried the wrong number of items.
    #[error("Bad {what} arity: expected {expected}, got {got}")]
    BadArity {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// A field failed shape validation (length, charset).
    #[error("Invalid {what}: {reason}")]
    Invalid {
        what: &'static str,
        reason: &'static str,
    },
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Cursor over an immutable byte slice.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over the full slice.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Current offset from the start of the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::UnexpectedEnd {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian u16.
    pub fn read_u16(&mut self) -> CodecResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a little-endian u32.
    pub fn read_u32(&mut self) -> CodecResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a little-endian u64.
    pub fn read_u64(&mut self) -> CodecResult<u64> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_le_bytes(arr))
    }

    /// Read `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        self.take(n)
    }

    /// Read a compact-size prefix. Rejects non-canonical widths.
    pub fn read_varint(&mut self) -> CodecResult<u64> {
        let first = self.read_u8()?;
        match first {
            0xfd => {
                let v = self.read_u16()? as u64;
                if v < 0xfd {
                    return Err(CodecError::NonCanonicalVarint);
                }
                Ok(v)
            }
            0xfe => {
                let v = self.read_u32()? as u64;
                if v <= u16::MAX as u64 {
                    return Err(CodecError::NonCanonicalVarint);
                }
                Ok(v)
            }
            0xff => {
                let v = self.read_u64()?;
                if v <= u32::MAX as u64 {
                    return Err(CodecError::NonCanonicalVarint);
                }
                Ok(v)
            }
            v => Ok(v as u64),
        }
    }

    /// Read a compact-size length followed by that many bytes, bounded.
    pub fn read_var_bytes(&mut self, what: &'static str, max: usize) -> CodecResult<Vec<u8>> {
        let len = self.read_varint()? as usize;
        if len > max {
            return Err(CodecError::Oversize {
                what,
                size: len,
                max,
            });
        }
        Ok(self.take(len)?.to_vec())
    }

    /// Fail unless the reader is fully consumed.
    pub fn finish(&self) -> CodecResult<()> {
        if self.remaining() > 0 {
            return Err(CodecError::TrailingBytes(self.remaining()));
        }
        Ok(())
    }
}

/// Growable output buffer for the wire format.
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    /// Write a little-endian u16.
    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a little-endian u32.
    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a little-endian u64.
    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a compact-size prefix in its canonical width.
    pub fn write_varint(&mut self, v: u64) {
        if v < 0xfd {
            self.write_u8(v as u8);
        } else if v <= u16::MAX as u64 {
            self.write_u8(0xfd);
            self.write_u16(v as u16);
        } else if v <= u32::MAX as u64 {
            self.write_u8(0xfe);
            self.write_u32(v as u32);
        } else {
            self.write_u8(0xff);
            self.write_u64(v);
        }
    }

    /// Write a compact-size length followed by the bytes.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.write_bytes(bytes);
    }

    /// Consume the writer, returning the buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// Types with a canonical wire encoding.
pub trait Encodable {
    /// Append the wire form to the writer.
    fn encode(&self, w: &mut Writer);

    /// Encode into a fresh byte vector.
    fn to_vec(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.encode(&mut w);
        w.into_vec()
    }
}

/// Types decodable from their canonical wire encoding.
pub trait Decodable: Sized {
    /// Decode one value, advancing the reader.
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self>;

    /// Decode a value that must consume the entire slice.
    fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        let mut r = Reader::new(bytes);
        let v = Self::decode(&mut r)?;
        r.finish()?;
        Ok(v)
    }
}
