//! Byte-exact wire codec: little-endian integers and compact-size counts.
//!
//! Every message in the workspace serializes through [`ByteWriter`] and
//! parses through [`ByteReader`]. Round trips are byte-identical: re-encoding
//! a parsed value reproduces the input exactly.

use thiserror::Error;

/// Wire decoding errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("Unexpected end of input: wanted {wanted} more bytes, {remaining} left")]
    UnexpectedEof { wanted: usize, remaining: usize },

    #[error("Non-canonical compact-size encoding")]
    NonCanonicalCompactSize,

    #[error("Declared length {declared} exceeds limit {limit}")]
    LengthOutOfRange { declared: u64, limit: u64 },

    #[error("{trailing} trailing bytes after message")]
    TrailingBytes { trailing: usize },
}

/// Growable output buffer for wire encoding.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bitcoin-style compact-size: 1, 3, 5, or 9 bytes depending on magnitude.
    pub fn put_compact_size(&mut self, v: u64) {
        match v {
            0..=0xFC => self.put_u8(v as u8),
            0xFD..=0xFFFF => {
                self.put_u8(0xFD);
                self.put_u16(v as u16);
            }
            0x1_0000..=0xFFFF_FFFF => {
                self.put_u8(0xFE);
                self.put_u32(v as u32);
            }
            _ => {
                self.put_u8(0xFF);
                self.put_u64(v);
            }
        }
    }

    /// Compact-size length prefix followed by the raw bytes.
    pub fn put_var_bytes(&mut self, bytes: &[u8]) {
        self.put_compact_size(bytes.len() as u64);
        self.put_bytes(bytes);
    }
}

/// Cursor over an input buffer for wire decoding.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::UnexpectedEof {
                wanted: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn get_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, WireError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn get_u32(&mut self) -> Result<u32, WireError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn get_u64(&mut self) -> Result<u64, WireError> {
        let b = self.take(8)?;
        let mut le = [0u8; 8];
        le.copy_from_slice(b);
        Ok(u64::from_le_bytes(le))
    }

    pub fn get_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let b = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(b);
        Ok(out)
    }

    /// Decodes a compact-size, rejecting non-minimal encodings.
    pub fn get_compact_size(&mut self) -> Result<u64, WireError> {
        let tag = self.get_u8()?;
        let v = match tag {
            0xFD => {
                let v = u64::from(self.get_u16()?);
                if v < 0xFD {
                    return Err(WireError::NonCanonicalCompactSize);
                }
                v
            }
            0xFE => {
                let v = u64::from(self.get_u32()?);
                if v <= 0xFFFF {
                    return Err(WireError::NonCanonicalCompactSize);
                }
                v
            }
            0xFF => {
                let v = self.get_u64()?;
                if v <= 0xFFFF_FFFF {
                    return Err(WireError::NonCanonicalCompactSize);
                }
                v
            }
            _ => u64::from(tag),
        };
        Ok(v)
    }

    /// Decodes a compact-size count that must not exceed `limit`.
    ///
    /// Guards untrusted length prefixes before any allocation is sized by them.
    pub fn get_count(&mut self, limit: u64) -> Result<u64, WireError> {
        let declared = self.get_compact_size()?;
        if declared > limit {
            return Err(WireError::LengthOutOfRange { declared, limit });
        }
        Ok(declared)
    }

    pub fn get_var_bytes(&mut self, limit: u64) -> Result<Vec<u8>, WireError> {
        let len = self.get_count(limit)? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Fails unless the whole input has been consumed.
    pub fn expect_eof(&self) -> Result<(), WireError> {
        if self.remaining() != 0 {
            return Err(WireError::TrailingBytes {
                trailing: self.remaining(),
            });
        }
        Ok(())
    }
}

/// Types that serialize to the wire.
pub trait WireEncode {
    fn encode(&self, w: &mut ByteWriter);

    fn to_wire_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        self.encode(&mut w);
        w.into_bytes()
    }
}

/// Types that parse from the wire.
pub trait WireDecode: Sized {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self, WireError>;

    /// Parses a complete message, rejecting trailing garbage.
    fn from_wire_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let mut r = ByteReader::new(bytes);
        let v = Self::decode(&mut r)?;
        r.expect_eof()?;
        Ok(v)
    }
}
