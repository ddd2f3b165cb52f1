// Bitcoin Script Engine
// Written in 2024 by
//   The scriptvm developers
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the CC0 Public Domain Dedication
// along with this software.
// If not, see <http://creativecommons.org/publicdomain/zero/1.0/>.
//

//! Consensus-encodable types
//!
//! Two length prefixes appear around scripts. [`CompactInt`] is the
//! variable-length integer used for witness stack items and for the length of
//! a serialized script. [`StackInt`] is the push-opcode prefix used for data
//! pushes inside a script.
//!

use std::io::{self, Cursor, Read, Write};
use std::{error, fmt};

use crate::opcodes::all;

/// Maximum size, in bytes, of a vector we are allowed to decode
pub const MAX_VEC_SIZE: usize = 4_000_000;

/// Encoding error
#[derive(Debug)]
pub enum Error {
    /// And I/O error
    Io(io::Error),
    /// Tried to allocate an oversized vector
    OversizedVectorAllocation {
        /// The capacity requested
        requested: usize,
        /// The maximum capacity
        max: usize,
    },
    /// A CompactInt was not encoded in its shortest form
    NonMinimalCompactInt,
    /// Parsing error
    ParseFailed(&'static str),
    /// The decoded bytes are not a valid script
    Script(crate::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref e) => write!(f, "I/O error: {}", e),
            Error::OversizedVectorAllocation {
                requested: ref r,
                max: ref m,
            } => write!(f, "oversized vector allocation: requested {}, maximum {}", r, m),
            Error::NonMinimalCompactInt => f.write_str("non-minimal CompactInt"),
            Error::ParseFailed(ref e) => write!(f, "parse failed: {}", e),
            Error::Script(ref e) => write!(f, "invalid script: {}", e),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref e) => Some(e),
            Error::Script(ref e) => Some(e),
            _ => None,
        }
    }
}

#[doc(hidden)]
impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

#[doc(hidden)]
impl From<crate::Error> for Error {
    fn from(e: crate::Error) -> Self {
        Error::Script(e)
    }
}

/// Data which can be encoded in a consensus-consistent way
pub trait Encodable {
    /// Encode an object with a well-defined format, should only ever error if
    /// the underlying `Write` errors. Returns the number of bytes written on
    /// success
    fn consensus_encode<W: Write>(&self, e: W) -> Result<usize, Error>;
}

/// Data which can be encoded in a consensus-consistent way
pub trait Decodable: Sized {
    /// Decode an object with a well-defined format
    fn consensus_decode<D: Read>(d: D) -> Result<Self, Error>;
}

/// Encode an object into a vector
pub fn serialize<T: Encodable + ?Sized>(data: &T) -> Vec<u8> {
    let mut encoder = Vec::new();
    // Writing to a vector cannot fail.
    let _ = data.consensus_encode(&mut encoder);
    encoder
}

/// Encode an object into a hex-encoded string
pub fn serialize_hex<T: Encodable + ?Sized>(data: &T) -> String {
    use bitcoin::hex::DisplayHex;
    serialize(data).to_lower_hex_string()
}

/// Deserialize an object from a vector, will error if said deserialization
/// doesn't consume the entire vector.
pub fn deserialize<T: Decodable>(data: &[u8]) -> Result<T, Error> {
    let (rv, consumed) = deserialize_partial(data)?;

    // Fail if data are not consumed entirely.
    if consumed == data.len() {
        Ok(rv)
    } else {
        Err(Error::ParseFailed("data not consumed entirely when explicitly deserializing"))
    }
}

/// Deserialize an object from a vector, but will not report an error if said deserialization
/// doesn't consume the entire vector.
pub fn deserialize_partial<T: Decodable>(data: &[u8]) -> Result<(T, usize), Error> {
    let mut decoder = Cursor::new(data);
    let rv = Decodable::consensus_decode(&mut decoder)?;
    let consumed = decoder.position() as usize;

    Ok((rv, consumed))
}

macro_rules! impl_int_encodable {
    ($ty:ident, $len:expr) => {
        impl Encodable for $ty {
            #[inline]
            fn consensus_encode<W: Write>(&self, mut w: W) -> Result<usize, Error> {
                w.write_all(&self.to_le_bytes())?;
                Ok($len)
            }
        }

        impl Decodable for $ty {
            #[inline]
            fn consensus_decode<D: Read>(mut d: D) -> Result<Self, Error> {
                let mut buf = [0u8; $len];
                d.read_exact(&mut buf)?;
                Ok($ty::from_le_bytes(buf))
            }
        }
    };
}
impl_int_encodable!(u8, 1);
impl_int_encodable!(u16, 2);
impl_int_encodable!(u32, 4);
impl_int_encodable!(u64, 8);

/// Bitcoin's variable-length integer ("CompactSize").
///
/// Values below `0xfd` take one byte; larger values are a marker byte
/// (`0xfd`, `0xfe`, `0xff`) followed by 2, 4 or 8 little-endian bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompactInt(pub u64);

impl CompactInt {
    /// The number of bytes this value takes when encoded.
    #[inline]
    pub fn size(self) -> usize {
        match self.0 {
            0..=0xfc => 1,
            0xfd..=0xffff => 3,
            0x1_0000..=0xffff_ffff => 5,
            _ => 9,
        }
    }
}

impl Encodable for CompactInt {
    #[inline]
    fn consensus_encode<W: Write>(&self, mut w: W) -> Result<usize, Error> {
        match self.0 {
            0..=0xfc => {
                (self.0 as u8).consensus_encode(w)?;
            }
            0xfd..=0xffff => {
                w.write_all(&[0xfd])?;
                (self.0 as u16).consensus_encode(w)?;
            }
            0x1_0000..=0xffff_ffff => {
                w.write_all(&[0xfe])?;
                (self.0 as u32).consensus_encode(w)?;
            }
            _ => {
                w.write_all(&[0xff])?;
                self.0.consensus_encode(w)?;
            }
        }
        Ok(self.size())
    }
}

impl Decodable for CompactInt {
    #[inline]
    fn consensus_decode<D: Read>(mut d: D) -> Result<Self, Error> {
        let n = u8::consensus_decode(&mut d)?;
        let (value, min) = match n {
            0xff => (u64::consensus_decode(&mut d)?, 0x1_0000_0000),
            0xfe => (u64::from(u32::consensus_decode(&mut d)?), 0x1_0000),
            0xfd => (u64::from(u16::consensus_decode(&mut d)?), 0xfd),
            n => return Ok(CompactInt(u64::from(n))),
        };
        if value < min {
            Err(Error::NonMinimalCompactInt)
        } else {
            Ok(CompactInt(value))
        }
    }
}

/// The length prefix of a data push inside a script.
///
/// Lengths up to 75 are the push opcode itself; longer payloads use
/// `OP_PUSHDATA1`, `OP_PUSHDATA2` or `OP_PUSHDATA4` followed by a 1, 2 or 4
/// byte little-endian length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackInt(pub u32);

impl StackInt {
    /// The number of bytes the prefix takes, opcode included.
    #[inline]
    pub fn size(self) -> usize {
        match self.0 {
            0..=75 => 1,
            76..=0xff => 2,
            0x100..=0xffff => 3,
            _ => 5,
        }
    }

    /// The shortest push opcode able to carry this many bytes.
    #[inline]
    pub fn opcode(self) -> crate::opcodes::All {
        match self.0 {
            0..=75 => crate::opcodes::All::from(self.0 as u8),
            76..=0xff => all::OP_PUSHDATA1,
            0x100..=0xffff => all::OP_PUSHDATA2,
            _ => all::OP_PUSHDATA4,
        }
    }
}

impl Encodable for StackInt {
    #[inline]
    fn consensus_encode<W: Write>(&self, mut w: W) -> Result<usize, Error> {
        let op = self.opcode().into_u8();
        op.consensus_encode(&mut w)?;
        match self.0 {
            0..=75 => {}
            76..=0xff => {
                (self.0 as u8).consensus_encode(&mut w)?;
            }
            0x100..=0xffff => {
                (self.0 as u16).consensus_encode(&mut w)?;
            }
            _ => {
                self.0.consensus_encode(&mut w)?;
            }
        }
        Ok(self.size())
    }
}

impl Decodable for StackInt {
    #[inline]
    fn consensus_decode<D: Read>(mut d: D) -> Result<Self, Error> {
        let op = u8::consensus_decode(&mut d)?;
        match op {
            0..=75 => Ok(StackInt(u32::from(op))),
            0x4c => Ok(StackInt(u32::from(u8::consensus_decode(&mut d)?))),
            0x4d => Ok(StackInt(u32::from(u16::consensus_decode(&mut d)?))),
            0x4e => Ok(StackInt(u32::consensus_decode(&mut d)?)),
            _ => Err(Error::ParseFailed("not a push opcode")),
        }
    }
}

impl Encodable for [u8] {
    #[inline]
    fn consensus_encode<W: Write>(&self, w: W) -> Result<usize, Error> {
        consensus_encode_with_size(self, w)
    }
}

impl Encodable for Vec<u8> {
    #[inline]
    fn consensus_encode<W: Write>(&self, w: W) -> Result<usize, Error> {
        consensus_encode_with_size(self, w)
    }
}

impl Decodable for Vec<u8> {
    #[inline]
    fn consensus_decode<D: Read>(mut d: D) -> Result<Self, Error> {
        let len = CompactInt::consensus_decode(&mut d)?.0 as usize;
        if len > MAX_VEC_SIZE {
            return Err(Error::OversizedVectorAllocation { requested: len, max: MAX_VEC_SIZE });
        }
        let mut ret = vec![0u8; len];
        d.read_exact(&mut ret)?;
        Ok(ret)
    }
}

impl Encodable for Vec<Vec<u8>> {
    #[inline]
    fn consensus_encode<W: Write>(&self, mut w: W) -> Result<usize, Error> {
        let mut len = CompactInt(self.len() as u64).consensus_encode(&mut w)?;
        for item in self.iter() {
            len += item.consensus_encode(&mut w)?;
        }
        Ok(len)
    }
}

impl Decodable for Vec<Vec<u8>> {
    #[inline]
    fn consensus_decode<D: Read>(mut d: D) -> Result<Self, Error> {
        let len = CompactInt::consensus_decode(&mut d)?.0 as usize;
        // every item costs at least its one-byte length prefix
        if len > MAX_VEC_SIZE {
            return Err(Error::OversizedVectorAllocation { requested: len, max: MAX_VEC_SIZE });
        }
        let mut ret = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            ret.push(Decodable::consensus_decode(&mut d)?);
        }
        Ok(ret)
    }
}

/// Writes `data` preceded by its [`CompactInt`] length.
pub(crate) fn consensus_encode_with_size<S: Write>(data: &[u8], mut s: S) -> Result<usize, Error> {
    let vi_len = CompactInt(data.len() as u64).consensus_encode(&mut s)?;
    s.write_all(data)?;
    Ok(vi_len + data.len())
}

/// Writes `data` preceded by its [`StackInt`] push prefix.
pub(crate) fn push_encode_with_size<S: Write>(data: &[u8], mut s: S) -> Result<usize, Error> {
    let prefix = StackInt(data.len() as u32).consensus_encode(&mut s)?;
    s.write_all(data)?;
    Ok(prefix + data.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hex::FromHex;

    #[test]
    fn compact_int_boundaries() {
        let cases: &[(u64, &str)] = &[
            (0, "00"),
            (252, "fc"),
            (253, "fdfd00"),
            (255, "fdff00"),
            (256, "fd0001"),
            (0xffff, "fdffff"),
            (0x1_0000, "fe00000100"),
            (0xffff_ffff, "feffffffff"),
            (0x1_0000_0000, "ff0000000001000000"),
        ];
        for &(n, hex) in cases {
            let bytes = Vec::<u8>::from_hex(hex).unwrap();
            assert_eq!(serialize(&CompactInt(n)), bytes, "{}", n);
            assert_eq!(CompactInt(n).size(), bytes.len());
            assert_eq!(deserialize::<CompactInt>(&bytes).unwrap(), CompactInt(n));
        }
    }

    #[test]
    fn compact_int_non_minimal() {
        let bytes = Vec::<u8>::from_hex("fd1000").unwrap();
        match deserialize::<CompactInt>(&bytes) {
            Err(Error::NonMinimalCompactInt) => {}
            other => panic!("unexpected {:?}", other),
        }
        let bytes = Vec::<u8>::from_hex("fe00010000").unwrap();
        assert!(deserialize::<CompactInt>(&bytes).is_err());
    }

    #[test]
    fn stack_int_boundaries() {
        let cases: &[(u32, &str)] = &[
            (0, "00"),
            (1, "01"),
            (75, "4b"),
            (76, "4c4c"),
            (77, "4c4d"),
            (252, "4cfc"),
            (253, "4cfd"),
            (255, "4cff"),
            (256, "4d0001"),
            (65535, "4dffff"),
            (65536, "4e00000100"),
        ];
        for &(n, hex) in cases {
            let bytes = Vec::<u8>::from_hex(hex).unwrap();
            assert_eq!(serialize(&StackInt(n)), bytes, "{}", n);
            assert_eq!(StackInt(n).size(), bytes.len());
            assert_eq!(deserialize::<StackInt>(&bytes).unwrap(), StackInt(n));
        }
        assert_eq!(StackInt(75).opcode(), all::OP_PUSHBYTES_75);
        assert_eq!(StackInt(76).opcode(), all::OP_PUSHDATA1);
    }

    #[test]
    fn stack_int_rejects_opcodes() {
        assert!(deserialize::<StackInt>(&[0x51]).is_err());
        assert!(deserialize::<StackInt>(&[0x4c]).is_err());
    }

    #[test]
    fn byte_vectors() {
        let v = vec![vec![], vec![1u8, 2, 3], vec![0xaa; 253]];
        let ser = serialize(&v);
        assert_eq!(&ser[..5], &[3, 0, 3, 1, 2]);
        assert_eq!(&ser[6..9], &[0xfd, 0xfd, 0x00]);
        assert_eq!(deserialize::<Vec<Vec<u8>>>(&ser).unwrap(), v);
        assert!(deserialize::<Vec<u8>>(&[2, 1]).is_err());
        assert!(deserialize::<Vec<u8>>(&[1, 1, 1]).is_err());
        assert_eq!(serialize_hex(&vec![0xabu8, 0xcd]), "02abcd");
    }
}
