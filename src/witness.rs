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

//! Witness
//!
//! The segregated witness of a transaction input: a list of byte strings,
//! serialized as a CompactInt item count followed by each item with its own
//! CompactInt length.
//!

use std::fmt;
use std::io::{Read, Write};

use bitcoin::hex::DisplayHex;
#[cfg(feature = "serde")] use serde::{Deserialize, Serialize};

use crate::encode::{self, Decodable, Encodable};
use crate::Stack;

/// The witness stack of a transaction input
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "actual_serde", transparent)
)]
pub struct Witness {
    items: Vec<Vec<u8>>,
}

impl Witness {
    /// An empty witness
    pub fn new() -> Witness {
        Witness::default()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends an item
    pub fn push(&mut self, item: Vec<u8>) {
        self.items.push(item);
    }

    /// Iterates over the items, first pushed first
    pub fn iter(&self) -> std::slice::Iter<'_, Vec<u8>> {
        self.items.iter()
    }

    /// The last item; the witness script of a P2WSH spend.
    pub fn last(&self) -> Option<&[u8]> {
        self.items.last().map(Vec::as_slice)
    }

    /// The items as an initial evaluation stack, the last item on top.
    pub fn to_stack(&self) -> Stack {
        Stack::from(self.items.clone())
    }

    /// The items as a slice
    pub fn as_slice(&self) -> &[Vec<u8>] {
        &self.items
    }

    /// Unwraps the items
    pub fn into_items(self) -> Vec<Vec<u8>> {
        self.items
    }

    /// Size of the consensus encoding in bytes.
    pub fn serialized_len(&self) -> usize {
        encode::CompactInt(self.items.len() as u64).size()
            + self
                .items
                .iter()
                .map(|item| encode::CompactInt(item.len() as u64).size() + item.len())
                .sum::<usize>()
    }

    /// Consensus encoding of the witness.
    pub fn serialize(&self) -> Vec<u8> {
        encode::serialize(self)
    }

    /// Reads a consensus-encoded witness, failing on trailing bytes.
    pub fn try_deserialize(bytes: &[u8]) -> Result<Self, encode::Error> {
        encode::deserialize(bytes)
    }
}

impl From<Vec<Vec<u8>>> for Witness {
    fn from(items: Vec<Vec<u8>>) -> Witness {
        Witness { items }
    }
}

impl<'a> IntoIterator for &'a Witness {
    type Item = &'a Vec<u8>;
    type IntoIter = std::slice::Iter<'a, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", item.as_hex())?;
        }
        f.write_str("]")
    }
}

impl Encodable for Witness {
    #[inline]
    fn consensus_encode<W: Write>(&self, w: W) -> Result<usize, encode::Error> {
        self.items.consensus_encode(w)
    }
}

impl Decodable for Witness {
    #[inline]
    fn consensus_decode<D: Read>(d: D) -> Result<Self, encode::Error> {
        Ok(Witness { items: Decodable::consensus_decode(d)? })
    }
}
