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

//! Script
//!
//! Raw script bytes and the typed wrappers a transaction puts them in:
//! the [`PubkeyScript`] locking an output, the [`SignatureScript`] spending
//! it, and the [`RedeemScript`] carried inside a P2SH spend.
//!
//! None of these types validate their content on construction. Framing is
//! only checked when a script is iterated, classified or decoded.
//!

use std::fmt;
use std::io::{Read, Write};
use std::ops::Deref;
use std::str::FromStr;

use bitcoin::hashes::{hash160, sha256, Hash};
use bitcoin::hex::{DisplayHex, FromHex, HexToBytesError};
use secp256k1_zkp::{PublicKey, XOnlyPublicKey};

use crate::decode::{decode, DecodedScript};
use crate::encode::{self, Decodable, Encodable};
use crate::locktime::LockTime;
use crate::opcodes::{all, All};
use crate::{num, Error, Mode};

/// Signature operations charged for a multisig with no usable key count.
const MAX_PUBKEYS_PER_MULTISIG: usize = 20;

/// A Bitcoin script
#[derive(Clone, Default, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Script(Box<[u8]>);

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Script(")?;
        bytes_to_asm_fmt(&self.0, f)?;
        f.write_str(")")
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        bytes_to_asm_fmt(&self.0, f)
    }
}

impl fmt::LowerHex for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0.as_hex(), f)
    }
}

impl FromStr for Script {
    type Err = HexToBytesError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Script::from(Vec::<u8>::from_hex(s)?))
    }
}

impl From<Vec<u8>> for Script {
    fn from(v: Vec<u8>) -> Script {
        Script(v.into_boxed_slice())
    }
}

impl From<&[u8]> for Script {
    fn from(v: &[u8]) -> Script {
        Script(v.into())
    }
}

impl Script {
    /// Creates a new empty script
    pub fn new() -> Script {
        Script(vec![].into_boxed_slice())
    }

    /// The length in bytes of the script
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the script is the empty script
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the script data
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns a copy of the script data
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.clone().into_vec()
    }

    /// Convert the script into a byte vector
    pub fn into_bytes(self) -> Vec<u8> {
        self.0.into_vec()
    }

    /// Iterates over the pushes and opcodes of the script, without
    /// interpreting conditionals.
    pub fn instructions(&self) -> Instructions {
        Instructions { data: &self.0 }
    }

    /// Decodes the script into an operation tree under `mode`.
    pub fn decode(&self, mode: Mode) -> Result<DecodedScript, Error> {
        decode(&self.0, mode)
    }

    /// Whether the script consists only of data pushes.
    ///
    /// `OP_RESERVED` counts as a push here, as it always has in Bitcoin.
    /// A script with a truncated push is not push-only.
    pub fn is_push_only(&self) -> bool {
        self.instructions().all(|ins| match ins {
            Ok(Instruction::PushBytes(_)) => true,
            Ok(Instruction::Op(op)) => op.into_u8() <= all::OP_PUSHNUM_16.into_u8(),
            Err(_) => false,
        })
    }

    /// Counts signature operations, charging 20 for every multisig.
    pub fn sigop_count(&self) -> usize {
        self.count_sigops(false)
    }

    /// Counts signature operations. With `accurate`, a multisig preceded by
    /// `OP_0`..`OP_16` is charged that many instead of 20.
    ///
    /// Counting stops silently at a truncated push.
    fn count_sigops(&self, accurate: bool) -> usize {
        let mut n = 0;
        let mut last = None;
        let mut ins = self.instructions();
        while let Some(&byte) = ins.data.first() {
            if !matches!(ins.next(), Some(Ok(_))) {
                break;
            }
            let op = All::from(byte);
            match op {
                all::OP_CHECKSIG | all::OP_CHECKSIGVERIFY => n += 1,
                all::OP_CHECKMULTISIG | all::OP_CHECKMULTISIGVERIFY => {
                    n += match last.and_then(All::small_int) {
                        Some(keys) if accurate => usize::from(keys),
                        _ => MAX_PUBKEYS_PER_MULTISIG,
                    };
                }
                _ => {}
            }
            last = Some(op);
        }
        n
    }

    /// The HASH160 of the script, as committed to by P2SH.
    pub fn script_hash(&self) -> hash160::Hash {
        hash160::Hash::hash(&self.0)
    }

    /// The SHA256 of the script, as committed to by P2WSH.
    pub fn wscript_hash(&self) -> sha256::Hash {
        sha256::Hash::hash(&self.0)
    }

    /// Checks whether a script pubkey is a p2sh output
    #[inline]
    pub fn is_p2sh(&self) -> bool {
        self.0.len() == 23
            && self.0[0] == all::OP_HASH160.into_u8()
            && self.0[1] == all::OP_PUSHBYTES_20.into_u8()
            && self.0[22] == all::OP_EQUAL.into_u8()
    }

    /// Checks whether a script pubkey is a p2pkh output
    #[inline]
    pub fn is_p2pkh(&self) -> bool {
        self.0.len() == 25
            && self.0[0] == all::OP_DUP.into_u8()
            && self.0[1] == all::OP_HASH160.into_u8()
            && self.0[2] == all::OP_PUSHBYTES_20.into_u8()
            && self.0[23] == all::OP_EQUALVERIFY.into_u8()
            && self.0[24] == all::OP_CHECKSIG.into_u8()
    }

    /// Checks whether a script pubkey is a p2pk output
    #[inline]
    pub fn is_p2pk(&self) -> bool {
        match self.0.len() {
            67 => {
                self.0[0] == all::OP_PUSHBYTES_65.into_u8()
                    && self.0[66] == all::OP_CHECKSIG.into_u8()
            }
            35 => {
                self.0[0] == all::OP_PUSHBYTES_33.into_u8()
                    && self.0[34] == all::OP_CHECKSIG.into_u8()
            }
            _ => false,
        }
    }

    /// The version and program of a BIP141 witness program, if this is one.
    ///
    /// A witness program is a version opcode (`OP_0`, `OP_1`..`OP_16`)
    /// followed by a single direct push of 2 to 40 bytes.
    pub fn witness_program(&self) -> Option<(u8, &[u8])> {
        if self.0.len() < 4 || self.0.len() > 42 {
            return None;
        }
        let version = All::from(self.0[0]).small_int()?;
        let push_len = usize::from(self.0[1]);
        if push_len + 2 != self.0.len() {
            return None;
        }
        Some((version, &self.0[2..]))
    }

    /// Checks whether a script pubkey is a segregated witness program
    #[inline]
    pub fn is_witness_program(&self) -> bool {
        self.witness_program().is_some()
    }

    /// Checks whether a script pubkey is a p2wsh output
    #[inline]
    pub fn is_v0_p2wsh(&self) -> bool {
        matches!(self.witness_program(), Some((0, p)) if p.len() == 32)
    }

    /// Checks whether a script pubkey is a p2wpkh output
    #[inline]
    pub fn is_v0_p2wpkh(&self) -> bool {
        matches!(self.witness_program(), Some((0, p)) if p.len() == 20)
    }

    /// Checks whether a script pubkey is a p2tr output
    #[inline]
    pub fn is_v1_p2tr(&self) -> bool {
        matches!(self.witness_program(), Some((1, p)) if p.len() == 32)
    }

    /// Check if this is an OP_RETURN output
    pub fn is_op_return(&self) -> bool {
        !self.0.is_empty() && All::from(self.0[0]) == all::OP_RETURN
    }

    /// `(m, n)` of a bare `m <keys> n CHECKMULTISIG` script.
    fn multisig_params(&self) -> Option<(usize, usize)> {
        let ins = self.instructions().collect::<Result<Vec<_>, _>>().ok()?;
        if ins.len() < 4 || ins[ins.len() - 1] != Instruction::Op(all::OP_CHECKMULTISIG) {
            return None;
        }
        let m = usize::from(ins[0].small_int()?);
        let n = usize::from(ins[ins.len() - 2].small_int()?);
        let keys = &ins[1..ins.len() - 2];
        let all_keys = keys.iter().all(|ins| match *ins {
            Instruction::PushBytes(key) => key.len() == 33 || key.len() == 65,
            Instruction::Op(_) => false,
        });
        if m == 0 || m > n || keys.len() != n || !all_keys {
            return None;
        }
        Some((m, n))
    }

    /// Whether the script starts `<locktime> OP_CLTV OP_DROP` and has
    /// something after it.
    fn is_cltv_prefixed(&self) -> bool {
        let mut ins = self.instructions();
        let lock_push = match ins.next() {
            Some(Ok(Instruction::PushBytes(data))) => !data.is_empty(),
            Some(Ok(Instruction::Op(op))) => op.small_int().is_some(),
            _ => false,
        };
        lock_push
            && ins.next() == Some(Ok(Instruction::Op(all::OP_CLTV)))
            && ins.next() == Some(Ok(Instruction::Op(all::OP_DROP)))
            && ins.next().is_some()
    }

    /// The script as space-separated opcodes and hex pushes
    pub fn asm(&self) -> String {
        self.to_string()
    }

    /// Consensus encoding: the bytes behind a CompactInt length.
    pub fn serialize(&self) -> Vec<u8> {
        encode::serialize(self)
    }

    /// Reads a consensus-encoded script, failing on trailing bytes.
    pub fn try_deserialize(bytes: &[u8]) -> Result<Self, encode::Error> {
        encode::deserialize(bytes)
    }
}

/// A single step of a script, as read by [`Script::instructions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// Push of literal bytes, including the empty push `OP_0`
    PushBytes(&'a [u8]),
    /// Any other opcode, small-number pushes included
    Op(All),
}

impl<'a> Instruction<'a> {
    /// The number pushed by `OP_0` or `OP_1`..`OP_16`.
    fn small_int(&self) -> Option<u8> {
        match *self {
            Instruction::PushBytes(data) if data.is_empty() => Some(0),
            Instruction::PushBytes(_) => None,
            Instruction::Op(op) => op.small_int().filter(|&n| n > 0),
        }
    }
}

/// Iterator over the instructions of a script
#[derive(Debug, Clone)]
pub struct Instructions<'a> {
    data: &'a [u8],
}

impl<'a> Instructions<'a> {
    fn fail(&mut self) -> Option<Result<Instruction<'a>, Error>> {
        self.data = &[];
        Some(Err(Error::EndOfStream))
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let (&byte, rest) = self.data.split_first()?;
        let (len, rest) = match push_width(byte) {
            None if byte <= all::OP_PUSHBYTES_75.into_u8() => (usize::from(byte), rest),
            None => {
                self.data = rest;
                return Some(Ok(Instruction::Op(All::from(byte))));
            }
            Some(width) => {
                if rest.len() < width {
                    return self.fail();
                }
                (read_le(&rest[..width]), &rest[width..])
            }
        };
        if rest.len() < len {
            return self.fail();
        }
        let (push, rest) = rest.split_at(len);
        self.data = rest;
        Some(Ok(Instruction::PushBytes(push)))
    }
}

/// Width of the length field following a PUSHDATA opcode.
fn push_width(byte: u8) -> Option<usize> {
    match All::from(byte) {
        all::OP_PUSHDATA1 => Some(1),
        all::OP_PUSHDATA2 => Some(2),
        all::OP_PUSHDATA4 => Some(4),
        _ => None,
    }
}

fn read_le(bytes: &[u8]) -> usize {
    bytes.iter().rev().fold(0, |acc, &b| (acc << 8) | usize::from(b))
}

/// Writes the assembly decoding of the script bytes to the formatter.
pub(crate) fn bytes_to_asm_fmt(script: &[u8], f: &mut dyn fmt::Write) -> fmt::Result {
    let mut index = 0;
    while index < script.len() {
        if index > 0 {
            f.write_str(" ")?;
        }
        let opcode = All::from(script[index]);
        index += 1;

        let data_len = match push_width(opcode.into_u8()) {
            Some(width) => {
                if script.len() - index < width {
                    write!(f, "{:?} <unexpected end>", opcode)?;
                    break;
                }
                let len = read_le(&script[index..index + width]);
                index += width;
                Some(len)
            }
            None if opcode.into_u8() <= all::OP_PUSHBYTES_75.into_u8() => {
                Some(usize::from(opcode.into_u8()))
            }
            None => None,
        };

        match data_len {
            Some(0) if opcode == all::OP_PUSHBYTES_0 => f.write_str("OP_0")?,
            Some(len) => {
                write!(f, "{:?}", opcode)?;
                if script.len() - index < len {
                    f.write_str(" <push past end>")?;
                    break;
                }
                write!(f, " {:x}", script[index..index + len].as_hex())?;
                index += len;
            }
            None => write!(f, "{:?}", opcode)?,
        }
    }
    Ok(())
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use std::fmt::Formatter;

        if deserializer.is_human_readable() {
            struct Visitor;
            impl<'de> serde::de::Visitor<'de> for Visitor {
                type Value = Script;

                fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                    formatter.write_str("a script hex")
                }

                fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                where
                    E: serde::de::Error,
                {
                    Script::from_str(v).map_err(E::custom)
                }
            }
            deserializer.deserialize_str(Visitor)
        } else {
            struct BytesVisitor;
            impl<'de> serde::de::Visitor<'de> for BytesVisitor {
                type Value = Script;

                fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                    formatter.write_str("script bytes")
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: serde::de::Error,
                {
                    Ok(Script::from(v))
                }

                fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E>
                where
                    E: serde::de::Error,
                {
                    Ok(Script::from(v))
                }
            }
            deserializer.deserialize_bytes(BytesVisitor)
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(&format_args!("{:x}", self))
        } else {
            serializer.serialize_bytes(self.as_bytes())
        }
    }
}

impl Encodable for Script {
    #[inline]
    fn consensus_encode<W: Write>(&self, w: W) -> Result<usize, encode::Error> {
        self.as_bytes().consensus_encode(w)
    }
}

impl Decodable for Script {
    #[inline]
    fn consensus_decode<D: Read>(d: D) -> Result<Self, encode::Error> {
        Ok(Script::from(Vec::<u8>::consensus_decode(d)?))
    }
}

/// An object which can be used to construct a script piece by piece
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Builder(Vec<u8>, Option<All>);

impl Builder {
    /// Creates a new empty script
    pub fn new() -> Self {
        Builder(vec![], None)
    }

    /// The length in bytes of the script
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the script is the empty script
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds instructions to push an integer onto the stack, using the
    /// small-number opcodes where they exist.
    pub fn push_int(self, data: i64) -> Builder {
        match data {
            -1 => self.push_opcode(all::OP_PUSHNUM_NEG1),
            0 => self.push_opcode(all::OP_PUSHBYTES_0),
            1..=16 => self.push_opcode(All::from(data as u8 + all::OP_PUSHNUM_1.into_u8() - 1)),
            _ => self.push_scriptint(data),
        }
    }

    /// Adds instructions to push an integer as a script number, never using
    /// the small-number opcodes.
    pub fn push_scriptint(self, data: i64) -> Builder {
        self.push_slice(&num::encode_num(data))
    }

    /// Adds instructions to push some arbitrary data onto the stack
    pub fn push_slice(mut self, data: &[u8]) -> Builder {
        // Writing to a vector cannot fail.
        let _ = encode::push_encode_with_size(data, &mut self.0);
        self.1 = None;
        self
    }

    /// Pushes a compressed public key
    pub fn push_key(self, key: &PublicKey) -> Builder {
        self.push_slice(&key.serialize())
    }

    /// Pushes an x-only public key
    pub fn push_x_only_key(self, key: &XOnlyPublicKey) -> Builder {
        self.push_slice(&key.serialize())
    }

    /// Adds a single opcode to the script
    pub fn push_opcode(mut self, data: All) -> Builder {
        self.0.push(data.into_u8());
        self.1 = Some(data);
        self
    }

    /// Adds an `OP_VERIFY` to the script, or replaces the last opcode with
    /// its VERIFY form when one exists
    pub fn push_verify(mut self) -> Builder {
        let verify = match self.1 {
            Some(all::OP_EQUAL) => Some(all::OP_EQUALVERIFY),
            Some(all::OP_NUMEQUAL) => Some(all::OP_NUMEQUALVERIFY),
            Some(all::OP_CHECKSIG) => Some(all::OP_CHECKSIGVERIFY),
            Some(all::OP_CHECKMULTISIG) => Some(all::OP_CHECKMULTISIGVERIFY),
            _ => None,
        };
        match verify {
            Some(op) => {
                self.0.pop();
                self.push_opcode(op)
            }
            None => self.push_opcode(all::OP_VERIFY),
        }
    }

    /// Converts the `Builder` into an unmodifiable `Script`
    pub fn into_script(self) -> Script {
        Script::from(self.0)
    }
}

impl From<Vec<u8>> for Builder {
    fn from(v: Vec<u8>) -> Builder {
        let script = Script::from(v);
        let last_op = match script.instructions().last() {
            Some(Ok(Instruction::Op(op))) => Some(op),
            _ => None,
        };
        Builder(script.into_bytes(), last_op)
    }
}

/// Generates a typed wrapper around [`Script`].
macro_rules! script_wrapper {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Default, PartialOrd, Ord, PartialEq, Eq, Hash)]
        pub struct $name(Script);

        impl $name {
            /// The underlying script
            pub fn as_script(&self) -> &Script {
                &self.0
            }

            /// Unwraps the underlying script
            pub fn into_script(self) -> Script {
                self.0
            }

            /// Reads a consensus-encoded script, failing on trailing bytes.
            pub fn try_deserialize(bytes: &[u8]) -> Result<Self, encode::Error> {
                encode::deserialize(bytes)
            }
        }

        impl Deref for $name {
            type Target = Script;
            fn deref(&self) -> &Script {
                &self.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                self.0.as_bytes()
            }
        }

        impl From<Script> for $name {
            fn from(script: Script) -> $name {
                $name(script)
            }
        }

        impl From<Vec<u8>> for $name {
            fn from(v: Vec<u8>) -> $name {
                $name(Script::from(v))
            }
        }

        impl From<$name> for Script {
            fn from(wrapper: $name) -> Script {
                wrapper.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl fmt::LowerHex for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::LowerHex::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = HexToBytesError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Script::from_str(s).map($name)
            }
        }

        impl Encodable for $name {
            #[inline]
            fn consensus_encode<W: Write>(&self, w: W) -> Result<usize, encode::Error> {
                self.0.consensus_encode(w)
            }
        }

        impl Decodable for $name {
            #[inline]
            fn consensus_decode<D: Read>(d: D) -> Result<Self, encode::Error> {
                Script::consensus_decode(d).map($name)
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                serde::Serialize::serialize(&self.0, s)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                <Script as serde::Deserialize>::deserialize(d).map($name)
            }
        }
    };
}

script_wrapper! {
    /// The script locking a transaction output
    PubkeyScript
}

script_wrapper! {
    /// A script revealed by the last push of a P2SH signature script
    RedeemScript
}

script_wrapper! {
    /// The script in a transaction input, satisfying the output it spends
    SignatureScript
}

/// The standard output templates recognized by [`PubkeyScript::classify`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(crate = "actual_serde"))]
pub enum ScriptType {
    /// Anything else
    Unknown,
    /// `DUP HASH160 <20> EQUALVERIFY CHECKSIG`
    P2PKH,
    /// `HASH160 <20> EQUAL`
    P2SH,
    /// `0 <20>`
    P2WPKH,
    /// `0 <32>`
    P2WSH,
    /// `1 <32>`
    P2TR,
    /// `<pubkey> CHECKSIG`
    P2PK,
    /// `m <pubkeys> n CHECKMULTISIG`
    MultiSig,
    /// The empty script
    Empty,
    /// Starts with `OP_RETURN`, unspendable
    Return,
    /// `<locktime> CLTV DROP` ahead of another template
    CheckLocktimeVerify,
}

impl PubkeyScript {
    /// Recognizes the standard template this output script follows.
    pub fn classify(&self) -> ScriptType {
        if self.is_empty() {
            ScriptType::Empty
        } else if self.is_p2pkh() {
            ScriptType::P2PKH
        } else if self.is_p2sh() {
            ScriptType::P2SH
        } else if self.is_v0_p2wpkh() {
            ScriptType::P2WPKH
        } else if self.is_v0_p2wsh() {
            ScriptType::P2WSH
        } else if self.is_v1_p2tr() {
            ScriptType::P2TR
        } else if self.is_p2pk() {
            ScriptType::P2PK
        } else if self.is_op_return() {
            ScriptType::Return
        } else if self.multisig_params().is_some() {
            ScriptType::MultiSig
        } else if self.is_cltv_prefixed() {
            ScriptType::CheckLocktimeVerify
        } else {
            ScriptType::Unknown
        }
    }

    /// Generates P2PKH-type of scriptPubkey
    pub fn new_p2pkh(pubkey_hash: &hash160::Hash) -> Self {
        PubkeyScript(p2pkh_body(Builder::new(), pubkey_hash).into_script())
    }

    /// Generates P2SH-type of scriptPubkey with a given hash of the redeem script
    pub fn new_p2sh(script_hash: &hash160::Hash) -> Self {
        Builder::new()
            .push_opcode(all::OP_HASH160)
            .push_slice(&script_hash[..])
            .push_opcode(all::OP_EQUAL)
            .into_script()
            .into()
    }

    /// Generates P2WPKH-type of scriptPubkey
    pub fn new_p2wpkh(pubkey_hash: &hash160::Hash) -> Self {
        Self::new_witness_program(0, &pubkey_hash[..])
    }

    /// Generates P2WSH-type of scriptPubkey with a given hash of the witness script
    pub fn new_p2wsh(script_hash: &sha256::Hash) -> Self {
        Self::new_witness_program(0, &script_hash[..])
    }

    /// Generates P2TR-type of scriptPubkey from an already tweaked output key
    pub fn new_p2tr(output_key: &XOnlyPublicKey) -> Self {
        Self::new_witness_program(1, &output_key.serialize())
    }

    fn new_witness_program(version: i64, program: &[u8]) -> Self {
        Builder::new().push_int(version).push_slice(program).into_script().into()
    }

    /// Generates P2PK-type of scriptPubkey
    pub fn new_p2pk(pubkey: &PublicKey) -> Self {
        Builder::new().push_key(pubkey).push_opcode(all::OP_CHECKSIG).into_script().into()
    }

    /// Generates a bare `m`-of-`keys.len()` multisig output.
    ///
    /// Returns `None` unless `1 <= m <= keys.len() <= 16`.
    pub fn new_multisig(m: usize, keys: &[PublicKey]) -> Option<Self> {
        multisig_script(m, keys).map(PubkeyScript)
    }

    /// Generates OP_RETURN-type of scriptPubkey for the given data
    pub fn new_op_return(data: &[u8]) -> Self {
        Builder::new().push_opcode(all::OP_RETURN).push_slice(data).into_script().into()
    }

    /// Generates a P2PKH output that cannot be spent before `lock_time`.
    pub fn new_cltv_p2pkh(lock_time: LockTime, pubkey_hash: &hash160::Hash) -> Self {
        let builder = Builder::new()
            .push_int(i64::from(lock_time.to_consensus_u32()))
            .push_opcode(all::OP_CLTV)
            .push_opcode(all::OP_DROP);
        PubkeyScript(p2pkh_body(builder, pubkey_hash).into_script())
    }
}

fn p2pkh_body(builder: Builder, pubkey_hash: &hash160::Hash) -> Builder {
    builder
        .push_opcode(all::OP_DUP)
        .push_opcode(all::OP_HASH160)
        .push_slice(&pubkey_hash[..])
        .push_opcode(all::OP_EQUALVERIFY)
        .push_opcode(all::OP_CHECKSIG)
}

fn multisig_script(m: usize, keys: &[PublicKey]) -> Option<Script> {
    if m == 0 || m > keys.len() || keys.len() > 16 {
        return None;
    }
    let builder = keys.iter().fold(Builder::new().push_int(m as i64), |b, key| b.push_key(key));
    Some(builder.push_int(keys.len() as i64).push_opcode(all::OP_CHECKMULTISIG).into_script())
}

/// The templates recognized by [`RedeemScript::classify`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(crate = "actual_serde"))]
pub enum RedeemScriptType {
    /// Anything else
    Unknown,
    /// A v0 20-byte witness program, nested in P2SH
    P2shP2wpkh,
    /// A v0 32-byte witness program, nested in P2SH
    P2shP2wsh,
    /// `m <pubkeys> n CHECKMULTISIG`
    MultiSig,
    /// `<locktime> CLTV DROP` ahead of another template
    CheckLocktimeVerify,
    /// The empty script
    Empty,
}

impl RedeemScript {
    /// Recognizes the template this redeem script follows.
    pub fn classify(&self) -> RedeemScriptType {
        if self.is_empty() {
            RedeemScriptType::Empty
        } else if self.is_v0_p2wpkh() {
            RedeemScriptType::P2shP2wpkh
        } else if self.is_v0_p2wsh() {
            RedeemScriptType::P2shP2wsh
        } else if self.multisig_params().is_some() {
            RedeemScriptType::MultiSig
        } else if self.is_cltv_prefixed() {
            RedeemScriptType::CheckLocktimeVerify
        } else {
            RedeemScriptType::Unknown
        }
    }

    /// Counts signature operations, charging a multisig for the key count
    /// that precedes it.
    pub fn sigop_count(&self) -> usize {
        self.0.count_sigops(true)
    }

    /// Generates an `m`-of-`keys.len()` multisig redeem script.
    ///
    /// Returns `None` unless `1 <= m <= keys.len() <= 16`.
    pub fn new_multisig(m: usize, keys: &[PublicKey]) -> Option<Self> {
        multisig_script(m, keys).map(RedeemScript)
    }

    /// The P2SH output committing to this script.
    pub fn to_p2sh(&self) -> PubkeyScript {
        PubkeyScript::new_p2sh(&self.script_hash())
    }

    /// The P2WSH output committing to this script used as a witness script.
    pub fn to_p2wsh(&self) -> PubkeyScript {
        PubkeyScript::new_p2wsh(&self.wscript_hash())
    }
}

impl SignatureScript {
    /// Spends a P2PKH output.
    pub fn new_p2pkh(sig: &[u8], pubkey: &PublicKey) -> Self {
        Builder::new().push_slice(sig).push_key(pubkey).into_script().into()
    }

    /// Spends a P2PK output.
    pub fn new_p2pk(sig: &[u8]) -> Self {
        Builder::new().push_slice(sig).into_script().into()
    }

    /// Spends a bare multisig output, with the empty dummy element first.
    pub fn new_multisig(sigs: &[&[u8]]) -> Self {
        sigs.iter()
            .fold(Builder::new().push_opcode(all::OP_PUSHBYTES_0), |b, sig| b.push_slice(sig))
            .into_script()
            .into()
    }

    /// Spends a P2SH output: `pushes` then the redeem script itself.
    pub fn new_p2sh(pushes: &[&[u8]], redeem_script: &RedeemScript) -> Self {
        pushes
            .iter()
            .fold(Builder::new(), |b, data| b.push_slice(data))
            .push_slice(redeem_script.as_bytes())
            .into_script()
            .into()
    }

    /// The redeem script carried by the last push, if the script is push-only
    /// and ends in a data push.
    pub fn redeem_script(&self) -> Option<RedeemScript> {
        if !self.is_push_only() {
            return None;
        }
        match self.instructions().last()? {
            Ok(Instruction::PushBytes(data)) => Some(RedeemScript::from(data.to_vec())),
            _ => None,
        }
    }
}
