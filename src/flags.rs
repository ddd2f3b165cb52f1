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

//! Evaluation mode and verification flags
//!
//! The flag bits use the same values as libbitcoinconsensus so that a flag
//! word taken from an existing node configuration can be passed straight to
//! [`VerifyFlags::from_bits`].
//!

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

#[cfg(feature = "serde")] use serde::{Deserialize, Serialize};

/// Script evaluation mode, the "signature version" of a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "actual_serde"))]
pub enum Mode {
    /// Bare scripts and P2SH redeem scripts.
    Legacy,
    /// BIP141 witness version 0 scripts.
    WitnessV0,
    /// BIP342 tapscript leaves.
    Tapscript,
}

impl Mode {
    /// Whether the 10,000 byte script limit and the 201 operation budget apply.
    #[inline]
    pub fn is_size_limited(self) -> bool {
        self != Mode::Tapscript
    }

    /// Whether legacy signature removal (FindAndDelete) applies.
    #[inline]
    pub fn is_legacy(self) -> bool {
        self == Mode::Legacy
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Mode::Legacy => f.write_str("legacy"),
            Mode::WitnessV0 => f.write_str("witness-v0"),
            Mode::Tapscript => f.write_str("tapscript"),
        }
    }
}

/// Evaluate P2SH subscripts (BIP16).
pub const VERIFY_P2SH: u32 = 1 << 0;
/// Enforce strict encoding of signatures and public keys.
pub const VERIFY_STRICTENC: u32 = 1 << 1;
/// Enforce strict DER signatures (BIP66).
pub const VERIFY_DERSIG: u32 = 1 << 2;
/// Enforce low-S signatures.
pub const VERIFY_LOW_S: u32 = 1 << 3;
/// The dummy element of CHECKMULTISIG must be empty (BIP147).
pub const VERIFY_NULLDUMMY: u32 = 1 << 4;
/// Signature scripts must be push-only.
pub const VERIFY_SIGPUSHONLY: u32 = 1 << 5;
/// Pushes and script numbers must be minimally encoded.
pub const VERIFY_MINIMALDATA: u32 = 1 << 6;
/// Fail on executed NOP1 and NOP4 to NOP10.
pub const VERIFY_DISCOURAGE_UPGRADABLE_NOPS: u32 = 1 << 7;
/// Exactly one element must remain on the stack after evaluation.
pub const VERIFY_CLEANSTACK: u32 = 1 << 8;
/// Enable OP_CHECKLOCKTIMEVERIFY (BIP65).
pub const VERIFY_CHECKLOCKTIMEVERIFY: u32 = 1 << 9;
/// Enable OP_CHECKSEQUENCEVERIFY (BIP112).
pub const VERIFY_CHECKSEQUENCEVERIFY: u32 = 1 << 10;
/// Evaluate segregated witness programs (BIP141).
pub const VERIFY_WITNESS: u32 = 1 << 11;
/// The argument of IF/NOTIF must be empty or `[0x01]` in witness v0.
pub const VERIFY_MINIMALIF: u32 = 1 << 13;
/// Failed signature checks require empty signatures.
pub const VERIFY_NULLFAIL: u32 = 1 << 14;
/// Public keys checked in witness v0 scripts must be compressed.
pub const VERIFY_WITNESS_PUBKEYTYPE: u32 = 1 << 15;

/// Every flag this crate understands.
pub const VERIFY_ALL: u32 = VERIFY_P2SH
    | VERIFY_STRICTENC
    | VERIFY_DERSIG
    | VERIFY_LOW_S
    | VERIFY_NULLDUMMY
    | VERIFY_SIGPUSHONLY
    | VERIFY_MINIMALDATA
    | VERIFY_DISCOURAGE_UPGRADABLE_NOPS
    | VERIFY_CLEANSTACK
    | VERIFY_CHECKLOCKTIMEVERIFY
    | VERIFY_CHECKSEQUENCEVERIFY
    | VERIFY_WITNESS
    | VERIFY_MINIMALIF
    | VERIFY_NULLFAIL
    | VERIFY_WITNESS_PUBKEYTYPE;

/// The flags that are consensus rules on mainnet today.
pub const VERIFY_CONSENSUS: u32 = VERIFY_P2SH
    | VERIFY_DERSIG
    | VERIFY_NULLDUMMY
    | VERIFY_CHECKLOCKTIMEVERIFY
    | VERIFY_CHECKSEQUENCEVERIFY
    | VERIFY_WITNESS;

/// A flag word contained bits this crate does not know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownFlags(pub u32);

impl fmt::Display for UnknownFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown verification flags: 0x{:08x}", self.0)
    }
}

impl std::error::Error for UnknownFlags {}

/// A read-only bundle of verification switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "actual_serde"))]
pub struct VerifyFlags(u32);

impl VerifyFlags {
    /// No flags at all.
    pub const NONE: VerifyFlags = VerifyFlags(0);

    /// Builds a flag set, rejecting unknown bits and adding implied ones.
    pub fn from_bits(bits: u32) -> Result<Self, UnknownFlags> {
        if bits & !VERIFY_ALL != 0 {
            return Err(UnknownFlags(bits & !VERIFY_ALL));
        }
        Ok(VerifyFlags(Self::apply_implied_bits(bits)))
    }

    /// The current consensus flag set.
    pub fn consensus() -> Self {
        VerifyFlags(VERIFY_CONSENSUS)
    }

    /// Every supported flag, the strictest policy this crate can express.
    pub fn all() -> Self {
        VerifyFlags(VERIFY_ALL)
    }

    /// The raw flag word.
    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `flag` is set.
    #[inline]
    pub fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    fn apply_implied_bits(mut bits: u32) -> u32 {
        if bits & VERIFY_WITNESS != 0 {
            bits |= VERIFY_P2SH;
        }
        if bits & VERIFY_CLEANSTACK != 0 {
            bits |= VERIFY_P2SH;
        }
        bits
    }
}

impl BitOr<u32> for VerifyFlags {
    type Output = VerifyFlags;

    fn bitor(self, rhs: u32) -> VerifyFlags {
        VerifyFlags(Self::apply_implied_bits((self.0 | rhs) & VERIFY_ALL))
    }
}

impl BitOrAssign<u32> for VerifyFlags {
    fn bitor_assign(&mut self, rhs: u32) {
        *self = *self | rhs;
    }
}
