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

//! Opcodes
//!
//! Bitcoin's script uses a stack-based assembly language. This module defines
//! every byte of the opcode table and how each byte is classified under the
//! three evaluation [`Mode`]s.
//!

#![allow(non_camel_case_types)]

use std::fmt;

use crate::Mode;

// Note: I am deliberately not implementing PartialOrd or Ord on the
//       opcode type. If you want to check ranges of opcodes, etc.,
//       write an #[inline] helper function which casts to u8s.

/// A script Opcode
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct All {
    code: u8,
}

/// Builds the constant table together with the mnemonic lookup used by `Debug`.
macro_rules! opcode_table {
    ($($(#[$doc:meta])* $op:ident = $code:literal, $name:literal;)*) => {
        pub mod all {
            //! Constants associated with All type
            use super::All;

            pub use super::push::*;

            $(
                $(#[$doc])*
                pub const $op: All = All { code: $code };
            )*
        }

        impl All {
            fn mnemonic(self) -> Option<&'static str> {
                match self.code {
                    $( $code => Some($name), )*
                    _ => None,
                }
            }
        }
    };
}

/// Data-push opcodes `0x00..=0x4b` carry their payload length in the opcode itself.
macro_rules! push_bytes_table {
    ($($op:ident = $n:literal;)*) => {
        mod push {
            use super::All;

            $(
                #[doc = concat!("Push the next ", stringify!($n), " bytes as an array onto the stack")]
                pub const $op: All = All { code: $n };
            )*
        }
    };
}

push_bytes_table! {
    OP_PUSHBYTES_0 = 0; OP_PUSHBYTES_1 = 1; OP_PUSHBYTES_2 = 2; OP_PUSHBYTES_3 = 3;
    OP_PUSHBYTES_4 = 4; OP_PUSHBYTES_5 = 5; OP_PUSHBYTES_6 = 6; OP_PUSHBYTES_7 = 7;
    OP_PUSHBYTES_8 = 8; OP_PUSHBYTES_9 = 9; OP_PUSHBYTES_10 = 10; OP_PUSHBYTES_11 = 11;
    OP_PUSHBYTES_12 = 12; OP_PUSHBYTES_13 = 13; OP_PUSHBYTES_14 = 14; OP_PUSHBYTES_15 = 15;
    OP_PUSHBYTES_16 = 16; OP_PUSHBYTES_17 = 17; OP_PUSHBYTES_18 = 18; OP_PUSHBYTES_19 = 19;
    OP_PUSHBYTES_20 = 20; OP_PUSHBYTES_21 = 21; OP_PUSHBYTES_22 = 22; OP_PUSHBYTES_23 = 23;
    OP_PUSHBYTES_24 = 24; OP_PUSHBYTES_25 = 25; OP_PUSHBYTES_26 = 26; OP_PUSHBYTES_27 = 27;
    OP_PUSHBYTES_28 = 28; OP_PUSHBYTES_29 = 29; OP_PUSHBYTES_30 = 30; OP_PUSHBYTES_31 = 31;
    OP_PUSHBYTES_32 = 32; OP_PUSHBYTES_33 = 33; OP_PUSHBYTES_34 = 34; OP_PUSHBYTES_35 = 35;
    OP_PUSHBYTES_36 = 36; OP_PUSHBYTES_37 = 37; OP_PUSHBYTES_38 = 38; OP_PUSHBYTES_39 = 39;
    OP_PUSHBYTES_40 = 40; OP_PUSHBYTES_41 = 41; OP_PUSHBYTES_42 = 42; OP_PUSHBYTES_43 = 43;
    OP_PUSHBYTES_44 = 44; OP_PUSHBYTES_45 = 45; OP_PUSHBYTES_46 = 46; OP_PUSHBYTES_47 = 47;
    OP_PUSHBYTES_48 = 48; OP_PUSHBYTES_49 = 49; OP_PUSHBYTES_50 = 50; OP_PUSHBYTES_51 = 51;
    OP_PUSHBYTES_52 = 52; OP_PUSHBYTES_53 = 53; OP_PUSHBYTES_54 = 54; OP_PUSHBYTES_55 = 55;
    OP_PUSHBYTES_56 = 56; OP_PUSHBYTES_57 = 57; OP_PUSHBYTES_58 = 58; OP_PUSHBYTES_59 = 59;
    OP_PUSHBYTES_60 = 60; OP_PUSHBYTES_61 = 61; OP_PUSHBYTES_62 = 62; OP_PUSHBYTES_63 = 63;
    OP_PUSHBYTES_64 = 64; OP_PUSHBYTES_65 = 65; OP_PUSHBYTES_66 = 66; OP_PUSHBYTES_67 = 67;
    OP_PUSHBYTES_68 = 68; OP_PUSHBYTES_69 = 69; OP_PUSHBYTES_70 = 70; OP_PUSHBYTES_71 = 71;
    OP_PUSHBYTES_72 = 72; OP_PUSHBYTES_73 = 73; OP_PUSHBYTES_74 = 74; OP_PUSHBYTES_75 = 75;
}

opcode_table! {
    /// Read the next byte as N; push the next N bytes as an array onto the stack
    OP_PUSHDATA1 = 0x4c, "PUSHDATA1";
    /// Read the next 2 bytes as N; push the next N bytes as an array onto the stack
    OP_PUSHDATA2 = 0x4d, "PUSHDATA2";
    /// Read the next 4 bytes as N; push the next N bytes as an array onto the stack
    OP_PUSHDATA4 = 0x4e, "PUSHDATA4";
    /// Push the array `0x81` onto the stack
    OP_PUSHNUM_NEG1 = 0x4f, "PUSHNUM_NEG1";
    /// Fails the script when executed; `OP_SUCCESS80` in tapscript
    OP_RESERVED = 0x50, "RESERVED";
    /// Push the number 1 onto the stack
    OP_PUSHNUM_1 = 0x51, "PUSHNUM_1";
    /// Push the number 2 onto the stack
    OP_PUSHNUM_2 = 0x52, "PUSHNUM_2";
    /// Push the number 3 onto the stack
    OP_PUSHNUM_3 = 0x53, "PUSHNUM_3";
    /// Push the number 4 onto the stack
    OP_PUSHNUM_4 = 0x54, "PUSHNUM_4";
    /// Push the number 5 onto the stack
    OP_PUSHNUM_5 = 0x55, "PUSHNUM_5";
    /// Push the number 6 onto the stack
    OP_PUSHNUM_6 = 0x56, "PUSHNUM_6";
    /// Push the number 7 onto the stack
    OP_PUSHNUM_7 = 0x57, "PUSHNUM_7";
    /// Push the number 8 onto the stack
    OP_PUSHNUM_8 = 0x58, "PUSHNUM_8";
    /// Push the number 9 onto the stack
    OP_PUSHNUM_9 = 0x59, "PUSHNUM_9";
    /// Push the number 10 onto the stack
    OP_PUSHNUM_10 = 0x5a, "PUSHNUM_10";
    /// Push the number 11 onto the stack
    OP_PUSHNUM_11 = 0x5b, "PUSHNUM_11";
    /// Push the number 12 onto the stack
    OP_PUSHNUM_12 = 0x5c, "PUSHNUM_12";
    /// Push the number 13 onto the stack
    OP_PUSHNUM_13 = 0x5d, "PUSHNUM_13";
    /// Push the number 14 onto the stack
    OP_PUSHNUM_14 = 0x5e, "PUSHNUM_14";
    /// Push the number 15 onto the stack
    OP_PUSHNUM_15 = 0x5f, "PUSHNUM_15";
    /// Push the number 16 onto the stack
    OP_PUSHNUM_16 = 0x60, "PUSHNUM_16";
    /// Does nothing
    OP_NOP = 0x61, "NOP";
    /// Fails the script when executed; `OP_SUCCESS98` in tapscript
    OP_VER = 0x62, "VER";
    /// Pop and execute the next statements if a nonzero element was popped
    OP_IF = 0x63, "IF";
    /// Pop and execute the next statements if a zero element was popped
    OP_NOTIF = 0x64, "NOTIF";
    /// Fails the script even if it is not executed
    OP_VERIF = 0x65, "VERIF";
    /// Fails the script even if it is not executed
    OP_VERNOTIF = 0x66, "VERNOTIF";
    /// Execute statements if those after the previous OP_IF were not, and vice-versa.
    OP_ELSE = 0x67, "ELSE";
    /// End a conditional block
    OP_ENDIF = 0x68, "ENDIF";
    /// If the top value is zero or the stack is empty, fail; otherwise, pop the stack
    OP_VERIFY = 0x69, "VERIFY";
    /// Fail the script immediately
    OP_RETURN = 0x6a, "RETURN";
    /// Pop one element from the main stack onto the alt stack
    OP_TOALTSTACK = 0x6b, "TOALTSTACK";
    /// Pop one element from the alt stack onto the main stack
    OP_FROMALTSTACK = 0x6c, "FROMALTSTACK";
    /// Drops the top two stack items
    OP_2DROP = 0x6d, "2DROP";
    /// Duplicates the top two stack items as AB -> ABAB
    OP_2DUP = 0x6e, "2DUP";
    /// Duplicates the top three stack items as ABC -> ABCABC
    OP_3DUP = 0x6f, "3DUP";
    /// Copies the two stack items of items two spaces back to the front, as xxAB -> ABxxAB
    OP_2OVER = 0x70, "2OVER";
    /// Moves the two stack items four spaces back to the front, as xxxxAB -> ABxxxx
    OP_2ROT = 0x71, "2ROT";
    /// Swaps the top two pairs, as ABCD -> CDAB
    OP_2SWAP = 0x72, "2SWAP";
    /// Duplicate the top stack element unless it is zero
    OP_IFDUP = 0x73, "IFDUP";
    /// Push the current number of stack items onto the stack
    OP_DEPTH = 0x74, "DEPTH";
    /// Drops the top stack item
    OP_DROP = 0x75, "DROP";
    /// Duplicates the top stack item
    OP_DUP = 0x76, "DUP";
    /// Drops the second-to-top stack item
    OP_NIP = 0x77, "NIP";
    /// Copies the second-to-top stack item, as xA -> AxA
    OP_OVER = 0x78, "OVER";
    /// Pop the top stack element as N. Copy the Nth stack element to the top
    OP_PICK = 0x79, "PICK";
    /// Pop the top stack element as N. Move the Nth stack element to the top
    OP_ROLL = 0x7a, "ROLL";
    /// Rotate the top three stack items, as [top next1 next2] -> [next2 top next1]
    OP_ROT = 0x7b, "ROT";
    /// Swap the top two stack items
    OP_SWAP = 0x7c, "SWAP";
    /// Copy the top stack item to before the second item, as [top next] -> [top next top]
    OP_TUCK = 0x7d, "TUCK";
    /// Disabled; `OP_SUCCESS126` in tapscript
    OP_CAT = 0x7e, "CAT";
    /// Disabled; `OP_SUCCESS127` in tapscript
    OP_SUBSTR = 0x7f, "SUBSTR";
    /// Disabled; `OP_SUCCESS128` in tapscript
    OP_LEFT = 0x80, "LEFT";
    /// Disabled; `OP_SUCCESS129` in tapscript
    OP_RIGHT = 0x81, "RIGHT";
    /// Pushes the length of the top stack item onto the stack
    OP_SIZE = 0x82, "SIZE";
    /// Disabled; `OP_SUCCESS131` in tapscript
    OP_INVERT = 0x83, "INVERT";
    /// Disabled; `OP_SUCCESS132` in tapscript
    OP_AND = 0x84, "AND";
    /// Disabled; `OP_SUCCESS133` in tapscript
    OP_OR = 0x85, "OR";
    /// Disabled; `OP_SUCCESS134` in tapscript
    OP_XOR = 0x86, "XOR";
    /// Pushes 1 if the inputs are exactly equal, 0 otherwise
    OP_EQUAL = 0x87, "EQUAL";
    /// Returns success if the inputs are exactly equal, failure otherwise
    OP_EQUALVERIFY = 0x88, "EQUALVERIFY";
    /// Fails the script when executed; `OP_SUCCESS137` in tapscript
    OP_RESERVED1 = 0x89, "RESERVED1";
    /// Fails the script when executed; `OP_SUCCESS138` in tapscript
    OP_RESERVED2 = 0x8a, "RESERVED2";
    /// Increment the top stack element in place
    OP_1ADD = 0x8b, "1ADD";
    /// Decrement the top stack element in place
    OP_1SUB = 0x8c, "1SUB";
    /// Disabled; `OP_SUCCESS141` in tapscript
    OP_2MUL = 0x8d, "2MUL";
    /// Disabled; `OP_SUCCESS142` in tapscript
    OP_2DIV = 0x8e, "2DIV";
    /// Multiply the top stack item by -1 in place
    OP_NEGATE = 0x8f, "NEGATE";
    /// Absolute value the top stack item in place
    OP_ABS = 0x90, "ABS";
    /// Map 0 to 1 and everything else to 0, in place
    OP_NOT = 0x91, "NOT";
    /// Map 0 to 0 and everything else to 1, in place
    OP_0NOTEQUAL = 0x92, "0NOTEQUAL";
    /// Pop two stack items and push their sum
    OP_ADD = 0x93, "ADD";
    /// Pop two stack items and push the second minus the top
    OP_SUB = 0x94, "SUB";
    /// Disabled; `OP_SUCCESS149` in tapscript
    OP_MUL = 0x95, "MUL";
    /// Disabled; `OP_SUCCESS150` in tapscript
    OP_DIV = 0x96, "DIV";
    /// Disabled; `OP_SUCCESS151` in tapscript
    OP_MOD = 0x97, "MOD";
    /// Disabled; `OP_SUCCESS152` in tapscript
    OP_LSHIFT = 0x98, "LSHIFT";
    /// Disabled; `OP_SUCCESS153` in tapscript
    OP_RSHIFT = 0x99, "RSHIFT";
    /// Pop the top two stack items and push 1 if both are nonzero, else push 0
    OP_BOOLAND = 0x9a, "BOOLAND";
    /// Pop the top two stack items and push 1 if either is nonzero, else push 0
    OP_BOOLOR = 0x9b, "BOOLOR";
    /// Pop the top two stack items and push 1 if both are numerically equal, else push 0
    OP_NUMEQUAL = 0x9c, "NUMEQUAL";
    /// Pop the top two stack items and return success if both are numerically equal, else return failure
    OP_NUMEQUALVERIFY = 0x9d, "NUMEQUALVERIFY";
    /// Pop the top two stack items and push 0 if both are numerically equal, else push 1
    OP_NUMNOTEQUAL = 0x9e, "NUMNOTEQUAL";
    /// Pop the top two items; push 1 if the second is less than the top, 0 otherwise
    OP_LESSTHAN = 0x9f, "LESSTHAN";
    /// Pop the top two items; push 1 if the second is greater than the top, 0 otherwise
    OP_GREATERTHAN = 0xa0, "GREATERTHAN";
    /// Pop the top two items; push 1 if the second is <= the top, 0 otherwise
    OP_LESSTHANOREQUAL = 0xa1, "LESSTHANOREQUAL";
    /// Pop the top two items; push 1 if the second is >= the top, 0 otherwise
    OP_GREATERTHANOREQUAL = 0xa2, "GREATERTHANOREQUAL";
    /// Pop the top two items; push the smaller
    OP_MIN = 0xa3, "MIN";
    /// Pop the top two items; push the larger
    OP_MAX = 0xa4, "MAX";
    /// Pop the top three items; if the top is >= the second and < the third, push 1, otherwise push 0
    OP_WITHIN = 0xa5, "WITHIN";
    /// Pop the top stack item and push its RIPEMD160 hash
    OP_RIPEMD160 = 0xa6, "RIPEMD160";
    /// Pop the top stack item and push its SHA1 hash
    OP_SHA1 = 0xa7, "SHA1";
    /// Pop the top stack item and push its SHA256 hash
    OP_SHA256 = 0xa8, "SHA256";
    /// Pop the top stack item and push its RIPEMD(SHA256) hash
    OP_HASH160 = 0xa9, "HASH160";
    /// Pop the top stack item and push its SHA256(SHA256) hash
    OP_HASH256 = 0xaa, "HASH256";
    /// Ignore this and everything preceding when deciding what to sign when signature-checking
    OP_CODESEPARATOR = 0xab, "CODESEPARATOR";
    /// Pop a public key and a signature; push 1 for a valid signature, 0 otherwise
    OP_CHECKSIG = 0xac, "CHECKSIG";
    /// Like `OP_CHECKSIG` but fail the script on an invalid signature
    OP_CHECKSIGVERIFY = 0xad, "CHECKSIGVERIFY";
    /// Pop N, N pubkeys, M, M signatures and a dummy, and push 1 if all M signatures are valid
    OP_CHECKMULTISIG = 0xae, "CHECKMULTISIG";
    /// Like `OP_CHECKMULTISIG` but fail the script on failure
    OP_CHECKMULTISIGVERIFY = 0xaf, "CHECKMULTISIGVERIFY";
    /// Does nothing
    OP_NOP1 = 0xb0, "NOP1";
    /// <https://github.com/bitcoin/bips/blob/master/bip-0065.mediawiki>
    OP_CLTV = 0xb1, "CLTV";
    /// <https://github.com/bitcoin/bips/blob/master/bip-0112.mediawiki>
    OP_CSV = 0xb2, "CSV";
    /// Does nothing
    OP_NOP4 = 0xb3, "NOP4";
    /// Does nothing
    OP_NOP5 = 0xb4, "NOP5";
    /// Does nothing
    OP_NOP6 = 0xb5, "NOP6";
    /// Does nothing
    OP_NOP7 = 0xb6, "NOP7";
    /// Does nothing
    OP_NOP8 = 0xb7, "NOP8";
    /// Does nothing
    OP_NOP9 = 0xb8, "NOP9";
    /// Does nothing
    OP_NOP10 = 0xb9, "NOP10";
    /// BIP342 signature counter; only valid in tapscript
    OP_CHECKSIGADD = 0xba, "CHECKSIGADD";
    /// Not an opcode in any context
    OP_INVALIDOPCODE = 0xff, "INVALIDOPCODE";
}

/// Empty stack is also FALSE
pub static OP_FALSE: All = all::OP_PUSHBYTES_0;
/// Number 1 is also TRUE
pub static OP_TRUE: All = all::OP_PUSHNUM_1;
/// previously called OP_NOP2
pub static OP_NOP2: All = all::OP_CLTV;
/// previously called OP_NOP3
pub static OP_NOP3: All = all::OP_CSV;

impl fmt::Debug for All {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("OP_")?;
        match self.code {
            x if x <= 75 => write!(f, "PUSHBYTES_{}", x),
            x => match self.mnemonic() {
                Some(name) => f.write_str(name),
                None => write!(f, "RETURN_{}", x),
            },
        }
    }
}

impl fmt::Display for All {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for All {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl All {
    /// Classifies an Opcode into a broad class under the given evaluation mode.
    #[inline]
    pub fn classify(self, mode: Mode) -> Class {
        use self::all::*;
        match (self, mode) {
            // fail even inside an unexecuted branch, whatever the mode
            (OP_VERIF, _) | (OP_VERNOTIF, _) => Class::IllegalOp,
            (OP_INVALIDOPCODE, _) => Class::UndefinedOp,

            (op, Mode::Tapscript) if op.is_op_success() => Class::SuccessOp,

            // every disabled opcode is an OP_SUCCESS in tapscript, so only
            // legacy and witness v0 reach this arm
            (op, _) if op.is_disabled() => Class::DisabledOp,
            (op, _) if op.code > OP_CHECKSIGADD.code => Class::UndefinedOp,

            (OP_NOP, _) => Class::NoOp,
            (OP_CLTV, _) => Class::Ordinary(Ordinary::OP_CLTV),
            (OP_CSV, _) => Class::Ordinary(Ordinary::OP_CSV),
            (op, _) if op.code >= OP_NOP1.code && op.code <= OP_NOP10.code => Class::NoOp,

            (OP_RETURN, _) => Class::ReturnOp,
            (OP_RESERVED, _) | (OP_VER, _) | (OP_RESERVED1, _) | (OP_RESERVED2, _) => Class::ReturnOp,
            (OP_CHECKMULTISIG, Mode::Tapscript) | (OP_CHECKMULTISIGVERIFY, Mode::Tapscript) => {
                Class::ReturnOp
            }

            (OP_PUSHNUM_NEG1, _) => Class::PushNum(-1),
            (op, _) if op.code >= OP_PUSHNUM_1.code && op.code <= OP_PUSHNUM_16.code => {
                Class::PushNum(1 + i32::from(self.code) - i32::from(OP_PUSHNUM_1.code))
            }
            (op, _) if op.code <= OP_PUSHBYTES_75.code => Class::PushBytes(u32::from(self.code)),

            (_, _) => Ordinary::try_from_all(self).map_or(Class::UndefinedOp, Class::Ordinary),
        }
    }

    /// Whether this byte is one of the BIP342 `OP_SUCCESSx` opcodes.
    #[inline]
    pub fn is_op_success(self) -> bool {
        matches!(
            self.code,
            80 | 98 | 126..=129 | 131..=134 | 137..=138 | 141..=142 | 149..=153 | 187..=254
        )
    }

    /// Whether this opcode was disabled in legacy script.
    #[inline]
    pub fn is_disabled(self) -> bool {
        use self::all::*;
        matches!(
            self,
            OP_CAT | OP_SUBSTR | OP_LEFT | OP_RIGHT | OP_INVERT | OP_AND | OP_OR | OP_XOR
                | OP_2MUL | OP_2DIV | OP_MUL | OP_DIV | OP_MOD | OP_LSHIFT | OP_RSHIFT
        )
    }

    /// Whether executing this opcode counts against the 201 operation budget.
    ///
    /// Pushes, including the small-number pushes and `OP_RESERVED`, are free.
    #[inline]
    pub fn charges_op_count(self) -> bool {
        self.code > all::OP_PUSHNUM_16.code
    }

    /// The small integer pushed by `OP_0` or `OP_1` to `OP_16`, if this is one of them.
    #[inline]
    pub fn small_int(self) -> Option<u8> {
        match self.code {
            0 => Some(0),
            x if x >= all::OP_PUSHNUM_1.code && x <= all::OP_PUSHNUM_16.code => {
                Some(x - all::OP_PUSHNUM_1.code + 1)
            }
            _ => None,
        }
    }

    /// Encode as a byte
    #[inline]
    pub fn into_u8(self) -> u8 {
        self.code
    }
}

impl From<u8> for All {
    #[inline]
    fn from(b: u8) -> All {
        All {code: b}
    }
}

/// Broad categories of opcodes with similar behavior
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Class {
    /// Pushes the given number onto the stack
    PushNum(i32),
    /// Pushes the given number of bytes onto the stack
    PushBytes(u32),
    /// Fails the script if executed
    ReturnOp,
    /// Succeeds the script even if not executed.
    SuccessOp,
    /// Fails the script even if not executed
    IllegalOp,
    /// Disabled opcode; fails the script even if not executed
    DisabledOp,
    /// Byte with no opcode assigned in this mode
    UndefinedOp,
    /// Does nothing
    NoOp,
    /// Any opcode not covered above
    Ordinary(Ordinary)
}

macro_rules! ordinary_opcode {
    ($($op:ident),*) => (
        #[repr(u8)]
        #[doc(hidden)]
        #[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
        pub enum Ordinary {
            $( $op = all::$op.code ),*
        }

        impl Ordinary {
            /// Try to create from an All
            pub fn try_from_all(b: All) -> Option<Self> {
                match b {
                    $( all::$op => { Some(Ordinary::$op) } ),*
                    _ => None,
                }
            }
        }
    );
}

// "Ordinary" opcodes: everything with real behaviour that is not a push
ordinary_opcode! {
    // pushdata
    OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4,
    // control flow
    OP_IF, OP_NOTIF, OP_ELSE, OP_ENDIF, OP_VERIFY,
    // stack
    OP_TOALTSTACK, OP_FROMALTSTACK,
    OP_2DROP, OP_2DUP, OP_3DUP, OP_2OVER, OP_2ROT, OP_2SWAP,
    OP_DROP, OP_DUP, OP_NIP, OP_OVER, OP_PICK, OP_ROLL, OP_ROT, OP_SWAP, OP_TUCK,
    OP_IFDUP, OP_DEPTH, OP_SIZE,
    // equality
    OP_EQUAL, OP_EQUALVERIFY,
    // arithmetic
    OP_1ADD, OP_1SUB, OP_NEGATE, OP_ABS, OP_NOT, OP_0NOTEQUAL,
    OP_ADD, OP_SUB, OP_BOOLAND, OP_BOOLOR,
    OP_NUMEQUAL, OP_NUMEQUALVERIFY, OP_NUMNOTEQUAL, OP_LESSTHAN,
    OP_GREATERTHAN, OP_LESSTHANOREQUAL, OP_GREATERTHANOREQUAL,
    OP_MIN, OP_MAX, OP_WITHIN,
    // crypto
    OP_RIPEMD160, OP_SHA1, OP_SHA256, OP_HASH160, OP_HASH256,
    OP_CODESEPARATOR, OP_CHECKSIG, OP_CHECKSIGVERIFY,
    OP_CHECKMULTISIG, OP_CHECKMULTISIGVERIFY, OP_CHECKSIGADD,
    // locktime
    OP_CLTV, OP_CSV
}

impl Ordinary {
    /// Encode as a byte
    #[inline]
    pub fn into_u8(self) -> u8 {
        self as u8
    }

    /// The opcode this ordinary opcode stands for.
    #[inline]
    pub fn to_all(self) -> All {
        All::from(self.into_u8())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn str_roundtrip() {
        let mut unique = HashSet::new();
        for b in 0..=255u8 {
            let op = All::from(b);
            assert_eq!(op.into_u8(), b);
            let s1 = format!("{}", op);
            let s2 = format!("{:?}", op);
            assert_eq!(s1, s2);
            assert!(unique.insert(s1));
        }
        assert_eq!(unique.len(), 256);

        assert_eq!(format!("{}", all::OP_PUSHBYTES_0), "OP_PUSHBYTES_0");
        assert_eq!(format!("{}", all::OP_PUSHBYTES_75), "OP_PUSHBYTES_75");
        assert_eq!(format!("{}", all::OP_CHECKSIGADD), "OP_CHECKSIGADD");
        assert_eq!(format!("{}", All::from(0xbb)), "OP_RETURN_187");
        assert_eq!(format!("{}", all::OP_INVALIDOPCODE), "OP_INVALIDOPCODE");
    }

    #[test]
    fn success_set() {
        let expected: Vec<u8> = [80u8, 98]
            .iter()
            .copied()
            .chain(126..=129)
            .chain(131..=134)
            .chain(137..=138)
            .chain(141..=142)
            .chain(149..=153)
            .chain(187..=254)
            .collect();
        let got: Vec<u8> = (0..=255u8).filter(|b| All::from(*b).is_op_success()).collect();
        assert_eq!(got, expected);
        for b in got {
            assert_eq!(All::from(b).classify(Mode::Tapscript), Class::SuccessOp);
            assert_ne!(All::from(b).classify(Mode::Legacy), Class::SuccessOp);
            assert_ne!(All::from(b).classify(Mode::WitnessV0), Class::SuccessOp);
        }
    }

    #[test]
    fn classify_legacy() {
        let ctx = Mode::Legacy;
        assert_eq!(all::OP_PUSHBYTES_0.classify(ctx), Class::PushBytes(0));
        assert_eq!(all::OP_PUSHBYTES_75.classify(ctx), Class::PushBytes(75));
        assert_eq!(all::OP_PUSHNUM_NEG1.classify(ctx), Class::PushNum(-1));
        assert_eq!(all::OP_PUSHNUM_16.classify(ctx), Class::PushNum(16));
        assert_eq!(all::OP_VERIF.classify(ctx), Class::IllegalOp);
        assert_eq!(all::OP_VERNOTIF.classify(ctx), Class::IllegalOp);
        assert_eq!(all::OP_CAT.classify(ctx), Class::DisabledOp);
        assert_eq!(all::OP_RSHIFT.classify(ctx), Class::DisabledOp);
        assert_eq!(all::OP_RESERVED.classify(ctx), Class::ReturnOp);
        assert_eq!(all::OP_VER.classify(ctx), Class::ReturnOp);
        assert_eq!(all::OP_RETURN.classify(ctx), Class::ReturnOp);
        assert_eq!(all::OP_NOP.classify(ctx), Class::NoOp);
        assert_eq!(all::OP_NOP10.classify(ctx), Class::NoOp);
        assert_eq!(all::OP_CLTV.classify(ctx), Class::Ordinary(Ordinary::OP_CLTV));
        assert_eq!(all::OP_CSV.classify(ctx), Class::Ordinary(Ordinary::OP_CSV));
        assert_eq!(all::OP_CHECKSIGADD.classify(ctx), Class::Ordinary(Ordinary::OP_CHECKSIGADD));
        assert_eq!(All::from(0xbb).classify(ctx), Class::UndefinedOp);
        assert_eq!(All::from(0xfe).classify(ctx), Class::UndefinedOp);
        assert_eq!(all::OP_INVALIDOPCODE.classify(ctx), Class::UndefinedOp);
        assert_eq!(all::OP_CHECKMULTISIG.classify(ctx), Class::Ordinary(Ordinary::OP_CHECKMULTISIG));
    }

    #[test]
    fn classify_tapscript() {
        let ctx = Mode::Tapscript;
        assert_eq!(all::OP_RESERVED.classify(ctx), Class::SuccessOp);
        assert_eq!(all::OP_CAT.classify(ctx), Class::SuccessOp);
        assert_eq!(All::from(0xfe).classify(ctx), Class::SuccessOp);
        assert_eq!(all::OP_INVALIDOPCODE.classify(ctx), Class::UndefinedOp);
        assert_eq!(all::OP_VERIF.classify(ctx), Class::IllegalOp);
        assert_eq!(all::OP_CHECKMULTISIG.classify(ctx), Class::ReturnOp);
        assert_eq!(all::OP_CHECKMULTISIGVERIFY.classify(ctx), Class::ReturnOp);
        assert_eq!(all::OP_RETURN.classify(ctx), Class::ReturnOp);
    }

    #[test]
    fn op_count_charges() {
        for b in 0..=0x60u8 {
            assert!(!All::from(b).charges_op_count(), "{:?}", All::from(b));
        }
        for b in 0x61..=0xffu8 {
            assert!(All::from(b).charges_op_count(), "{:?}", All::from(b));
        }
    }

    #[test]
    fn small_ints() {
        assert_eq!(all::OP_PUSHBYTES_0.small_int(), Some(0));
        assert_eq!(all::OP_PUSHNUM_1.small_int(), Some(1));
        assert_eq!(all::OP_PUSHNUM_16.small_int(), Some(16));
        assert_eq!(all::OP_PUSHNUM_NEG1.small_int(), None);
        assert_eq!(all::OP_PUSHBYTES_1.small_int(), None);
    }
}
