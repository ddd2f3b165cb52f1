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

//! Script decoding and execution errors.

use std::{error, fmt};

use crate::opcodes;

/// Ways that decoding or executing a script can fail.
///
/// Decode errors abort the decode; execution errors abort the evaluation at
/// the first failing opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    /// A push or its length field runs past the end of the script
    EndOfStream,
    /// Byte with no opcode assigned in the current mode
    UndefinedOp(u8),
    /// One of the opcodes disabled since 2010
    DisabledOp(opcodes::All),
    /// OP_VERIF/OP_VERNOTIF, or an ELSE/ENDIF with no matching IF
    InvalidOp(opcodes::All),
    /// More than 201 counted operations
    OpCountOverflow,
    /// Script longer than 10,000 bytes
    ScriptOverflow,
    /// A push of more than 520 bytes
    PushSizeOverflow,
    /// An IF/NOTIF without a closing ENDIF
    UnbalancedConditional,
    /// The stack holds fewer items than the opcode consumes
    NotEnoughStackItems,
    /// Main and alternate stacks together hold more than 1,000 items
    StackItemCountOverflow,
    /// A stack item is not a valid script number in this context
    InvalidStackNumberFormat,
    /// CLTV/CSV argument is negative
    NegativeLocktime,
    /// CLTV/CSV argument is not satisfied by the transaction
    UnsatisfiedLocktime,
    /// A reserved opcode or OP_RETURN was executed
    NotRunableOp(opcodes::All),
    /// A signature is not strict DER
    InvalidDerEncodingLength,
    /// Signature fails other encoding rules (low-S, Schnorr size)
    InvalidSignatureEncoding,
    /// A public key is not a valid encoding
    InvalidPublicKeyEncoding,
    /// A witness v0 public key is not compressed
    WitnessPubkeyType,
    /// The signature hash type byte is not defined
    InvalidSighashType,
    /// CHECKSIGVERIFY or CHECKMULTISIGVERIFY failed
    FailedSignatureVerification,
    /// A failed signature check had a non-empty signature under NULLFAIL
    NullFail,
    /// EQUALVERIFY or NUMEQUALVERIFY failed
    UnequalStackItems,
    /// VERIFY popped a false value
    VerifyFailed,
    /// Public key count of a multisig is outside `0..=20`
    InvalidMultiSigPubkeyCount,
    /// Signature count of a multisig is outside `0..=n`
    InvalidMultiSigSignatureCount,
    /// The multisig dummy element is not empty under NULLDUMMY
    InvalidMultiSigDummy,
    /// OP_CHECKSIGADD outside tapscript
    OpCheckSigAddPreTaproot,
    /// An IF/NOTIF argument that is not minimally encoded
    NonMinimalConditional,
    /// A push that is not minimally encoded under MINIMALDATA
    NonMinimalPush,
    /// The tapscript signature budget is exhausted
    TapscriptValidationWeight,
    /// An upgradable NOP was executed under DISCOURAGE_UPGRADABLE_NOPS
    DiscourageUpgradableNops,
    /// The script finished with a false (or no) value on top of the stack
    EvalFalse,
    /// More than one item remained on the stack under CLEANSTACK
    CleanStack,
    /// A signature script contained a non-push opcode
    SigPushOnly,
    /// Witness does not match the witness program
    WitnessProgramMismatch,
    /// A native witness spend had a non-empty signature script
    WitnessMalleated,
    /// Witness data was supplied to a non-witness spend
    WitnessUnexpected,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::EndOfStream => f.write_str("unexpected end of script"),
            Error::UndefinedOp(b) => write!(f, "undefined opcode 0x{:02x}", b),
            Error::DisabledOp(op) => write!(f, "disabled opcode {}", op),
            Error::InvalidOp(op) => write!(f, "invalid opcode {}", op),
            Error::OpCountOverflow => f.write_str("operation limit exceeded"),
            Error::ScriptOverflow => f.write_str("script is larger than the maximum size"),
            Error::PushSizeOverflow => f.write_str("push is larger than 520 bytes"),
            Error::UnbalancedConditional => f.write_str("unbalanced conditional"),
            Error::NotEnoughStackItems => f.write_str("not enough stack items"),
            Error::StackItemCountOverflow => f.write_str("stack size limit exceeded"),
            Error::InvalidStackNumberFormat => f.write_str("invalid script number"),
            Error::NegativeLocktime => f.write_str("negative lock time"),
            Error::UnsatisfiedLocktime => f.write_str("lock time requirement not satisfied"),
            Error::NotRunableOp(op) => write!(f, "{} is not runnable", op),
            Error::InvalidDerEncodingLength => f.write_str("non-canonical DER signature"),
            Error::InvalidSignatureEncoding => f.write_str("invalid signature encoding"),
            Error::InvalidPublicKeyEncoding => f.write_str("invalid public key encoding"),
            Error::WitnessPubkeyType => f.write_str("witness public key is not compressed"),
            Error::InvalidSighashType => f.write_str("undefined signature hash type"),
            Error::FailedSignatureVerification => f.write_str("signature verification failed"),
            Error::NullFail => f.write_str("non-empty signature failed under NULLFAIL"),
            Error::UnequalStackItems => f.write_str("stack items are not equal"),
            Error::VerifyFailed => f.write_str("VERIFY failed"),
            Error::InvalidMultiSigPubkeyCount => f.write_str("invalid multisig public key count"),
            Error::InvalidMultiSigSignatureCount => f.write_str("invalid multisig signature count"),
            Error::InvalidMultiSigDummy => f.write_str("multisig dummy element must be empty"),
            Error::OpCheckSigAddPreTaproot => f.write_str("OP_CHECKSIGADD is only valid in tapscript"),
            Error::NonMinimalConditional => f.write_str("IF argument is not minimally encoded"),
            Error::NonMinimalPush => f.write_str("push is not minimally encoded"),
            Error::TapscriptValidationWeight => f.write_str("tapscript validation weight exceeded"),
            Error::DiscourageUpgradableNops => f.write_str("upgradable NOP executed"),
            Error::EvalFalse => f.write_str("script evaluated to false"),
            Error::CleanStack => f.write_str("stack is not clean after evaluation"),
            Error::SigPushOnly => f.write_str("signature script is not push-only"),
            Error::WitnessProgramMismatch => f.write_str("witness does not match the program"),
            Error::WitnessMalleated => f.write_str("witness spend has a non-empty signature script"),
            Error::WitnessUnexpected => f.write_str("unexpected witness"),
        }
    }
}

impl error::Error for Error {}
