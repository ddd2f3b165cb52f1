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

//! # Bitcoin Script Engine
//!
//! Decoding, execution and signature script-code serialization of Bitcoin
//! scripts in legacy, witness v0 and tapscript modes.
//!
//! Raw script bytes decode into a tree of [`Operation`]s with conditionals
//! resolved up front. Executing the tree against an [`OpData`] records which
//! branches ran and which OP_CODESEPARATORs were passed; that trace is what
//! [`to_signing_bytes`] replays to produce the script code a signature
//! commits to.
//!
//! Transactions are not modelled here. Signature hashes, lock times and
//! sequence numbers come from a [`TxContext`] supplied by the caller, and
//! signatures are checked through a [`SignatureVerifier`].
//!

// Coding conventions
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![deny(missing_docs)]

pub extern crate bitcoin;
pub extern crate secp256k1_zkp;
#[cfg(feature = "serde")] pub extern crate actual_serde as serde;

pub mod checker;
pub mod decode;
pub mod encode;
mod error;
pub mod flags;
pub mod interpreter;
pub mod locktime;
pub mod num;
pub mod opcodes;
pub mod operation;
pub mod script;
pub mod sighash;
pub mod stack;
mod witness;

// export everything at the top level so it can be used as `scriptvm::Script` etc.
pub use crate::checker::{NoTransaction, Secp256k1Verifier, SignatureVerifier, TxContext};
pub use crate::decode::{decode, try_evaluate_op_success, DecodedScript};
pub use crate::error::Error;
pub use crate::flags::{Mode, VerifyFlags};
pub use crate::interpreter::Interpreter;
pub use crate::locktime::{LockTime, Sequence};
pub use crate::operation::{Mark, Operation, Trace};
pub use crate::script::{
    Builder, PubkeyScript, RedeemScript, RedeemScriptType, Script, ScriptType, SignatureScript,
};
pub use crate::sighash::{script_code, to_signing_bytes};
pub use crate::stack::{Environment, OpData, Stack};
pub use crate::witness::Witness;
