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

//! Operations
//!
//! A decoded script is a tree of [`Operation`]s: conditionals own their
//! branches, everything else is a leaf. The tree is immutable once decoded.
//! What happened while running it (which branch each IF took, which
//! OP_CODESEPARATORs executed) is recorded in a [`Trace`] indexed by opcode
//! position, so the same tree can be evaluated any number of times.
//!
//! Opcode positions count opcodes from the start of the script: every push
//! (with its data), every IF, NOTIF, ELSE and ENDIF and every other opcode
//! takes exactly one position.
//!

use bitcoin::hashes::{hash160, ripemd160, sha1, sha256, sha256d, Hash};

use crate::checker::{self, VALIDATION_WEIGHT_PER_SIGOP};
use crate::flags::{
    VERIFY_CHECKLOCKTIMEVERIFY, VERIFY_CHECKSEQUENCEVERIFY, VERIFY_DISCOURAGE_UPGRADABLE_NOPS,
    VERIFY_MINIMALIF, VERIFY_NULLDUMMY, VERIFY_NULLFAIL,
};
use crate::locktime;
use crate::num::{self, MAX_LOCKTIME_NUM_LEN, MAX_NUM_LEN};
use crate::opcodes::{all, All, Ordinary};
use crate::sighash;
use crate::stack::OpData;
use crate::{Error, Mode};

/// Maximum number of public keys in a CHECKMULTISIG.
pub const MAX_PUBKEYS_PER_MULTISIG: i64 = 20;

/// A single node of a decoded script.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Data push, including OP_0, OP_1NEGATE and OP_1 to OP_16
    Push(PushOp),
    /// IF or NOTIF together with its branches
    If(IfOp),
    /// OP_CODESEPARATOR at the given opcode position
    CodeSeparator(u32),
    /// OP_NOP and the upgradable NOPs
    NoOp(All),
    /// Reserved opcodes and OP_RETURN; fail when executed
    NotRunnable(All),
    /// Any other opcode
    Op(Ordinary),
}

/// A data push.
///
/// The opcode is kept next to the payload so that non-minimal pushes
/// (say, one byte pushed with `OP_PUSHDATA2`) survive decoding and
/// re-encode to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PushOp {
    opcode: All,
    data: Vec<u8>,
}

/// An IF/NOTIF block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IfOp {
    /// Opcode position of the IF/NOTIF itself
    pub position: u32,
    /// True for NOTIF
    pub negate: bool,
    /// Operations run when the condition holds
    pub then_ops: Vec<Operation>,
    /// The ELSE branch, if the block has one
    pub else_branch: Option<ElseBranch>,
    /// Opcode position of the closing ENDIF
    pub endif_position: u32,
}

/// The ELSE half of an [`IfOp`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElseBranch {
    /// Opcode position of the ELSE
    pub position: u32,
    /// Operations run when the condition fails
    pub ops: Vec<Operation>,
}

/// What happened at an opcode position during one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    /// Not reached (yet)
    Pending,
    /// An OP_CODESEPARATOR that executed
    Executed,
    /// An IF/NOTIF that ran its "then" branch
    Then,
    /// An IF/NOTIF that ran its "else" branch (or nothing, if it has none)
    Else,
}

/// Per-evaluation record of executed separators and taken branches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trace {
    marks: Vec<Mark>,
}

impl Trace {
    /// A trace for a script with `positions` opcode positions, all pending.
    pub fn new(positions: u32) -> Trace {
        Trace { marks: vec![Mark::Pending; positions as usize] }
    }

    /// The mark at `position`; positions past the end are pending.
    pub fn get(&self, position: u32) -> Mark {
        self.marks.get(position as usize).copied().unwrap_or(Mark::Pending)
    }

    pub(crate) fn mark(&mut self, position: u32, mark: Mark) {
        if let Some(m) = self.marks.get_mut(position as usize) {
            *m = mark;
        }
    }
}

impl PushOp {
    /// Pushes `data` with the shortest length prefix, never a small-number opcode.
    pub fn new(data: Vec<u8>) -> PushOp {
        let opcode = crate::encode::StackInt(data.len() as u32).opcode();
        PushOp { opcode, data }
    }

    /// Pushes `data` the way MINIMALDATA requires, using `OP_0`, `OP_1NEGATE`
    /// or `OP_1` to `OP_16` where possible.
    pub fn minimal(data: Vec<u8>) -> PushOp {
        let opcode = match data[..] {
            [] => Some(all::OP_PUSHBYTES_0),
            [0x81] => Some(all::OP_PUSHNUM_NEG1),
            [n] if (1..=16).contains(&n) => Some(All::from(all::OP_PUSHNUM_1.into_u8() + n - 1)),
            _ => None,
        };
        match opcode {
            Some(opcode) => PushOp { opcode, data },
            None => PushOp::new(data),
        }
    }

    /// Builds a push from a decoded opcode and payload.
    pub(crate) fn from_parts(opcode: All, data: Vec<u8>) -> PushOp {
        PushOp { opcode, data }
    }

    /// The push opcode.
    #[inline]
    pub fn opcode(&self) -> All {
        self.opcode
    }

    /// The bytes this push places on the stack.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether this push uses an `OP_1NEGATE` or `OP_1` to `OP_16` opcode.
    #[inline]
    pub fn is_push_num(&self) -> bool {
        self.opcode == all::OP_PUSHNUM_NEG1
            || (self.opcode.into_u8() >= all::OP_PUSHNUM_1.into_u8()
                && self.opcode.into_u8() <= all::OP_PUSHNUM_16.into_u8())
    }

    /// Whether no shorter encoding of this push exists.
    pub fn is_minimal(&self) -> bool {
        if self.is_push_num() {
            return true;
        }
        let op = self.opcode.into_u8();
        match self.data[..] {
            [] => op == all::OP_PUSHBYTES_0.into_u8(),
            [n] if (1..=16).contains(&n) => false,
            [0x81] => false,
            _ => match self.data.len() {
                0..=75 => op as usize == self.data.len(),
                76..=0xff => self.opcode == all::OP_PUSHDATA1,
                0x100..=0xffff => self.opcode == all::OP_PUSHDATA2,
                _ => true,
            },
        }
    }

    /// Writes the push exactly as it was encoded.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.opcode.into_u8());
        if self.is_push_num() {
            return;
        }
        let len = self.data.len();
        match self.opcode {
            all::OP_PUSHDATA1 => out.push(len as u8),
            all::OP_PUSHDATA2 => out.extend_from_slice(&(len as u16).to_le_bytes()),
            all::OP_PUSHDATA4 => out.extend_from_slice(&(len as u32).to_le_bytes()),
            _ => {}
        }
        out.extend_from_slice(&self.data);
    }

    fn run(&self, data: &mut OpData) -> Result<(), Error> {
        if data.require_minimal() && !self.is_minimal() {
            return Err(Error::NonMinimalPush);
        }
        data.push(self.data.clone());
        Ok(())
    }
}

impl IfOp {
    /// Pops the condition, records the choice and returns the branch to run.
    fn enter(&self, data: &mut OpData) -> Result<Option<&[Operation]>, Error> {
        let strict = match data.mode() {
            Mode::Tapscript => true,
            Mode::WitnessV0 => data.flags().contains(VERIFY_MINIMALIF),
            Mode::Legacy => false,
        };
        let cond = data.pop()?;
        let taken = num::to_bool(&cond, strict)? != self.negate;

        if taken {
            data.trace_mut().mark(self.position, Mark::Then);
            Ok(Some(&self.then_ops[..]))
        } else {
            data.trace_mut().mark(self.position, Mark::Else);
            Ok(self.else_branch.as_ref().map(|branch| &branch.ops[..]))
        }
    }
}

impl Drop for IfOp {
    // Unnest children first so dropping a deep tree does not recurse.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.then_ops);
        if let Some(ref mut branch) = self.else_branch {
            pending.append(&mut branch.ops);
        }
        while let Some(op) = pending.pop() {
            if let Operation::If(mut block) = op {
                pending.append(&mut block.then_ops);
                if let Some(ref mut branch) = block.else_branch {
                    pending.append(&mut branch.ops);
                }
            }
        }
    }
}

impl Operation {
    /// Executes this operation against `data`.
    pub fn run(&self, data: &mut OpData) -> Result<(), Error> {
        match *self {
            Operation::Push(ref push) => push.run(data),
            Operation::If(_) => run_ops(std::slice::from_ref(self), data),
            Operation::CodeSeparator(position) => {
                data.trace_mut().mark(position, Mark::Executed);
                data.set_last_codesep(position);
                Ok(())
            }
            Operation::NoOp(op) => upgradable_nop(op, data),
            Operation::NotRunnable(op) => Err(Error::NotRunableOp(op)),
            Operation::Op(op) => run_ordinary(op, data),
        }
    }

    /// The opcode this operation starts with.
    pub fn opcode(&self) -> All {
        match *self {
            Operation::Push(ref push) => push.opcode,
            Operation::If(ref block) => {
                if block.negate {
                    all::OP_NOTIF
                } else {
                    all::OP_IF
                }
            }
            Operation::CodeSeparator(_) => all::OP_CODESEPARATOR,
            Operation::NoOp(op) | Operation::NotRunnable(op) => op,
            Operation::Op(op) => op.to_all(),
        }
    }

    /// Writes the canonical encoding: the bytes this operation was decoded from.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match *self {
            Operation::Push(ref push) => push.encode_into(out),
            Operation::If(_) => {
                // an unexecuted trace keeps both branches and every separator
                let trace = Trace::new(0);
                out.extend(sighash::to_signing_bytes(std::slice::from_ref(self), &trace, &[], Mode::WitnessV0));
            }
            _ => out.push(self.opcode().into_u8()),
        }
    }

    /// The canonical encoding as a fresh vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }
}

/// Runs `ops` in order, checking the stack size limit after each one.
///
/// Branches are walked with an explicit stack of open blocks, so nesting
/// depth is bounded by memory rather than by the native stack.
pub fn run_ops(ops: &[Operation], data: &mut OpData) -> Result<(), Error> {
    let mut frames = vec![ops.iter()];
    loop {
        let Some(frame) = frames.last_mut() else {
            return Ok(());
        };
        let Some(op) = frame.next() else {
            frames.pop();
            continue;
        };
        match *op {
            Operation::If(ref block) => {
                let branch = block.enter(data)?;
                data.check_item_count()?;
                if let Some(branch) = branch {
                    frames.push(branch.iter());
                }
            }
            _ => {
                op.run(data)?;
                data.check_item_count()?;
            }
        }
    }
}

fn upgradable_nop(op: All, data: &OpData) -> Result<(), Error> {
    if op != all::OP_NOP && data.flags().contains(VERIFY_DISCOURAGE_UPGRADABLE_NOPS) {
        return Err(Error::DiscourageUpgradableNops);
    }
    Ok(())
}

/// Pops `n` items and decodes each as a script number, deepest first.
fn pop_nums(data: &mut OpData, n: usize) -> Result<Vec<i64>, Error> {
    let strict = data.require_minimal();
    data.pop_many(n)?
        .iter()
        .map(|item| num::decode_num(item, strict, MAX_NUM_LEN))
        .collect()
}

fn unary(data: &mut OpData, f: impl Fn(i64) -> i64) -> Result<(), Error> {
    let n = pop_nums(data, 1)?;
    data.push_num(f(n[0]));
    Ok(())
}

fn binary(data: &mut OpData, f: impl Fn(i64, i64) -> i64) -> Result<(), Error> {
    let n = pop_nums(data, 2)?;
    data.push_num(f(n[0], n[1]));
    Ok(())
}

fn hash_top(data: &mut OpData, f: impl Fn(&[u8]) -> Vec<u8>) -> Result<(), Error> {
    let item = data.pop()?;
    data.push(f(&item));
    Ok(())
}

fn run_ordinary(op: Ordinary, data: &mut OpData) -> Result<(), Error> {
    match op {
        Ordinary::OP_VERIFY => {
            if !data.pop_bool()? {
                return Err(Error::VerifyFailed);
            }
        }
        Ordinary::OP_TOALTSTACK => data.to_alt()?,
        Ordinary::OP_FROMALTSTACK => data.from_alt()?,

        Ordinary::OP_2DROP => {
            data.pop_many(2)?;
        }
        Ordinary::OP_2DUP => {
            let items = data.peek_many(2)?.to_vec();
            data.push_many(items);
        }
        Ordinary::OP_3DUP => {
            let items = data.peek_many(3)?.to_vec();
            data.push_many(items);
        }
        Ordinary::OP_2OVER => {
            // (x1 x2 x3 x4 -- x1 x2 x3 x4 x1 x2)
            let items = data.peek_many(4)?[..2].to_vec();
            data.push_many(items);
        }
        Ordinary::OP_2ROT => {
            // (x1 x2 x3 x4 x5 x6 -- x3 x4 x5 x6 x1 x2)
            if data.item_count() < 6 {
                return Err(Error::NotEnoughStackItems);
            }
            let x1 = data.pop_at(5)?;
            let x2 = data.pop_at(4)?;
            data.push_many(vec![x1, x2]);
        }
        Ordinary::OP_2SWAP => {
            // (x1 x2 x3 x4 -- x3 x4 x1 x2)
            if data.item_count() < 4 {
                return Err(Error::NotEnoughStackItems);
            }
            let x1 = data.pop_at(3)?;
            let x2 = data.pop_at(2)?;
            data.push_many(vec![x1, x2]);
        }
        Ordinary::OP_IFDUP => {
            let top = data.peek()?;
            if num::cast_to_bool(top) {
                let top = top.to_vec();
                data.push(top);
            }
        }
        Ordinary::OP_DEPTH => {
            let depth = data.item_count() as i64;
            data.push_num(depth);
        }
        Ordinary::OP_DROP => {
            data.pop()?;
        }
        Ordinary::OP_DUP => {
            let top = data.peek()?.to_vec();
            data.push(top);
        }
        Ordinary::OP_NIP => {
            data.pop_at(1)?;
        }
        Ordinary::OP_OVER => {
            let item = data.peek_at(1)?.to_vec();
            data.push(item);
        }
        Ordinary::OP_PICK | Ordinary::OP_ROLL => {
            // (xn ... x1 x0 n -- xn ... x1 x0 xn)
            let n = pop_nums(data, 1)?[0];
            if n < 0 || n >= data.item_count() as i64 {
                return Err(Error::NotEnoughStackItems);
            }
            let item = if op == Ordinary::OP_PICK {
                data.peek_at(n as usize)?.to_vec()
            } else {
                data.pop_at(n as usize)?
            };
            data.push(item);
        }
        Ordinary::OP_ROT => {
            // (x1 x2 x3 -- x2 x3 x1)
            let x1 = data.pop_at(2)?;
            data.push(x1);
        }
        Ordinary::OP_SWAP => {
            let x1 = data.pop_at(1)?;
            data.push(x1);
        }
        Ordinary::OP_TUCK => {
            // (x1 x2 -- x2 x1 x2)
            let x2 = data.peek()?.to_vec();
            data.insert(x2, 2)?;
        }
        Ordinary::OP_SIZE => {
            let size = data.peek()?.len() as i64;
            data.push_num(size);
        }

        Ordinary::OP_EQUAL | Ordinary::OP_EQUALVERIFY => {
            let items = data.pop_many(2)?;
            let equal = items[0] == items[1];
            if op == Ordinary::OP_EQUALVERIFY {
                if !equal {
                    return Err(Error::UnequalStackItems);
                }
            } else {
                data.push_bool(equal);
            }
        }

        Ordinary::OP_1ADD => unary(data, |a| a + 1)?,
        Ordinary::OP_1SUB => unary(data, |a| a - 1)?,
        Ordinary::OP_NEGATE => unary(data, |a| -a)?,
        Ordinary::OP_ABS => unary(data, i64::abs)?,
        Ordinary::OP_NOT => unary(data, |a| (a == 0) as i64)?,
        Ordinary::OP_0NOTEQUAL => unary(data, |a| (a != 0) as i64)?,

        Ordinary::OP_ADD => binary(data, |a, b| a + b)?,
        Ordinary::OP_SUB => binary(data, |a, b| a - b)?,
        Ordinary::OP_BOOLAND => binary(data, |a, b| (a != 0 && b != 0) as i64)?,
        Ordinary::OP_BOOLOR => binary(data, |a, b| (a != 0 || b != 0) as i64)?,
        Ordinary::OP_NUMEQUAL => binary(data, |a, b| (a == b) as i64)?,
        Ordinary::OP_NUMNOTEQUAL => binary(data, |a, b| (a != b) as i64)?,
        Ordinary::OP_LESSTHAN => binary(data, |a, b| (a < b) as i64)?,
        Ordinary::OP_GREATERTHAN => binary(data, |a, b| (a > b) as i64)?,
        Ordinary::OP_LESSTHANOREQUAL => binary(data, |a, b| (a <= b) as i64)?,
        Ordinary::OP_GREATERTHANOREQUAL => binary(data, |a, b| (a >= b) as i64)?,
        Ordinary::OP_MIN => binary(data, i64::min)?,
        Ordinary::OP_MAX => binary(data, i64::max)?,
        Ordinary::OP_NUMEQUALVERIFY => {
            let n = pop_nums(data, 2)?;
            if n[0] != n[1] {
                return Err(Error::UnequalStackItems);
            }
        }
        Ordinary::OP_WITHIN => {
            // (x min max -- out)
            let n = pop_nums(data, 3)?;
            data.push_bool(n[1] <= n[0] && n[0] < n[2]);
        }

        Ordinary::OP_RIPEMD160 => hash_top(data, |b| ripemd160::Hash::hash(b).to_byte_array().to_vec())?,
        Ordinary::OP_SHA1 => hash_top(data, |b| sha1::Hash::hash(b).to_byte_array().to_vec())?,
        Ordinary::OP_SHA256 => hash_top(data, |b| sha256::Hash::hash(b).to_byte_array().to_vec())?,
        Ordinary::OP_HASH160 => hash_top(data, |b| hash160::Hash::hash(b).to_byte_array().to_vec())?,
        Ordinary::OP_HASH256 => hash_top(data, |b| sha256d::Hash::hash(b).to_byte_array().to_vec())?,

        Ordinary::OP_CHECKSIG | Ordinary::OP_CHECKSIGVERIFY => {
            let items = data.pop_many(2)?;
            let (sig, pubkey) = (&items[0][..], &items[1][..]);
            let success = match data.mode() {
                Mode::Tapscript => tapscript_checksig(data, sig, pubkey)?,
                Mode::Legacy | Mode::WitnessV0 => ecdsa_checksig(data, sig, pubkey)?,
            };
            if op == Ordinary::OP_CHECKSIGVERIFY {
                if !success {
                    return Err(Error::FailedSignatureVerification);
                }
            } else {
                data.push_bool(success);
            }
        }
        Ordinary::OP_CHECKSIGADD => {
            // (sig n pubkey -- n+success)
            if data.mode() != Mode::Tapscript {
                return Err(Error::OpCheckSigAddPreTaproot);
            }
            let items = data.pop_many(3)?;
            let n = num::decode_num(&items[1], data.require_minimal(), MAX_NUM_LEN)?;
            let success = tapscript_checksig(data, &items[0], &items[2])?;
            data.push_num(n + success as i64);
        }
        Ordinary::OP_CHECKMULTISIG | Ordinary::OP_CHECKMULTISIGVERIFY => {
            let success = checkmultisig(data)?;
            if op == Ordinary::OP_CHECKMULTISIGVERIFY {
                if !success {
                    return Err(Error::FailedSignatureVerification);
                }
            } else {
                data.push_bool(success);
            }
        }

        Ordinary::OP_CLTV => {
            if !data.flags().contains(VERIFY_CHECKLOCKTIMEVERIFY) {
                return upgradable_nop(op.to_all(), data);
            }
            let n = data.peek_num(MAX_LOCKTIME_NUM_LEN)?;
            let ctx = data.ctx();
            locktime::check_lock_time(n, ctx.lock_time(), ctx.sequence())?;
        }
        Ordinary::OP_CSV => {
            if !data.flags().contains(VERIFY_CHECKSEQUENCEVERIFY) {
                return upgradable_nop(op.to_all(), data);
            }
            let n = data.peek_num(MAX_LOCKTIME_NUM_LEN)?;
            let ctx = data.ctx();
            locktime::check_sequence(n, ctx.version(), ctx.sequence())?;
        }

        // the decoder folds these into pushes, conditionals and separators
        Ordinary::OP_PUSHDATA1
        | Ordinary::OP_PUSHDATA2
        | Ordinary::OP_PUSHDATA4
        | Ordinary::OP_IF
        | Ordinary::OP_NOTIF
        | Ordinary::OP_ELSE
        | Ordinary::OP_ENDIF
        | Ordinary::OP_CODESEPARATOR => return Err(Error::InvalidOp(op.to_all())),
    }
    Ok(())
}

/// Legacy and witness v0 CHECKSIG: a failed check pushes false unless NULLFAIL applies.
fn ecdsa_checksig(data: &mut OpData, sig: &[u8], pubkey: &[u8]) -> Result<bool, Error> {
    let flags = data.flags();
    checker::check_signature_encoding(sig, flags)?;
    checker::check_pubkey_encoding(pubkey, flags, data.mode())?;

    let success = !sig.is_empty() && {
        let script_code =
            sighash::script_code(data.script(), data.trace(), data.last_codesep(), &[sig], data.mode());
        checker::check_ecdsa_signature(data.ctx(), data.verifier(), sig, pubkey, &script_code, data.mode())
    };

    if !success && flags.contains(VERIFY_NULLFAIL) && !sig.is_empty() {
        return Err(Error::NullFail);
    }
    Ok(success)
}

/// BIP342 signature check: empty signatures are false, bad ones are errors.
fn tapscript_checksig(data: &mut OpData, sig: &[u8], pubkey: &[u8]) -> Result<bool, Error> {
    if !sig.is_empty() {
        data.consume_validation_weight(VALIDATION_WEIGHT_PER_SIGOP)?;
    }
    if pubkey.is_empty() {
        return Err(Error::InvalidPublicKeyEncoding);
    }
    // other key sizes are unknown key types, valid for any signature
    if pubkey.len() == 32 && !sig.is_empty() {
        let codesep_pos = data.last_codesep().unwrap_or(u32::MAX);
        checker::check_schnorr_signature(data.ctx(), data.verifier(), sig, pubkey, codesep_pos)?;
    }
    Ok(!sig.is_empty())
}

/// CHECKMULTISIG: `dummy sig_1 .. sig_m m key_1 .. key_n n`.
fn checkmultisig(data: &mut OpData) -> Result<bool, Error> {
    let strict = data.require_minimal();
    let flags = data.flags();

    let n = num::decode_num(data.peek_at(0)?, strict, MAX_NUM_LEN)?;
    if !(0..=MAX_PUBKEYS_PER_MULTISIG).contains(&n) {
        return Err(Error::InvalidMultiSigPubkeyCount);
    }
    let n = n as usize;
    data.add_op_count(n)?;

    let m = num::decode_num(data.peek_at(n + 1)?, strict, MAX_NUM_LEN)?;
    if m < 0 || m as usize > n {
        return Err(Error::InvalidMultiSigSignatureCount);
    }
    let m = m as usize;

    let items = data.pop_many(n + m + 3)?;
    let dummy = &items[0];
    let sigs: Vec<&[u8]> = items[1..=m].iter().map(|s| &s[..]).collect();
    let keys = &items[m + 2..m + 2 + n];

    let script_code = if m > 0 {
        sighash::script_code(data.script(), data.trace(), data.last_codesep(), &sigs, data.mode())
    } else {
        Vec::new()
    };

    // signatures and keys are matched from the top down; a key that does not
    // match the current signature is skipped for good
    let mut sigs_left = m;
    let mut keys_left = n;
    let mut success = true;
    while success && sigs_left > 0 {
        let sig = sigs[sigs_left - 1];
        let key = &keys[keys_left - 1];
        checker::check_signature_encoding(sig, flags)?;
        checker::check_pubkey_encoding(key, flags, data.mode())?;

        let ok = !sig.is_empty()
            && checker::check_ecdsa_signature(data.ctx(), data.verifier(), sig, key, &script_code, data.mode());
        if ok {
            sigs_left -= 1;
        }
        keys_left -= 1;
        if sigs_left > keys_left {
            success = false;
        }
    }

    if !success && flags.contains(VERIFY_NULLFAIL) && sigs.iter().any(|s| !s.is_empty()) {
        return Err(Error::NullFail);
    }
    if flags.contains(VERIFY_NULLDUMMY) && !dummy.is_empty() {
        return Err(Error::InvalidMultiSigDummy);
    }
    Ok(success)
}
