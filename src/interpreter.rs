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

//! Interpreter
//!
//! Drives evaluation: decodes a script, runs it against a stack, and chains
//! the scripts of a spend together the way a node validates an input.
//!
//! [`Interpreter::verify_script`] handles the signature script, the output
//! script, P2SH redeem scripts and witness v0 programs. Outputs with a
//! witness version of 1 or higher are left unencumbered; the Taproot
//! commitment check belongs to the caller, who then hands the revealed leaf
//! to [`Interpreter::verify_tapscript`].
//!

use bitcoin::hashes::{sha256, Hash};
use log::{debug, trace};

use crate::checker::{SignatureVerifier, TxContext, VALIDATION_WEIGHT_OFFSET};
use crate::decode::{decode, try_evaluate_op_success, MAX_PUSH_SIZE};
use crate::flags::{VERIFY_CLEANSTACK, VERIFY_P2SH, VERIFY_SIGPUSHONLY, VERIFY_WITNESS};
use crate::opcodes::all;
use crate::operation::run_ops;
use crate::script::{Builder, PubkeyScript, RedeemScript, SignatureScript};
use crate::stack::{Environment, OpData, Stack, MAX_STACK_ITEMS};
use crate::{num, Error, Mode, VerifyFlags, Witness};

/// Evaluates scripts for one transaction input.
pub struct Interpreter<'a> {
    ctx: &'a dyn TxContext,
    verifier: &'a dyn SignatureVerifier,
    flags: VerifyFlags,
}

impl<'a> Interpreter<'a> {
    /// Creates an interpreter checking signatures against `ctx` with `verifier`.
    pub fn new(
        ctx: &'a dyn TxContext,
        verifier: &'a dyn SignatureVerifier,
        flags: VerifyFlags,
    ) -> Interpreter<'a> {
        Interpreter { ctx, verifier, flags }
    }

    /// The verification flags in force.
    pub fn flags(&self) -> VerifyFlags {
        self.flags
    }

    /// Decodes and runs `script` on `stack`, returning the final stack.
    ///
    /// In tapscript an OP_SUCCESS anywhere before the first framing error
    /// makes the script succeed without running it, and the stack is
    /// returned untouched.
    pub fn evaluate(&self, script: &[u8], stack: Stack, mode: Mode) -> Result<Stack, Error> {
        self.run(script, stack, mode, None)
    }

    fn run(
        &self,
        script: &[u8],
        stack: Stack,
        mode: Mode,
        validation_weight: Option<i64>,
    ) -> Result<Stack, Error> {
        trace!("evaluating {} byte {} script on {} items", script.len(), mode, stack.len());

        if mode == Mode::Tapscript && try_evaluate_op_success(script).1 {
            debug!("tapscript contains OP_SUCCESS, skipping evaluation");
            return Ok(stack);
        }

        let decoded = decode(script, mode)?;
        if decoded.has_op_success {
            debug!("tapscript contains OP_SUCCESS, skipping evaluation");
            return Ok(stack);
        }
        trace!("decoded {} operations, {} charged", decoded.ops.len(), decoded.op_count);

        let env = Environment { ctx: self.ctx, verifier: self.verifier, flags: self.flags, mode };
        let mut data = OpData::new(&decoded, stack, env);
        if let Some(budget) = validation_weight {
            data.set_validation_weight(budget);
        }
        run_ops(&decoded.ops, &mut data)?;

        trace!("evaluation finished with {} items, {} operations", data.item_count(), data.op_count());
        Ok(data.into_stack())
    }

    /// Verifies that `script_sig` and `witness` satisfy `script_pubkey`.
    pub fn verify_script(
        &self,
        script_sig: &SignatureScript,
        script_pubkey: &PubkeyScript,
        witness: &Witness,
    ) -> Result<(), Error> {
        if self.flags.contains(VERIFY_SIGPUSHONLY) && !script_sig.is_push_only() {
            return Err(Error::SigPushOnly);
        }

        let stack = self.evaluate(script_sig.as_bytes(), Stack::new(), Mode::Legacy)?;
        let p2sh_stack = if self.flags.contains(VERIFY_P2SH) { Some(stack.clone()) } else { None };

        let mut stack = self.evaluate(script_pubkey.as_bytes(), stack, Mode::Legacy)?;
        if !is_true(&stack) {
            return Err(Error::EvalFalse);
        }

        let mut had_witness = false;
        let mut clean_stack = self.flags.contains(VERIFY_CLEANSTACK);

        if self.flags.contains(VERIFY_WITNESS) {
            if let Some((version, program)) = script_pubkey.witness_program() {
                if !script_sig.is_empty() {
                    return Err(Error::WitnessMalleated);
                }
                had_witness = true;
                clean_stack = false;
                self.verify_witness_program(witness, version, program, false)?;
            }
        }

        if let Some(mut p2sh_stack) = p2sh_stack.filter(|_| script_pubkey.is_p2sh()) {
            if !script_sig.is_push_only() {
                return Err(Error::SigPushOnly);
            }

            let redeem_script = RedeemScript::from(p2sh_stack.pop()?);
            trace!("evaluating P2SH redeem script {}", redeem_script);
            stack = self.evaluate(redeem_script.as_bytes(), p2sh_stack, Mode::Legacy)?;
            if !is_true(&stack) {
                return Err(Error::EvalFalse);
            }

            if self.flags.contains(VERIFY_WITNESS) {
                if let Some((version, program)) = redeem_script.witness_program() {
                    let expected = Builder::new().push_slice(redeem_script.as_bytes()).into_script();
                    if script_sig.as_script() != &expected {
                        return Err(Error::WitnessMalleated);
                    }
                    had_witness = true;
                    clean_stack = false;
                    self.verify_witness_program(witness, version, program, true)?;
                }
            }
        }

        if clean_stack && stack.len() != 1 {
            return Err(Error::CleanStack);
        }

        if self.flags.contains(VERIFY_WITNESS) && !had_witness && !witness.is_empty() {
            return Err(Error::WitnessUnexpected);
        }
        Ok(())
    }

    fn verify_witness_program(
        &self,
        witness: &Witness,
        version: u8,
        program: &[u8],
        is_p2sh: bool,
    ) -> Result<(), Error> {
        if version != 0 {
            debug!(
                "witness v{} program of {} bytes (nested: {}) is not evaluated",
                version,
                program.len(),
                is_p2sh
            );
            return Ok(());
        }

        match program.len() {
            32 => {
                let (witness_script, items) = match witness.as_slice().split_last() {
                    Some(split) => split,
                    None => return Err(Error::WitnessProgramMismatch),
                };
                if &sha256::Hash::hash(witness_script)[..] != program {
                    return Err(Error::WitnessProgramMismatch);
                }
                self.execute_witness_script(witness_script, Stack::from(items.to_vec()), Mode::WitnessV0, None)
            }
            20 => {
                if witness.len() != 2 {
                    return Err(Error::WitnessProgramMismatch);
                }
                let script = Builder::new()
                    .push_opcode(all::OP_DUP)
                    .push_opcode(all::OP_HASH160)
                    .push_slice(program)
                    .push_opcode(all::OP_EQUALVERIFY)
                    .push_opcode(all::OP_CHECKSIG)
                    .into_script();
                self.execute_witness_script(script.as_bytes(), witness.to_stack(), Mode::WitnessV0, None)
            }
            _ => Err(Error::WitnessProgramMismatch),
        }
    }

    /// Runs a tapscript leaf on the witness `stack` left after removing the
    /// script and control block.
    ///
    /// `witness_size` is the serialized size of the whole input witness; the
    /// signature budget is that plus 50.
    pub fn verify_tapscript(&self, leaf: &[u8], stack: Stack, witness_size: usize) -> Result<(), Error> {
        let budget = witness_size as i64 + VALIDATION_WEIGHT_OFFSET;
        self.execute_witness_script(leaf, stack, Mode::Tapscript, Some(budget))
    }

    fn execute_witness_script(
        &self,
        script: &[u8],
        stack: Stack,
        mode: Mode,
        validation_weight: Option<i64>,
    ) -> Result<(), Error> {
        if mode == Mode::Tapscript {
            match try_evaluate_op_success(script) {
                (_, true) => {
                    debug!("tapscript contains OP_SUCCESS, skipping evaluation");
                    return Ok(());
                }
                (false, false) => return Err(Error::EndOfStream),
                (true, false) => {}
            }
            if stack.len() > MAX_STACK_ITEMS {
                return Err(Error::StackItemCountOverflow);
            }
        }

        if stack.iter().any(|item| item.len() > MAX_PUSH_SIZE) {
            return Err(Error::PushSizeOverflow);
        }

        let stack = self.run(script, stack, mode, validation_weight)?;
        if stack.len() != 1 {
            return Err(Error::CleanStack);
        }
        if !is_true(&stack) {
            return Err(Error::EvalFalse);
        }
        Ok(())
    }
}

/// Whether the top item of `stack` exists and is true.
fn is_true(stack: &Stack) -> bool {
    stack.peek().map_or(false, num::cast_to_bool)
}
