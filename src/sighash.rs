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

//! Signing bytes
//!
//! Rebuilds the script code that goes into a legacy or witness v0 signature
//! hash from a decoded script and the [`Trace`] of its execution so far.
//!
//! Conditionals always re-emit their IF/NOTIF, ELSE and ENDIF bytes but only
//! the contents of the branch that was taken; a conditional that has not run
//! yet is emitted in full. In legacy mode executed OP_CODESEPARATORs are
//! dropped, and pushes of the signatures being checked are removed
//! ("FindAndDelete"). Witness script code keeps both.
//!

use crate::encode::StackInt;
use crate::opcodes::all;
use crate::operation::{Mark, Operation, PushOp, Trace};
use crate::Mode;

/// Replays `ops` into signing bytes, removing `signatures` in legacy mode.
pub fn to_signing_bytes(ops: &[Operation], trace: &Trace, signatures: &[&[u8]], mode: Mode) -> Vec<u8> {
    script_code(ops, trace, None, signatures, mode)
}

/// Like [`to_signing_bytes`], but only emits what comes after the
/// OP_CODESEPARATOR at position `after`.
///
/// This is the script code a CHECKSIG hashes: everything following the last
/// executed separator.
pub fn script_code(
    ops: &[Operation],
    trace: &Trace,
    after: Option<u32>,
    signatures: &[&[u8]],
    mode: Mode,
) -> Vec<u8> {
    let mut writer = Writer {
        out: Vec::with_capacity(64),
        trace,
        start: after.map_or(0, |p| p + 1),
        signatures,
        legacy: mode.is_legacy(),
        position: 0,
    };
    writer.ops(ops);
    writer.out
}

struct Writer<'a> {
    out: Vec<u8>,
    trace: &'a Trace,
    start: u32,
    signatures: &'a [&'a [u8]],
    legacy: bool,
    position: u32,
}

impl<'a> Writer<'a> {
    fn byte(&mut self, position: u32, b: u8) {
        if position >= self.start {
            self.out.push(b);
        }
    }

    /// Whether `push` is what `CScript() << sig` produces for a removed signature.
    fn is_removed(&self, push: &PushOp) -> bool {
        self.legacy
            && self.signatures.iter().any(|sig| {
                push.data() == *sig && push.opcode() == StackInt(sig.len() as u32).opcode()
            })
    }

    /// Walks the tree with an explicit stack of pending work.
    fn ops<'o>(&mut self, ops: &'o [Operation]) {
        let mut work = vec![Work::Ops(ops.iter())];
        loop {
            let Some(item) = work.last_mut() else {
                return;
            };
            let op = match *item {
                Work::Ops(ref mut iter) => match iter.next() {
                    Some(op) => op,
                    None => {
                        work.pop();
                        continue;
                    }
                },
                Work::Opcode(position, byte) => {
                    work.pop();
                    self.byte(position, byte);
                    self.position = position + 1;
                    continue;
                }
            };

            match *op {
                Operation::Push(ref push) => {
                    let position = self.position;
                    self.position += 1;
                    if position >= self.start && !self.is_removed(push) {
                        push.encode_into(&mut self.out);
                    }
                }
                Operation::If(ref block) => {
                    self.byte(block.position, op.opcode().into_u8());
                    self.position = block.position + 1;

                    // pushed in reverse: then, ELSE, else, ENDIF
                    let mark = self.trace.get(block.position);
                    work.push(Work::Opcode(block.endif_position, all::OP_ENDIF.into_u8()));
                    if let Some(ref branch) = block.else_branch {
                        if mark != Mark::Then {
                            work.push(Work::Ops(branch.ops.iter()));
                        }
                        work.push(Work::Opcode(branch.position, all::OP_ELSE.into_u8()));
                    }
                    if mark != Mark::Else {
                        work.push(Work::Ops(block.then_ops.iter()));
                    }
                }
                Operation::CodeSeparator(position) => {
                    self.position = position + 1;
                    if !(self.legacy && self.trace.get(position) == Mark::Executed) {
                        self.byte(position, all::OP_CODESEPARATOR.into_u8());
                    }
                }
                _ => {
                    let position = self.position;
                    self.position += 1;
                    self.byte(position, op.opcode().into_u8());
                }
            }
        }
    }
}

/// A unit of work while replaying a tree.
enum Work<'a> {
    /// The rest of a list of operations
    Ops(std::slice::Iter<'a, Operation>),
    /// A structural opcode (ELSE, ENDIF) at a known position
    Opcode(u32, u8),
}

#[cfg(test)]
mod tests {
    use bitcoin::hex::FromHex;

    use super::*;
    use crate::checker::{NoTransaction, Secp256k1Verifier};
    use crate::decode::decode;
    use crate::operation::run_ops;
    use crate::stack::{Environment, OpData, Stack};
    use crate::VerifyFlags;

    fn hex(s: &str) -> Vec<u8> {
        Vec::<u8>::from_hex(s).unwrap()
    }

    /// Decodes and runs `script` on `stack`, returning the tree and trace.
    fn executed(script: &[u8], stack: Vec<Vec<u8>>, mode: Mode) -> (Vec<Operation>, Trace, Option<u32>) {
        let d = decode(script, mode).unwrap();
        let (trace, codesep) = {
            let env = Environment {
                ctx: &NoTransaction,
                verifier: &Secp256k1Verifier,
                flags: VerifyFlags::NONE,
                mode,
            };
            let mut data = OpData::new(&d, Stack::from(stack), env);
            let _ = run_ops(&d.ops, &mut data);
            (data.trace().clone(), data.last_codesep())
        };
        (d.ops, trace, codesep)
    }

    #[test]
    fn unexecuted_tree_is_unchanged() {
        let script = hex("6351675268ab76a90102");
        let d = decode(&script, Mode::Legacy).unwrap();
        let trace = Trace::new(d.positions);
        assert_eq!(to_signing_bytes(&d.ops, &trace, &[], Mode::Legacy), script);
        assert_eq!(to_signing_bytes(&d.ops, &trace, &[], Mode::WitnessV0), script);
    }

    #[test]
    fn only_taken_branch() {
        // IF 1 ELSE 2 ENDIF
        let script = hex("6351675268");
        let (ops, trace, _) = executed(&script, vec![vec![1]], Mode::Legacy);
        assert_eq!(to_signing_bytes(&ops, &trace, &[], Mode::Legacy), hex("63516768"));
        let (ops, trace, _) = executed(&script, vec![vec![]], Mode::Legacy);
        assert_eq!(to_signing_bytes(&ops, &trace, &[], Mode::Legacy), hex("63675268"));

        // NOTIF without ELSE, not taken
        let (ops, trace, _) = executed(&hex("645168"), vec![vec![1]], Mode::Legacy);
        assert_eq!(to_signing_bytes(&ops, &trace, &[], Mode::Legacy), hex("6468"));
    }

    #[test]
    fn executed_codeseparators() {
        // CODESEPARATOR 1 DROP CODESEPARATOR
        let script = hex("ab5175ab");
        let (ops, trace, last) = executed(&script, vec![], Mode::Legacy);
        assert_eq!(last, Some(3));
        assert_eq!(to_signing_bytes(&ops, &trace, &[], Mode::Legacy), hex("5175"));
        assert_eq!(to_signing_bytes(&ops, &trace, &[], Mode::WitnessV0), script);

        // CODESEPARATOR RETURN CODESEPARATOR: the one never reached stays
        let (ops, trace, last) = executed(&hex("ab6aab"), vec![], Mode::Legacy);
        assert_eq!(last, Some(0));
        assert_eq!(to_signing_bytes(&ops, &trace, &[], Mode::Legacy), hex("6aab"));

        // separators in the branch not taken go with the branch
        let (ops, trace, last) = executed(&hex("0063ab68ab"), vec![], Mode::Legacy);
        assert_eq!(last, Some(4));
        assert_eq!(to_signing_bytes(&ops, &trace, &[], Mode::Legacy), hex("006368"));
    }

    #[test]
    fn script_code_after_separator() {
        // 1 CODESEPARATOR 2 CHECKSIG
        let script = hex("51ab52ac");
        let d = decode(&script, Mode::WitnessV0).unwrap();
        let mut trace = Trace::new(d.positions);
        assert_eq!(script_code(&d.ops, &trace, None, &[], Mode::WitnessV0), script);
        trace.mark(1, Mark::Executed);
        assert_eq!(script_code(&d.ops, &trace, Some(1), &[], Mode::WitnessV0), hex("52ac"));
        assert_eq!(script_code(&d.ops, &trace, Some(1), &[], Mode::Legacy), hex("52ac"));
    }

    #[test]
    fn find_and_delete() {
        let sig = [0xaa; 3];
        // <sig> <sig via PUSHDATA1> <other> CHECKSIG
        let script = hex("03aaaaaa4c03aaaaaa03bbbbbbac");
        let d = decode(&script, Mode::Legacy).unwrap();
        let trace = Trace::new(d.positions);
        assert_eq!(
            to_signing_bytes(&d.ops, &trace, &[&sig], Mode::Legacy),
            hex("4c03aaaaaa03bbbbbbac")
        );
        assert_eq!(to_signing_bytes(&d.ops, &trace, &[&sig], Mode::WitnessV0), script);

        // an empty signature removes every OP_0
        let d = decode(&hex("005100ac"), Mode::Legacy).unwrap();
        let trace = Trace::new(d.positions);
        assert_eq!(to_signing_bytes(&d.ops, &trace, &[&[]], Mode::Legacy), hex("51ac"));
    }

    #[test]
    fn push_prefix_boundaries() {
        for &len in &[75usize, 76, 77, 252, 253, 255, 256] {
            let data = vec![0x5a; len];
            let push = PushOp::new(data.clone());
            let mut bytes = Vec::new();
            push.encode_into(&mut bytes);
            assert_eq!(bytes.len(), StackInt(len as u32).size() + len, "{}", len);

            let d = decode(&bytes, Mode::Legacy).unwrap();
            let trace = Trace::new(d.positions);
            assert_eq!(to_signing_bytes(&d.ops, &trace, &[], Mode::Legacy), bytes, "{}", len);
        }
    }
}
