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

//! Script decoding
//!
//! Turns raw script bytes into a tree of [`Operation`]s, enforcing the limits
//! that apply whether or not an opcode is ever executed: script size, push
//! size, the operation budget, disabled and undefined opcodes, and balanced
//! conditionals.
//!

use crate::opcodes::{all, All, Class, Ordinary};
use crate::operation::{ElseBranch, IfOp, Operation, PushOp};
use crate::stack::MAX_OPS_PER_SCRIPT;
use crate::{num, Error, Mode};

/// Maximum size of a legacy or witness v0 script.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum size of a single push.
pub const MAX_PUSH_SIZE: usize = 520;

/// The result of decoding a script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedScript {
    /// Top level operations
    pub ops: Vec<Operation>,
    /// Operations charged against the 201 budget (0 in tapscript)
    pub op_count: usize,
    /// Number of opcode positions decoded
    pub positions: u32,
    /// Bytes consumed; short of the script length only after an OP_SUCCESS
    pub consumed: usize,
    /// Whether decoding stopped at a tapscript OP_SUCCESS
    pub has_op_success: bool,
}

struct Decoder<'a> {
    bytes: &'a [u8],
    cursor: usize,
    mode: Mode,
    op_count: usize,
    position: u32,
}

impl<'a> Decoder<'a> {
    fn next_position(&mut self) -> u32 {
        let p = self.position;
        self.position += 1;
        p
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if self.bytes.len() - self.cursor < n {
            return Err(Error::EndOfStream);
        }
        let ret = &self.bytes[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(ret)
    }

    fn read_len(&mut self, width: usize) -> Result<usize, Error> {
        let bytes = self.take(width)?;
        let mut buf = [0u8; 4];
        buf[..width].copy_from_slice(bytes);
        Ok(u32::from_le_bytes(buf) as usize)
    }

    /// Reads a push payload; a truncated payload fails before an oversized one.
    fn push(&mut self, opcode: All, len: usize) -> Result<Operation, Error> {
        let data = self.take(len)?;
        if len > MAX_PUSH_SIZE {
            return Err(Error::PushSizeOverflow);
        }
        self.next_position();
        Ok(Operation::Push(PushOp::from_parts(opcode, data.to_vec())))
    }

    /// Decodes the whole script into `ops`.
    ///
    /// Open IF/NOTIF blocks are kept on an explicit stack, so nesting depth
    /// is bounded by memory and not by the native stack. Returns whether an
    /// OP_SUCCESS ended decoding early.
    fn decode(&mut self, ops: &mut Vec<Operation>) -> Result<bool, Error> {
        let mut open: Vec<IfOp> = Vec::new();

        while self.cursor < self.bytes.len() {
            let opcode = All::from(self.bytes[self.cursor]);
            self.cursor += 1;

            if self.mode.is_size_limited() && opcode.charges_op_count() {
                self.op_count += 1;
                if self.op_count > MAX_OPS_PER_SCRIPT {
                    return Err(Error::OpCountOverflow);
                }
            }

            let op = match opcode.classify(self.mode) {
                Class::PushBytes(n) => self.push(opcode, n as usize)?,
                Class::PushNum(n) => {
                    self.next_position();
                    Operation::Push(PushOp::from_parts(opcode, num::encode_num(i64::from(n))))
                }
                Class::SuccessOp => {
                    // close every open block where decoding stopped
                    while let Some(mut block) = open.pop() {
                        block.endif_position = self.position;
                        innermost(ops, &mut open).push(Operation::If(block));
                    }
                    return Ok(true);
                }
                Class::IllegalOp => return Err(Error::InvalidOp(opcode)),
                Class::DisabledOp => return Err(Error::DisabledOp(opcode)),
                Class::UndefinedOp => return Err(Error::UndefinedOp(opcode.into_u8())),
                Class::NoOp => {
                    self.next_position();
                    Operation::NoOp(opcode)
                }
                Class::ReturnOp => {
                    self.next_position();
                    Operation::NotRunnable(opcode)
                }
                Class::Ordinary(ord) => match ord {
                    Ordinary::OP_PUSHDATA1 => {
                        let len = self.read_len(1)?;
                        self.push(opcode, len)?
                    }
                    Ordinary::OP_PUSHDATA2 => {
                        let len = self.read_len(2)?;
                        self.push(opcode, len)?
                    }
                    Ordinary::OP_PUSHDATA4 => {
                        let len = self.read_len(4)?;
                        self.push(opcode, len)?
                    }
                    Ordinary::OP_IF | Ordinary::OP_NOTIF => {
                        open.push(IfOp {
                            position: self.next_position(),
                            negate: ord == Ordinary::OP_NOTIF,
                            then_ops: Vec::new(),
                            else_branch: None,
                            endif_position: 0,
                        });
                        continue;
                    }
                    Ordinary::OP_ELSE => {
                        let position = self.next_position();
                        match open.last_mut() {
                            Some(block) if block.else_branch.is_none() => {
                                block.else_branch = Some(ElseBranch { position, ops: Vec::new() });
                            }
                            _ => return Err(Error::InvalidOp(all::OP_ELSE)),
                        }
                        continue;
                    }
                    Ordinary::OP_ENDIF => {
                        let position = self.next_position();
                        let Some(mut block) = open.pop() else {
                            return Err(Error::InvalidOp(all::OP_ENDIF));
                        };
                        block.endif_position = position;
                        Operation::If(block)
                    }
                    Ordinary::OP_CODESEPARATOR => Operation::CodeSeparator(self.next_position()),
                    _ => {
                        self.next_position();
                        Operation::Op(ord)
                    }
                },
            };
            innermost(ops, &mut open).push(op);
        }

        if open.is_empty() {
            Ok(false)
        } else {
            Err(Error::UnbalancedConditional)
        }
    }
}

/// The list new operations go to: the innermost open branch, or the top level.
fn innermost<'b>(ops: &'b mut Vec<Operation>, open: &'b mut [IfOp]) -> &'b mut Vec<Operation> {
    match open.last_mut() {
        Some(block) => match block.else_branch {
            Some(ref mut branch) => &mut branch.ops,
            None => &mut block.then_ops,
        },
        None => ops,
    }
}

/// Decodes `bytes` under `mode`.
pub fn decode(bytes: &[u8], mode: Mode) -> Result<DecodedScript, Error> {
    if mode.is_size_limited() && bytes.len() > MAX_SCRIPT_SIZE {
        return Err(Error::ScriptOverflow);
    }

    let mut decoder = Decoder { bytes, cursor: 0, mode, op_count: 0, position: 0 };
    let mut ops = Vec::new();
    let has_op_success = decoder.decode(&mut ops)?;

    Ok(DecodedScript {
        ops,
        op_count: decoder.op_count,
        positions: decoder.position,
        consumed: decoder.cursor,
        has_op_success,
    })
}

/// Scans a tapscript for OP_SUCCESS following only push framing.
///
/// Returns `(is_evaluable, has_op_success)`. A truncated push before any
/// OP_SUCCESS makes the script unevaluable; an OP_SUCCESS before any framing
/// error makes the whole script succeed, whatever else it contains.
pub fn try_evaluate_op_success(bytes: &[u8]) -> (bool, bool) {
    let mut cursor = 0;
    while cursor < bytes.len() {
        let opcode = All::from(bytes[cursor]);
        cursor += 1;
        if opcode.is_op_success() {
            return (true, true);
        }
        let (width, len) = match opcode.into_u8() {
            n @ 0x01..=0x4b => (0, n as usize),
            0x4c => (1, 0),
            0x4d => (2, 0),
            0x4e => (4, 0),
            _ => continue,
        };
        let len = if width > 0 {
            if bytes.len() - cursor < width {
                return (false, false);
            }
            let mut buf = [0u8; 4];
            buf[..width].copy_from_slice(&bytes[cursor..cursor + width]);
            cursor += width;
            u32::from_le_bytes(buf) as usize
        } else {
            len
        };
        if bytes.len() - cursor < len {
            return (false, false);
        }
        cursor += len;
    }
    (true, false)
}
