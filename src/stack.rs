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

//! The stack machine
//!
//! [`Stack`] is a growable stack of byte strings. [`OpData`] is the state of
//! one evaluation: the main and alternate stacks, the mode and flags, the
//! transaction context and signature verifier, and the execution trace of the
//! script being run.
//!
//! Indices passed to the `*_at` methods are 0-based from the top of the stack.
//!

use std::fmt;

use bitcoin::hex::DisplayHex;

use crate::checker::{SignatureVerifier, TxContext};
use crate::decode::DecodedScript;
use crate::num::{self, MAX_NUM_LEN};
use crate::operation::{Operation, Trace};
use crate::{Error, Mode, VerifyFlags};

/// Maximum combined number of items on the main and alternate stacks.
pub const MAX_STACK_ITEMS: usize = 1000;

/// Maximum number of operations a legacy or witness v0 script may contain.
pub const MAX_OPS_PER_SCRIPT: usize = 201;

/// A stack of byte strings.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Stack {
    items: Vec<Vec<u8>>,
}

impl Stack {
    /// Creates an empty stack.
    pub fn new() -> Stack {
        Stack { items: Vec::with_capacity(8) }
    }

    /// The number of items on the stack.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the stack is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pushes an item on top of the stack.
    #[inline]
    pub fn push(&mut self, item: Vec<u8>) {
        self.items.push(item);
    }

    /// Pushes several items, the last one ending up on top.
    pub fn push_many<I: IntoIterator<Item = Vec<u8>>>(&mut self, items: I) {
        self.items.extend(items);
    }

    /// Removes the top item.
    #[inline]
    pub fn pop(&mut self) -> Result<Vec<u8>, Error> {
        self.items.pop().ok_or(Error::NotEnoughStackItems)
    }

    /// Removes the top `n` items, returned bottom to top. Nothing is removed on error.
    pub fn pop_many(&mut self, n: usize) -> Result<Vec<Vec<u8>>, Error> {
        if n > self.items.len() {
            return Err(Error::NotEnoughStackItems);
        }
        let at = self.items.len() - n;
        Ok(self.items.split_off(at))
    }

    /// The top item.
    #[inline]
    pub fn peek(&self) -> Result<&[u8], Error> {
        self.items.last().map(|v| &v[..]).ok_or(Error::NotEnoughStackItems)
    }

    /// The top `n` items, bottom to top.
    pub fn peek_many(&self, n: usize) -> Result<&[Vec<u8>], Error> {
        if n > self.items.len() {
            return Err(Error::NotEnoughStackItems);
        }
        Ok(&self.items[self.items.len() - n..])
    }

    /// The item `i` places below the top.
    #[inline]
    pub fn peek_at(&self, i: usize) -> Result<&[u8], Error> {
        let idx = self.index(i)?;
        Ok(&self.items[idx])
    }

    /// Removes and returns the item `i` places below the top.
    pub fn pop_at(&mut self, i: usize) -> Result<Vec<u8>, Error> {
        let idx = self.index(i)?;
        Ok(self.items.remove(idx))
    }

    /// Inserts `item` so that it ends up `i` places below the top.
    ///
    /// `insert(item, 0)` is the same as `push(item)`.
    pub fn insert(&mut self, item: Vec<u8>, i: usize) -> Result<(), Error> {
        if i > self.items.len() {
            return Err(Error::NotEnoughStackItems);
        }
        let idx = self.items.len() - i;
        self.items.insert(idx, item);
        Ok(())
    }

    /// Inserts `items` (bottom to top) so that the last of them ends up `i`
    /// places below the top.
    pub fn insert_many(&mut self, items: Vec<Vec<u8>>, i: usize) -> Result<(), Error> {
        if i > self.items.len() {
            return Err(Error::NotEnoughStackItems);
        }
        let idx = self.items.len() - i;
        self.items.splice(idx..idx, items);
        Ok(())
    }

    /// Iterates the items from bottom to top.
    pub fn iter(&self) -> std::slice::Iter<'_, Vec<u8>> {
        self.items.iter()
    }

    /// The items, bottom to top.
    pub fn as_slice(&self) -> &[Vec<u8>] {
        &self.items
    }

    /// Consumes the stack, returning the items bottom to top.
    pub fn into_inner(self) -> Vec<Vec<u8>> {
        self.items
    }

    fn index(&self, i: usize) -> Result<usize, Error> {
        if i >= self.items.len() {
            return Err(Error::NotEnoughStackItems);
        }
        Ok(self.items.len() - 1 - i)
    }
}

impl From<Vec<Vec<u8>>> for Stack {
    fn from(items: Vec<Vec<u8>>) -> Stack {
        Stack { items }
    }
}

impl<'a> IntoIterator for &'a Stack {
    type Item = &'a Vec<u8>;
    type IntoIter = std::slice::Iter<'a, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", item.as_hex())?;
        }
        f.write_str("]")
    }
}

/// What an evaluation is checked against, besides the script and its stack.
#[derive(Clone, Copy)]
pub struct Environment<'a> {
    /// The transaction input being verified
    pub ctx: &'a dyn TxContext,
    /// Checks signatures for `ctx`
    pub verifier: &'a dyn SignatureVerifier,
    /// Verification flags
    pub flags: VerifyFlags,
    /// Evaluation mode
    pub mode: Mode,
}

/// The state of a single script evaluation.
pub struct OpData<'a> {
    stack: Stack,
    alt: Stack,
    mode: Mode,
    flags: VerifyFlags,
    ctx: &'a dyn TxContext,
    verifier: &'a dyn SignatureVerifier,
    script: &'a [Operation],
    trace: Trace,
    op_count: usize,
    last_codesep: Option<u32>,
    validation_weight: Option<i64>,
}

impl<'a> OpData<'a> {
    /// Creates the state for evaluating `script`, starting from `stack`.
    ///
    /// The operations charged while decoding count towards the budget.
    pub fn new(script: &'a DecodedScript, stack: Stack, env: Environment<'a>) -> OpData<'a> {
        OpData {
            stack,
            alt: Stack::new(),
            mode: env.mode,
            flags: env.flags,
            ctx: env.ctx,
            verifier: env.verifier,
            script: &script.ops,
            trace: Trace::new(script.positions),
            op_count: script.op_count,
            last_codesep: None,
            validation_weight: None,
        }
    }

    /// Sets the BIP342 signature budget for a tapscript evaluation.
    pub fn set_validation_weight(&mut self, budget: i64) {
        self.validation_weight = Some(budget);
    }

    /// The evaluation mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The verification flags.
    #[inline]
    pub fn flags(&self) -> VerifyFlags {
        self.flags
    }

    /// The transaction being verified.
    #[inline]
    pub fn ctx(&self) -> &'a dyn TxContext {
        self.ctx
    }

    /// The signature verifier.
    #[inline]
    pub fn verifier(&self) -> &'a dyn SignatureVerifier {
        self.verifier
    }

    /// The top level operations of the script being evaluated.
    #[inline]
    pub fn script(&self) -> &'a [Operation] {
        self.script
    }

    /// What has executed so far.
    #[inline]
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub(crate) fn trace_mut(&mut self) -> &mut Trace {
        &mut self.trace
    }

    /// Operations charged so far.
    #[inline]
    pub fn op_count(&self) -> usize {
        self.op_count
    }

    /// Charges `n` more operations against the budget.
    pub fn add_op_count(&mut self, n: usize) -> Result<(), Error> {
        self.op_count += n;
        if self.mode.is_size_limited() && self.op_count > MAX_OPS_PER_SCRIPT {
            return Err(Error::OpCountOverflow);
        }
        Ok(())
    }

    /// Position of the last executed OP_CODESEPARATOR.
    #[inline]
    pub fn last_codesep(&self) -> Option<u32> {
        self.last_codesep
    }

    pub(crate) fn set_last_codesep(&mut self, position: u32) {
        self.last_codesep = Some(position);
    }

    /// Spends tapscript validation weight for one signature.
    pub(crate) fn consume_validation_weight(&mut self, cost: i64) -> Result<(), Error> {
        if let Some(ref mut left) = self.validation_weight {
            *left -= cost;
            if *left < 0 {
                return Err(Error::TapscriptValidationWeight);
            }
        }
        Ok(())
    }

    /// Whether script numbers and pushes must be minimally encoded.
    #[inline]
    pub fn require_minimal(&self) -> bool {
        self.flags.contains(crate::flags::VERIFY_MINIMALDATA)
    }

    /// Number of items on the main stack.
    #[inline]
    pub fn item_count(&self) -> usize {
        self.stack.len()
    }

    /// Number of items on the alternate stack.
    #[inline]
    pub fn alt_item_count(&self) -> usize {
        self.alt.len()
    }

    /// Fails if the two stacks together hold more than 1,000 items.
    pub fn check_item_count(&self) -> Result<(), Error> {
        if self.stack.len() + self.alt.len() > MAX_STACK_ITEMS {
            return Err(Error::StackItemCountOverflow);
        }
        Ok(())
    }

    /// See [`Stack::push`].
    #[inline]
    pub fn push(&mut self, item: Vec<u8>) {
        self.stack.push(item);
    }

    /// See [`Stack::push_many`].
    #[inline]
    pub fn push_many<I: IntoIterator<Item = Vec<u8>>>(&mut self, items: I) {
        self.stack.push_many(items);
    }

    /// See [`Stack::pop`].
    #[inline]
    pub fn pop(&mut self) -> Result<Vec<u8>, Error> {
        self.stack.pop()
    }

    /// See [`Stack::pop_many`].
    #[inline]
    pub fn pop_many(&mut self, n: usize) -> Result<Vec<Vec<u8>>, Error> {
        self.stack.pop_many(n)
    }

    /// See [`Stack::peek`].
    #[inline]
    pub fn peek(&self) -> Result<&[u8], Error> {
        self.stack.peek()
    }

    /// See [`Stack::peek_many`].
    #[inline]
    pub fn peek_many(&self, n: usize) -> Result<&[Vec<u8>], Error> {
        self.stack.peek_many(n)
    }

    /// See [`Stack::peek_at`].
    #[inline]
    pub fn peek_at(&self, i: usize) -> Result<&[u8], Error> {
        self.stack.peek_at(i)
    }

    /// See [`Stack::pop_at`].
    #[inline]
    pub fn pop_at(&mut self, i: usize) -> Result<Vec<u8>, Error> {
        self.stack.pop_at(i)
    }

    /// See [`Stack::insert`].
    #[inline]
    pub fn insert(&mut self, item: Vec<u8>, i: usize) -> Result<(), Error> {
        self.stack.insert(item, i)
    }

    /// See [`Stack::insert_many`].
    #[inline]
    pub fn insert_many(&mut self, items: Vec<Vec<u8>>, i: usize) -> Result<(), Error> {
        self.stack.insert_many(items, i)
    }

    /// Moves the top item to the alternate stack.
    pub fn to_alt(&mut self) -> Result<(), Error> {
        let item = self.stack.pop()?;
        self.alt.push(item);
        Ok(())
    }

    /// Moves the top item of the alternate stack back to the main stack.
    pub fn from_alt(&mut self) -> Result<(), Error> {
        let item = self.alt.pop()?;
        self.stack.push(item);
        Ok(())
    }

    /// Pops a script number of at most 4 bytes.
    pub fn pop_num(&mut self) -> Result<i64, Error> {
        let item = self.stack.pop()?;
        num::decode_num(&item, self.require_minimal(), MAX_NUM_LEN)
    }

    /// Reads the top item as a script number of at most `max_len` bytes.
    pub fn peek_num(&self, max_len: usize) -> Result<i64, Error> {
        num::decode_num(self.stack.peek()?, self.require_minimal(), max_len)
    }

    /// Pushes `n` in canonical script-number form.
    #[inline]
    pub fn push_num(&mut self, n: i64) {
        self.stack.push(num::encode_num(n));
    }

    /// Pops an item and casts it to a boolean.
    pub fn pop_bool(&mut self) -> Result<bool, Error> {
        Ok(num::cast_to_bool(&self.stack.pop()?))
    }

    /// Pushes `[0x01]` for true and `[]` for false.
    #[inline]
    pub fn push_bool(&mut self, b: bool) {
        self.stack.push(num::encode_bool(b));
    }

    /// The main stack.
    #[inline]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Ends the evaluation, returning the main stack.
    pub fn into_stack(self) -> Stack {
        self.stack
    }
}

impl<'a> fmt::Debug for OpData<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OpData")
            .field("stack", &self.stack)
            .field("alt", &self.alt)
            .field("mode", &self.mode)
            .field("flags", &self.flags)
            .field("op_count", &self.op_count)
            .field("last_codesep", &self.last_codesep)
            .field("validation_weight", &self.validation_weight)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(items: &[&[u8]]) -> Stack {
        Stack::from(items.iter().map(|i| i.to_vec()).collect::<Vec<_>>())
    }

    #[test]
    fn push_pop() {
        let mut s = Stack::new();
        assert_eq!(s.pop(), Err(Error::NotEnoughStackItems));
        s.push(vec![1]);
        s.push_many(vec![vec![2], vec![3]]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.peek().unwrap(), &[3]);
        assert_eq!(s.pop().unwrap(), vec![3]);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn pop_many_is_all_or_nothing() {
        let mut s = stack(&[&[1], &[2], &[3]]);
        assert_eq!(s.pop_many(4), Err(Error::NotEnoughStackItems));
        assert_eq!(s.len(), 3);
        assert_eq!(s.pop_many(2).unwrap(), vec![vec![2], vec![3]]);
        assert_eq!(s.as_slice(), &[vec![1]]);
        assert_eq!(s.pop_many(0).unwrap(), Vec::<Vec<u8>>::new());
    }

    #[test]
    fn indexed_access() {
        let mut s = stack(&[&[1], &[2], &[3]]);
        assert_eq!(s.peek_at(0).unwrap(), &[3]);
        assert_eq!(s.peek_at(2).unwrap(), &[1]);
        assert_eq!(s.peek_at(3), Err(Error::NotEnoughStackItems));
        assert_eq!(s.peek_many(2).unwrap(), &[vec![2], vec![3]]);

        assert_eq!(s.pop_at(1).unwrap(), vec![2]);
        assert_eq!(s.as_slice(), &[vec![1], vec![3]]);

        s.insert(vec![9], 2).unwrap();
        assert_eq!(s.as_slice(), &[vec![9], vec![1], vec![3]]);
        s.insert(vec![8], 0).unwrap();
        assert_eq!(s.peek().unwrap(), &[8]);
        assert_eq!(s.insert(vec![7], 5), Err(Error::NotEnoughStackItems));

        s.insert_many(vec![vec![5], vec![6]], 1).unwrap();
        assert_eq!(s.as_slice(), &[vec![9], vec![1], vec![3], vec![5], vec![6], vec![8]]);
    }

    #[test]
    fn debug_is_hex() {
        let s = stack(&[&[], &[0xab, 0x01]]);
        assert_eq!(format!("{:?}", s), "[ ab01]");
    }
}
