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

//! Script numbers and booleans
//!
//! Numbers on the stack are little-endian sign-magnitude byte strings: the
//! top bit of the last byte is the sign. Only values of at most 4 bytes may be
//! read as numbers by arithmetic opcodes (5 bytes for the lock-time opcodes),
//! but arithmetic results may grow beyond that and are still pushed; they just
//! can't be read back as numbers again.
//!

use crate::Error;

/// Maximum size of an arithmetic operand.
pub const MAX_NUM_LEN: usize = 4;

/// Maximum size of an OP_CHECKLOCKTIMEVERIFY/OP_CHECKSEQUENCEVERIFY operand.
pub const MAX_LOCKTIME_NUM_LEN: usize = 5;

/// Encodes an integer in canonical script-number form. Zero is the empty string.
pub fn encode_num(n: i64) -> Vec<u8> {
    let mut out = Vec::with_capacity(9);
    if n == 0 {
        return out;
    }

    let neg = n < 0;
    let mut abs = n.unsigned_abs();
    while abs > 0 {
        out.push((abs & 0xff) as u8);
        abs >>= 8;
    }
    // If the top byte already uses the sign bit we need an extra byte for
    // the sign, otherwise the sign goes into the top byte itself.
    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if neg { 0x80 } else { 0x00 });
    } else if neg {
        out[last] |= 0x80;
    }
    out
}

/// Whether `bytes` has no redundant trailing zero byte.
///
/// A final `0x00` or `0x80` byte is only needed when the byte before it has its
/// top bit set; otherwise the number could have been one byte shorter.
pub fn is_minimally_encoded(bytes: &[u8]) -> bool {
    match bytes.split_last() {
        None => true,
        Some((last, rest)) => {
            if last & 0x7f != 0 {
                return true;
            }
            match rest.last() {
                None => false,
                Some(prev) => prev & 0x80 != 0,
            }
        }
    }
}

/// Decodes a script number of at most `max_len` bytes.
///
/// Strict decoding also rejects non-minimal encodings.
pub fn decode_num(bytes: &[u8], strict: bool, max_len: usize) -> Result<i64, Error> {
    if bytes.len() > max_len {
        return Err(Error::InvalidStackNumberFormat);
    }
    if strict && !is_minimally_encoded(bytes) {
        return Err(Error::InvalidStackNumberFormat);
    }
    Ok(decode_num_unchecked(bytes))
}

// Callers have already bounded the length to 8 bytes or fewer.
fn decode_num_unchecked(bytes: &[u8]) -> i64 {
    let (last, _) = match bytes.split_last() {
        Some(split) => split,
        None => return 0,
    };

    let mut ret: i64 = 0;
    for (i, b) in bytes.iter().enumerate() {
        ret |= i64::from(*b) << (8 * i);
    }
    if last & 0x80 != 0 {
        ret &= !(0x80i64 << (8 * (bytes.len() - 1)));
        -ret
    } else {
        ret
    }
}

/// Interprets a stack item as a boolean, the way every opcode but IF/NOTIF does.
///
/// Any all-zero string is false, including "negative zero" (zeros followed
/// by a final `0x80`). Everything else is true.
pub fn cast_to_bool(bytes: &[u8]) -> bool {
    match bytes.split_last() {
        Some((last, rest)) => !((last & !0x80 == 0x00) && rest.iter().all(|&b| b == 0)),
        None => false,
    }
}

/// Interprets a stack item as a boolean.
///
/// In strict mode only `[]` (false) and `[0x01]` (true) are accepted and
/// everything else is [`Error::NonMinimalConditional`].
pub fn to_bool(bytes: &[u8], strict: bool) -> Result<bool, Error> {
    if !strict {
        return Ok(cast_to_bool(bytes));
    }
    match bytes {
        [] => Ok(false),
        [1] => Ok(true),
        _ => Err(Error::NonMinimalConditional),
    }
}

/// The canonical encoding of a boolean result.
#[inline]
pub fn encode_bool(b: bool) -> Vec<u8> {
    if b { vec![1] } else { vec![] }
}
