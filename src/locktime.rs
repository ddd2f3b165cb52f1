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

//! Lock times
//!
//! The comparisons behind OP_CHECKLOCKTIMEVERIFY (against the transaction's
//! `nLockTime`) and OP_CHECKSEQUENCEVERIFY (against the input's `nSequence`).
//! Absolute lock times are either block heights or UNIX times, split at
//! 500,000,000, and values of different kinds never satisfy each other.
//!

pub use bitcoin::absolute::{Height, Time, LOCK_TIME_THRESHOLD};
pub use bitcoin::Sequence;

use crate::Error;

/// Bit 31 of a sequence number disables its relative lock time.
pub const SEQUENCE_LOCKTIME_DISABLE_FLAG: u32 = 1 << 31;
/// Bit 22 of a sequence number selects time-based (512 second units) relative locks.
pub const SEQUENCE_LOCKTIME_TYPE_FLAG: u32 = 1 << 22;
/// The low 16 bits of a sequence number hold the relative lock value.
pub const SEQUENCE_LOCKTIME_MASK: u32 = 0x0000_ffff;

/// An absolute lock time: a transaction's `nLockTime`, or the operand of
/// OP_CHECKLOCKTIMEVERIFY.
///
/// ```
/// # use scriptvm::LockTime;
/// let operand = LockTime::from_consensus(100);
/// assert!(operand.is_implied_by(LockTime::from_consensus(120)));
/// assert!(!operand.is_implied_by(LockTime::from_consensus(500_000_120)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockTime {
    /// A block height
    Blocks(Height),
    /// A UNIX timestamp
    Seconds(Time),
}

impl LockTime {
    /// No lock at all.
    pub const ZERO: LockTime = LockTime::Blocks(Height::ZERO);

    /// Interprets a raw `nLockTime` value.
    pub fn from_consensus(n: u32) -> Self {
        let lock = if n < LOCK_TIME_THRESHOLD {
            Height::from_consensus(n).map(LockTime::Blocks)
        } else {
            Time::from_consensus(n).map(LockTime::Seconds)
        };
        // both conversions accept every value on their side of the threshold
        lock.unwrap_or(LockTime::ZERO)
    }

    /// Whether a transaction locked at `tx_lock` satisfies this operand.
    pub fn is_implied_by(&self, tx_lock: LockTime) -> bool {
        match (*self, tx_lock) {
            (LockTime::Blocks(this), LockTime::Blocks(other)) => this <= other,
            (LockTime::Seconds(this), LockTime::Seconds(other)) => this <= other,
            _ => false,
        }
    }

    /// The raw `nLockTime` value.
    pub fn to_consensus_u32(self) -> u32 {
        match self {
            LockTime::Blocks(h) => h.to_consensus_u32(),
            LockTime::Seconds(t) => t.to_consensus_u32(),
        }
    }
}

/// Checks the operand of `OP_CHECKLOCKTIMEVERIFY` against the spending transaction.
///
/// `n` is the 5-byte script number from the stack, `tx_lock` the transaction
/// lock time and `sequence` the sequence of the input being verified.
pub fn check_lock_time(n: i64, tx_lock: LockTime, sequence: Sequence) -> Result<(), Error> {
    if n < 0 {
        return Err(Error::NegativeLocktime);
    }
    if n > i64::from(u32::MAX) {
        return Err(Error::UnsatisfiedLocktime);
    }
    if !LockTime::from_consensus(n as u32).is_implied_by(tx_lock) {
        return Err(Error::UnsatisfiedLocktime);
    }
    // A final input disables nLockTime, and with it the CLTV constraint.
    if sequence == Sequence::MAX {
        return Err(Error::UnsatisfiedLocktime);
    }
    Ok(())
}

/// Checks the operand of `OP_CHECKSEQUENCEVERIFY` against the spending input (BIP112).
pub fn check_sequence(n: i64, tx_version: i32, tx_sequence: Sequence) -> Result<(), Error> {
    if n < 0 {
        return Err(Error::NegativeLocktime);
    }
    // Only the low 32 bits are meaningful; the disable flag turns CSV into a NOP.
    let n = n as u64;
    if n & u64::from(SEQUENCE_LOCKTIME_DISABLE_FLAG) != 0 {
        return Ok(());
    }
    if tx_version < 2 {
        return Err(Error::UnsatisfiedLocktime);
    }
    let tx_sequence = tx_sequence.to_consensus_u32();
    if tx_sequence & SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
        return Err(Error::UnsatisfiedLocktime);
    }

    let mask = SEQUENCE_LOCKTIME_TYPE_FLAG | SEQUENCE_LOCKTIME_MASK;
    let required = n as u32 & mask;
    let available = tx_sequence & mask;
    let same_unit = (required & SEQUENCE_LOCKTIME_TYPE_FLAG) == (available & SEQUENCE_LOCKTIME_TYPE_FLAG);
    if !same_unit || required > available {
        return Err(Error::UnsatisfiedLocktime);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_do_not_mix() {
        let height = LockTime::from_consensus(100);
        let time = LockTime::from_consensus(500_000_100);
        assert!(matches!(height, LockTime::Blocks(_)));
        assert!(matches!(time, LockTime::Seconds(_)));
        assert!(!height.is_implied_by(time));
        assert!(!time.is_implied_by(height));
        assert!(time.is_implied_by(LockTime::from_consensus(u32::MAX)));

        for &n in &[0, 1, 499_999_999, 500_000_000, u32::MAX] {
            assert_eq!(LockTime::from_consensus(n).to_consensus_u32(), n);
        }
    }

    #[test]
    fn cltv() {
        let tx_lock = LockTime::from_consensus(600_000);
        let seq = Sequence::ENABLE_LOCKTIME_NO_RBF;
        assert_eq!(check_lock_time(600_000, tx_lock, seq), Ok(()));
        assert_eq!(check_lock_time(599_999, tx_lock, seq), Ok(()));
        assert_eq!(check_lock_time(600_001, tx_lock, seq), Err(Error::UnsatisfiedLocktime));
        assert_eq!(check_lock_time(-1, tx_lock, seq), Err(Error::NegativeLocktime));
        assert_eq!(check_lock_time(500_000_000, tx_lock, seq), Err(Error::UnsatisfiedLocktime));
        assert_eq!(check_lock_time(1 << 33, tx_lock, seq), Err(Error::UnsatisfiedLocktime));
        assert_eq!(check_lock_time(100, tx_lock, Sequence::MAX), Err(Error::UnsatisfiedLocktime));
    }

    #[test]
    fn csv() {
        let seq = Sequence::from_consensus(10);
        assert_eq!(check_sequence(10, 2, seq), Ok(()));
        assert_eq!(check_sequence(11, 2, seq), Err(Error::UnsatisfiedLocktime));
        assert_eq!(check_sequence(10, 1, seq), Err(Error::UnsatisfiedLocktime));
        assert_eq!(check_sequence(-1, 2, seq), Err(Error::NegativeLocktime));
        // disabled operand always passes, even against a version 1 transaction
        assert_eq!(check_sequence(i64::from(SEQUENCE_LOCKTIME_DISABLE_FLAG), 1, seq), Ok(()));
        // time based operand against a height based input
        let time_based = i64::from(SEQUENCE_LOCKTIME_TYPE_FLAG | 1);
        assert_eq!(check_sequence(time_based, 2, seq), Err(Error::UnsatisfiedLocktime));
        let time_seq = Sequence::from_consensus(SEQUENCE_LOCKTIME_TYPE_FLAG | 2);
        assert_eq!(check_sequence(time_based, 2, time_seq), Ok(()));
        // input with relative locks disabled
        assert_eq!(check_sequence(1, 2, Sequence::MAX), Err(Error::UnsatisfiedLocktime));
    }
}
