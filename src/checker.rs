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

//! Signature checking
//!
//! The engine never computes a transaction digest itself. A [`TxContext`]
//! supplies signature hashes and lock-time data for the input being verified,
//! and a [`SignatureVerifier`] does the elliptic curve work.
//! [`Secp256k1Verifier`] is the default verifier.
//!
//! The encoding rules enforced before a signature ever reaches the verifier
//! (BIP66 strict DER, low-S, defined hash types, public key formats) live
//! here too.
//!

use secp256k1_zkp::{ecdsa, schnorr, Message, PublicKey, XOnlyPublicKey, SECP256K1};

use crate::flags::{
    Mode, VerifyFlags, VERIFY_DERSIG, VERIFY_LOW_S, VERIFY_STRICTENC, VERIFY_WITNESS_PUBKEYTYPE,
};
use crate::locktime::{LockTime, Sequence};
use crate::Error;

/// Validation weight spent by each non-empty tapscript signature (BIP342).
pub const VALIDATION_WEIGHT_PER_SIGOP: i64 = 50;

/// Validation weight granted on top of the witness size (BIP342).
pub const VALIDATION_WEIGHT_OFFSET: i64 = 50;

/// Checks signatures over 32-byte message digests.
pub trait SignatureVerifier {
    /// Verifies a DER encoded ECDSA signature (without hash type byte).
    fn verify_ecdsa(&self, msg: &[u8; 32], sig: &[u8], pubkey: &[u8]) -> bool;

    /// Verifies a 64-byte BIP340 signature against a 32-byte x-only key.
    fn verify_schnorr(&self, msg: &[u8; 32], sig: &[u8], pubkey: &[u8]) -> bool;
}

/// The transaction input a script is being evaluated for.
pub trait TxContext {
    /// Legacy or witness v0 signature hash of `script_code` under `sighash_type`.
    ///
    /// Returns `None` when no digest can be produced.
    fn signature_hash(&self, script_code: &[u8], sighash_type: u32, mode: Mode) -> Option<[u8; 32]>;

    /// BIP341 signature hash for a tapscript spend.
    ///
    /// `codesep_pos` is the opcode position of the last executed
    /// OP_CODESEPARATOR, or `0xffffffff` if none was executed. Returns `None`
    /// for hash types that cannot be satisfied by this transaction.
    fn taproot_signature_hash(&self, sighash_type: u8, codesep_pos: u32) -> Option<[u8; 32]>;

    /// The transaction's lock time.
    fn lock_time(&self) -> LockTime;

    /// The sequence number of the input being verified.
    fn sequence(&self) -> Sequence;

    /// The transaction version.
    fn version(&self) -> i32;
}

/// A context with no transaction behind it.
///
/// Every signature check fails and every lock time is unsatisfied, which is
/// what evaluating a script in isolation should do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoTransaction;

impl TxContext for NoTransaction {
    fn signature_hash(&self, _: &[u8], _: u32, _: Mode) -> Option<[u8; 32]> {
        None
    }

    fn taproot_signature_hash(&self, _: u8, _: u32) -> Option<[u8; 32]> {
        None
    }

    fn lock_time(&self) -> LockTime {
        LockTime::ZERO
    }

    fn sequence(&self) -> Sequence {
        Sequence::MAX
    }

    fn version(&self) -> i32 {
        1
    }
}

/// [`SignatureVerifier`] backed by libsecp256k1.
///
/// ECDSA signatures are parsed laxly and normalized to low-S before
/// verification, like Bitcoin Core does; encoding strictness is enforced
/// separately by the flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Secp256k1Verifier;

impl SignatureVerifier for Secp256k1Verifier {
    fn verify_ecdsa(&self, msg: &[u8; 32], sig: &[u8], pubkey: &[u8]) -> bool {
        let Ok(pk) = PublicKey::from_slice(pubkey) else {
            return false;
        };
        let Ok(mut sig) = ecdsa::Signature::from_der_lax(sig) else {
            return false;
        };
        sig.normalize_s();
        SECP256K1.verify_ecdsa(&Message::from_digest(*msg), &sig, &pk).is_ok()
    }

    fn verify_schnorr(&self, msg: &[u8; 32], sig: &[u8], pubkey: &[u8]) -> bool {
        let Ok(pk) = XOnlyPublicKey::from_slice(pubkey) else {
            return false;
        };
        let Ok(sig) = schnorr::Signature::from_slice(sig) else {
            return false;
        };
        SECP256K1.verify_schnorr(&sig, &Message::from_digest(*msg), &pk).is_ok()
    }
}

/// Whether `sig` (hash type byte included) is strict DER as required by BIP66.
///
/// Format: `0x30 [total-length] 0x02 [R-length] [R] 0x02 [S-length] [S] [sighash]`,
/// where R and S are non-negative and not excessively padded.
pub fn is_valid_signature_encoding(sig: &[u8]) -> bool {
    if sig.len() < 9 || sig.len() > 73 {
        return false;
    }
    if sig[0] != 0x30 {
        return false;
    }
    // length covers everything but the type, length and sighash bytes
    if sig[1] as usize != sig.len() - 3 {
        return false;
    }

    let len_r = sig[3] as usize;
    if len_r + 5 >= sig.len() {
        return false;
    }
    let len_s = sig[len_r + 5] as usize;
    if len_r + len_s + 7 != sig.len() {
        return false;
    }

    if sig[2] != 0x02 || len_r == 0 || sig[4] & 0x80 != 0 {
        return false;
    }
    if len_r > 1 && sig[4] == 0x00 && sig[5] & 0x80 == 0 {
        return false;
    }

    if sig[len_r + 4] != 0x02 || len_s == 0 || sig[len_r + 6] & 0x80 != 0 {
        return false;
    }
    if len_s > 1 && sig[len_r + 6] == 0x00 && sig[len_r + 7] & 0x80 == 0 {
        return false;
    }
    true
}

/// Whether the S value of a DER signature (hash type byte included) is in
/// the lower half of the curve order.
pub fn is_low_s(sig: &[u8]) -> bool {
    let Some((_, der)) = sig.split_last() else {
        return false;
    };
    match ecdsa::Signature::from_der_lax(der) {
        Ok(parsed) => {
            let mut normalized = parsed;
            normalized.normalize_s();
            normalized == parsed
        }
        Err(_) => false,
    }
}

/// Whether the final byte of `sig` is a defined legacy/witness v0 hash type.
pub fn is_defined_hashtype(sig: &[u8]) -> bool {
    match sig.last() {
        Some(&t) => matches!(t & !0x80, 0x01..=0x03),
        None => false,
    }
}

/// Whether `hash_type` is a defined BIP341 hash type.
pub fn is_defined_taproot_hashtype(hash_type: u8) -> bool {
    matches!(hash_type, 0x00..=0x03 | 0x81..=0x83)
}

/// Whether `pubkey` is a well formed compressed or uncompressed public key.
pub fn is_valid_pubkey_encoding(pubkey: &[u8]) -> bool {
    match pubkey.len() {
        33 => pubkey[0] == 0x02 || pubkey[0] == 0x03,
        65 => pubkey[0] == 0x04,
        _ => false,
    }
}

/// Enforces the signature encoding rules selected by `flags`.
///
/// An empty signature always passes: it is the canonical way to provide a
/// failing signature to CHECK(MULTI)SIG.
pub fn check_signature_encoding(sig: &[u8], flags: VerifyFlags) -> Result<(), Error> {
    if sig.is_empty() {
        return Ok(());
    }
    let strict_der = flags.contains(VERIFY_DERSIG)
        || flags.contains(VERIFY_LOW_S)
        || flags.contains(VERIFY_STRICTENC);
    if strict_der && !is_valid_signature_encoding(sig) {
        return Err(Error::InvalidDerEncodingLength);
    }
    if flags.contains(VERIFY_LOW_S) && !is_low_s(sig) {
        return Err(Error::InvalidSignatureEncoding);
    }
    if flags.contains(VERIFY_STRICTENC) && !is_defined_hashtype(sig) {
        return Err(Error::InvalidSighashType);
    }
    Ok(())
}

/// Whether `pubkey` is a compressed public key.
pub fn is_compressed_pubkey(pubkey: &[u8]) -> bool {
    pubkey.len() == 33 && (pubkey[0] == 0x02 || pubkey[0] == 0x03)
}

/// Enforces the public key encoding rules selected by `flags`.
///
/// WITNESS_PUBKEYTYPE only applies to witness v0 scripts.
pub fn check_pubkey_encoding(pubkey: &[u8], flags: VerifyFlags, mode: Mode) -> Result<(), Error> {
    if flags.contains(VERIFY_STRICTENC) && !is_valid_pubkey_encoding(pubkey) {
        return Err(Error::InvalidPublicKeyEncoding);
    }
    if mode == Mode::WitnessV0 && flags.contains(VERIFY_WITNESS_PUBKEYTYPE) && !is_compressed_pubkey(pubkey) {
        return Err(Error::WitnessPubkeyType);
    }
    Ok(())
}

/// Checks a legacy or witness v0 signature over `script_code`.
///
/// The caller has already checked encodings. An empty signature is false
/// without consulting the context or verifier.
pub fn check_ecdsa_signature(
    ctx: &dyn TxContext,
    verifier: &dyn SignatureVerifier,
    sig: &[u8],
    pubkey: &[u8],
    script_code: &[u8],
    mode: Mode,
) -> bool {
    let Some((&hash_type, der)) = sig.split_last() else {
        return false;
    };
    match ctx.signature_hash(script_code, u32::from(hash_type), mode) {
        Some(msg) => verifier.verify_ecdsa(&msg, der, pubkey),
        None => false,
    }
}

/// Checks a BIP340 signature in tapscript.
///
/// `sig` is non-empty. It is 64 bytes for the default hash type, or 65 with
/// an explicit, non-zero hash type byte. Unlike ECDSA, a bad signature is an
/// error rather than a false result.
pub fn check_schnorr_signature(
    ctx: &dyn TxContext,
    verifier: &dyn SignatureVerifier,
    sig: &[u8],
    pubkey: &[u8],
    codesep_pos: u32,
) -> Result<(), Error> {
    let (sig, hash_type) = match sig.len() {
        64 => (sig, 0x00),
        65 if sig[64] != 0x00 => (&sig[..64], sig[64]),
        _ => return Err(Error::InvalidSignatureEncoding),
    };
    if !is_defined_taproot_hashtype(hash_type) {
        return Err(Error::InvalidSighashType);
    }
    let msg = ctx.taproot_signature_hash(hash_type, codesep_pos).ok_or(Error::InvalidSighashType)?;
    if !verifier.verify_schnorr(&msg, sig, pubkey) {
        return Err(Error::FailedSignatureVerification);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bitcoin::hex::FromHex;
    use secp256k1_zkp::{Keypair, SecretKey};

    use super::*;
    use crate::flags;

    // A low-S signature from the Bitcoin Core script tests, sighash ALL appended.
    const DER_SIG: &str = "3044022057292e2d4dfe775becdd0a9e6547997c728cdf35390f6a017da56d654d374e4902206b643be2fc53763b4e284845bfea2c597d2dc7759941dce937636c9d341b71ed01";

    #[test]
    fn strict_der() {
        let sig = Vec::<u8>::from_hex(DER_SIG).unwrap();
        assert!(is_valid_signature_encoding(&sig));
        assert!(is_defined_hashtype(&sig));

        // wrong compound marker
        let mut bad = sig.clone();
        bad[0] = 0x31;
        assert!(!is_valid_signature_encoding(&bad));

        // total length off by one
        let mut bad = sig.clone();
        bad[1] += 1;
        assert!(!is_valid_signature_encoding(&bad));

        // negative R
        let mut bad = sig.clone();
        bad[4] |= 0x80;
        assert!(!is_valid_signature_encoding(&bad));

        assert!(!is_valid_signature_encoding(&sig[..8]));
    }

    #[test]
    fn encoding_flags() {
        let sig = Vec::<u8>::from_hex(DER_SIG).unwrap();
        let mut junk = sig.clone();
        junk[0] = 0x31;

        let none = VerifyFlags::NONE;
        let der = VerifyFlags::NONE | flags::VERIFY_DERSIG;
        assert_eq!(check_signature_encoding(&junk, none), Ok(()));
        assert_eq!(check_signature_encoding(&junk, der), Err(Error::InvalidDerEncodingLength));
        assert_eq!(check_signature_encoding(&[], der), Ok(()));
        assert_eq!(check_signature_encoding(&sig, der), Ok(()));

        let mut bad_type = sig.clone();
        *bad_type.last_mut().unwrap() = 0x04;
        let strict = VerifyFlags::NONE | flags::VERIFY_STRICTENC;
        assert_eq!(check_signature_encoding(&bad_type, der), Ok(()));
        assert_eq!(check_signature_encoding(&bad_type, strict), Err(Error::InvalidSighashType));

        assert_eq!(check_pubkey_encoding(&[0x05; 33], none, Mode::Legacy), Ok(()));
        assert_eq!(check_pubkey_encoding(&[0x05; 33], strict, Mode::Legacy), Err(Error::InvalidPublicKeyEncoding));
        assert_eq!(check_pubkey_encoding(&[0x02; 33], strict, Mode::Legacy), Ok(()));
    }

    #[test]
    fn witness_pubkey_type() {
        let uncompressed = [0x04; 65];
        let compressed = [0x03; 33];
        let flags = VerifyFlags::NONE | flags::VERIFY_WITNESS_PUBKEYTYPE;
        assert_eq!(check_pubkey_encoding(&uncompressed, flags, Mode::WitnessV0), Err(Error::WitnessPubkeyType));
        assert_eq!(check_pubkey_encoding(&compressed, flags, Mode::WitnessV0), Ok(()));
        // legacy scripts and the unflagged policy accept either form
        assert_eq!(check_pubkey_encoding(&uncompressed, flags, Mode::Legacy), Ok(()));
        assert_eq!(check_pubkey_encoding(&uncompressed, VerifyFlags::NONE, Mode::WitnessV0), Ok(()));
        // hybrid keys fail STRICTENC first
        let strict = flags | flags::VERIFY_STRICTENC;
        assert_eq!(check_pubkey_encoding(&[0x06; 65], strict, Mode::WitnessV0), Err(Error::InvalidPublicKeyEncoding));
    }

    #[test]
    fn low_s() {
        let sk = SecretKey::from_slice(&[0x42; 32]).unwrap();
        let msg = Message::from_digest([0x11; 32]);
        let sig = SECP256K1.sign_ecdsa(&msg, &sk);

        let mut low = sig.serialize_der().to_vec();
        low.push(0x01);
        assert!(is_low_s(&low));

        // flip S to n - S
        let compact = sig.serialize_compact();
        let order = secp256k1_zkp::constants::CURVE_ORDER;
        let mut high_s = [0u8; 32];
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let d = i16::from(order[i]) - i16::from(compact[32 + i]) - borrow;
            borrow = if d < 0 { 1 } else { 0 };
            high_s[i] = (d + 256 * borrow) as u8;
        }
        let mut high_compact = compact;
        high_compact[32..].copy_from_slice(&high_s);
        let high = ecdsa::Signature::from_compact(&high_compact).unwrap();
        let mut high = high.serialize_der().to_vec();
        high.push(0x01);
        assert!(!is_low_s(&high));

        let low_s_flags = VerifyFlags::NONE | flags::VERIFY_LOW_S;
        assert_eq!(check_signature_encoding(&high, low_s_flags), Err(Error::InvalidSignatureEncoding));

        // the verifier normalizes, so both verify
        let pk = PublicKey::from_secret_key(SECP256K1, &sk).serialize();
        let v = Secp256k1Verifier;
        assert!(v.verify_ecdsa(&[0x11; 32], &low[..low.len() - 1], &pk));
        assert!(v.verify_ecdsa(&[0x11; 32], &high[..high.len() - 1], &pk));
        assert!(!v.verify_ecdsa(&[0x12; 32], &low[..low.len() - 1], &pk));
    }

    #[test]
    fn schnorr() {
        struct Fixed;
        impl TxContext for Fixed {
            fn signature_hash(&self, _: &[u8], _: u32, _: Mode) -> Option<[u8; 32]> {
                None
            }
            fn taproot_signature_hash(&self, t: u8, _: u32) -> Option<[u8; 32]> {
                if t == 0x03 { None } else { Some([t; 32]) }
            }
            fn lock_time(&self) -> LockTime {
                LockTime::ZERO
            }
            fn sequence(&self) -> Sequence {
                Sequence::MAX
            }
            fn version(&self) -> i32 {
                2
            }
        }

        let kp = Keypair::from_seckey_slice(SECP256K1, &[0x07; 32]).unwrap();
        let (xonly, _) = kp.x_only_public_key();
        let pk = xonly.serialize();
        let sig = SECP256K1.sign_schnorr_no_aux_rand(&Message::from_digest([0x00; 32]), &kp);
        let sig = sig[..].to_vec();

        let v = Secp256k1Verifier;
        assert_eq!(check_schnorr_signature(&Fixed, &v, &sig, &pk, u32::MAX), Ok(()));

        // explicit default hash type is not allowed
        let mut explicit = sig.clone();
        explicit.push(0x00);
        assert_eq!(
            check_schnorr_signature(&Fixed, &v, &explicit, &pk, u32::MAX),
            Err(Error::InvalidSignatureEncoding)
        );

        // signed a different digest
        let mut all = sig.clone();
        all.push(0x01);
        assert_eq!(
            check_schnorr_signature(&Fixed, &v, &all, &pk, u32::MAX),
            Err(Error::FailedSignatureVerification)
        );

        let mut undefined = sig.clone();
        undefined.push(0x04);
        assert_eq!(
            check_schnorr_signature(&Fixed, &v, &undefined, &pk, u32::MAX),
            Err(Error::InvalidSighashType)
        );

        let mut unsatisfiable = sig;
        unsatisfiable.push(0x03);
        assert_eq!(
            check_schnorr_signature(&Fixed, &v, &unsatisfiable, &pk, u32::MAX),
            Err(Error::InvalidSighashType)
        );
    }
}
