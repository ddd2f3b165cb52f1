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

//! Full spends signed with real keys against a mock transaction.

use scriptvm::bitcoin::hashes::{hash160, sha256, sha256d, Hash, HashEngine};
use scriptvm::flags::{
    VERIFY_CHECKLOCKTIMEVERIFY, VERIFY_CONSENSUS, VERIFY_DERSIG, VERIFY_LOW_S, VERIFY_NULLFAIL,
    VERIFY_P2SH, VERIFY_STRICTENC, VERIFY_WITNESS,
};
use scriptvm::opcodes::all;
use scriptvm::secp256k1_zkp::{Keypair, Message, PublicKey, SecretKey, SECP256K1};
use scriptvm::{
    Builder, Error, Interpreter, LockTime, Mode, PubkeyScript, RedeemScript, Secp256k1Verifier, Sequence,
    SignatureScript, Stack, TxContext, VerifyFlags, Witness,
};

/// Stands in for a transaction: hashes commit to the script code, the hash
/// type and the mode, which is all the engine varies.
struct MockTx {
    lock_time: LockTime,
    sequence: Sequence,
}

impl Default for MockTx {
    fn default() -> Self {
        MockTx { lock_time: LockTime::ZERO, sequence: Sequence::MAX }
    }
}

impl TxContext for MockTx {
    fn signature_hash(&self, script_code: &[u8], sighash_type: u32, mode: Mode) -> Option<[u8; 32]> {
        let mut engine = sha256d::Hash::engine();
        engine.input(script_code);
        engine.input(&sighash_type.to_le_bytes());
        engine.input(&[mode as u8]);
        Some(sha256d::Hash::from_engine(engine).to_byte_array())
    }

    fn taproot_signature_hash(&self, sighash_type: u8, codesep_pos: u32) -> Option<[u8; 32]> {
        let mut engine = sha256::Hash::engine();
        engine.input(&[sighash_type]);
        engine.input(&codesep_pos.to_le_bytes());
        Some(sha256::Hash::from_engine(engine).to_byte_array())
    }

    fn lock_time(&self) -> LockTime {
        self.lock_time
    }

    fn sequence(&self) -> Sequence {
        self.sequence
    }

    fn version(&self) -> i32 {
        2
    }
}

struct Signer {
    sk: SecretKey,
    pk: PublicKey,
}

impl Signer {
    fn new(seed: u8) -> Signer {
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        Signer { sk, pk: PublicKey::from_secret_key(SECP256K1, &sk) }
    }

    fn pubkey_hash(&self) -> hash160::Hash {
        hash160::Hash::hash(&self.pk.serialize())
    }

    /// DER signature with SIGHASH_ALL over `script_code`.
    fn sign(&self, tx: &MockTx, script_code: &[u8], mode: Mode) -> Vec<u8> {
        let msg = tx.signature_hash(script_code, 0x01, mode).unwrap();
        let sig = SECP256K1.sign_ecdsa(&Message::from_digest(msg), &self.sk);
        let mut der = sig.serialize_der().to_vec();
        der.push(0x01);
        der
    }
}

fn policy() -> VerifyFlags {
    VerifyFlags::consensus() | VERIFY_STRICTENC | VERIFY_LOW_S | VERIFY_NULLFAIL
}

fn verify(
    tx: &MockTx,
    flags: VerifyFlags,
    sig: &SignatureScript,
    pubkey: &PubkeyScript,
    witness: &Witness,
) -> Result<(), Error> {
    Interpreter::new(tx, &Secp256k1Verifier, flags).verify_script(sig, pubkey, witness)
}

#[test]
fn p2pkh() {
    let tx = MockTx::default();
    let alice = Signer::new(1);
    let pubkey = PubkeyScript::new_p2pkh(&alice.pubkey_hash());
    let sig = alice.sign(&tx, pubkey.as_bytes(), Mode::Legacy);

    let script_sig = SignatureScript::new_p2pkh(&sig, &alice.pk);
    assert_eq!(verify(&tx, policy(), &script_sig, &pubkey, &Witness::new()), Ok(()));

    // wrong key for the hash
    let bob = Signer::new(2);
    let wrong_key = SignatureScript::new_p2pkh(&sig, &bob.pk);
    assert_eq!(
        verify(&tx, policy(), &wrong_key, &pubkey, &Witness::new()),
        Err(Error::UnequalStackItems)
    );

    // signed the wrong script code: false, and NULLFAIL turns it into an error
    let other = bob.sign(&tx, pubkey.as_bytes(), Mode::Legacy);
    let bad_sig = SignatureScript::new_p2pkh(&other, &alice.pk);
    assert_eq!(
        verify(&tx, VerifyFlags::consensus(), &bad_sig, &pubkey, &Witness::new()),
        Err(Error::EvalFalse)
    );
    assert_eq!(verify(&tx, policy(), &bad_sig, &pubkey, &Witness::new()), Err(Error::NullFail));
}

#[test]
fn p2sh_p2pk() {
    let tx = MockTx::default();
    let alice = Signer::new(3);
    let redeem = RedeemScript::from(Builder::new().push_key(&alice.pk).push_opcode(all::OP_CHECKSIG).into_script());
    let sig = alice.sign(&tx, redeem.as_bytes(), Mode::Legacy);
    let script_sig = SignatureScript::new_p2sh(&[&sig[..]], &redeem);
    assert_eq!(verify(&tx, policy(), &script_sig, &redeem.to_p2sh(), &Witness::new()), Ok(()));
}

#[test]
fn p2sh_multisig() {
    let tx = MockTx::default();
    let signers = [Signer::new(4), Signer::new(5), Signer::new(6)];
    let keys: Vec<PublicKey> = signers.iter().map(|s| s.pk).collect();
    let redeem = RedeemScript::new_multisig(2, &keys).unwrap();
    let pubkey = redeem.to_p2sh();

    let sig0 = signers[0].sign(&tx, redeem.as_bytes(), Mode::Legacy);
    let sig2 = signers[2].sign(&tx, redeem.as_bytes(), Mode::Legacy);

    let script_sig = SignatureScript::new_p2sh(&[&[][..], &sig0[..], &sig2[..]], &redeem);
    assert_eq!(verify(&tx, policy(), &script_sig, &pubkey, &Witness::new()), Ok(()));
    assert_eq!(script_sig.redeem_script(), Some(redeem.clone()));
    assert_eq!(redeem.sigop_count(), 3);

    // signatures out of key order fail
    let swapped = SignatureScript::new_p2sh(&[&[][..], &sig2[..], &sig0[..]], &redeem);
    assert_eq!(
        verify(&tx, VerifyFlags::consensus(), &swapped, &pubkey, &Witness::new()),
        Err(Error::EvalFalse)
    );
}

#[test]
fn p2wpkh() {
    let tx = MockTx::default();
    let alice = Signer::new(7);
    let pubkey = PubkeyScript::new_p2wpkh(&alice.pubkey_hash());
    let script_code = PubkeyScript::new_p2pkh(&alice.pubkey_hash());
    let sig = alice.sign(&tx, script_code.as_bytes(), Mode::WitnessV0);

    let witness = Witness::from(vec![sig.clone(), alice.pk.serialize().to_vec()]);
    assert_eq!(verify(&tx, policy(), &SignatureScript::default(), &pubkey, &witness), Ok(()));

    // the same signature made for legacy does not verify in witness v0
    let legacy = alice.sign(&tx, script_code.as_bytes(), Mode::Legacy);
    let witness = Witness::from(vec![legacy, alice.pk.serialize().to_vec()]);
    assert_eq!(
        verify(&tx, policy(), &SignatureScript::default(), &pubkey, &witness),
        Err(Error::NullFail)
    );

    // nested in P2SH
    let redeem = RedeemScript::from(pubkey.into_script());
    let witness = Witness::from(vec![sig, alice.pk.serialize().to_vec()]);
    let script_sig = SignatureScript::new_p2sh(&[], &redeem);
    assert_eq!(verify(&tx, policy(), &script_sig, &redeem.to_p2sh(), &witness), Ok(()));
}

#[test]
fn p2wsh_signs_taken_branch_only() {
    let tx = MockTx::default();
    let (alice, bob) = (Signer::new(8), Signer::new(9));
    let witness_script = Builder::new()
        .push_opcode(all::OP_IF)
        .push_key(&alice.pk)
        .push_opcode(all::OP_CHECKSIG)
        .push_opcode(all::OP_ELSE)
        .push_key(&bob.pk)
        .push_opcode(all::OP_CHECKSIG)
        .push_opcode(all::OP_ENDIF)
        .into_script();
    let pubkey = PubkeyScript::new_p2wsh(&witness_script.wscript_hash());

    let then_code = Builder::new()
        .push_opcode(all::OP_IF)
        .push_key(&alice.pk)
        .push_opcode(all::OP_CHECKSIG)
        .push_opcode(all::OP_ELSE)
        .push_opcode(all::OP_ENDIF)
        .into_script();
    let sig = alice.sign(&tx, then_code.as_bytes(), Mode::WitnessV0);
    let witness = Witness::from(vec![sig, vec![1], witness_script.to_bytes()]);
    assert_eq!(verify(&tx, policy(), &SignatureScript::default(), &pubkey, &witness), Ok(()));

    let else_code = Builder::new()
        .push_opcode(all::OP_IF)
        .push_opcode(all::OP_ELSE)
        .push_key(&bob.pk)
        .push_opcode(all::OP_CHECKSIG)
        .push_opcode(all::OP_ENDIF)
        .into_script();
    let sig = bob.sign(&tx, else_code.as_bytes(), Mode::WitnessV0);
    let witness = Witness::from(vec![sig, vec![], witness_script.to_bytes()]);
    assert_eq!(verify(&tx, policy(), &SignatureScript::default(), &pubkey, &witness), Ok(()));

    // a signature over the whole script does not match
    let whole = bob.sign(&tx, witness_script.as_bytes(), Mode::WitnessV0);
    let witness = Witness::from(vec![whole, vec![], witness_script.to_bytes()]);
    assert_eq!(
        verify(&tx, VerifyFlags::consensus(), &SignatureScript::default(), &pubkey, &witness),
        Err(Error::EvalFalse)
    );
}

#[test]
fn cltv_p2pkh() {
    let alice = Signer::new(10);
    let pubkey = PubkeyScript::new_cltv_p2pkh(LockTime::from_consensus(500), &alice.pubkey_hash());
    let flags = VerifyFlags::from_bits(VERIFY_P2SH | VERIFY_DERSIG | VERIFY_CHECKLOCKTIMEVERIFY).unwrap();

    let tx = MockTx { lock_time: LockTime::from_consensus(600), sequence: Sequence::ENABLE_LOCKTIME_NO_RBF };
    let sig = alice.sign(&tx, pubkey.as_bytes(), Mode::Legacy);
    let script_sig = SignatureScript::new_p2pkh(&sig, &alice.pk);
    assert_eq!(verify(&tx, flags, &script_sig, &pubkey, &Witness::new()), Ok(()));

    let early = MockTx { lock_time: LockTime::from_consensus(400), sequence: Sequence::ENABLE_LOCKTIME_NO_RBF };
    assert_eq!(
        verify(&early, flags, &script_sig, &pubkey, &Witness::new()),
        Err(Error::UnsatisfiedLocktime)
    );

    // a final input disables the lock time
    let final_input = MockTx { lock_time: LockTime::from_consensus(600), sequence: Sequence::MAX };
    assert_eq!(
        verify(&final_input, flags, &script_sig, &pubkey, &Witness::new()),
        Err(Error::UnsatisfiedLocktime)
    );
}

fn schnorr_sig(seed: u8, tx: &MockTx, codesep_pos: u32) -> (Vec<u8>, [u8; 32]) {
    let kp = Keypair::from_seckey_slice(SECP256K1, &[seed; 32]).unwrap();
    let (xonly, _) = kp.x_only_public_key();
    let msg = tx.taproot_signature_hash(0x00, codesep_pos).unwrap();
    let sig = SECP256K1.sign_schnorr_no_aux_rand(&Message::from_digest(msg), &kp);
    (sig[..].to_vec(), xonly.serialize())
}

#[test]
fn tapscript_checksig() {
    let tx = MockTx::default();
    let interp = Interpreter::new(&tx, &Secp256k1Verifier, VerifyFlags::all());
    let (sig, key) = schnorr_sig(11, &tx, u32::MAX);
    let leaf = Builder::new().push_slice(&key).push_opcode(all::OP_CHECKSIG).into_script();

    assert_eq!(interp.verify_tapscript(leaf.as_bytes(), Stack::from(vec![sig.clone()]), 100), Ok(()));

    // empty signature is a clean false
    assert_eq!(interp.verify_tapscript(leaf.as_bytes(), Stack::from(vec![vec![]]), 100), Err(Error::EvalFalse));

    // a bad signature is an error, not a false
    let mut bad = sig.clone();
    bad[10] ^= 1;
    assert_eq!(
        interp.verify_tapscript(leaf.as_bytes(), Stack::from(vec![bad]), 100),
        Err(Error::FailedSignatureVerification)
    );

    // the 50 unit budget per signature comes out of the witness size plus 50
    let two = Builder::new()
        .push_slice(&key)
        .push_opcode(all::OP_CHECKSIGVERIFY)
        .push_slice(&key)
        .push_opcode(all::OP_CHECKSIG)
        .into_script();
    let stack = Stack::from(vec![sig.clone(), sig.clone()]);
    assert_eq!(interp.verify_tapscript(two.as_bytes(), stack.clone(), 50), Ok(()));
    assert_eq!(interp.verify_tapscript(two.as_bytes(), stack, 49), Err(Error::TapscriptValidationWeight));
}

#[test]
fn tapscript_codeseparator_position() {
    let tx = MockTx::default();
    let interp = Interpreter::new(&tx, &Secp256k1Verifier, VerifyFlags::all());
    // NOP CODESEPARATOR <key> CHECKSIG: the separator sits at position 1
    let (sig, key) = schnorr_sig(12, &tx, 1);
    let leaf = Builder::new()
        .push_opcode(all::OP_NOP)
        .push_opcode(all::OP_CODESEPARATOR)
        .push_slice(&key)
        .push_opcode(all::OP_CHECKSIG)
        .into_script();
    assert_eq!(interp.verify_tapscript(leaf.as_bytes(), Stack::from(vec![sig]), 100), Ok(()));
}

#[test]
fn tapscript_checksigadd() {
    let tx = MockTx::default();
    let interp = Interpreter::new(&tx, &Secp256k1Verifier, VerifyFlags::all());
    let (sig_a, key_a) = schnorr_sig(13, &tx, u32::MAX);
    let (_, key_b) = schnorr_sig(14, &tx, u32::MAX);
    // <a> CHECKSIG <b> CHECKSIGADD 1 NUMEQUAL
    let leaf = Builder::new()
        .push_slice(&key_a)
        .push_opcode(all::OP_CHECKSIG)
        .push_slice(&key_b)
        .push_opcode(all::OP_CHECKSIGADD)
        .push_int(1)
        .push_opcode(all::OP_NUMEQUAL)
        .into_script();
    // witness items: sig for b (empty) below sig for a
    let stack = Stack::from(vec![vec![], sig_a]);
    assert_eq!(interp.verify_tapscript(leaf.as_bytes(), stack, 200), Ok(()));

    // the same opcode outside tapscript
    let stack = Stack::from(vec![vec![], vec![], key_b.to_vec()]);
    let legacy = interp.evaluate(&[all::OP_CHECKSIGADD.into_u8()], stack, Mode::WitnessV0);
    assert_eq!(legacy.unwrap_err(), Error::OpCheckSigAddPreTaproot);
}

#[test]
fn witness_flag_gates_segwit() {
    let tx = MockTx::default();
    let alice = Signer::new(15);
    let pubkey = PubkeyScript::new_p2wpkh(&alice.pubkey_hash());
    let witness = Witness::from(vec![vec![0x30], alice.pk.serialize().to_vec()]);
    let without = VerifyFlags::from_bits(VERIFY_CONSENSUS & !VERIFY_WITNESS).unwrap();
    assert_eq!(verify(&tx, without, &SignatureScript::default(), &pubkey, &witness), Ok(()));
    assert!(verify(&tx, VerifyFlags::consensus(), &SignatureScript::default(), &pubkey, &witness).is_err());
}

#[test]
fn consensus_flags_round_trip() {
    let flags = VerifyFlags::consensus();
    assert!(flags.contains(VERIFY_WITNESS));
    assert_eq!(VerifyFlags::from_bits(flags.bits()), Ok(flags));
    assert_eq!(VerifyFlags::from_bits(VERIFY_CONSENSUS).unwrap(), flags);
}
