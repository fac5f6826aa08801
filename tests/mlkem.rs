//! End-to-end tests across all three parameter sets: round trips, seeded
//! determinism, serialized-form sizes, boundary errors, and implicit
//! rejection.

use kem::{Decapsulate, Encapsulate};
use mlkem::{
    Ciphertext, EncodedSizeUser, Error, KemCore, MlKem512, MlKem768, MlKem1024, Seed,
    array::typenum::Unsigned,
};

/// A fixed 64-byte seed for deterministic tests.
fn fixed_seed(variant: u8) -> Seed {
    Seed::from_fn(|i| (i as u8).wrapping_add(variant.wrapping_mul(37)))
}

fn round_trip<K: KemCore>() {
    let mut rng = rand::thread_rng();

    let (dk, ek) = K::generate(&mut rng);
    let (ct, k_send) = ek.encapsulate(&mut rng).unwrap();
    let k_recv = dk.decapsulate(&ct).unwrap();
    assert_eq!(k_send, k_recv);
}

#[test]
fn round_trip_all_sets() {
    round_trip::<MlKem512>();
    round_trip::<MlKem768>();
    round_trip::<MlKem1024>();
}

fn seeded_determinism<K: KemCore>() {
    let (dk1, ek1) = K::from_seed(fixed_seed(0));
    let (dk2, ek2) = K::from_seed(fixed_seed(0));
    assert_eq!(dk1.as_bytes(), dk2.as_bytes());
    assert_eq!(ek1.as_bytes(), ek2.as_bytes());

    let (dk3, ek3) = K::from_seed(fixed_seed(1));
    assert_ne!(dk1.as_bytes(), dk3.as_bytes());
    assert_ne!(ek1.as_bytes(), ek3.as_bytes());
}

#[test]
fn seeded_determinism_all_sets() {
    seeded_determinism::<MlKem512>();
    seeded_determinism::<MlKem768>();
    seeded_determinism::<MlKem1024>();
}

fn serialized_round_trip<K: KemCore>() {
    let mut rng = rand::thread_rng();
    let (dk, ek) = K::from_seed(fixed_seed(2));

    let dk2 = K::DecapsulationKey::from_bytes(&dk.as_bytes()).unwrap();
    let ek2 = K::EncapsulationKey::from_bytes(&ek.as_bytes()).unwrap();
    assert_eq!(dk, dk2);
    assert_eq!(ek, ek2);

    let (ct, k_send) = ek2.encapsulate(&mut rng).unwrap();
    assert_eq!(k_send, dk2.decapsulate(&ct).unwrap());
}

#[test]
fn serialized_round_trip_all_sets() {
    serialized_round_trip::<MlKem512>();
    serialized_round_trip::<MlKem768>();
    serialized_round_trip::<MlKem1024>();
}

fn object_sizes<K: KemCore>(ek_len: usize, dk_len: usize, ct_len: usize) {
    assert_eq!(
        <<K::EncapsulationKey as EncodedSizeUser>::EncodedSize as Unsigned>::USIZE,
        ek_len
    );
    assert_eq!(
        <<K::DecapsulationKey as EncodedSizeUser>::EncodedSize as Unsigned>::USIZE,
        dk_len
    );
    assert_eq!(<K::CiphertextSize as Unsigned>::USIZE, ct_len);
    assert_eq!(<K::SharedKeySize as Unsigned>::USIZE, 32);
}

// The byte lengths from the FIPS 203 parameter-set table.
#[test]
fn object_sizes_all_sets() {
    object_sizes::<MlKem512>(800, 1632, 768);
    object_sizes::<MlKem768>(1184, 2400, 1088);
    object_sizes::<MlKem1024>(1568, 3168, 1568);
}

#[test]
fn rejects_wrong_lengths() {
    let (dk, ek) = MlKem768::from_seed(fixed_seed(3));

    // Keys of the wrong length are rejected when parsing from slices.
    let ek_bytes = ek.as_bytes();
    let err = ml_kem_768_ek_from_slice(&ek_bytes[..ek_bytes.len() - 1]).unwrap_err();
    assert_eq!(err, Error::InvalidKeyLength);

    let dk_bytes = dk.as_bytes();
    let err = ml_kem_768_dk_from_slice(&dk_bytes[..dk_bytes.len() - 1]).unwrap_err();
    assert_eq!(err, Error::InvalidKeyLength);

    // Correct-length slices parse.
    assert!(ml_kem_768_ek_from_slice(&ek_bytes).is_ok());
    assert!(ml_kem_768_dk_from_slice(&dk_bytes).is_ok());

    // Ciphertexts of the wrong length are rejected; the ML-KEM-512 length is
    // wrong for ML-KEM-768.
    let short_ct = [0u8; 768];
    assert_eq!(
        dk.decapsulate_slice(&short_ct).unwrap_err(),
        Error::InvalidCiphertextLength
    );

    // A correct-length ciphertext always decapsulates to a 32-byte key.
    let ct = [0u8; 1088];
    let k = dk.decapsulate_slice(&ct).unwrap();
    assert_eq!(k.len(), 32);

    // Seeds must be exactly 64 bytes.
    let err = mlkem::ml_kem_768::DecapsulationKey::from_seed_slice(&[0u8; 63]).unwrap_err();
    assert_eq!(err, Error::InvalidKeyLength);
}

fn ml_kem_768_ek_from_slice(data: &[u8]) -> Result<mlkem::ml_kem_768::EncapsulationKey, Error> {
    mlkem::ml_kem_768::EncapsulationKey::try_from(data)
}

fn ml_kem_768_dk_from_slice(data: &[u8]) -> Result<mlkem::ml_kem_768::DecapsulationKey, Error> {
    mlkem::ml_kem_768::DecapsulationKey::try_from(data)
}

#[test]
fn rejects_non_canonical_encapsulation_key() {
    let (_, ek) = MlKem768::from_seed(fixed_seed(4));

    // Force the first encoded coefficient of t_hat to 0xfff, which is >= q.
    let mut enc = ek.as_bytes();
    enc[0] = 0xff;
    enc[1] |= 0x0f;

    let result = mlkem::ml_kem_768::EncapsulationKey::from_bytes(&enc);
    assert_eq!(result.unwrap_err(), Error::InvalidKey);
}

#[test]
fn rejects_inconsistent_key_hash() {
    let (dk, _) = MlKem768::from_seed(fixed_seed(5));

    // Corrupt the embedded H(ek).
    let mut enc = dk.as_bytes();
    let h_offset = enc.len() - 64;
    enc[h_offset] ^= 0x80;

    let result = mlkem::ml_kem_768::DecapsulationKey::from_bytes(&enc);
    assert_eq!(result.unwrap_err(), Error::InvalidKey);
}

fn implicit_rejection<K: KemCore>() {
    let mut rng = rand::thread_rng();
    let (dk, ek) = K::from_seed(fixed_seed(6));

    let (ct, k_send) = ek.encapsulate(&mut rng).unwrap();

    // Flip a bit anywhere in the ciphertext; the decapsulated key changes and
    // no error is reported.
    let mut forged: Ciphertext<K> = ct.clone();
    let last = forged.len() - 1;
    forged[last] ^= 0x40;

    let k_reject = dk.decapsulate(&forged).unwrap();
    assert_ne!(k_send, k_reject);

    // The rejection key is a deterministic function of (dk, c).
    assert_eq!(k_reject, dk.decapsulate(&forged).unwrap());
}

#[test]
fn implicit_rejection_all_sets() {
    implicit_rejection::<MlKem512>();
    implicit_rejection::<MlKem768>();
    implicit_rejection::<MlKem1024>();
}

// Cross-key check: a ciphertext for one recipient decapsulates under another
// key to an unrelated (rejection) value, not to the sender's key.
#[test]
fn wrong_recipient() {
    let mut rng = rand::thread_rng();

    let (_, ek_a) = MlKem768::from_seed(fixed_seed(7));
    let (dk_b, _) = MlKem768::from_seed(fixed_seed(8));

    let (ct, k_send) = ek_a.encapsulate(&mut rng).unwrap();
    let k_other = dk_b.decapsulate(&ct).unwrap();
    assert_ne!(k_send, k_other);
}

#[cfg(feature = "deterministic")]
mod deterministic {
    use super::*;
    use mlkem::{B32, EncapsulateDeterministic};

    // With d, z, and m pinned, the whole (ek, dk, c, K) tuple is a pure
    // function of the inputs.
    #[test]
    fn full_transcript_is_deterministic() {
        let d = B32::from_fn(|i| i as u8);
        let z = B32::from_fn(|i| 0x55 ^ (i as u8));
        let m = B32::from_fn(|_| 0xa5);

        let (dk1, ek1) = MlKem768::generate_deterministic(&d, &z);
        let (dk2, ek2) = MlKem768::generate_deterministic(&d, &z);
        assert_eq!(dk1.as_bytes(), dk2.as_bytes());
        assert_eq!(ek1.as_bytes(), ek2.as_bytes());

        let (c1, k1) = ek1.encapsulate_deterministic(&m).unwrap();
        let (c2, k2) = ek2.encapsulate_deterministic(&m).unwrap();
        assert_eq!(c1, c2);
        assert_eq!(k1, k2);

        assert_eq!(k1, dk1.decapsulate(&c1).unwrap());
    }
}
