use hybrid_array::{Array, ArraySize};
use rand_core::CryptoRngCore;
use sha3::{
    Digest, Sha3_256, Sha3_512, Shake128, Shake256,
    digest::{ExtendableOutput, Update, XofReader},
};

use crate::param::{CbdSamplingSize, EncodedPolynomial};
use crate::util::B32;

/// Fill a fixed-size array with bytes from the provided RNG.
pub(crate) fn rand<L: ArraySize>(rng: &mut impl CryptoRngCore) -> Array<u8, L> {
    let mut val = Array::default();
    rng.fill_bytes(&mut val);
    val
}

/// `H(s) = SHA3-256(s)`
pub(crate) fn H(x: impl AsRef<[u8]>) -> B32 {
    let mut hash = Sha3_256::new();
    Digest::update(&mut hash, x);

    // The `sha3` crate hands back its own array type; copy into ours.
    let digest = hash.finalize();
    let mut out = B32::default();
    out.copy_from_slice(&digest);
    out
}

/// `G(c) = SHA3-512(c)`, split into two 32-byte halves.
pub(crate) fn G(inputs: &[impl AsRef<[u8]>]) -> (B32, B32) {
    let mut hash = Sha3_512::new();
    for x in inputs {
        Digest::update(&mut hash, x);
    }
    let digest = hash.finalize();

    let mut a = B32::default();
    let mut b = B32::default();
    a.copy_from_slice(&digest[..32]);
    b.copy_from_slice(&digest[32..]);
    (a, b)
}

/// `J(s) = SHAKE256(s, 32)`, the implicit-rejection key derivation.
pub(crate) fn J(inputs: &[impl AsRef<[u8]>]) -> B32 {
    let mut hash = Shake256::default();
    for x in inputs {
        hash.update(x.as_ref());
    }
    let mut reader = hash.finalize_xof();

    let mut out = B32::default();
    reader.read(&mut out);
    out
}

/// The output of `PRF<Eta>`: `64 * eta` bytes, exactly one CBD sample block.
pub(crate) type PrfOutput<Eta> = EncodedPolynomial<<Eta as CbdSamplingSize>::SampleSize>;

/// `PRF_eta(s, b) = SHAKE256(s || b, 64 * eta)`
pub(crate) fn PRF<Eta>(s: &B32, b: u8) -> PrfOutput<Eta>
where
    Eta: CbdSamplingSize,
{
    let mut hash = Shake256::default();
    hash.update(s.as_ref());
    hash.update(&[b]);
    let mut reader = hash.finalize_xof();

    let mut out = PrfOutput::<Eta>::default();
    reader.read(&mut out);
    out
}

/// The incremental XOF behind `SampleNTT`: SHAKE128 over `rho || i || j`.
pub(crate) fn XOF(rho: &B32, i: u8, j: u8) -> impl XofReader {
    let mut hash = Shake128::default();
    hash.update(rho);
    hash.update(&[i, j]);
    hash.finalize_xof()
}
